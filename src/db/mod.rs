pub mod items;
pub mod pool;

pub use items::ItemRepository;
pub use pool::{create_pool, run_migrations};

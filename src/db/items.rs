use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::ItemModel;
use crate::validation::{ItemChanges, NewItem};

/// Durable storage for catalog items.
///
/// Each operation runs in its own transaction. Returning early through `?`
/// drops the transaction, which rolls it back.
#[derive(Clone, Debug)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All items, most recently created first.
    pub async fn list(&self) -> Result<Vec<ItemModel>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let items: Vec<ItemModel> = sqlx::query_as(
            "SELECT id, name, country, denomination, year, catalog_reference, description, \
             estimated_value, market_value, status, notes, image_path, created_at, updated_at \
             FROM currency_items ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(items)
    }

    pub async fn get(&self, id: i64) -> Result<Option<ItemModel>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let item = fetch_item(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn create(&self, new_item: NewItem) -> Result<ItemModel, sqlx::Error> {
        let now = format_timestamp(current_timestamp());
        let mut tx = self.pool.begin().await?;

        let item: ItemModel = sqlx::query_as(
            "INSERT INTO currency_items (name, country, denomination, year, catalog_reference, \
             description, estimated_value, market_value, status, notes, image_path, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, name, country, denomination, year, catalog_reference, description, \
             estimated_value, market_value, status, notes, image_path, created_at, updated_at",
        )
        .bind(&new_item.name)
        .bind(&new_item.country)
        .bind(&new_item.denomination)
        .bind(new_item.year)
        .bind(&new_item.catalog_reference)
        .bind(&new_item.description)
        .bind(new_item.estimated_value)
        .bind(new_item.market_value)
        .bind(new_item.status)
        .bind(&new_item.notes)
        .bind(&new_item.image_path)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Created item id={} name={:?}", item.id, item.name);
        Ok(item)
    }

    /// Merges `changes` into the stored item. `None` when no item has `id`.
    pub async fn update(
        &self,
        id: i64,
        changes: ItemChanges,
    ) -> Result<Option<ItemModel>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds SQLite's write lock before the
        // read; upgrading a read lock later can fail with SQLITE_BUSY.
        let locked = sqlx::query("UPDATE currency_items SET updated_at = updated_at WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if locked == 0 {
            return Ok(None);
        }

        let Some(mut item) = fetch_item(&mut *tx, id).await? else {
            return Ok(None);
        };
        changes.apply_to(&mut item);
        let updated_at = next_timestamp(item.updated_at);

        let item: ItemModel = sqlx::query_as(
            "UPDATE currency_items SET name = ?, country = ?, denomination = ?, year = ?, \
             catalog_reference = ?, description = ?, estimated_value = ?, market_value = ?, \
             status = ?, notes = ?, image_path = ?, updated_at = ? \
             WHERE id = ? \
             RETURNING id, name, country, denomination, year, catalog_reference, description, \
             estimated_value, market_value, status, notes, image_path, created_at, updated_at",
        )
        .bind(&item.name)
        .bind(&item.country)
        .bind(&item.denomination)
        .bind(item.year)
        .bind(&item.catalog_reference)
        .bind(&item.description)
        .bind(item.estimated_value)
        .bind(item.market_value)
        .bind(item.status)
        .bind(&item.notes)
        .bind(&item.image_path)
        .bind(format_timestamp(updated_at))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Updated item id={}", id);
        Ok(Some(item))
    }

    /// Hard delete. Returns `false` when no item has `id`.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let rows_affected = sqlx::query("DELETE FROM currency_items WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        if rows_affected > 0 {
            tracing::info!("Deleted item id={}", id);
        }
        Ok(rows_affected > 0)
    }
}

async fn fetch_item(conn: &mut SqliteConnection, id: i64) -> Result<Option<ItemModel>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name, country, denomination, year, catalog_reference, description, \
         estimated_value, market_value, status, notes, image_path, created_at, updated_at \
         FROM currency_items WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Stored precision is microseconds; truncating here keeps returned and
/// re-read records identical.
fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly after `previous`, even if the clock has not advanced.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    current_timestamp().max(previous + Duration::microseconds(1))
}

/// Fixed-width text so that lexical order in SQLite matches time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};
    use crate::models::ItemStatus;
    use crate::validation::Patch;

    async fn repository() -> ItemRepository {
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();
        ItemRepository::new(pool)
    }

    fn new_item(name: &str) -> NewItem {
        NewItem {
            name: name.to_string(),
            country: "France".to_string(),
            denomination: "1 Franc".to_string(),
            year: Some(1912),
            catalog_reference: None,
            description: Some("Semeuse".to_string()),
            estimated_value: Some(25.5),
            market_value: Some(32.0),
            status: ItemStatus::Owned,
            notes: None,
            image_path: Some("images/franc.jpg".to_string()),
        }
    }

    #[test]
    fn test_format_timestamp_is_fixed_width() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(ts), "2024-05-01T10:00:00.000000Z");
    }

    #[test]
    fn test_next_timestamp_strictly_increases() {
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(next_timestamp(future), future + Duration::microseconds(1));
        let past = Utc::now() - Duration::hours(1);
        assert!(next_timestamp(past) > past);
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let repo = repository().await;
        let first = repo.create(new_item("1912 French 1 Franc")).await.unwrap();
        let second = repo.create(new_item("1969 German 5 Mark")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(first.name, "1912 French 1 Franc");
        assert_eq!(first.year, Some(1912));
        assert_eq!(first.estimated_value, Some(25.5));
        assert_eq!(first.status, ItemStatus::Owned);
        assert_eq!(first.image_path.as_deref(), Some("images/franc.jpg"));

        let fetched = repo.get(first.id).await.unwrap().unwrap();
        assert_eq!(fetched, first);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = repository().await;
        let a = repo.create(new_item("a")).await.unwrap();
        let b = repo.create(new_item("b")).await.unwrap();
        let c = repo.create(new_item("c")).await.unwrap();

        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn test_list_equal_timestamps_later_insert_first() {
        let repo = repository().await;
        for name in ["a", "b"] {
            sqlx::query(
                "INSERT INTO currency_items (name, country, denomination, status, created_at, updated_at) \
                 VALUES (?, 'France', '1 Franc', 'owned', ?, ?)",
            )
            .bind(name)
            .bind("2024-05-01T10:00:00.000000Z")
            .bind("2024-05-01T10:00:00.000000Z")
            .execute(&repo.pool)
            .await
            .unwrap();
        }

        let items = repo.list().await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(items[0].id > items[1].id);
    }

    #[tokio::test]
    async fn test_concurrent_updates_on_file_database() {
        let path = std::env::temp_dir().join(format!(
            "coin-tracker-concurrent-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let url = format!("sqlite://{}", path.display());
        let pool = create_pool(&url, 5).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = ItemRepository::new(pool.clone());
        let created = repo.create(new_item("1912 French 1 Franc")).await.unwrap();

        let handles: Vec<_> = (0..10i32)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    let changes = ItemChanges {
                        market_value: Patch::Value(f64::from(i)),
                        ..ItemChanges::default()
                    };
                    repo.update(created.id, changes).await
                })
            })
            .collect();
        for handle in handles {
            let updated = handle.await.unwrap().unwrap();
            assert!(updated.is_some());
        }

        let current = repo.get(created.id).await.unwrap().unwrap();
        assert!(current.updated_at > created.updated_at);
        assert_eq!(current.name, created.name);

        pool.close().await;
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_update_merges_present_fields() {
        let repo = repository().await;
        let created = repo.create(new_item("1912 French 1 Franc")).await.unwrap();

        let changes = ItemChanges {
            market_value: Patch::Value(40.0),
            status: Some(ItemStatus::Sold),
            description: Patch::Null,
            ..ItemChanges::default()
        };
        let updated = repo.update(created.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.market_value, Some(40.0));
        assert_eq!(updated.status, ItemStatus::Sold);
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.estimated_value, created.estimated_value);
        assert_eq!(updated.image_path, created.image_path);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        let again = repo
            .update(created.id, ItemChanges::default())
            .await
            .unwrap()
            .unwrap();
        assert!(again.updated_at > updated.updated_at);
        assert_eq!(again.market_value, Some(40.0));
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let repo = repository().await;
        assert!(repo.get(404).await.unwrap().is_none());
        assert!(repo
            .update(404, ItemChanges::default())
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete(404).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_permanent_and_ids_not_reused() {
        let repo = repository().await;
        let created = repo.create(new_item("1901 US Morgan Dollar")).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
        assert!(!repo.delete(created.id).await.unwrap());

        let next = repo.create(new_item("1957 Italian 100 Lire")).await.unwrap();
        assert!(next.id > created.id);
    }

    #[tokio::test]
    async fn test_storage_constraints_reject_invalid_rows() {
        let repo = repository().await;
        let mut item = new_item("bad");
        item.year = Some(2101);
        assert!(repo.create(item).await.is_err());
        assert!(repo.list().await.unwrap().is_empty());
    }
}

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::AppResult;
use crate::services::json_body;

const SAMPLE_MATCHES: [&str; 4] = [
    "1912 French 1 Franc",
    "1957 Italian 100 Lire",
    "1969 German 5 Mark",
    "1901 US Morgan Dollar",
];

const PLACEHOLDER_NOTES: &str =
    "Prototype vision placeholder. Integrate ML or external service for production.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecognitionRequest {
    pub filename: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    pub probable_match: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub notes: String,
}

/// Suggests an identification for an uploaded image.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, request: &RecognitionRequest) -> RecognitionResult;
}

/// Stand-in that derives a repeatable suggestion from the request text.
/// It does not look at image content.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRecognizer;

impl Recognizer for PlaceholderRecognizer {
    fn recognize(&self, request: &RecognitionRequest) -> RecognitionResult {
        let seed: u64 = request
            .filename
            .chars()
            .chain(request.mime_type.chars())
            .map(|c| c as u64)
            .sum();
        let mut rng = Lcg::new(if seed == 0 { 42 } else { seed });

        let index = (rng.next_unit() * SAMPLE_MATCHES.len() as f64) as usize;
        let confidence = 0.4 + rng.next_unit() * 0.5;

        RecognitionResult {
            probable_match: SAMPLE_MATCHES[index.min(SAMPLE_MATCHES.len() - 1)].to_string(),
            confidence: (confidence * 10_000.0).round() / 10_000.0,
            notes: PLACEHOLDER_NOTES.to_string(),
        }
    }
}

/// Numerical Recipes linear congruential generator, modulo 2^32.
struct Lcg(u64);

impl Lcg {
    const MODULUS: u64 = 1 << 32;

    fn new(seed: u64) -> Self {
        Self(seed % Self::MODULUS)
    }

    /// Next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64 {
        self.0 = (self.0 * 1_664_525 + 1_013_904_223) % Self::MODULUS;
        self.0 as f64 / Self::MODULUS as f64
    }
}

/// POST /recognize
pub async fn recognize(
    State(state): State<AppState>,
    payload: Result<Json<RecognitionRequest>, JsonRejection>,
) -> AppResult<Json<RecognitionResult>> {
    let request = json_body(payload)?;
    let result = state.recognizer.recognize(&request);
    tracing::debug!(
        "Recognition filename={:?} match={:?} confidence={}",
        request.filename,
        result.probable_match,
        result.confidence
    );
    Ok(Json(result))
}

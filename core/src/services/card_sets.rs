//! Card set listing by series.
//!
//! # Design
//! The series name travels as one percent-encoded path segment, so names
//! like "Scarlet & Violet" survive intact.

use tracing::{info, warn};

use super::path_segment;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::CardSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardSetsError {
    #[error("failed to fetch sets for {series}: {source}")]
    FetchFailed { series: String, source: ApiError },
}

#[derive(Clone)]
pub struct CardSetsService {
    client: ApiClient,
}

impl CardSetsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All sets in `series` (e.g. "Scarlet & Violet").
    pub async fn sets_by_series(&self, series: &str) -> Result<Vec<CardSet>, CardSetsError> {
        let path = format!("/api/sets/series/{}", path_segment(series));
        match self.client.get::<Vec<CardSet>>(&path).await {
            Ok(sets) => {
                info!(series, count = sets.len(), "fetched card sets");
                Ok(sets)
            }
            Err(source) => {
                warn!(series, error = %source, "failed to fetch card sets");
                Err(CardSetsError::FetchFailed {
                    series: series.to_string(),
                    source,
                })
            }
        }
    }
}

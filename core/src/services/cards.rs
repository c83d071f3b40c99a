//! Cards of one set.
//!
//! # Design
//! Public endpoint; no token is needed. The set id is encoded as a single
//! path segment.

use tracing::{info, warn};

use super::path_segment;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::Card;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardsError {
    #[error("failed to fetch cards for set {set_id}: {source}")]
    FetchFailed { set_id: String, source: ApiError },
}

#[derive(Clone)]
pub struct CardsService {
    client: ApiClient,
}

impl CardsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn cards_by_set(&self, set_id: &str) -> Result<Vec<Card>, CardsError> {
        let path = format!("/api/cards/set/{}", path_segment(set_id));
        match self.client.get::<Vec<Card>>(&path).await {
            Ok(cards) => {
                info!(set_id, count = cards.len(), "fetched cards");
                Ok(cards)
            }
            Err(source) => {
                warn!(set_id, error = %source, "failed to fetch cards");
                Err(CardsError::FetchFailed {
                    set_id: set_id.to_string(),
                    source,
                })
            }
        }
    }
}

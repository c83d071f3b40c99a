//! A user's card collection.
//!
//! # Design
//! Every call needs the bearer token. `set_quantity` picks the endpoint from
//! the quantity; a negative quantity never builds a request.

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{AddEntryRequest, CollectionEntry, CollectionItem};

const ADD: &str = "/api/collection/add";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("failed to add card {card_id} to collection: {source}")]
    AddFailed { card_id: String, source: ApiError },

    #[error("failed to remove entry {entry_id} from collection: {source}")]
    DeleteFailed { entry_id: i64, source: ApiError },

    #[error("failed to fetch collection for user {user_id}: {source}")]
    FetchFailed { user_id: i64, source: ApiError },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(i32),
}

/// A user's owned cards. The server keys entries by (user, card).
#[derive(Clone)]
pub struct CollectionService {
    client: ApiClient,
}

impl CollectionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Insert or overwrite the quantity held for `card_id`.
    pub async fn add_to_collection(
        &self,
        card_id: &str,
        user_id: i64,
        quantity: i32,
    ) -> Result<CollectionEntry, CollectionError> {
        let request = AddEntryRequest {
            card_id: card_id.to_string(),
            user_id,
            quantity,
        };
        match self.client.post::<_, CollectionEntry>(ADD, &request).await {
            Ok(entry) => {
                info!(card_id, user_id, quantity, entry_id = entry.id, "collection entry saved");
                Ok(entry)
            }
            Err(source) => {
                warn!(card_id, user_id, error = %source, "failed to save collection entry");
                Err(CollectionError::AddFailed {
                    card_id: card_id.to_string(),
                    source,
                })
            }
        }
    }

    pub async fn remove_from_collection(&self, entry_id: i64) -> Result<(), CollectionError> {
        let path = format!("/api/collection/delete/{entry_id}");
        match self.client.delete(&path).await {
            Ok(()) => {
                info!(entry_id, "collection entry removed");
                Ok(())
            }
            Err(source) => {
                warn!(entry_id, error = %source, "failed to remove collection entry");
                Err(CollectionError::DeleteFailed { entry_id, source })
            }
        }
    }

    pub async fn user_collection(&self, user_id: i64) -> Result<Vec<CollectionItem>, CollectionError> {
        let path = format!("/api/collection/user/{user_id}");
        match self.client.get::<Vec<CollectionItem>>(&path).await {
            Ok(items) => {
                info!(user_id, count = items.len(), "fetched collection");
                Ok(items)
            }
            Err(source) => {
                warn!(user_id, error = %source, "failed to fetch collection");
                Err(CollectionError::FetchFailed { user_id, source })
            }
        }
    }

    /// Bring the held quantity of `card_id` to `quantity`.
    ///
    /// Zero removes `existing` when there is one and is a no-op otherwise;
    /// a positive quantity upserts. Returns the entry that now exists, if any.
    pub async fn set_quantity(
        &self,
        card_id: &str,
        user_id: i64,
        quantity: i32,
        existing: Option<i64>,
    ) -> Result<Option<CollectionEntry>, CollectionError> {
        match (quantity, existing) {
            (q, _) if q < 0 => Err(CollectionError::InvalidQuantity(q)),
            (0, Some(entry_id)) => self.remove_from_collection(entry_id).await.map(|()| None),
            (0, None) => Ok(None),
            (q, _) => self.add_to_collection(card_id, user_id, q).await.map(Some),
        }
    }
}

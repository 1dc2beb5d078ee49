use async_trait::async_trait;
use shop_seed_core::{Collection, EntityKind, NewRow};

use crate::error::GatewayError;

/// Relational and document persistence used by the entity factories.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Persist a row and return its generated id.
    async fn create(&self, row: NewRow) -> Result<i64, GatewayError>;

    /// Remove a row; users and products are soft-deleted.
    async fn destroy(&self, kind: EntityKind, id: i64) -> Result<(), GatewayError>;

    async fn update_challenge_description(
        &self,
        challenge_id: i64,
        description: String,
    ) -> Result<(), GatewayError>;

    async fn insert_document(
        &self,
        collection: Collection,
        document: serde_json::Value,
    ) -> Result<(), GatewayError>;
}

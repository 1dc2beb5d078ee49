//! Entity factories, one module per group of related stages.
//!
//! Sibling records of a stage are created concurrently. Each creation goes
//! through [`StageScope`], which logs a failure with the entity kind and
//! natural key and lets the remaining siblings continue.

use std::fmt::{Display, Formatter};

use serde::Serialize;
use shop_seed_core::{Collection, EntityKind, NewRow};

use crate::assets::AssetFetcher;
use crate::context::RunContext;
use crate::gateway::Gateway;
use crate::report::StageTally;

pub mod accounts;
pub mod catalog;
pub mod challenges;
pub mod commerce;
pub mod community;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SecurityQuestions,
    Users,
    Challenges,
    RandomFakeUsers,
    Products,
    Baskets,
    BasketItems,
    AnonymousFeedback,
    Complaints,
    Recycles,
    Orders,
    Quantities,
    Wallets,
    DeliveryMethods,
    Memories,
    PrepareFilesystem,
}

impl Stage {
    /// Execution order; every stage depends only on stages before it.
    pub const ORDER: [Self; 16] = [
        Self::SecurityQuestions,
        Self::Users,
        Self::Challenges,
        Self::RandomFakeUsers,
        Self::Products,
        Self::Baskets,
        Self::BasketItems,
        Self::AnonymousFeedback,
        Self::Complaints,
        Self::Recycles,
        Self::Orders,
        Self::Quantities,
        Self::Wallets,
        Self::DeliveryMethods,
        Self::Memories,
        Self::PrepareFilesystem,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SecurityQuestions => "security_questions",
            Self::Users => "users",
            Self::Challenges => "challenges",
            Self::RandomFakeUsers => "random_fake_users",
            Self::Products => "products",
            Self::Baskets => "baskets",
            Self::BasketItems => "basket_items",
            Self::AnonymousFeedback => "anonymous_feedback",
            Self::Complaints => "complaints",
            Self::Recycles => "recycles",
            Self::Orders => "orders",
            Self::Quantities => "quantities",
            Self::Wallets => "wallets",
            Self::DeliveryMethods => "delivery_methods",
            Self::Memories => "memories",
            Self::PrepareFilesystem => "prepare_filesystem",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a stage needs, borrowed from the running seeder.
pub struct StageScope<'a> {
    pub ctx: &'a RunContext,
    pub gateway: &'a dyn Gateway,
    pub assets: &'a AssetFetcher,
    pub tally: StageTally,
}

impl<'a> StageScope<'a> {
    #[must_use]
    pub fn new(ctx: &'a RunContext, gateway: &'a dyn Gateway, assets: &'a AssetFetcher) -> Self {
        Self { ctx, gateway, assets, tally: StageTally::default() }
    }

    /// Persist one row; a failure is logged and yields `None`.
    pub async fn create(&self, row: NewRow) -> Option<i64> {
        let kind = row.kind();
        let key = row.natural_key();
        match self.gateway.create(row).await {
            Ok(id) => {
                self.tally.record_created();
                Some(id)
            }
            Err(err) => {
                self.tally.record_failed();
                tracing::error!(kind = %kind, key = %key, error = %err, "could not insert record");
                None
            }
        }
    }

    /// Remove a just-created row; failures are logged.
    pub async fn destroy(&self, kind: EntityKind, id: i64) {
        if let Err(err) = self.gateway.destroy(kind, id).await {
            self.tally.record_failed();
            tracing::error!(kind = %kind, id, error = %err, "could not delete record");
        }
    }

    pub async fn insert_document(&self, collection: Collection, key: &str, document: serde_json::Value) {
        match self.gateway.insert_document(collection, document).await {
            Ok(()) => self.tally.record_created(),
            Err(err) => {
                self.tally.record_failed();
                tracing::error!(collection = %collection, key, error = %err, "could not insert document");
            }
        }
    }

    /// Record a dependent record that cannot be built because a reference is missing.
    pub fn skip(&self, kind: EntityKind, key: &str, missing: &str) {
        self.tally.record_skipped();
        tracing::warn!(kind = %kind, key, missing, "missing cross-reference; record skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        let names = Stage::ORDER.iter().map(|stage| stage.as_str()).collect::<Vec<_>>();
        assert_eq!(names.first(), Some(&"security_questions"));
        assert_eq!(names.last(), Some(&"prepare_filesystem"));
        let position = |stage: Stage| Stage::ORDER.iter().position(|s| *s == stage);
        assert!(position(Stage::Challenges) < position(Stage::Products));
        assert!(position(Stage::Users) < position(Stage::Baskets));
        assert!(position(Stage::Baskets) < position(Stage::BasketItems));
        assert!(position(Stage::Recycles) < position(Stage::Orders));
    }
}

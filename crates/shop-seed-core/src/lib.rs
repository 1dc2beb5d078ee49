//! Shared types and business rules for seeding the demo shop store.
//!
//! Everything in this crate is synchronous and free of persistence concerns:
//! the entity rows handed to a store, the static dataset and configuration
//! shapes, the fixed scenario fixtures, and the text/price/token rules the
//! pipeline injects while building rows.

pub mod assets;
pub mod config;
pub mod dataset;
pub mod entities;
pub mod fixtures;
pub mod model;
pub mod rules;

pub use assets::{extract_filename, is_plain_file_name, is_url, AssetKind};
pub use config::{
    ApplicationConfig, ChallengeConfig, MemoryConfig, PathsConfig, ProductConfig, ReviewConfig,
    SafetyMode, SeedConfig,
};
pub use dataset::{
    StaticAddress, StaticCard, StaticChallenge, StaticDataset, StaticDelivery, StaticFeedback,
    StaticSecurityAnswer, StaticSecurityQuestion, StaticTutorial, StaticUser,
};
pub use model::{
    Collection, EntityKind, NewAddress, NewBasket, NewBasketItem, NewCard, NewChallenge,
    NewComplaint, NewDeliveryMethod, NewFeedback, NewHint, NewMemory, NewProduct, NewQuantity,
    NewRecycle, NewRow, NewSecurityAnswer, NewSecurityQuestion, NewUser, NewWallet, OrderDocument,
    OrderLine, ReviewDocument, Role,
};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("dataset error in {file}: {message}")]
    Dataset { file: String, message: String },
}

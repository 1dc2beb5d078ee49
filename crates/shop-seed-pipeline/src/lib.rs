//! Staged, dependency-ordered seeding of the demo shop's relational store.
//!
//! [`Seeder::run`] walks the stages in [`Stage::ORDER`]. Records created by
//! earlier stages are looked up by natural key through the run's
//! [`cache::CrossReferenceCache`]; persistence goes through a [`Gateway`].

pub mod assets;
pub mod cache;
pub mod context;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod rewrite;
pub mod stages;

pub use assets::{AssetFetcher, DownloadSummary, Downloader, HttpDownloader};
pub use error::{AssetError, GatewayError, PipelineError, RewriteError};
pub use executor::{ExecutorError, StoreExecutor};
pub use gateway::Gateway;
pub use orchestrator::Seeder;
pub use report::{RunReport, StageReport};
pub use rewrite::RewriteSummary;
pub use stages::Stage;

use std::sync::Arc;

use shop_seed_core::rules::brand_rules;
use shop_seed_core::{SeedConfig, StaticDataset};

use crate::assets::{AssetFetcher, Downloader};
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::gateway::Gateway;
use crate::report::RunReport;
use crate::rewrite::rewrite_text_in_tree_async;
use crate::stages::{accounts, catalog, challenges, commerce, community, Stage, StageScope};

/// Runs the seed stages in their fixed order against a gateway.
pub struct Seeder {
    gateway: Arc<dyn Gateway>,
    downloader: Arc<dyn Downloader>,
    rng_seed: Option<u64>,
}

impl Seeder {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, downloader: Arc<dyn Downloader>) -> Self {
        Self { gateway, downloader, rng_seed: None }
    }

    /// Make random defaults reproducible.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Seed the store from `config` and `dataset`.
    ///
    /// Each stage settles completely before the next starts. Per-record
    /// failures are logged and counted; only a failed product insert ends the
    /// run early.
    ///
    /// # Errors
    /// Returns [`PipelineError::FatalDependency`] when a product cannot be persisted.
    pub async fn run(&self, config: &SeedConfig, dataset: &StaticDataset) -> Result<RunReport, PipelineError> {
        let ctx = RunContext::new(config, dataset, self.rng_seed);
        let assets = AssetFetcher::new(Arc::clone(&self.downloader), ctx.config.paths.clone());
        let mut report = RunReport { coding_challenges: ctx.coding_challenges.len(), ..RunReport::default() };

        tracing::info!(
            application = %ctx.config.application.name,
            environments = ?ctx.active_environments,
            "seeding started"
        );

        for stage in Stage::ORDER {
            tracing::info!(stage = %stage, "stage started");
            let scope = StageScope::new(&ctx, self.gateway.as_ref(), &assets);

            match stage {
                Stage::SecurityQuestions => accounts::security_questions(&scope).await,
                Stage::Users => accounts::users(&scope).await,
                Stage::Challenges => challenges::challenges(&scope).await,
                Stage::RandomFakeUsers => accounts::random_fake_users(&scope).await,
                Stage::Products => {
                    let downloads = catalog::products(&scope).await.inspect_err(|err| {
                        tracing::error!(stage = %stage, error = %err, "seeding aborted");
                    })?;
                    report.downloads = downloads;
                    report.blueprint_file = ctx.cache.blueprint_file();
                }
                Stage::Baskets => commerce::baskets(&scope).await,
                Stage::BasketItems => commerce::basket_items(&scope).await,
                Stage::AnonymousFeedback => community::anonymous_feedback(&scope).await,
                Stage::Complaints => community::complaints(&scope).await,
                Stage::Recycles => community::recycles(&scope).await,
                Stage::Orders => commerce::orders(&scope).await,
                Stage::Quantities => catalog::quantities(&scope).await,
                Stage::Wallets => accounts::wallets(&scope).await,
                Stage::DeliveryMethods => catalog::delivery_methods(&scope).await,
                Stage::Memories => community::memories(&scope).await,
                Stage::PrepareFilesystem => {
                    let rules = brand_rules(&ctx.config.application.name);
                    match rewrite_text_in_tree_async(&ctx.config.paths.dist_dir, rules).await {
                        Ok(summary) => report.rewrite = Some(summary),
                        Err(err) => {
                            scope.tally.record_failed();
                            tracing::error!(error = %err, "could not prepare file system");
                        }
                    }
                }
            }

            let stage_report = scope.tally.finish(stage);
            tracing::info!(
                stage = %stage,
                created = stage_report.created,
                failed = stage_report.failed,
                skipped = stage_report.skipped,
                "stage finished"
            );
            report.stages.push(stage_report);
        }

        tracing::info!(
            cached_users = ctx.cache.user_count(),
            created = report.total_created(),
            failed = report.total_failed(),
            "seeding finished"
        );
        Ok(report)
    }
}

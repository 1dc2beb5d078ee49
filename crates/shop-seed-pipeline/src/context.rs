use std::env;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use shop_seed_core::rules::RuntimeEnvironment;
use shop_seed_core::{SeedConfig, StaticDataset};

use crate::cache::CrossReferenceCache;
use crate::registry::CodingChallengeRegistry;

/// State owned by one seed run and dropped when it ends.
pub struct RunContext {
    /// Private working copy of the caller's configuration.
    pub config: SeedConfig,
    pub dataset: StaticDataset,
    pub cache: CrossReferenceCache,
    pub active_environments: Vec<RuntimeEnvironment>,
    pub coding_challenges: CodingChallengeRegistry,
    rng: Mutex<StdRng>,
}

impl RunContext {
    #[must_use]
    pub fn new(config: &SeedConfig, dataset: &StaticDataset, rng_seed: Option<u64>) -> Self {
        let config = config.clone();
        let active_environments = config
            .challenges
            .active_environments
            .clone()
            .unwrap_or_else(detect_environments);
        let coding_challenges =
            CodingChallengeRegistry::scan(config.challenges.code_snippets_dir.as_deref());
        let rng = rng_seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Self {
            config,
            dataset: dataset.clone(),
            cache: CrossReferenceCache::new(),
            active_environments,
            coding_challenges,
            rng: Mutex::new(rng),
        }
    }

    /// Borrow the run's random source.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

/// Hosting environments this process runs in.
#[must_use]
pub fn detect_environments() -> Vec<RuntimeEnvironment> {
    let mut active = Vec::new();
    if Path::new("/.dockerenv").exists() {
        active.push(RuntimeEnvironment::Docker);
    }
    if env::var_os("DYNO").is_some() {
        active.push(RuntimeEnvironment::Heroku);
    }
    if cfg!(windows) {
        active.push(RuntimeEnvironment::Windows);
    }
    if env::var_os("GITPOD_WORKSPACE_ID").is_some() {
        active.push(RuntimeEnvironment::Gitpod);
    }
    active
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn configured_environments_override_detection() {
        let mut config = SeedConfig::default();
        config.challenges.active_environments = Some(vec![RuntimeEnvironment::Heroku]);
        let ctx = RunContext::new(&config, &StaticDataset::default(), Some(1));
        assert_eq!(ctx.active_environments, vec![RuntimeEnvironment::Heroku]);
        assert!(ctx.coding_challenges.is_empty());
    }

    #[test]
    fn seeded_runs_draw_the_same_numbers() {
        let config = SeedConfig::default();
        let first = RunContext::new(&config, &StaticDataset::default(), Some(42));
        let second = RunContext::new(&config, &StaticDataset::default(), Some(42));
        let a: u32 = first.with_rng(|rng| rng.gen());
        let b: u32 = second.with_rng(|rng| rng.gen());
        assert_eq!(a, b);
    }

    #[test]
    fn working_copy_is_detached_from_the_caller() {
        let mut config = SeedConfig::default();
        let ctx = RunContext::new(&config, &StaticDataset::default(), None);
        config.application.name = "Changed".to_string();
        assert_eq!(ctx.config.application.name, "OWASP Juice Shop");
    }
}

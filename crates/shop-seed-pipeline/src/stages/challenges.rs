use futures::future::join_all;
use shop_seed_core::rules::{
    apply_rules, challenge_description_rules, challenge_enablement, challenge_tags,
    disclosure_sentence, hint_rules,
};
use shop_seed_core::{NewChallenge, NewHint, NewRow, StaticChallenge};

use super::StageScope;
use crate::cache::ChallengeRef;

pub async fn challenges(scope: &StageScope<'_>) {
    join_all(scope.ctx.dataset.challenges.iter().map(|challenge| create_challenge(scope, challenge)))
        .await;
}

/// Build the persisted challenge row with environment and feature-flag rules applied.
#[must_use]
pub fn build_challenge(scope: &StageScope<'_>, challenge: &StaticChallenge) -> NewChallenge {
    let ctx = scope.ctx;
    let settings = &ctx.config.challenges;

    let enablement = challenge_enablement(
        &challenge.disabled_env,
        &ctx.active_environments,
        settings.safety_mode,
    );
    let mut description = apply_rules(
        &challenge.description,
        &challenge_description_rules(&ctx.config.application.domain, &settings.xss_bonus_payload),
    );
    if let Some(because) = enablement.disabled_because.as_deref().filter(|_| !enablement.enabled) {
        description.push_str(&disclosure_sentence(because));
    }
    let has_coding_challenge = ctx.coding_challenges.contains(&challenge.key);

    NewChallenge {
        key: challenge.key.clone(),
        name: challenge.name.clone(),
        category: challenge.category.clone(),
        tags: challenge_tags(&challenge.tags, has_coding_challenge),
        description,
        difficulty: challenge.difficulty,
        mitigation_url: challenge.mitigation_url.clone().filter(|_| settings.show_mitigations),
        disabled_env: enablement.disabled_because,
        tutorial_order: challenge.tutorial.map(|tutorial| tutorial.order),
        has_coding_challenge,
    }
}

async fn create_challenge(scope: &StageScope<'_>, challenge: &StaticChallenge) {
    let row = build_challenge(scope, challenge);
    let description = row.description.clone();
    let Some(challenge_id) = scope.create(NewRow::Challenge(row)).await else {
        return;
    };
    scope.ctx.cache.bind_challenge(&challenge.key, ChallengeRef { id: challenge_id, description });

    if scope.ctx.config.challenges.show_hints && !challenge.hints.is_empty() {
        let rules = hint_rules(&scope.ctx.config.application.name);
        let rules = &rules;
        join_all(challenge.hints.iter().enumerate().map(|(index, hint)| {
            scope.create(NewRow::Hint(NewHint {
                challenge_id,
                text: apply_rules(hint, rules),
                order: u32::try_from(index + 1).unwrap_or(u32::MAX),
                unlocked: false,
            }))
        }))
        .await;
    }
}

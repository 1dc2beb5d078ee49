//! Feedback, complaints, recycling requests and photo wall memories.

use futures::future::join_all;
use shop_seed_core::fixtures::{
    ANONYMOUS_FEEDBACK, COMPLAINTS, FIXED_MEMORY, GEO_STALKING_META_USER,
    GEO_STALKING_VISUAL_USER, RECYCLES,
};
use shop_seed_core::rules::{authored_feedback, UPLOADS_PATH};
use shop_seed_core::{
    AssetKind, EntityKind, MemoryConfig, NewComplaint, NewFeedback, NewMemory, NewRecycle, NewRow,
};

use super::accounts::create_security_answer;
use super::StageScope;

pub async fn anonymous_feedback(scope: &StageScope<'_>) {
    join_all(ANONYMOUS_FEEDBACK.iter().map(|feedback| {
        scope.create(NewRow::Feedback(NewFeedback {
            user_id: None,
            comment: authored_feedback(feedback.comment, None),
            rating: feedback.rating,
        }))
    }))
    .await;
}

pub async fn complaints(scope: &StageScope<'_>) {
    join_all(COMPLAINTS.iter().map(|complaint| async move {
        let Some(author) = scope.ctx.cache.user(complaint.author) else {
            scope.skip(EntityKind::Complaint, complaint.author, "user");
            return;
        };
        scope
            .create(NewRow::Complaint(NewComplaint {
                user_id: author.id,
                message: complaint.message.to_string(),
            }))
            .await;
    }))
    .await;
}

pub async fn recycles(scope: &StageScope<'_>) {
    join_all(RECYCLES.iter().map(|recycle| async move {
        let cache = &scope.ctx.cache;
        let Some(owner) = cache.user(recycle.owner) else {
            scope.skip(EntityKind::Recycle, recycle.owner, "user");
            return;
        };
        let Some(address_id) = cache.first_address(recycle.owner) else {
            scope.skip(EntityKind::Recycle, recycle.owner, "address");
            return;
        };
        scope
            .create(NewRow::Recycle(NewRecycle {
                user_id: owner.id,
                address_id,
                quantity: recycle.quantity,
                is_pickup: true,
                date: recycle.date.to_string(),
            }))
            .await;
    }))
    .await;
}

pub async fn memories(scope: &StageScope<'_>) {
    let fixed = async {
        let Some(owner) = scope.ctx.cache.user(FIXED_MEMORY.owner) else {
            scope.skip(EntityKind::Memory, FIXED_MEMORY.caption, "user");
            return;
        };
        scope
            .create(NewRow::Memory(NewMemory {
                user_id: owner.id,
                image_path: FIXED_MEMORY.image_path.to_string(),
                caption: FIXED_MEMORY.caption.to_string(),
            }))
            .await;
    };
    let configured = join_all(scope.ctx.config.memories.iter().map(|memory| create_memory(scope, memory)));
    futures::join!(fixed, configured);
}

async fn create_memory(scope: &StageScope<'_>, memory: &MemoryConfig) {
    let image = scope.assets.resolve(&memory.image, AssetKind::MemoryImage).await;
    let mut owner = memory.user.clone();

    if let (Some(question), Some(answer)) =
        (memory.geo_stalking_meta_security_question, &memory.geo_stalking_meta_security_answer)
    {
        answer_geo_stalking_question(scope, GEO_STALKING_META_USER, question, answer).await;
        owner = Some(GEO_STALKING_META_USER.to_string());
    }

    if let (Some(question), Some(answer)) =
        (memory.geo_stalking_visual_security_question, &memory.geo_stalking_visual_security_answer)
    {
        answer_geo_stalking_question(scope, GEO_STALKING_VISUAL_USER, question, answer).await;
        owner = Some(GEO_STALKING_VISUAL_USER.to_string());
    }

    let Some(user) = owner.as_deref().and_then(|alias| scope.ctx.cache.user(alias)) else {
        tracing::warn!(caption = %memory.caption, "could not find user for memory");
        scope.tally.record_skipped();
        return;
    };

    scope
        .create(NewRow::Memory(NewMemory {
            user_id: user.id,
            image_path: format!("{UPLOADS_PATH}{image}"),
            caption: memory.caption.clone(),
        }))
        .await;
}

async fn answer_geo_stalking_question(scope: &StageScope<'_>, alias: &str, question: u32, answer: &str) {
    let Some(user) = scope.ctx.cache.user(alias) else {
        scope.skip(EntityKind::SecurityAnswer, alias, "user");
        return;
    };
    create_security_answer(scope, user.id, alias, question, answer).await;
}

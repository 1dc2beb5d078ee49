//! Products with their scenario roles and reviews, stock quantities and delivery methods.

use futures::future::{join_all, try_join_all};
use shop_seed_core::rules::{
    apply_rules, default_quantity, prepare_products, tamper_challenge_rules, PreparedProduct,
    ProductRole, RemoteAsset, TAMPER_CHALLENGE_KEY,
};
use shop_seed_core::{
    AssetKind, Collection, EntityKind, NewDeliveryMethod, NewQuantity, NewRow, ReviewDocument,
};

use super::StageScope;
use crate::assets::DownloadSummary;
use crate::cache::ProductRef;
use crate::error::PipelineError;

/// Create every configured product. The first product that cannot be
/// persisted aborts the stage and the run.
///
/// # Errors
/// Returns [`PipelineError::FatalDependency`] when a product insert fails.
pub async fn products(scope: &StageScope<'_>) -> Result<DownloadSummary, PipelineError> {
    let ctx = scope.ctx;
    let prepared = ctx.with_rng(|rng| prepare_products(&ctx.config.products, rng));

    for product in &prepared {
        if let Some(image) = &product.image_download {
            scope.assets.spawn_background(image.clone(), AssetKind::ProductImage);
        }
    }

    if let Some(blueprint) = prepared.iter().find_map(|product| product.blueprint_file.as_deref()) {
        let (file_name, remote) = RemoteAsset::classify(blueprint);
        if let Some(remote) = remote {
            if let Err(err) = scope.assets.fetch(&remote, AssetKind::Blueprint).await {
                tracing::error!(url = %remote.url, error = %err, "could not download blueprint file");
            }
        }
        ctx.cache.bind_blueprint_file(file_name);
    }

    let created = try_join_all(prepared.iter().map(|product| create_product(scope, product))).await;
    let downloads = scope.assets.join_background().await;
    created?;
    Ok(downloads)
}

async fn create_product(scope: &StageScope<'_>, product: &PreparedProduct) -> Result<(), PipelineError> {
    let ctx = scope.ctx;
    let row = NewRow::Product(product.row.clone());
    let product_id = match scope.gateway.create(row).await {
        Ok(id) => id,
        Err(source) => {
            scope.tally.record_failed();
            tracing::error!(kind = %EntityKind::Product, key = %product.row.name, error = %source, "could not insert product");
            return Err(PipelineError::FatalDependency {
                kind: EntityKind::Product,
                key: product.row.name.clone(),
                source,
            });
        }
    };
    scope.tally.record_created();

    ctx.cache.bind_product(
        product.slot,
        ProductRef { id: product_id, name: product.row.name.clone(), price: product.row.price },
    );
    for role in &product.roles {
        ctx.cache.bind_product_role(*role, product.slot);
    }

    if product.has_role(ProductRole::TamperableUrl) {
        rewrite_tamper_challenge(scope).await;
    }

    if product.deletion_date.is_some() {
        scope.destroy(EntityKind::Product, product_id).await;
    }

    join_all(product.reviews.iter().map(|review| async move {
        let Some(author) = ctx.cache.user(&review.author) else {
            scope.skip(EntityKind::Product, &product.row.name, &format!("review author {}", review.author));
            return;
        };
        let document = ReviewDocument {
            message: review.text.clone(),
            author: author.email,
            product: product_id,
            likes_count: 0,
            liked_by: Vec::new(),
        };
        match serde_json::to_value(&document) {
            Ok(value) => scope.insert_document(Collection::Reviews, &product.row.name, value).await,
            Err(err) => {
                scope.tally.record_failed();
                tracing::error!(key = %product.row.name, error = %err, "could not encode review");
            }
        }
    }))
    .await;

    Ok(())
}

async fn rewrite_tamper_challenge(scope: &StageScope<'_>) {
    let Some(product) = scope.ctx.cache.product_for_role(ProductRole::TamperableUrl) else {
        scope.skip(EntityKind::Challenge, TAMPER_CHALLENGE_KEY, ProductRole::TamperableUrl.as_str());
        return;
    };
    let Some(challenge) = scope.ctx.cache.challenge(TAMPER_CHALLENGE_KEY) else {
        scope.skip(EntityKind::Challenge, TAMPER_CHALLENGE_KEY, "challenge");
        return;
    };
    let overwrite_url = &scope.ctx.config.challenges.overwrite_url_for_product_tampering_challenge;
    let description =
        apply_rules(&challenge.description, &tamper_challenge_rules(&product.name, overwrite_url));
    if let Err(err) = scope.gateway.update_challenge_description(challenge.id, description).await {
        scope.tally.record_failed();
        tracing::error!(key = TAMPER_CHALLENGE_KEY, error = %err, "could not update challenge description");
    }
}

pub async fn quantities(scope: &StageScope<'_>) {
    let ctx = scope.ctx;
    join_all(ctx.config.products.iter().enumerate().map(|(slot, product)| async move {
        let Some(stocked) = ctx.cache.product(slot) else {
            scope.skip(EntityKind::Quantity, &product.name, &format!("product slot {slot}"));
            return;
        };
        let quantity = ctx.with_rng(|rng| default_quantity(product.quantity, rng));
        scope
            .create(NewRow::Quantity(NewQuantity {
                product_id: stocked.id,
                quantity,
                limit_per_user: product.limit_per_user,
            }))
            .await;
    }))
    .await;
}

pub async fn delivery_methods(scope: &StageScope<'_>) {
    join_all(scope.ctx.dataset.deliveries.iter().map(|delivery| {
        scope.create(NewRow::DeliveryMethod(NewDeliveryMethod {
            name: delivery.name.clone(),
            price: delivery.price,
            deluxe_price: delivery.deluxe_price,
            eta: delivery.eta,
            icon: delivery.icon.clone(),
        }))
    }))
    .await;
}

use futures::future::join_all;
use shop_seed_core::fixtures::{OrderFixture, BASKET_ITEMS, BASKET_OWNERS, ORDERS};
use shop_seed_core::rules::{order_line, order_totals, payment_id};
use shop_seed_core::{Collection, EntityKind, NewBasket, NewBasketItem, NewRow, OrderDocument};

use super::StageScope;

pub async fn baskets(scope: &StageScope<'_>) {
    join_all(BASKET_OWNERS.iter().map(|owner| async move {
        let Some(user) = scope.ctx.cache.user(owner) else {
            scope.skip(EntityKind::Basket, owner, "user");
            return;
        };
        if let Some(basket_id) = scope.create(NewRow::Basket(NewBasket { user_id: user.id })).await {
            scope.ctx.cache.bind_basket(owner, basket_id);
        }
    }))
    .await;
}

pub async fn basket_items(scope: &StageScope<'_>) {
    join_all(BASKET_ITEMS.iter().map(|item| async move {
        let Some(basket_id) = scope.ctx.cache.basket(item.owner) else {
            scope.skip(EntityKind::BasketItem, item.owner, "basket");
            return;
        };
        let Some(product) = scope.ctx.cache.product(item.product_slot) else {
            scope.skip(EntityKind::BasketItem, item.owner, &format!("product slot {}", item.product_slot));
            return;
        };
        scope
            .create(NewRow::BasketItem(NewBasketItem {
                basket_id,
                product_id: product.id,
                quantity: item.quantity,
            }))
            .await;
    }))
    .await;
}

pub async fn orders(scope: &StageScope<'_>) {
    join_all(ORDERS.iter().map(|order| create_order(scope, order))).await;
}

/// Assemble an order document from cached users and product snapshots.
#[must_use]
pub fn build_order(scope: &StageScope<'_>, order: &OrderFixture) -> Option<OrderDocument> {
    let cache = &scope.ctx.cache;
    let Some(user) = cache.user(order.owner) else {
        scope.skip(EntityKind::User, order.owner, "order owner");
        return None;
    };

    let mut lines = Vec::with_capacity(order.lines.len());
    for line in order.lines {
        let Some(product) = cache.product(line.product_slot) else {
            scope.skip(EntityKind::Product, order.owner, &format!("order product slot {}", line.product_slot));
            return None;
        };
        lines.push(order_line(line.quantity, product.id, &product.name, product.price));
    }

    let (total_price, bonus) = order_totals(&lines);
    Some(OrderDocument {
        user_id: user.id,
        email: user.email,
        order_lines: lines,
        total_price,
        bonus,
        payment_id: scope.ctx.with_rng(payment_id),
        state: order.state.to_string(),
    })
}

async fn create_order(scope: &StageScope<'_>, order: &OrderFixture) {
    let Some(document) = build_order(scope, order) else {
        return;
    };
    match serde_json::to_value(&document) {
        Ok(value) => scope.insert_document(Collection::Orders, order.owner, value).await,
        Err(err) => {
            scope.tally.record_failed();
            tracing::error!(key = order.owner, error = %err, "could not encode order");
        }
    }
}

//! Security questions, users with their cascaded records, fake users and wallets.

use futures::future::join_all;
use shop_seed_core::rules::{
    authored_feedback, deluxe_token, profile_image_path, qualify_email, random_fake_email,
    random_string,
};
use shop_seed_core::{
    EntityKind, NewAddress, NewCard, NewFeedback, NewRow, NewSecurityAnswer, NewSecurityQuestion,
    NewUser, NewWallet, Role, StaticUser,
};

use super::StageScope;
use crate::cache::UserRef;

pub async fn security_questions(scope: &StageScope<'_>) {
    let questions = &scope.ctx.dataset.security_questions;
    join_all(questions.iter().enumerate().map(|(index, question)| async move {
        let row = NewRow::SecurityQuestion(NewSecurityQuestion { question: question.question.clone() });
        if let Some(id) = scope.create(row).await {
            let ordinal = u32::try_from(index + 1).unwrap_or(u32::MAX);
            scope.ctx.cache.bind_security_question(ordinal, id);
        }
    }))
    .await;
}

pub async fn users(scope: &StageScope<'_>) {
    join_all(scope.ctx.dataset.users.iter().map(|user| create_user(scope, user))).await;
}

async fn create_user(scope: &StageScope<'_>, user: &StaticUser) {
    let application = &scope.ctx.config.application;
    let email = qualify_email(&user.email, &application.domain, user.custom_domain);
    let row = NewRow::User(NewUser {
        username: user.username.clone(),
        email: email.clone(),
        password: user.password.clone(),
        role: user.role,
        deluxe_token: deluxe_token(user.role, &email, &application.deluxe_secret),
        profile_image: profile_image_path(user.role, user.profile_image.as_deref()),
        totp_secret: user.totp_secret.clone(),
        last_login_ip: user.last_login_ip.clone(),
    });
    let Some(user_id) = scope.create(row).await else {
        return;
    };
    scope.ctx.cache.bind_user(&user.key, UserRef { id: user_id, email: email.clone() });

    if let Some(answer) = &user.security_question {
        create_security_answer(scope, user_id, &user.key, answer.id, &answer.answer).await;
    }

    if let Some(feedback) = &user.feedback {
        scope
            .create(NewRow::Feedback(NewFeedback {
                user_id: Some(user_id),
                comment: authored_feedback(&feedback.comment, Some(&email)),
                rating: feedback.rating,
            }))
            .await;
    }

    if user.deleted_flag {
        scope.destroy(EntityKind::User, user_id).await;
    }

    join_all(user.address.iter().map(|address| async move {
        let row = NewRow::Address(NewAddress {
            user_id,
            full_name: address.full_name.clone(),
            mobile_num: address.mobile_num,
            zip_code: address.zip_code.clone(),
            street_address: address.street_address.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
        });
        if let Some(address_id) = scope.create(row).await {
            scope.ctx.cache.add_address(&user.key, address_id);
        }
    }))
    .await;

    join_all(user.card.iter().map(|card| {
        scope.create(NewRow::Card(NewCard {
            user_id,
            full_name: card.full_name.clone(),
            card_num: card.card_num,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        }))
    }))
    .await;
}

/// Answer a security question given by its 1-based dataset position.
pub async fn create_security_answer(
    scope: &StageScope<'_>,
    user_id: i64,
    alias: &str,
    question_ordinal: u32,
    answer: &str,
) {
    let Some(question_id) = scope.ctx.cache.security_question(question_ordinal) else {
        scope.skip(EntityKind::SecurityAnswer, alias, &format!("security question {question_ordinal}"));
        return;
    };
    scope
        .create(NewRow::SecurityAnswer(NewSecurityAnswer {
            user_id,
            security_question_id: question_id,
            answer: answer.to_string(),
        }))
        .await;
}

pub async fn random_fake_users(scope: &StageScope<'_>) {
    let count = scope.ctx.config.application.number_of_random_fake_users;
    let rows = (0..count)
        .map(|_| {
            scope.ctx.with_rng(|rng| NewUser {
                username: None,
                email: random_fake_email(rng),
                password: random_string(rng, 5),
                role: Role::Customer,
                deluxe_token: String::new(),
                profile_image: profile_image_path(Role::Customer, None),
                totp_secret: String::new(),
                last_login_ip: String::new(),
            })
        })
        .collect::<Vec<_>>();

    join_all(rows.into_iter().map(|row| scope.create(NewRow::User(row)))).await;
}

pub async fn wallets(scope: &StageScope<'_>) {
    join_all(scope.ctx.dataset.users.iter().map(|user| async move {
        let Some(owner) = scope.ctx.cache.user(&user.key) else {
            scope.skip(EntityKind::Wallet, &user.key, "user");
            return;
        };
        scope
            .create(NewRow::Wallet(NewWallet {
                user_id: owner.id,
                balance: user.wallet_balance.unwrap_or(0.0),
            }))
            .await;
    }))
    .await;
}

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    SecurityQuestion,
    User,
    SecurityAnswer,
    Address,
    Card,
    Wallet,
    Challenge,
    Hint,
    Product,
    Quantity,
    Basket,
    BasketItem,
    Feedback,
    Complaint,
    Recycle,
    DeliveryMethod,
    Memory,
}

impl EntityKind {
    pub const ALL: [Self; 17] = [
        Self::SecurityQuestion,
        Self::User,
        Self::SecurityAnswer,
        Self::Address,
        Self::Card,
        Self::Wallet,
        Self::Challenge,
        Self::Hint,
        Self::Product,
        Self::Quantity,
        Self::Basket,
        Self::BasketItem,
        Self::Feedback,
        Self::Complaint,
        Self::Recycle,
        Self::DeliveryMethod,
        Self::Memory,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SecurityQuestion => "security_question",
            Self::User => "user",
            Self::SecurityAnswer => "security_answer",
            Self::Address => "address",
            Self::Card => "card",
            Self::Wallet => "wallet",
            Self::Challenge => "challenge",
            Self::Hint => "hint",
            Self::Product => "product",
            Self::Quantity => "quantity",
            Self::Basket => "basket",
            Self::BasketItem => "basket_item",
            Self::Feedback => "feedback",
            Self::Complaint => "complaint",
            Self::Recycle => "recycle",
            Self::DeliveryMethod => "delivery_method",
            Self::Memory => "memory",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Kinds whose rows are soft-removed instead of physically deleted.
    #[must_use]
    pub fn is_soft_deletable(self) -> bool {
        matches!(self, Self::User | Self::Product)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Deluxe,
    Accounting,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Deluxe => "deluxe",
            Self::Accounting => "accounting",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "deluxe" => Some(Self::Deluxe),
            "accounting" => Some(Self::Accounting),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Document collections kept outside the relational tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Orders,
    Reviews,
}

impl Collection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Reviews => "reviews",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "orders" => Some(Self::Orders),
            "reviews" => Some(Self::Reviews),
            _ => None,
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSecurityQuestion {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub deluxe_token: String,
    pub profile_image: String,
    pub totp_secret: String,
    pub last_login_ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSecurityAnswer {
    pub user_id: i64,
    pub security_question_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewAddress {
    pub user_id: i64,
    pub full_name: String,
    pub mobile_num: i64,
    pub zip_code: String,
    pub street_address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCard {
    pub user_id: i64,
    pub full_name: String,
    pub card_num: i64,
    pub exp_month: u32,
    pub exp_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWallet {
    pub user_id: i64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewChallenge {
    pub key: String,
    pub name: String,
    pub category: String,
    pub tags: Option<String>,
    pub description: String,
    pub difficulty: u8,
    pub mitigation_url: Option<String>,
    pub disabled_env: Option<String>,
    pub tutorial_order: Option<u32>,
    pub has_coding_challenge: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewHint {
    pub challenge_id: i64,
    pub text: String,
    pub order: u32,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub deluxe_price: f64,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewQuantity {
    pub product_id: i64,
    pub quantity: u32,
    pub limit_per_user: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBasket {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBasketItem {
    pub basket_id: i64,
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewFeedback {
    pub user_id: Option<i64>,
    pub comment: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewComplaint {
    pub user_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewRecycle {
    pub user_id: i64,
    pub address_id: i64,
    pub quantity: u32,
    pub is_pickup: bool,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDeliveryMethod {
    pub name: String,
    pub price: f64,
    pub deluxe_price: f64,
    pub eta: f64,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMemory {
    pub user_id: i64,
    pub image_path: String,
    pub caption: String,
}

/// One relational row ready to hand to the persistence gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewRow {
    SecurityQuestion(NewSecurityQuestion),
    User(NewUser),
    SecurityAnswer(NewSecurityAnswer),
    Address(NewAddress),
    Card(NewCard),
    Wallet(NewWallet),
    Challenge(NewChallenge),
    Hint(NewHint),
    Product(NewProduct),
    Quantity(NewQuantity),
    Basket(NewBasket),
    BasketItem(NewBasketItem),
    Feedback(NewFeedback),
    Complaint(NewComplaint),
    Recycle(NewRecycle),
    DeliveryMethod(NewDeliveryMethod),
    Memory(NewMemory),
}

impl NewRow {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::SecurityQuestion(_) => EntityKind::SecurityQuestion,
            Self::User(_) => EntityKind::User,
            Self::SecurityAnswer(_) => EntityKind::SecurityAnswer,
            Self::Address(_) => EntityKind::Address,
            Self::Card(_) => EntityKind::Card,
            Self::Wallet(_) => EntityKind::Wallet,
            Self::Challenge(_) => EntityKind::Challenge,
            Self::Hint(_) => EntityKind::Hint,
            Self::Product(_) => EntityKind::Product,
            Self::Quantity(_) => EntityKind::Quantity,
            Self::Basket(_) => EntityKind::Basket,
            Self::BasketItem(_) => EntityKind::BasketItem,
            Self::Feedback(_) => EntityKind::Feedback,
            Self::Complaint(_) => EntityKind::Complaint,
            Self::Recycle(_) => EntityKind::Recycle,
            Self::DeliveryMethod(_) => EntityKind::DeliveryMethod,
            Self::Memory(_) => EntityKind::Memory,
        }
    }

    /// Human-meaningful handle used when logging a failed creation.
    #[must_use]
    pub fn natural_key(&self) -> String {
        match self {
            Self::SecurityQuestion(row) => row.question.clone(),
            Self::User(row) => row.username.clone().unwrap_or_else(|| row.email.clone()),
            Self::SecurityAnswer(row) => {
                format!("user {} question {}", row.user_id, row.security_question_id)
            }
            Self::Address(row) => format!("user {} {}", row.user_id, row.full_name),
            Self::Card(row) => format!("user {} {}", row.user_id, row.full_name),
            Self::Wallet(row) => format!("user {}", row.user_id),
            Self::Challenge(row) => row.key.clone(),
            Self::Hint(row) => format!("challenge {} hint {}", row.challenge_id, row.order),
            Self::Product(row) => row.name.clone(),
            Self::Quantity(row) => format!("product {}", row.product_id),
            Self::Basket(row) => format!("user {}", row.user_id),
            Self::BasketItem(row) => format!("basket {} product {}", row.basket_id, row.product_id),
            Self::Feedback(row) => row.comment.clone(),
            Self::Complaint(row) => format!("user {}", row.user_id),
            Self::Recycle(row) => format!("user {} address {}", row.user_id, row.address_id),
            Self::DeliveryMethod(row) => row.name.clone(),
            Self::Memory(row) => row.caption.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub quantity: u32,
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub total: f64,
    pub bonus: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    #[serde(rename = "UserId")]
    pub user_id: i64,
    pub email: String,
    pub order_lines: Vec<OrderLine>,
    pub total_price: f64,
    pub bonus: u32,
    pub payment_id: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDocument {
    pub message: String,
    pub author: String,
    pub product: i64,
    pub likes_count: u32,
    pub liked_by: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_round_trips_through_its_name() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("order"), None);
    }

    #[test]
    fn only_users_and_products_are_soft_deletable() {
        let soft = EntityKind::ALL
            .into_iter()
            .filter(|kind| kind.is_soft_deletable())
            .collect::<Vec<_>>();
        assert_eq!(soft, vec![EntityKind::User, EntityKind::Product]);
    }

    #[test]
    fn anonymous_user_rows_fall_back_to_email_as_natural_key() {
        let row = NewRow::User(NewUser {
            username: None,
            email: "abcde@fghi.jk".to_string(),
            password: "x".to_string(),
            role: Role::Customer,
            deluxe_token: String::new(),
            profile_image: String::new(),
            totp_secret: String::new(),
            last_login_ip: String::new(),
        });
        assert_eq!(row.kind(), EntityKind::User);
        assert_eq!(row.natural_key(), "abcde@fghi.jk");
    }

    #[test]
    fn order_document_uses_store_field_names() -> Result<(), serde_json::Error> {
        let order = OrderDocument {
            user_id: 1,
            email: "admin@juice-sh.op".to_string(),
            order_lines: vec![],
            total_price: 0.0,
            bonus: 0,
            payment_id: "abc".to_string(),
            state: "delivered".to_string(),
        };
        let value = serde_json::to_value(&order)?;
        assert_eq!(value["UserId"], 1);
        assert_eq!(value["totalPrice"], 0.0);
        assert_eq!(value["paymentId"], "abc");
        Ok(())
    }
}

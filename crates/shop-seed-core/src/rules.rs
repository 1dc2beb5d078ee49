//! Business rules injected while seed rows are built.
//!
//! Text customization is expressed as ordered [`TextRule`] lists so each
//! substitution can be checked on its own, independent of persistence.

use std::fmt::{Display, Formatter};
use std::fmt::Write as _;

use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::assets::{extract_filename, is_url};
use crate::config::{ProductConfig, ReviewConfig, SafetyMode};
use crate::entities::named_entity;
use crate::model::{NewProduct, OrderLine, Role};

type HmacSha256 = Hmac<Sha256>;

pub const BRAND_NAME: &str = "OWASP Juice Shop";
pub const BRAND_ENV_NAME: &str = "OWASP_JUICE_SHOP";
pub const BRAND_DOMAIN: &str = "juice-sh.op";
pub const TAMPER_PRODUCT_TOKEN: &str = "OWASP SSL Advanced Forensic Tool (O-Saft)";
pub const TAMPER_URL_TOKEN: &str = "https://owasp.slack.com";
pub const TAMPER_CHALLENGE_KEY: &str = "changeProductChallenge";
pub const CODING_CHALLENGE_TAG: &str = "With Coding Challenge";
pub const UPLOADS_PATH: &str = "assets/public/images/uploads/";
pub const DEFAULT_PRODUCT_DESCRIPTION: &str =
    "Lorem ipsum dolor sit amet, consectetuer adipiscing elit.";
pub const DEFAULT_PRODUCT_IMAGE: &str = "undefined.png";
pub const SEASONAL_SPECIAL_DELETION: &str = "2014-12-27 00:00:00+00:00";
pub const LEAKED_KEYWORD_DELETION: &str = "2019-02-1 00:00:00+00:00";

/// Bonus payload shipped with the stock configuration.
pub const DEFAULT_XSS_BONUS_PAYLOAD: &str = "<iframe width=\"100%\" height=\"166\" scrolling=\"no\" frameborder=\"no\" allow=\"autoplay\" src=\"https://w.soundcloud.com/player/?url=https%3A//api.soundcloud.com/tracks/771984076&color=%23ff5500&auto_play=true&hide_related=false&show_comments=true&show_user=true&show_reposts=false&show_teaser=true\"></iframe>";

/// The encoded widget embedded in challenge descriptions, replaced by the configured payload.
pub const BONUS_PAYLOAD_WIDGET: &str = "&lt;iframe width=&quot;100%&quot; height=&quot;166&quot; scrolling=&quot;no&quot; frameborder=&quot;no&quot; allow=&quot;autoplay&quot; src=&quot;https://w.soundcloud.com/player/?url=https%3A//api.soundcloud.com/tracks/771984076&amp;color=%23ff5500&amp;auto_play=true&amp;hide_related=false&amp;show_comments=true&amp;show_user=true&amp;show_reposts=false&amp;show_teaser=true&quot;&gt;&lt;/iframe&gt;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceScope {
    First,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRule {
    pub pattern: String,
    pub replacement: String,
    pub scope: ReplaceScope,
}

impl TextRule {
    #[must_use]
    pub fn first(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into(), scope: ReplaceScope::First }
    }

    #[must_use]
    pub fn all(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into(), scope: ReplaceScope::All }
    }

    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        if self.pattern.is_empty() {
            return text.to_string();
        }
        match self.scope {
            ReplaceScope::First => text.replacen(&self.pattern, &self.replacement, 1),
            ReplaceScope::All => text.replace(&self.pattern, &self.replacement),
        }
    }
}

/// Apply each rule once, in order.
#[must_use]
pub fn apply_rules(text: &str, rules: &[TextRule]) -> String {
    rules.iter().fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

#[must_use]
pub fn challenge_description_rules(domain: &str, bonus_payload: &str) -> Vec<TextRule> {
    vec![
        TextRule::first(BRAND_DOMAIN, domain),
        TextRule::first(BONUS_PAYLOAD_WIDGET, encode_html_entities(bonus_payload)),
    ]
}

#[must_use]
pub fn hint_rules(application_name: &str) -> Vec<TextRule> {
    vec![TextRule::first(BRAND_NAME, application_name)]
}

#[must_use]
pub fn tamper_challenge_rules(product_name: &str, overwrite_url: &str) -> Vec<TextRule> {
    vec![
        TextRule::all(TAMPER_PRODUCT_TOKEN, product_name),
        TextRule::first(TAMPER_URL_TOKEN, overwrite_url),
    ]
}

/// Rules for rewriting brand tokens in built frontend files.
#[must_use]
pub fn brand_rules(application_name: &str) -> Vec<TextRule> {
    vec![
        TextRule::all(BRAND_NAME, application_name),
        TextRule::all(BRAND_ENV_NAME, env_style_name(application_name)),
    ]
}

#[must_use]
pub fn env_style_name(application_name: &str) -> String {
    application_name.replace(' ', "_").to_uppercase()
}

/// Encode markup-significant characters and non-ASCII characters that have a
/// named reference. Other characters are kept as they are.
#[must_use]
pub fn encode_html_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => match named_entity(c) {
                Some(name) => {
                    let _ = write!(out, "&{name};");
                }
                None => out.push(c),
            },
        }
    }
    out
}

/// Hosting environments a challenge may be unsafe to run on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuntimeEnvironment {
    Docker,
    Heroku,
    Windows,
    Gitpod,
}

impl RuntimeEnvironment {
    pub const CHECK_ORDER: [Self; 4] = [Self::Docker, Self::Heroku, Self::Windows, Self::Gitpod];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "Docker",
            Self::Heroku => "Heroku",
            Self::Windows => "Windows",
            Self::Gitpod => "Gitpod",
        }
    }
}

impl Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enablement {
    pub enabled: bool,
    pub disabled_because: Option<String>,
}

impl Enablement {
    fn enabled() -> Self {
        Self { enabled: true, disabled_because: None }
    }

    fn disabled(because: &str) -> Self {
        Self { enabled: false, disabled_because: Some(because.to_string()) }
    }
}

/// Decide whether a challenge is safe to offer in the active environments.
#[must_use]
pub fn challenge_enablement(
    disabled_env: &[RuntimeEnvironment],
    active: &[RuntimeEnvironment],
    mode: SafetyMode,
) -> Enablement {
    if disabled_env.is_empty() || mode == SafetyMode::Disabled {
        return Enablement::enabled();
    }

    for env in RuntimeEnvironment::CHECK_ORDER {
        if disabled_env.contains(&env) && active.contains(&env) {
            return Enablement::disabled(env.as_str());
        }
    }

    if mode == SafetyMode::Enabled {
        return Enablement::disabled("Safety Mode");
    }

    Enablement::enabled()
}

#[must_use]
pub fn disclosure_sentence(disabled_because: &str) -> String {
    format!(" <em>(This challenge is <strong>potentially harmful</strong> on {disabled_because}!)</em>")
}

/// Append the coding challenge tag when the registry knows the key.
#[must_use]
pub fn challenge_tags(tags: &[String], has_coding_challenge: bool) -> Option<String> {
    let mut all = tags.to_vec();
    if has_coding_challenge {
        all.push(CODING_CHALLENGE_TAG.to_string());
    }
    if all.is_empty() {
        None
    } else {
        Some(all.join(","))
    }
}

#[must_use]
pub fn qualify_email(email: &str, domain: &str, custom_domain: bool) -> String {
    if custom_domain {
        email.to_string()
    } else {
        format!("{email}@{domain}")
    }
}

/// HMAC-SHA256 membership token; empty for every role but deluxe.
#[must_use]
pub fn deluxe_token(role: Role, email: &str, secret: &str) -> String {
    if role != Role::Deluxe {
        return String::new();
    }
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(email.as_bytes());
    mac.update(Role::Deluxe.as_str().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[must_use]
pub fn profile_image_path(role: Role, profile_image: Option<&str>) -> String {
    let file = profile_image.unwrap_or(if role == Role::Admin { "defaultAdmin.png" } else { "default.svg" });
    format!("{UPLOADS_PATH}{file}")
}

#[must_use]
pub fn authored_feedback(comment: &str, author_email: Option<&str>) -> String {
    match author_email {
        Some(email) => {
            let masked = email.chars().skip(3).collect::<String>();
            format!("{comment} (***{masked})")
        }
        None => format!("{comment} (anonymous)"),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProductRole {
    SeasonalSpecial,
    LeakedKeyword,
    TamperableUrl,
    RetrievableBlueprint,
}

impl ProductRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SeasonalSpecial => "seasonal_special",
            Self::LeakedKeyword => "leaked_keyword",
            Self::TamperableUrl => "tamperable_url",
            Self::RetrievableBlueprint => "retrievable_blueprint",
        }
    }
}

impl Display for ProductRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote asset that must be fetched before its local file name is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAsset {
    pub url: String,
    pub file_name: String,
}

impl RemoteAsset {
    /// Split a reference into its stored value and an optional download.
    #[must_use]
    pub fn classify(reference: &str) -> (String, Option<Self>) {
        if is_url(reference) {
            let file_name = extract_filename(reference);
            (file_name.clone(), Some(Self { url: reference.to_string(), file_name }))
        } else {
            (reference.to_string(), None)
        }
    }
}

/// A catalog entry with defaults and scenario mutations applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedProduct {
    /// Position in the configured catalog.
    pub slot: usize,
    pub row: NewProduct,
    pub image_download: Option<RemoteAsset>,
    pub deletion_date: Option<String>,
    pub roles: Vec<ProductRole>,
    pub blueprint_file: Option<String>,
    pub reviews: Vec<ReviewConfig>,
}

impl PreparedProduct {
    #[must_use]
    pub fn has_role(&self, role: ProductRole) -> bool {
        self.roles.contains(&role)
    }
}

#[must_use]
pub fn default_price<R: Rng + ?Sized>(price: Option<f64>, rng: &mut R) -> f64 {
    price.unwrap_or_else(|| f64::from(rng.gen_range(1_u8..=9)))
}

#[must_use]
pub fn default_quantity<R: Rng + ?Sized>(quantity: Option<u32>, rng: &mut R) -> u32 {
    quantity.unwrap_or_else(|| rng.gen_range(30..=99))
}

/// Resolve defaults, relocate remote images and apply the scenario role mutations.
pub fn prepare_products<R: Rng + ?Sized>(products: &[ProductConfig], rng: &mut R) -> Vec<PreparedProduct> {
    products
        .iter()
        .enumerate()
        .map(|(slot, product)| prepare_product(slot, product, rng))
        .collect()
}

fn prepare_product<R: Rng + ?Sized>(slot: usize, product: &ProductConfig, rng: &mut R) -> PreparedProduct {
    let price = default_price(product.price, rng);
    let deluxe_price = product.deluxe_price.unwrap_or(price);
    let mut description = product
        .description
        .clone()
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| DEFAULT_PRODUCT_DESCRIPTION.to_string());
    let (image, image_download) =
        RemoteAsset::classify(product.image.as_deref().unwrap_or(DEFAULT_PRODUCT_IMAGE));
    let mut deletion_date = product.deleted_date.clone();
    let mut roles = Vec::new();

    if product.use_for_christmas_special_challenge {
        roles.push(ProductRole::SeasonalSpecial);
        description.push_str(" (Seasonal special offer! Limited availability!)");
        deletion_date = Some(SEASONAL_SPECIAL_DELETION.to_string());
    }

    if let Some(url) = &product.url_for_product_tampering_challenge {
        roles.push(ProductRole::TamperableUrl);
        let _ = write!(description, " <a href=\"{url}\" target=\"_blank\">More...</a>");
        deletion_date = None;
    }

    if product.keywords_for_pastebin_data_leak_challenge.is_some() {
        roles.push(ProductRole::LeakedKeyword);
        description.push_str(" (This product is unsafe! We plan to remove it from the stock!)");
        deletion_date = Some(LEAKED_KEYWORD_DELETION.to_string());
    }

    if product.file_for_retrieve_blueprint_challenge.is_some() {
        roles.push(ProductRole::RetrievableBlueprint);
    }

    PreparedProduct {
        slot,
        row: NewProduct { name: product.name.clone(), description, price, deluxe_price, image },
        image_download,
        deletion_date,
        roles,
        blueprint_file: product.file_for_retrieve_blueprint_challenge.clone(),
        reviews: product.reviews.clone(),
    }
}

/// Bonus points per unit: a tenth of the price, rounded half away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn unit_bonus(price: f64) -> u32 {
    let rounded = (price / 10.0).round();
    if rounded <= 0.0 {
        0
    } else {
        // Saturates at u32::MAX.
        rounded.min(f64::from(u32::MAX)) as u32
    }
}

#[must_use]
pub fn order_line(quantity: u32, product_id: i64, name: &str, price: f64) -> OrderLine {
    OrderLine {
        quantity,
        id: product_id,
        name: name.to_string(),
        price,
        total: price * f64::from(quantity),
        bonus: unit_bonus(price).saturating_mul(quantity),
    }
}

/// Total price and total bonus of an order.
#[must_use]
pub fn order_totals(lines: &[OrderLine]) -> (f64, u32) {
    lines.iter().fold((0.0, 0), |(total, bonus), line| {
        (total + line.total, bonus.saturating_add(line.bonus))
    })
}

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_from<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len).map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())])).collect()
}

#[must_use]
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    random_from(rng, ALPHANUMERIC, len)
}

#[must_use]
pub fn random_fake_email<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}@{}.{}",
        random_string(rng, 5).to_lowercase(),
        random_string(rng, 4).to_lowercase(),
        random_string(rng, 2).to_lowercase()
    )
}

/// Opaque base-36 payment reference.
#[must_use]
pub fn payment_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_from(rng, BASE36, 11)
}

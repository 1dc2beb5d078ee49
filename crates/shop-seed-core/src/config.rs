//! Seed configuration as read from a YAML file.
//!
//! Field names follow the camelCase keys of the demo application's own
//! configuration files so an existing `default.yml` can be fed in unchanged.
//! Every field carries a default matching the stock demo settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rules::{RuntimeEnvironment, DEFAULT_XSS_BONUS_PAYLOAD};
use crate::SeedError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedConfig {
    pub application: ApplicationConfig,
    pub challenges: ChallengeConfig,
    pub paths: PathsConfig,
    pub products: Vec<ProductConfig>,
    pub memories: Vec<MemoryConfig>,
}

impl SeedConfig {
    /// Read a configuration file.
    ///
    /// # Errors
    /// Returns [`SeedError::Config`] when the file cannot be read or is not valid YAML
    /// for this shape.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let body = fs::read_to_string(path).map_err(|err| {
            SeedError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_yaml(&body)
            .map_err(|err| SeedError::Config(format!("{}: {err}", path.display())))
    }

    /// Parse a configuration document.
    ///
    /// # Errors
    /// Returns the YAML error message when the document does not match the expected shape.
    pub fn from_yaml(body: &str) -> Result<Self, String> {
        let config: Self = serde_yaml::from_str(body).map_err(|err| err.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.application.name.trim().is_empty() {
            return Err("application.name MUST NOT be empty".to_string());
        }
        if self.application.domain.trim().is_empty() {
            return Err("application.domain MUST NOT be empty".to_string());
        }
        for (role, count) in [
            ("useForChristmasSpecialChallenge", self.products.iter().filter(|p| p.use_for_christmas_special_challenge).count()),
            ("keywordsForPastebinDataLeakChallenge", self.products.iter().filter(|p| p.keywords_for_pastebin_data_leak_challenge.is_some()).count()),
            ("urlForProductTamperingChallenge", self.products.iter().filter(|p| p.url_for_product_tampering_challenge.is_some()).count()),
            ("fileForRetrieveBlueprintChallenge", self.products.iter().filter(|p| p.file_for_retrieve_blueprint_challenge.is_some()).count()),
        ] {
            if count > 1 {
                return Err(format!("at most one product may set {role}, found {count}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationConfig {
    pub name: String,
    pub domain: String,
    pub number_of_random_fake_users: usize,
    /// Key for the deluxe membership token HMAC.
    pub deluxe_secret: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "OWASP Juice Shop".to_string(),
            domain: "juice-sh.op".to_string(),
            number_of_random_fake_users: 0,
            deluxe_secret: "juice-shop-deluxe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SafetyMode {
    /// Disable challenges only on the environments they list.
    #[default]
    Auto,
    /// Disable every challenge that lists any unsafe environment.
    Enabled,
    /// Never disable a challenge.
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeConfig {
    pub show_hints: bool,
    pub show_mitigations: bool,
    pub safety_mode: SafetyMode,
    pub xss_bonus_payload: String,
    pub overwrite_url_for_product_tampering_challenge: String,
    /// Environments treated as active; detected from the host when absent.
    pub active_environments: Option<Vec<RuntimeEnvironment>>,
    /// Directory scanned for coding challenge snippets.
    pub code_snippets_dir: Option<PathBuf>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            show_hints: true,
            show_mitigations: true,
            safety_mode: SafetyMode::Auto,
            xss_bonus_payload: DEFAULT_XSS_BONUS_PAYLOAD.to_string(),
            overwrite_url_for_product_tampering_challenge: "https://owasp.slack.com".to_string(),
            active_environments: None,
            code_snippets_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PathsConfig {
    /// Built frontend output; assets land below it and brand tokens are rewritten in it.
    pub dist_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { dist_dir: PathBuf::from("frontend/dist") }
    }
}

impl PathsConfig {
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.dist_dir.join("frontend/assets/public/images")
    }

    #[must_use]
    pub fn product_images_dir(&self) -> PathBuf {
        self.images_dir().join("products")
    }

    #[must_use]
    pub fn upload_images_dir(&self) -> PathBuf {
        self.images_dir().join("uploads")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductConfig {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub deluxe_price: Option<f64>,
    pub image: Option<String>,
    pub quantity: Option<u32>,
    pub limit_per_user: Option<u32>,
    pub deleted_date: Option<String>,
    pub reviews: Vec<ReviewConfig>,
    pub use_for_christmas_special_challenge: bool,
    pub keywords_for_pastebin_data_leak_challenge: Option<Vec<String>>,
    pub url_for_product_tampering_challenge: Option<String>,
    pub file_for_retrieve_blueprint_challenge: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewConfig {
    pub text: String,
    /// User alias of the review author.
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryConfig {
    pub image: String,
    pub caption: String,
    pub user: Option<String>,
    pub geo_stalking_meta_security_question: Option<u32>,
    pub geo_stalking_meta_security_answer: Option<String>,
    pub geo_stalking_visual_security_question: Option<u32>,
    pub geo_stalking_visual_security_answer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_stock_defaults() -> Result<(), String> {
        let config = SeedConfig::from_yaml("{}")?;
        assert_eq!(config.application.name, "OWASP Juice Shop");
        assert_eq!(config.application.domain, "juice-sh.op");
        assert!(config.challenges.show_hints);
        assert!(config.challenges.show_mitigations);
        assert_eq!(config.challenges.safety_mode, SafetyMode::Auto);
        assert!(config.products.is_empty());
        assert_eq!(
            config.paths.product_images_dir(),
            PathBuf::from("frontend/dist/frontend/assets/public/images/products")
        );
        Ok(())
    }

    #[test]
    fn camel_case_product_flags_are_read() -> Result<(), String> {
        let config = SeedConfig::from_yaml(
            r"
application:
  name: Acme Shop
  numberOfRandomFakeUsers: 3
products:
  - name: Apple Juice
    price: 1.99
    reviews:
      - text: One of my favorites!
        author: admin
  - name: Christmas Tee
    useForChristmasSpecialChallenge: true
memories:
  - image: magn(et)ificent!-1571814229653.jpg
    caption: Magn(et)ificent!
    geoStalkingMetaSecurityQuestion: 14
    geoStalkingMetaSecurityAnswer: Daniel Boone National Forest
",
        )?;
        assert_eq!(config.application.name, "Acme Shop");
        assert_eq!(config.application.domain, "juice-sh.op");
        assert_eq!(config.application.number_of_random_fake_users, 3);
        assert_eq!(config.products[0].price, Some(1.99));
        assert_eq!(config.products[0].reviews[0].author, "admin");
        assert!(config.products[1].use_for_christmas_special_challenge);
        assert_eq!(config.memories[0].geo_stalking_meta_security_question, Some(14));
        Ok(())
    }

    #[test]
    fn duplicate_scenario_roles_are_rejected() {
        let result = SeedConfig::from_yaml(
            r"
products:
  - name: A
    useForChristmasSpecialChallenge: true
  - name: B
    useForChristmasSpecialChallenge: true
",
        );
        let err = match result {
            Ok(_) => panic!("duplicate christmas products must be rejected"),
            Err(err) => err,
        };
        assert!(err.contains("useForChristmasSpecialChallenge"), "unexpected error: {err}");
    }

    #[test]
    fn load_reports_missing_file() {
        let missing = Path::new("/definitely/not/here/config.yml");
        match SeedConfig::load(missing) {
            Err(SeedError::Config(message)) => assert!(message.contains("failed to read")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}

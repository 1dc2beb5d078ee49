//! The static seed dataset: ordered record lists loaded from YAML files.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::Role;
use crate::rules::RuntimeEnvironment;
use crate::SeedError;

pub const SECURITY_QUESTIONS_FILE: &str = "securityQuestions.yml";
pub const USERS_FILE: &str = "users.yml";
pub const CHALLENGES_FILE: &str = "challenges.yml";
pub const DELIVERIES_FILE: &str = "deliveries.yml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StaticDataset {
    pub security_questions: Vec<StaticSecurityQuestion>,
    pub users: Vec<StaticUser>,
    pub challenges: Vec<StaticChallenge>,
    pub deliveries: Vec<StaticDelivery>,
}

impl StaticDataset {
    /// Load all dataset files from one directory.
    ///
    /// # Errors
    /// Returns [`SeedError::Dataset`] when a file is missing or malformed, or when
    /// user aliases or challenge keys are not unique.
    pub fn load(dir: &Path) -> Result<Self, SeedError> {
        let dataset = Self {
            security_questions: read_list(dir, SECURITY_QUESTIONS_FILE)?,
            users: read_list(dir, USERS_FILE)?,
            challenges: read_list(dir, CHALLENGES_FILE)?,
            deliveries: read_list(dir, DELIVERIES_FILE)?,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check the natural keys later stages look records up by.
    ///
    /// # Errors
    /// Returns [`SeedError::Dataset`] naming the first duplicated key.
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut aliases = BTreeSet::new();
        for user in &self.users {
            if !aliases.insert(user.key.as_str()) {
                return Err(SeedError::Dataset {
                    file: USERS_FILE.to_string(),
                    message: format!("duplicate user key `{}`", user.key),
                });
            }
        }

        let mut keys = BTreeSet::new();
        for challenge in &self.challenges {
            if !keys.insert(challenge.key.as_str()) {
                return Err(SeedError::Dataset {
                    file: CHALLENGES_FILE.to_string(),
                    message: format!("duplicate challenge key `{}`", challenge.key),
                });
            }
        }

        Ok(())
    }
}

fn read_list<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, SeedError> {
    let path = dir.join(file);
    let body = fs::read_to_string(&path).map_err(|err| SeedError::Dataset {
        file: file.to_string(),
        message: format!("failed to read {}: {err}", path.display()),
    })?;
    serde_yaml::from_str(&body)
        .map_err(|err| SeedError::Dataset { file: file.to_string(), message: err.to_string() })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticSecurityQuestion {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaticUser {
    /// Alias other records refer to this user by.
    pub key: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Local part only, unless `custom_domain` is set.
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub custom_domain: bool,
    #[serde(default)]
    pub deleted_flag: bool,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub security_question: Option<StaticSecurityAnswer>,
    #[serde(default)]
    pub feedback: Option<StaticFeedback>,
    #[serde(default)]
    pub address: Vec<StaticAddress>,
    #[serde(default)]
    pub card: Vec<StaticCard>,
    #[serde(default)]
    pub totp_secret: String,
    #[serde(default)]
    pub last_login_ip: String,
    #[serde(default)]
    pub wallet_balance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticSecurityAnswer {
    /// 1-based position of the question in the security question list.
    pub id: u32,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticFeedback {
    pub comment: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StaticAddress {
    pub full_name: String,
    pub mobile_num: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub zip_code: String,
    pub street_address: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StaticCard {
    pub full_name: String,
    pub card_num: i64,
    pub exp_month: u32,
    pub exp_year: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StaticChallenge {
    pub key: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: String,
    pub difficulty: u8,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub mitigation_url: Option<String>,
    #[serde(default)]
    pub disabled_env: Vec<RuntimeEnvironment>,
    #[serde(default)]
    pub tutorial: Option<StaticTutorial>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticTutorial {
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaticDelivery {
    pub name: String,
    pub price: f64,
    pub deluxe_price: f64,
    pub eta: f64,
    pub icon: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(number) => number.to_string(),
    })
}

use crate::errors::{AppError, AppResult};
use crate::ids::page_id_from_locator;
use crate::models::CollectionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "NOTION_UTIL_CONFIG";

const DEFAULT_BASE_URL: &str = "https://www.notion.so/kekefam/";
const MAX_UTC_OFFSET_HOURS: u32 = 14;
const MIN_SUBMIT_ATTEMPTS: u32 = 1;
const MAX_SUBMIT_ATTEMPTS: u32 = 10;
const MIN_RETRY_BACKOFF_MS: u64 = 100;
const MAX_RETRY_BACKOFF_MS: u64 = 600_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub locator: String,
    /// Display name of the date property reported with query hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp_property: Option<String>,
    /// Property code written when a page of this kind is stamped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentConfig {
    pub memo_bucket: String,
    pub drafts: String,
    /// Falls back to the resolved `NOTE` collection when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPolicy {
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            retry_backoff_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotionConfig {
    pub base_url: String,
    pub utc_offset_hours: i32,
    pub time_zone: String,
    pub collections: BTreeMap<CollectionKind, CollectionConfig>,
    pub parents: ParentConfig,
    pub memo_block_type: String,
    pub submit: SubmitPolicy,
}

impl Default for NotionConfig {
    fn default() -> Self {
        let collection = |id: &str, view: &str, stamp_property: Option<&str>, stamp_code: Option<&str>| CollectionConfig {
            locator: format!("{}{}?v={}", DEFAULT_BASE_URL, id, view),
            stamp_property: stamp_property.map(ToString::to_string),
            stamp_code: stamp_code.map(ToString::to_string),
        };

        let mut collections = BTreeMap::new();
        collections.insert(
            CollectionKind::Book,
            collection(
                "4044898e951546df9fadbbba4d98c10f",
                "59575ce5af824944a6bc7bd95a14704e",
                Some("Read at"),
                Some("fz`,"),
            ),
        );
        collections.insert(
            CollectionKind::Draft,
            collection("0131e73ca2b147cc802692d60fd4a56d", "4d82e5866a4c426fa788b1b72b46dff6", None, None),
        );
        collections.insert(
            CollectionKind::Note,
            collection("80f1b4ba615949faa9625bc42c5fb531", "c1d00e9c432347c189b0055c24722312", None, None),
        );
        collections.insert(
            CollectionKind::People,
            collection(
                "6a3eb7d328bc4e328a9babb598d44d0e",
                "6415bd5b087143808dcc7d16a96710ee",
                Some("Met at"),
                Some("87:u"),
            ),
        );

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            utc_offset_hours: 9,
            time_zone: "Asia/Seoul".to_string(),
            collections,
            parents: ParentConfig {
                memo_bucket: "34b815a1-89e7-4fb0-9e24-89d01a62a6d7".to_string(),
                drafts: "02c93613-79e4-4964-9d28-59dbf5c3e3e8".to_string(),
                daily_notes: None,
            },
            memo_block_type: "bulleted_list".to_string(),
            submit: SubmitPolicy::default(),
        }
    }
}

impl NotionConfig {
    pub fn from_yaml_str(raw: &str) -> AppResult<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|error| AppError::Config(format!("failed to read {}: {}", path.display(), error)))?;
        Self::from_yaml_str(&raw)
    }

    /// Loads the file named by `NOTION_UTIL_CONFIG`, or the built-in
    /// deployment table when the variable is unset.
    pub fn from_env() -> AppResult<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => {
                tracing::info!("{} not set; using built-in collection table", CONFIG_PATH_ENV);
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.utc_offset_hours.unsigned_abs() > MAX_UTC_OFFSET_HOURS {
            return Err(AppError::Config(format!(
                "utcOffsetHours must be within +/-{} (got {}).",
                MAX_UTC_OFFSET_HOURS, self.utc_offset_hours
            )));
        }
        for (kind, collection) in &self.collections {
            page_id_from_locator(&collection.locator)
                .map_err(|error| AppError::Config(format!("collection {}: {}", kind, error)))?;
        }
        if !(MIN_SUBMIT_ATTEMPTS..=MAX_SUBMIT_ATTEMPTS).contains(&self.submit.max_attempts) {
            return Err(AppError::Config(format!(
                "submit.maxAttempts must be between {} and {}.",
                MIN_SUBMIT_ATTEMPTS, MAX_SUBMIT_ATTEMPTS
            )));
        }
        if !(MIN_RETRY_BACKOFF_MS..=MAX_RETRY_BACKOFF_MS).contains(&self.submit.retry_backoff_ms) {
            return Err(AppError::Config(format!(
                "submit.retryBackoffMs must be between {} and {}.",
                MIN_RETRY_BACKOFF_MS, MAX_RETRY_BACKOFF_MS
            )));
        }
        Ok(())
    }

    pub fn collection(&self, kind: CollectionKind) -> AppResult<&CollectionConfig> {
        self.collections
            .get(&kind)
            .ok_or_else(|| AppError::Config(format!("no locator configured for collection {}", kind)))
    }
}

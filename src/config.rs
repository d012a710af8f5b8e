use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{SeedError, SeedResult};

/// ## Structure
/// Configuration file for a seeding run. Every field has a default, so a
/// missing file only needs credentials from the environment.
///
/// ```text
/// SeedConfig
///   ├── backend: BackendConfig
///   │   ├── endpoint          (APPWRITE_ENDPOINT)
///   │   ├── project_id        (APPWRITE_PROJECT_ID)
///   │   ├── api_key           (APPWRITE_API_KEY)
///   │   ├── database_id       (APPWRITE_DATABASE_ID)
///   │   └── bucket_id         (APPWRITE_BUCKET_ID)
///   ├── collections: CollectionIds
///   │   ├── categories
///   │   ├── customizations
///   │   ├── menu
///   │   └── menu_customizations
///   └── images: ImageConfig
///       ├── enabled
///       ├── fetch_timeout_secs
///       ├── fallback_url      (None keeps the source url)
///       └── user_agent
/// ```
///
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    pub backend: BackendConfig,
    pub collections: CollectionIds,
    pub images: ImageConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: Option<String>,
    pub database_id: String,
    pub bucket_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CollectionIds {
    pub categories: String,
    pub customizations: String,
    pub menu: String,
    pub menu_customizations: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImageConfig {
    pub enabled: bool,
    pub fetch_timeout_secs: u64,
    pub fallback_url: Option<String>,
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project_id: String::new(),
            api_key: None,
            database_id: "menuseed".to_string(),
            bucket_id: "assets".to_string(),
        }
    }
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            categories: "categories".to_string(),
            customizations: "customizations".to_string(),
            menu: "menu".to_string(),
            menu_customizations: "menu_customizations".to_string(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fetch_timeout_secs: 30,
            fallback_url: None,
            user_agent: format!("menuseed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CollectionIds {
    /// Collections in the order the clear phase wipes them.
    pub fn in_clear_order(&self) -> [&str; 4] {
        [
            self.categories.as_str(),
            self.customizations.as_str(),
            self.menu.as_str(),
            self.menu_customizations.as_str(),
        ]
    }
}

impl ImageConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl SeedConfig {
    /// Read the YAML file at `path` if it exists, then apply environment
    /// overrides. A missing file is not an error.
    pub fn load(path: impl AsRef<Path>) -> SeedResult<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            info!("Loading config: {}", path.display());
            let content = std::fs::read_to_string(path)?;
            Self::from_yaml(&content)?
        } else {
            debug!("Config {} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> SeedResult<Self> {
        serde_yaml::from_str(content).map_err(|e| SeedError::Config(e.to_string()))
    }

    pub fn to_yaml(&self) -> SeedResult<String> {
        serde_yaml::to_string(self).map_err(|e| SeedError::Config(e.to_string()))
    }

    /// `lookup` is `std::env::var` outside of tests.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let backend = &mut self.backend;
        for (key, slot) in [
            ("APPWRITE_ENDPOINT", &mut backend.endpoint),
            ("APPWRITE_PROJECT_ID", &mut backend.project_id),
            ("APPWRITE_DATABASE_ID", &mut backend.database_id),
            ("APPWRITE_BUCKET_ID", &mut backend.bucket_id),
        ] {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                debug!("{key} set, overriding config");
                *slot = value;
            }
        }

        if let Some(key) = lookup("APPWRITE_API_KEY").filter(|v| !v.trim().is_empty()) {
            backend.api_key = Some(key);
        }
    }

    /// Settings for a dry run: nothing leaves the process, so images keep
    /// their source urls instead of being fetched.
    pub fn offline(mut self) -> Self {
        self.images.enabled = false;
        self
    }

    /// Checks shared by every backend.
    pub fn validate(&self) -> SeedResult<()> {
        let required = [
            ("backend.database_id", &self.backend.database_id),
            ("backend.bucket_id", &self.backend.bucket_id),
            ("collections.categories", &self.collections.categories),
            ("collections.customizations", &self.collections.customizations),
            ("collections.menu", &self.collections.menu),
            (
                "collections.menu_customizations",
                &self.collections.menu_customizations,
            ),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SeedError::Config(format!("{field} must not be empty")));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for collection in self.collections.in_clear_order() {
            if !seen.insert(collection) {
                return Err(SeedError::Config(format!(
                    "collection '{collection}' is configured more than once"
                )));
            }
        }

        if self.images.enabled && self.images.fetch_timeout_secs == 0 {
            return Err(SeedError::Config(
                "images.fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Extra checks for talking to a real Appwrite endpoint.
    pub fn validate_remote(&self) -> SeedResult<()> {
        self.validate()?;

        url::Url::parse(&self.backend.endpoint).map_err(|e| {
            SeedError::Config(format!(
                "backend.endpoint '{}' is not a valid url: {e}",
                self.backend.endpoint
            ))
        })?;

        if self.backend.project_id.trim().is_empty() {
            return Err(SeedError::Config(
                "backend.project_id must be set (or APPWRITE_PROJECT_ID)".to_string(),
            ));
        }

        if self.backend.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(SeedError::Config(
                "an API key is required (set APPWRITE_API_KEY)".to_string(),
            ));
        }

        Ok(())
    }
}

//! Persistent CLI storage-context configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tasksync_core::util::{is_http_url, normalize_text_option};

const CONFIG_FILE_NAME: &str = "cli-config.json";

pub const DEFAULT_LOCAL_CONTEXT: &str = "local";
pub const DEFAULT_REMOTE_CONTEXT: &str = "remote";

pub const LOCAL_CONTEXT_ENV: &str = "TASKSYNC_CONTEXT_LOCAL";
pub const REMOTE_CONTEXT_ENV: &str = "TASKSYNC_CONTEXT_REMOTE";
pub const API_TOKEN_ENV: &str = "TASKSYNC_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliContextsConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub local_context: Option<String>,
    #[serde(default)]
    pub remote_context: Option<String>,
    #[serde(default)]
    pub contexts: BTreeMap<String, StorageContext>,
}

/// A named place tasks live in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageContext {
    Local {
        #[serde(default)]
        db_path: Option<PathBuf>,
    },
    Remote {
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        token: Option<String>,
    },
}

const fn default_config_version() -> u32 {
    1
}

impl Default for CliContextsConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            local_context: None,
            remote_context: None,
            contexts: BTreeMap::new(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasksync")
        .join(CONFIG_FILE_NAME)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasksync")
        .join("tasksync.db")
}

pub fn normalize_context_name(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// First non-blank of: explicit flag, environment, config file, built-in default
pub fn pick_context_name(
    explicit: Option<&str>,
    from_env: Option<&str>,
    configured: Option<&str>,
    fallback: &str,
) -> String {
    normalize_context_name(explicit)
        .or_else(|| normalize_context_name(from_env))
        .or_else(|| normalize_context_name(configured))
        .unwrap_or_else(|| fallback.to_string())
}

impl CliContextsConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    pub fn local_context_name(&self, explicit: Option<&str>) -> String {
        pick_context_name(
            explicit,
            std::env::var(LOCAL_CONTEXT_ENV).ok().as_deref(),
            self.local_context.as_deref(),
            DEFAULT_LOCAL_CONTEXT,
        )
    }

    pub fn remote_context_name(&self, explicit: Option<&str>) -> String {
        pick_context_name(
            explicit,
            std::env::var(REMOTE_CONTEXT_ENV).ok().as_deref(),
            self.remote_context.as_deref(),
            DEFAULT_REMOTE_CONTEXT,
        )
    }

    pub fn context(&self, name: &str) -> Option<&StorageContext> {
        self.contexts.get(name)
    }

    fn normalize(&mut self) {
        self.local_context = normalize_context_name(self.local_context.as_deref());
        self.remote_context = normalize_context_name(self.remote_context.as_deref());
        for context in self.contexts.values_mut() {
            context.normalize();
        }
    }

    fn validate(&self) -> Result<(), String> {
        for (name, context) in &self.contexts {
            if let StorageContext::Remote {
                base_url: Some(url),
                ..
            } = context
            {
                if !is_http_url(url) {
                    return Err(format!(
                        "Context `{name}` has a base_url without http(s) scheme: {url}"
                    ));
                }
            }
        }
        Ok(())
    }
}

impl StorageContext {
    fn normalize(&mut self) {
        match self {
            Self::Local { db_path } => {
                if db_path
                    .as_ref()
                    .is_some_and(|path| path.as_os_str().is_empty())
                {
                    *db_path = None;
                }
            }
            Self::Remote { base_url, token } => {
                *base_url = normalize_text_option(base_url.take());
                *token = normalize_text_option(token.take());
            }
        }
    }
}

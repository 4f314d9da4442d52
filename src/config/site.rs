//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub url: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Date / Time
    pub timezone: String,

    // Content source
    #[serde(default)]
    pub prismic: PrismicConfig,

    // Comment widget
    #[serde(default)]
    pub comments: CommentsConfig,

    // Preview mode
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            url: "http://localhost:3000".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            timezone: "UTC".to_string(),

            prismic: PrismicConfig::default(),
            comments: CommentsConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an environment lookup
    ///
    /// - `PRISMIC_API_ENDPOINT`
    /// - `PRISMIC_ACCESS_TOKEN`
    /// - `PREVIEW_SECRET`
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("PRISMIC_API_ENDPOINT").filter(|v| !v.is_empty()) {
            self.prismic.api_endpoint = endpoint;
        }
        if let Some(token) = lookup("PRISMIC_ACCESS_TOKEN").filter(|v| !v.is_empty()) {
            self.prismic.access_token = Some(token);
        }
        if let Some(secret) = lookup("PREVIEW_SECRET").filter(|v| !v.is_empty()) {
            self.preview.secret = Some(secret);
        }
    }

    /// Timezone used when formatting publication dates
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {}", self.timezone, e))
    }
}

/// Prismic repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    /// Local JSON export used instead of the live API
    pub fixtures: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            fixtures: None,
            timeout_secs: 30,
        }
    }
}

/// Utterances comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// GitHub repository holding the comment issues; no widget when unset
    pub repo: Option<String>,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: None,
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

/// Preview mode configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Key signing the preview cookie; preview mode is unavailable when unset
    pub secret: Option<String>,
}

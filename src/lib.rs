//! spacetraveling: a statically generated blog backed by the Prismic CMS
//!
//! Posts are fetched from the content source at build time, shaped into
//! view models and rendered with embedded Tera templates. A small server
//! serves the output, renders unknown or previewed posts on demand and
//! handles leaving preview mode.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod prismic;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use prismic::{ContentSource, FixtureSource, PrismicClient};

/// The main spacetraveling application
#[derive(Clone)]
pub struct Spacetraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
    /// Static assets copied verbatim into the output
    pub static_dir: std::path::PathBuf,
}

impl Spacetraveling {
    /// Create a new instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        }
    }

    /// Build the configured content source
    ///
    /// A configured fixtures file takes precedence over the live API.
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        match &self.config.prismic.fixtures {
            Some(fixtures) => {
                let path = self.base_dir.join(fixtures);
                tracing::info!("Using local content export {:?}", path);
                Ok(Arc::new(FixtureSource::load(&path)?))
            }
            None => {
                tracing::debug!("Using content API {}", self.config.prismic.api_endpoint);
                Ok(Arc::new(PrismicClient::from_config(&self.config.prismic)?))
            }
        }
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        let source = self.content_source()?;
        commands::generate::run(self, source.as_ref()).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

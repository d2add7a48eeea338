use anyhow::Context;
use plinth_engine::{TokenTable, UnresolvedTokenPolicy};
use plinth_guardrails::{Guardrails, ThresholdOverrides};
use plinth_registry::SurfaceRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "plinth.config.json";

/// Plinth configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Generated layout catalog (surfaces, slots, sections)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// Canvas snapshot that runs read and write
    #[serde(default = "default_canvas")]
    pub canvas: String,

    /// Design token table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<String>,

    #[serde(default)]
    pub unresolved_tokens: UnresolvedTokenPolicy,

    #[serde(default)]
    pub guardrails: ThresholdOverrides,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_canvas() -> String {
    ".plinth/canvas.json".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn canvas_path(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.canvas)
    }

    /// Registry built from the configured catalog, or one holding only the default surface
    pub fn registry(&self, cwd: &Path) -> anyhow::Result<SurfaceRegistry> {
        match &self.catalog {
            Some(catalog) => Ok(SurfaceRegistry::load(&cwd.join(catalog))?),
            None => Ok(SurfaceRegistry::new()),
        }
    }

    pub fn token_table(&self, cwd: &Path) -> anyhow::Result<TokenTable> {
        match &self.tokens {
            Some(tokens) => {
                let path = cwd.join(tokens);
                TokenTable::load(&path)
                    .with_context(|| format!("Failed to load tokens {}", path.display()))
            }
            None => Ok(TokenTable::default()),
        }
    }

    pub fn guardrails(&self) -> Guardrails {
        Guardrails::new(self.guardrails.resolve())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            canvas: default_canvas(),
            tokens: None,
            unresolved_tokens: UnresolvedTokenPolicy::default(),
            guardrails: ThresholdOverrides::default(),
            log_level: default_log_level(),
        }
    }
}

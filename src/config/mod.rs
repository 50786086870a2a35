use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Args, ProviderKind};
use crate::errors::BlueprintError;
use crate::wire::ProductData;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: String,
    pub root: String,
    pub out_dir: String,
    pub provider: ProviderKind,
    pub model: String,
    pub api_base: Option<String>,
    pub timeout_secs: u64,
    pub save_request: bool,
    pub save_response: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: "2025-10-01".into(),
            root: ".".into(),
            out_dir: "blueprint-out".into(),
            provider: ProviderKind::Gemini,
            model: "gemini-2.5-pro".into(),
            api_base: None,
            timeout_secs: 600,
            save_request: false,
            save_response: false,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file named by `--config`, then CLI flags.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(Path::new(path))?,
            None => Self::default(),
        };
        cfg.apply_args(args);
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(root) = &args.root {
            self.root = root.clone();
        }
        if let Some(out) = &args.out_dir {
            self.out_dir = out.clone();
        }
        if let Some(base) = &args.api_base {
            self.api_base = Some(base.clone());
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(kind) = args.provider {
            // A provider switch without an explicit model must not keep the other vendor's model.
            if kind != self.provider && args.model.is_none() {
                self.model = default_model(kind).into();
            }
            self.provider = kind;
        }
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        self.save_request |= args.save_request;
        self.save_response |= args.save_response;
    }

    pub fn api_key(&self) -> Result<String, BlueprintError> {
        let vars: &[&str] = match self.provider {
            ProviderKind::Gemini => &["GEMINI_API_KEY", "API_KEY"],
            ProviderKind::OpenAI => &["OPENAI_API_KEY"],
        };
        vars.iter()
            .find_map(|v| std::env::var(v).ok().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| BlueprintError::Config(format!("{} env var is not set", vars.join(" or "))))
    }
}

pub fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "gemini-2.5-pro",
        ProviderKind::OpenAI => "gpt-4.1-mini",
    }
}

/// Product data for prefilling the wizard. `.toml` files are read as TOML, anything
/// else as JSON, both with the camelCase field names of the blueprint export.
pub fn load_product_input(path: &Path) -> Result<ProductData> {
    let s = fs::read_to_string(path)?;
    let data = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&s).map_err(anyhow::Error::from),
        _ => serde_json::from_str(&s).map_err(anyhow::Error::from),
    };
    data.with_context(|| format!("parsing product input {}", path.display()))
}

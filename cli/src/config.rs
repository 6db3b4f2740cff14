use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_CONFIG: &str = "litpage.toml";

/// Site build settings, read from `litpage.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Template every page is rendered through.
    pub template: PathBuf,

    /// Literate page sources, rendered in order.
    #[serde(default)]
    pub pages: Vec<PathBuf>,

    /// Metadata key holding a page's output path.
    #[serde(default = "default_output_key")]
    pub output_key: String,

    /// Data key the page source path is bound to while rendering the template.
    #[serde(default = "default_body_key")]
    pub body_key: String,

    #[serde(default = "default_literate_extension")]
    pub literate_extension: String,

    /// Extra data shared by every page. Page metadata wins on conflicts.
    #[serde(default)]
    pub data: toml::Table,

    /// Directory relative output paths resolve against.
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_output_key() -> String {
    "OUTPUT".to_string()
}

fn default_body_key() -> String {
    "BODYPATH".to_string()
}

fn default_literate_extension() -> String {
    "lit".to_string()
}

impl SiteConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file. Relative paths inside it resolve against the
    /// directory containing the file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let mut config =
            Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.template = base.join(&config.template);
            for page in &mut config.pages {
                *page = base.join(&*page);
            }
            config.root = base.to_path_buf();
        }
        Ok(config)
    }

    pub fn output_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// The shared `data` table as page data.
    pub fn shared_data(&self) -> anyhow::Result<litpage::Metadata> {
        match serde_json::to_value(&self.data)? {
            serde_json::Value::Object(map) => Ok(map),
            other => anyhow::bail!("config data must be a table, got {}", other),
        }
    }
}

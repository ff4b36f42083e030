use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thingsync_core::{CallbackTargets, SyncSettings};

use crate::state::config_path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub things: ThingsSection,
    pub shortcuts: ShortcutsSection,
    pub callback: CallbackTargets,
    pub vault: VaultSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThingsSection {
    /// Things URL-scheme auth token; only `complete` needs it.
    pub auth_token: String,
    /// Comma-separated tags added when a note has no `context`.
    pub default_tags: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutsSection {
    pub platform: Platform,
    pub desktop: String,
    pub mobile: String,
    pub bulk: String,
}

impl Default for ShortcutsSection {
    fn default() -> Self {
        Self {
            platform: Platform::Desktop,
            desktop: "ThingsObsidianDesktop".to_string(),
            mobile: "ThingsObsidianMobile".to_string(),
            bulk: "ThingsObsidianBulk".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSection {
    /// Vault name for deep links. Detected from the `.obsidian` folder when empty.
    pub name: Option<String>,
}

impl Config {
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            callbacks: self.callback.clone(),
            ..SyncSettings::default()
        }
        .with_default_tags(&self.things.default_tags)
    }

    /// Shortcut that pushes a single completion change.
    pub fn update_shortcut(&self) -> &str {
        match self.shortcuts.platform {
            Platform::Desktop => self.shortcuts.desktop.as_str(),
            Platform::Mobile => self.shortcuts.mobile.as_str(),
        }
    }

    pub fn vault_name(&self) -> Option<&str> {
        self.vault.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    println!("# {}", p.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    if cfg.things.auth_token.is_empty() {
        println!("\n# things.auth_token is empty: `thingsync complete` will refuse to run.");
        println!("# Get it from Things -> Settings -> General -> Enable Things URLs -> Manage.");
    }
    Ok(())
}

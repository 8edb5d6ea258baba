use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::tui::ThemeVariant;

/// Environment variable naming the instance used when none is given
pub const DEFAULT_INSTANCE_ENV: &str = "WIKIJS_DEFAULT_INSTANCE";

const API_URL_SUFFIX: &str = "_API_URL";
const API_KEY_SUFFIX: &str = "_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceConfig {
    /// GraphQL endpoint, e.g. `https://wiki.example.com/graphql`
    pub url: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl InstanceConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            label: None,
        }
    }

    pub fn display_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceSource {
    File,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstance {
    pub name: String,
    pub config: InstanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TuiSettings {
    /// How long the success message of an action dialog stays up
    #[serde(default = "default_success_duration_ms")]
    pub success_duration_ms: u64,
    /// How long transient footer status messages stay up
    #[serde(default = "default_status_duration_ms")]
    pub status_duration_ms: u64,
    #[serde(default)]
    pub theme: ThemeVariant,
}

fn default_success_duration_ms() -> u64 {
    3000
}

fn default_status_duration_ms() -> u64 {
    5000
}

impl Default for TuiSettings {
    fn default() -> Self {
        Self {
            success_duration_ms: default_success_duration_ms(),
            status_duration_ms: default_status_duration_ms(),
            theme: ThemeVariant::default(),
        }
    }
}

impl TuiSettings {
    pub fn success_duration(&self) -> Duration {
        Duration::from_millis(self.success_duration_ms)
    }

    pub fn status_duration(&self) -> Duration {
        Duration::from_millis(self.status_duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub default_instance: Option<String>,
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceConfig>,
    #[serde(default)]
    pub tui: TuiSettings,

    /// Instances detected from `<PREFIX>_API_URL` / `<PREFIX>_API_KEY`; never saved
    #[serde(skip)]
    pub env_instances: BTreeMap<String, InstanceConfig>,
    #[serde(skip)]
    pub env_default: Option<String>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("wikit")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".wikit")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file (if any) and merge in instances from the environment and `.env`
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?
        } else {
            info!("Config file doesn't exist, using defaults");
            Self::default()
        };

        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        config.env_instances = instances_from_env(std::env::vars());
        config.env_default = std::env::var(DEFAULT_INSTANCE_ENV).ok().filter(|v| !v.is_empty());

        debug!(
            "Loaded config with {} file instances and {} environment instances",
            config.instances.len(),
            config.env_instances.len()
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// All known instances by name; file entries shadow environment entries
    pub fn all_instances(&self) -> Vec<(&str, &InstanceConfig, InstanceSource)> {
        let mut merged: BTreeMap<&str, (&InstanceConfig, InstanceSource)> = self
            .env_instances
            .iter()
            .map(|(name, cfg)| (name.as_str(), (cfg, InstanceSource::Environment)))
            .collect();
        for (name, cfg) in &self.instances {
            merged.insert(name.as_str(), (cfg, InstanceSource::File));
        }
        merged
            .into_iter()
            .map(|(name, (cfg, source))| (name, cfg, source))
            .collect()
    }

    pub fn instance_names(&self) -> Vec<&str> {
        self.all_instances().into_iter().map(|(name, _, _)| name).collect()
    }

    pub fn get_instance(&self, name: &str) -> Option<&InstanceConfig> {
        self.instances.get(name).or_else(|| self.env_instances.get(name))
    }

    pub fn add_instance(&mut self, name: String, instance: InstanceConfig) {
        info!("Adding instance: {}", name);
        if self.default_instance.is_none() {
            info!("Set {} as default instance", name);
            self.default_instance = Some(name.clone());
        }
        self.instances.insert(name, instance);
    }

    pub fn set_default_instance(&mut self, name: &str) -> Result<()> {
        if self.get_instance(name).is_none() {
            anyhow::bail!(
                "Instance '{}' not found. Available: {}",
                name,
                self.available_list()
            );
        }
        info!("Setting default instance to: {}", name);
        self.default_instance = Some(name.to_string());
        Ok(())
    }

    /// Pick the instance to talk to.
    ///
    /// An explicit name must exist. Otherwise `WIKIJS_DEFAULT_INSTANCE`, then the configured
    /// default, then the first instance by name.
    pub fn resolve(&self, requested: Option<&str>) -> Result<ResolvedInstance> {
        let name = match requested {
            Some(name) => name.to_string(),
            None => match self.env_default.as_ref().or(self.default_instance.as_ref()) {
                Some(name) => name.clone(),
                None => self
                    .instance_names()
                    .first()
                    .map(|name| name.to_string())
                    .context("No instances configured. Add one with `wikit instances add` or set <PREFIX>_API_URL and <PREFIX>_API_KEY")?,
            },
        };

        let config = self.get_instance(&name).with_context(|| {
            format!(
                "Unknown or unconfigured instance '{}'. Available: {}",
                name,
                self.available_list()
            )
        })?;
        debug!("Resolved instance '{}' -> {}", name, config.url);

        Ok(ResolvedInstance {
            name,
            config: config.clone(),
        })
    }

    fn available_list(&self) -> String {
        let names = self.instance_names();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    }
}

/// Detect instances from `<PREFIX>_API_URL` / `<PREFIX>_API_KEY` pairs.
///
/// The instance name is the lowercased prefix; prefixes without both variables are skipped.
pub fn instances_from_env<I>(vars: I) -> BTreeMap<String, InstanceConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: BTreeMap<String, String> = vars.into_iter().collect();
    let mut instances = BTreeMap::new();

    for (key, url) in &vars {
        let Some(prefix) = key.strip_suffix(API_URL_SUFFIX) else {
            continue;
        };
        if prefix.is_empty() || url.is_empty() {
            continue;
        }
        match vars.get(&format!("{}{}", prefix, API_KEY_SUFFIX)) {
            Some(api_key) if !api_key.is_empty() => {
                let mut instance = InstanceConfig::new(url.clone(), api_key.clone());
                instance.label = Some(label_from_prefix(prefix));
                instances.insert(prefix.to_lowercase(), instance);
            }
            _ => debug!("Ignoring {}: no matching {}{}", key, prefix, API_KEY_SUFFIX),
        }
    }

    instances
}

/// `WIKI_PROD` -> `Wiki Prod`
pub fn label_from_prefix(prefix: &str) -> String {
    prefix
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

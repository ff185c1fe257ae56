use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use toml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub tagline: String,
    pub email: String,
    pub resume_url: String,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub environment: Environment,
    pub production_url: String,
    pub local_path: String,
    pub cache_dir: String,
    pub github_api_url: String,
    pub tick_rate_ms: u64,
    pub hover_zone: u16,
    pub compact_width: u16,
    pub sidebar_collapsed: bool,
    pub log_file: String,
    pub profile: Profile,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let blueprint_path = match std::env::var("CARGO_MANIFEST_DIR") {
            Ok(manifest_dir) => {
                let mut path = PathBuf::from(manifest_dir);
                path.push("folio.toml");
                path
            }
            // release builds look next to the working directory
            Err(_) => PathBuf::from("folio.toml"),
        };

        let user_config_path = get_user_config_path();

        // Seed the user config from the blueprint on first run
        if let Some(user_config_path) = &user_config_path {
            if !user_config_path.exists() {
                if let Ok(blueprint_content) = fs::read_to_string(&blueprint_path) {
                    if let Some(parent) = user_config_path.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    let _ = fs::write(user_config_path, blueprint_content);
                }
            }
        }

        let mut builder = Self::defaults()?
            // 1. Project defaults from the blueprint
            .add_source(File::from(blueprint_path).required(false));
        // 2. User's global config
        if let Some(user_config_path) = user_config_path {
            builder = builder.add_source(File::from(user_config_path).required(false));
        }
        let s = builder
            // 3. Local folio.toml from CWD
            .add_source(File::with_name("folio.toml").required(false))
            // 4. FOLIO_ENVIRONMENT, FOLIO_PRODUCTION_URL, ...
            .add_source(config::Environment::with_prefix("FOLIO"))
            .build()?;

        s.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let cache_dir = dirs::cache_dir()
            .map(|d| d.join("folio").display().to_string())
            .unwrap_or_else(|| ".folio-cache".to_string());
        Config::builder()
            .set_default("environment", "production")?
            .set_default("production_url", "https://tristanj.dev/cache")?
            .set_default("local_path", "public/cache")?
            .set_default("cache_dir", cache_dir)?
            .set_default("github_api_url", "https://api.github.com")?
            .set_default("tick_rate_ms", 33_i64)?
            .set_default("hover_zone", 1_i64)?
            .set_default("compact_width", 100_i64)?
            .set_default("sidebar_collapsed", false)?
            .set_default("log_file", "folio.log")?
            .set_default("profile.name", "Tristan Jones")?
            .set_default("profile.title", "IT & Operations Manager")?
            .set_default(
                "profile.tagline",
                "Passionate about delivering exceptional service and innovative technical solutions.",
            )?
            .set_default("profile.email", "tristanjones247@gmail.com")?
            .set_default("profile.resume_url", "https://tristanj.dev/resume.pdf")
    }

    /// Built-in defaults only, no files or environment.
    #[cfg(test)]
    pub fn with_defaults() -> Self {
        Self::defaults()
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("built-in defaults deserialize")
    }

    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.cache_dir).into_owned())
    }

    pub fn log_file(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).into_owned())
    }
}

pub fn get_user_config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".config");
    path.push("folio");
    path.push("folio.toml");
    Some(path)
}

/// Remembers the sidebar rail state for the next start.
pub fn save_sidebar_collapsed(collapsed: bool) -> Result<(), anyhow::Error> {
    let user_config_path =
        get_user_config_path().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;

    let config_str = fs::read_to_string(&user_config_path).unwrap_or_else(|_| "".to_string());
    let mut doc = config_str.parse::<toml::Table>()?;

    doc.insert("sidebar_collapsed".to_string(), toml::Value::Boolean(collapsed));

    if let Some(parent) = user_config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&user_config_path, doc.to_string())?;

    Ok(())
}

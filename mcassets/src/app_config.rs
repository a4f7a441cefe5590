use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use serde_valid::Validate;

use crate::errors::AssetsError;
use crate::utils::normalize_path;

/// Downloads the block assets and texture atlas used by the web viewer.
#[derive(Parser, Debug, Default)]
#[command(name = "mcassets", version, about)]
pub struct Cli {
    /// Directory the generated files are written to
    #[arg(long)]
    pub resource_dir: Option<String>,
    /// File name of the generated assets script
    #[arg(long)]
    pub assets_file: Option<String>,
    /// File name of the atlas image
    #[arg(long)]
    pub atlas_file: Option<String>,
    /// Also write the merged assets as indented JSON to this path
    #[arg(long)]
    pub debug_file: Option<String>,
    /// Compare the remote assets with the files on disk without writing
    #[arg(long)]
    pub check: bool,
}

fn default_base_directory() -> String {
    env!("CARGO_MANIFEST_DIR").to_string()
}

fn default_user_agent() -> String {
    format!("mcassets/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct AppConfig {
    /// Relative paths below are resolved against this directory.
    #[serde(default = "default_base_directory")]
    pub base_directory: String,
    pub resource_directory: String,
    #[validate(min_length = 1)]
    pub assets_file: String,
    #[validate(min_length = 1)]
    pub atlas_file: String,
    #[serde(default)]
    pub debug_file: Option<String>,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl AppConfig {
    pub fn from_config(cli: &Cli) -> Result<Self, AssetsError> {
        let config = config::Config::builder()
            .set_default("resource_directory", "../resource")?
            .set_default("assets_file", "assets.js")?
            .set_default("atlas_file", "atlas.png")?
            .add_source(config::Environment::with_prefix("MCASSETS").try_parsing(true))
            .set_override_option("resource_directory", cli.resource_dir.clone())?
            .set_override_option("assets_file", cli.assets_file.clone())?
            .set_override_option("atlas_file", cli.atlas_file.clone())?
            .set_override_option("debug_file", cli.debug_file.clone())?
            .build()?;

        let app_config = config.try_deserialize::<'_, Self>()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        normalize_path(&Path::new(&self.base_directory).join(path))
    }

    pub fn resource_dir(&self) -> PathBuf {
        self.resolve(&self.resource_directory)
    }

    pub fn assets_path(&self) -> PathBuf {
        normalize_path(&self.resource_dir().join(&self.assets_file))
    }

    pub fn atlas_path(&self) -> PathBuf {
        normalize_path(&self.resource_dir().join(&self.atlas_file))
    }

    pub fn debug_path(&self) -> Option<PathBuf> {
        self.debug_file.as_ref().map(|file| self.resolve(file))
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file.as_ref().map(|file| self.resolve(file))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Serializes tests that read or modify `MCASSETS_*` environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Holds [`ENV_LOCK`] with every `MCASSETS_*` variable cleared, and clears
/// them again when dropped.
#[cfg(test)]
pub(crate) struct IsolatedEnv {
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
fn clear_mcassets_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("MCASSETS_") {
            std::env::remove_var(key);
        }
    }
}

#[cfg(test)]
impl Drop for IsolatedEnv {
    fn drop(&mut self) {
        clear_mcassets_env();
    }
}

#[cfg(test)]
pub(crate) fn isolated_env() -> IsolatedEnv {
    let lock = ENV_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    clear_mcassets_env();
    IsolatedEnv { _lock: lock }
}

#[cfg(test)]
pub(crate) fn test_config(base_directory: &Path) -> AppConfig {
    AppConfig {
        base_directory: base_directory.to_string_lossy().into_owned(),
        resource_directory: "../resource".to_string(),
        assets_file: "assets.js".to_string(),
        atlas_file: "atlas.png".to_string(),
        debug_file: None,
        log_file: None,
        request_timeout_secs: Some(10),
        user_agent: default_user_agent(),
    }
}

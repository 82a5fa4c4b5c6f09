use crate::error::AppError;
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Resolve the configuration directory of a workspace member.
///
/// Works both when the process is started from the member directory and
/// from the workspace root.
pub fn configuration_directory(base_path: &Path, member: &str) -> PathBuf {
    if base_path.ends_with(member) {
        base_path.join("config")
    } else {
        base_path.join(member).join("config")
    }
}

/// Load `base.yaml` from `directory`, then apply `APP_`-prefixed environment
/// overrides (`APP_PAYHERE__MERCHANT_ID=...`).
pub fn load_layered<T: DeserializeOwned>(directory: &Path) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .add_source(File::from(directory.join("base.yaml")).required(true))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}

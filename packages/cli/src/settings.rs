use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use store::RecipeKeeperConfig;

/// Defaults, then `recipe-keeper.toml` when present, then `RECIPE_KEEPER_*`.
///
/// Nested keys use a double underscore: `RECIPE_KEEPER_SYNC__INTERVAL_SECS=10`.
pub(crate) fn load(file: &Path) -> Result<RecipeKeeperConfig, ConfigError> {
    let defaults = RecipeKeeperConfig::default();
    let config = Config::builder()
        .set_default("sync.interval_secs", i64::from(defaults.sync.interval_secs))?
        .set_default(
            "sync.remote_latency_ms",
            i64::try_from(defaults.sync.remote_latency_ms).unwrap_or(i64::MAX),
        )?
        .set_default(
            "notify.poll_interval_secs",
            i64::from(defaults.notify.poll_interval_secs),
        )?
        .add_source(
            File::from(file)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(
            Environment::with_prefix("RECIPE_KEEPER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::{remove_var, set_var};

    #[test]
    fn test_settings() {
        let dir = std::env::temp_dir().join(format!("recipe-keeper-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(RecipeKeeperConfig::filename());

        // No file, no env: defaults
        let settings = load(&file).unwrap();
        assert_eq!(settings, RecipeKeeperConfig::default());

        std::fs::write(&file, "[sync]\ninterval_secs = 10\n\n[storage]\nnamespace = \"ada\"\n").unwrap();
        set_var("RECIPE_KEEPER_NOTIFY__POLL_INTERVAL_SECS", "5");
        let settings = load(&file).unwrap();
        remove_var("RECIPE_KEEPER_NOTIFY__POLL_INTERVAL_SECS");

        assert_eq!(settings.sync.interval_secs, 10);
        assert_eq!(settings.sync.remote_latency_ms, 1000);
        assert_eq!(settings.notify.poll_interval_secs, 5);
        assert_eq!(settings.storage.namespace.as_deref(), Some("ada"));

        std::fs::remove_dir_all(&dir).ok();
    }
}

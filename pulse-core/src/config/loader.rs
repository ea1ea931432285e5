use crate::config::model::Config;

/// Load configuration from the path named by `CONFIG_PATH` (default
/// `config.toml`). A missing file yields the built-in defaults; a file that
/// exists but fails to parse is a startup error.
pub fn load_config() -> Result<Config, anyhow::Error> {
    let config_path = get_config_path();
    if std::path::Path::new(&config_path).exists() {
        load_config_from_path(&config_path)
    } else {
        Ok(Config::default())
    }
}

pub fn get_config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_config_from_path(config_path: &str) -> Result<Config, anyhow::Error> {
    let config_str = std::fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

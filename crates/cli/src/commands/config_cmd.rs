//! `steward config` — Configuration helpers.

use clap::Subcommand;
use steward_config::AppConfig;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the default configuration (the default action)
    Default,
    /// Print the effective configuration after file and env overrides
    Show,
    /// Print the config file path
    Path,
}

pub fn run(action: Option<ConfigAction>) -> anyhow::Result<()> {
    match action.unwrap_or(ConfigAction::Default) {
        ConfigAction::Default => print!("{}", AppConfig::default_toml()),
        ConfigAction::Show => {
            let config = super::load_config()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::config_dir().join("config.toml").display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".steward"));
    }

    #[test]
    fn default_toml_parses_back() {
        let parsed: AppConfig = toml::from_str(&AppConfig::default_toml()).unwrap();
        assert!(parsed.validate().is_ok());
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toml;

use crate::warn;

/// Environment variables consulted, in order, when the config has no API key.
pub(crate) const API_KEY_ENV_VARS: [&str; 2] = ["BUDDY_API_KEY", "OPENROUTER_API_KEY"];

#[derive(Deserialize, Serialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Keybindings {
    #[default]
    Emacs,
    Vi,
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Provider {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(default)]
pub(crate) struct Chat {
    pub system_prompt: Option<String>,
    pub keybindings: Keybindings,
    /// Save messages and resume from them on the next start
    pub history: bool,
}

impl Default for Chat {
    fn default() -> Self {
        Chat {
            system_prompt: None,
            keybindings: Keybindings::default(),
            history: true,
        }
    }
}

#[derive(Deserialize, Serialize, Default, Debug)]
pub(crate) struct Config {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub chat: Chat,
}

fn non_empty(value: String) -> Option<String> {
    match value.trim() {
        "" => None,
        trimmed => Some(trimmed.to_string()),
    }
}

impl Config {
    /// The API key from the config file, falling back to the environment.
    pub(crate) fn api_key(&self) -> Option<String> {
        self.api_key_with(|var| std::env::var(var).ok())
    }

    fn api_key_with<F: Fn(&str) -> Option<String>>(&self, lookup: F) -> Option<String> {
        if let Some(key) = self.provider.api_key.clone().and_then(non_empty) {
            return Some(key);
        }

        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| lookup(var).and_then(non_empty))
    }

    pub(crate) fn model(&self) -> Option<String> {
        self.provider.model.clone().and_then(non_empty)
    }
}

fn get_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME");

    if let Some(home) = home {
        let home = PathBuf::from(home);

        const USER_PATHS: [&str; 2] = [".config/buddy/config.toml", ".buddy.toml"];

        for &path in USER_PATHS.iter() {
            let fullpath = home.join(path);

            if fullpath.exists() {
                return Some(fullpath);
            }
        }
    }

    let system_config = PathBuf::from("/etc/buddy.toml");

    if system_config.exists() {
        Some(system_config)
    } else {
        None
    }
}

fn parse_config_or_die<S: serde::de::DeserializeOwned>(config: &str) -> S {
    let r: Result<S, toml::de::Error> = toml::de::from_str(config);

    match r {
        Ok(s) => s,
        Err(err) => die::die!("failed to parse config: {}", err),
    }
}

fn extra_fields_helper<'a>(
    path: &mut Vec<&'a String>,
    user_config: &'a toml::Table,
    config: &'a toml::Table,
    extra: &mut Vec<String>,
) {
    for (user_key, user_value) in user_config {
        path.push(user_key);

        if let Some(config_value) = config.get(user_key) {
            if let (toml::Value::Table(user_value), toml::Value::Table(config_value)) =
                (user_value, config_value)
            {
                extra_fields_helper(path, user_value, config_value, extra)
            }
        } else {
            let path: Vec<&str> = path.iter().map(|&s| s.as_str()).collect();

            extra.push(path.join("."));
        }

        path.pop();
    }
}

/// The dotted paths of keys in `user_config` which `Config` does not use.
fn extra_fields(config: &Config, user_config: &toml::Table) -> Vec<String> {
    let config = match toml::Value::try_from(config) {
        Ok(toml::Value::Table(config)) => config,
        Ok(_) => return Vec::new(),
        Err(err) => {
            log::debug!("failed to reserialize the config: {}", err);
            return Vec::new();
        }
    };

    let mut path = Vec::new();
    let mut extra = Vec::new();

    extra_fields_helper(&mut path, user_config, &config, &mut extra);

    extra
}

fn warn_on_extra_fields(config: &Config, raw_config: &str) {
    let user_config: toml::Table = parse_config_or_die(raw_config);

    for key in extra_fields(config, &user_config) {
        warn!("config contains extraneous key \"{}\", ignoring", key);
    }
}

/// Reads the config at `config`, or the first config found in the default
/// locations. Without either, the defaults are used.
pub(crate) fn read_config(config: Option<PathBuf>) -> Config {
    let config_path = config.or_else(get_config_path);

    if let Some(path) = config_path {
        log::debug!("reading config from {}", path.display());

        let raw_config = match std::fs::read_to_string(&path) {
            Ok(raw_config) => raw_config,
            Err(err) => die::die!("failed to read config {}: {}", path.display(), err),
        };

        let config: Config = parse_config_or_die(&raw_config);

        warn_on_extra_fields(&config, &raw_config);

        config
    } else {
        Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[provider]
api_key = "sk-or-test"
api_base = "http://localhost:8080/v1"
model = "mistralai/mistral-7b-instruct"

[chat]
system_prompt = "You are a cat."
keybindings = "vi"
history = false
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(
            config.provider.api_base.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert_eq!(config.model().as_deref(), Some("mistralai/mistral-7b-instruct"));
        assert_eq!(config.chat.system_prompt.as_deref(), Some("You are a cat."));
        assert_eq!(config.chat.keybindings, Keybindings::Vi);
        assert!(!config.chat.history);

        let user_config: toml::Table = toml::from_str(FULL_CONFIG).unwrap();
        assert!(extra_fields(&config, &user_config).is_empty());
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.provider.api_key.is_none());
        assert!(config.model().is_none());
        assert_eq!(config.chat.keybindings, Keybindings::Emacs);
        assert!(config.chat.history);

        let config: Config = toml::from_str("[chat]\nkeybindings = \"vi\"\n").unwrap();
        assert!(config.chat.history);
    }

    #[test]
    fn test_extra_fields() {
        let raw = r#"
colour = "pink"

[provider]
model = "some/model"
temperature = 0.2

[reminders]
enabled = true
"#;

        let config: Config = toml::from_str(raw).unwrap();
        let user_config: toml::Table = toml::from_str(raw).unwrap();

        let mut extra = extra_fields(&config, &user_config);
        extra.sort();

        assert_eq!(extra, vec!["colour", "provider.temperature", "reminders"]);
    }

    #[test]
    fn test_api_key_fallback() {
        let env = |var: &str| match var {
            "OPENROUTER_API_KEY" => Some("from-env".to_string()),
            "BUDDY_API_KEY" => Some("  ".to_string()),
            _ => None,
        };

        let mut config = Config::default();
        assert_eq!(config.api_key_with(env).as_deref(), Some("from-env"));

        config.provider.api_key = Some("from-config".to_string());
        assert_eq!(config.api_key_with(env).as_deref(), Some("from-config"));

        config.provider.api_key = Some(String::new());
        assert_eq!(config.api_key_with(|_| None), None);

        let env = |var: &str| match var {
            "BUDDY_API_KEY" => Some("buddy".to_string()),
            _ => Some("openrouter".to_string()),
        };
        assert_eq!(config.api_key_with(env).as_deref(), Some("buddy"));
    }

    #[test]
    fn test_blank_model_is_unset() {
        let config: Config = toml::from_str("[provider]\nmodel = \" \"\n").unwrap();

        assert!(config.model().is_none());
    }
}

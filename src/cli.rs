use std::io::{self, IsTerminal};

use crate::config::Config;
use crate::providers::{OpenRouterProvider, DEFAULT_API_BASE};
use crate::RequestedColorMode;

pub(crate) mod chat;
pub(crate) mod list;
pub(crate) mod mood;

#[derive(Clone, Copy, strum_macros::Display)]
pub(crate) enum ColorMode {
    On,
    Off,
}

impl ColorMode {
    /// Returns whether ANSI color should be used
    /// If the user has specified a preference, this is honored. This preference
    /// can be specified through the command line or the "NO_COLOR" environment
    /// variable If the user hasn't stated a preference, color is enabled if the
    /// output is a terminal.
    pub(crate) fn resolve_auto(cm: RequestedColorMode) -> ColorMode {
        match cm {
            RequestedColorMode::Auto => {
                let disable_color =
                    std::env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal();

                if disable_color {
                    ColorMode::Off
                } else {
                    ColorMode::On
                }
            }
            RequestedColorMode::On => ColorMode::On,
            RequestedColorMode::Off => ColorMode::Off,
        }
    }
}

/// Builds the provider described by the config. A missing API key leaves the
/// provider unauthenticated; the caller decides whether that is acceptable.
pub(crate) fn provider_from_config(config: &Config) -> OpenRouterProvider {
    let api_base = config
        .provider
        .api_base
        .as_deref()
        .unwrap_or(DEFAULT_API_BASE);

    let api_key = config.api_key().unwrap_or_default();

    match OpenRouterProvider::new(&api_key, api_base) {
        Ok(provider) => provider,
        Err(err) => die::die!("invalid API base \"{}\": {}", api_base, err.describe()),
    }
}

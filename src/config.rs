use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;
use strum_macros::{Display, EnumString, IntoStaticStr};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display, IntoStaticStr, Deserialize)]
pub enum Theme {
    #[strum(serialize = "none")]
    #[serde(rename = "none")]
    None,
    #[default]
    #[strum(serialize = "default")]
    #[serde(rename = "default")]
    Default,
}

/// Dashboard layout settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Number of stack slots in the stack view.
    pub stack_slots: usize,
    /// Maximum number of dereferences in a pointer chain.
    pub max_chain_hops: usize,
    /// Size of the instruction window in the code view.
    pub code_instructions: usize,
    /// Code view is padded with blank lines up to this number of rows.
    pub code_rows: usize,
    /// Maximum number of frames in the backtrace view.
    pub backtrace_depth: usize,
    /// Banner width, terminal width if not set.
    pub width: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            stack_slots: 8,
            max_chain_hops: 5,
            code_instructions: 5,
            code_rows: 11,
            backtrace_depth: 10,
            width: None,
        }
    }
}

/// Application config.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme for visualizing dashboard.
    pub theme: Theme,
    /// Default view selectors (`r`, `c`, `s`, `b`), all views if empty.
    pub views: Vec<String>,
    pub context: ContextConfig,
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/lookout/config.toml";

    pub fn parse(data: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(data)
    }

    /// Load config from file, `~/.config/lookout/config.toml` if path not set.
    /// Return default config on errors.
    pub fn load(path: Option<&Path>) -> Self {
        let data = match path {
            None => {
                let Some(home) = home::home_dir() else {
                    return Self::default();
                };
                match muted_error!(read_to_string(home.join(Self::DEFAULT_PATH))) {
                    Some(data) => data,
                    None => return Self::default(),
                }
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!("Error while load config file: {err}");
                    return Self::default();
                }
            },
        };

        weak_error!(Self::parse(&data), "config parsing:").unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_config_parsing() {
        struct TestCase {
            data: &'static str,
            expected: Config,
        }

        let cases = [
            TestCase {
                data: "",
                expected: Config::default(),
            },
            TestCase {
                data: r#"
theme = "none"
views = ["reg", "code"]

[context]
stack_slots = 16
width = 100
"#,
                expected: Config {
                    theme: Theme::None,
                    views: vec!["reg".to_string(), "code".to_string()],
                    context: ContextConfig {
                        stack_slots: 16,
                        width: Some(100),
                        ..ContextConfig::default()
                    },
                },
            },
        ];

        for tc in cases {
            assert_eq!(Config::parse(tc.data).unwrap(), tc.expected);
        }
    }

    #[test]
    fn test_config_invalid() {
        assert!(Config::parse("theme = \"solarized\"").is_err());
        assert!(Config::parse("[context]\nstack_slots = -1").is_err());
    }

    #[test]
    fn test_theme_names() {
        assert_eq!(Theme::from_str("none").unwrap(), Theme::None);
        assert_eq!(Theme::Default.to_string(), "default");
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load(Some(Path::new("/nonexistent/lookout.toml")));
        assert_eq!(config, Config::default());
    }
}

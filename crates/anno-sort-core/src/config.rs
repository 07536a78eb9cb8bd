use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_OUTPUT_SUFFIX;
use crate::encoding::{InputEncoding, DEFAULT_INPUT_ENCODING};
use crate::error::{AnnoSortError, Result};
use crate::order::SecondaryOrder;
use crate::partition::DEFAULT_MAX_OPEN_PARTITIONS;
use crate::pipeline::SortOptions;

const CONFIG_FILE: &str = "config.toml";
const BASE_DIR_NAME: &str = ".anno-sort";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# anno-sort configuration file
# Location: ~/.anno-sort/config.toml

[sort]
# Order groups of the same category alphabetically instead of by first
# appearance in the input
# Default: false
alpha_sort_within_category = false

# Text encoding of the input files
# Default: "utf-8-sig" (UTF-8, optional BOM)
# Example: input_encoding = "gbk"
input_encoding = "utf-8-sig"

# Directory scanned for CSV files when no directory is given
# Default: current directory
# target_directory = "/data/exports"

# Appended to the input file stem to name the output
# Default: "_sorted"
output_suffix = "_sorted"

# Maximum number of group spill files kept open at once
# Default: 256
max_open_partitions = 256

# Where spill files are created
# Default: system temp directory
# spill_directory = "/scratch"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sort: SortConfig,
}

/// Sorting-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub alpha_sort_within_category: bool,

    #[serde(default = "default_input_encoding")]
    pub input_encoding: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_directory: Option<PathBuf>,

    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    #[serde(default = "default_max_open_partitions")]
    pub max_open_partitions: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spill_directory: Option<PathBuf>,
}

fn default_input_encoding() -> String {
    DEFAULT_INPUT_ENCODING.to_string()
}

fn default_output_suffix() -> String {
    DEFAULT_OUTPUT_SUFFIX.to_string()
}

fn default_max_open_partitions() -> usize {
    DEFAULT_MAX_OPEN_PARTITIONS
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            alpha_sort_within_category: false,
            input_encoding: default_input_encoding(),
            target_directory: None,
            output_suffix: default_output_suffix(),
            max_open_partitions: default_max_open_partitions(),
            spill_directory: None,
        }
    }
}

impl SortConfig {
    /// Reject values `set` would refuse, for hand-edited files.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, value: String, reason: &str| {
            AnnoSortError::InvalidConfigValue {
                key: key.to_string(),
                value,
                reason: reason.to_string(),
            }
        };
        if self.output_suffix.is_empty() {
            return Err(invalid(
                "sort.output_suffix",
                String::new(),
                "suffix must not be empty",
            ));
        }
        if self.max_open_partitions == 0 {
            return Err(invalid(
                "sort.max_open_partitions",
                "0".to_string(),
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Resolve into pipeline options, validating the encoding label.
    pub fn to_sort_options(&self) -> Result<SortOptions> {
        Ok(SortOptions {
            secondary: SecondaryOrder::from_alpha_flag(self.alpha_sort_within_category),
            encoding: InputEncoding::from_label(&self.input_encoding)?,
            spill_dir: self.spill_directory.clone(),
            max_open_partitions: self.max_open_partitions.max(1),
        })
    }

    /// Target directory, falling back to the current directory
    pub fn target_directory_or_cwd(&self) -> Result<PathBuf> {
        match &self.target_directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

impl Config {
    /// Default base directory (`~/.anno-sort`)
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(BASE_DIR_NAME))
            .ok_or(AnnoSortError::HomeNotFound)
    }

    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| AnnoSortError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        config.sort.validate()?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| AnnoSortError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: &str| AnnoSortError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let sort = &mut self.sort;

        match key {
            "sort.alpha_sort_within_category" => {
                sort.alpha_sort_within_category =
                    parse_bool(value).ok_or_else(|| invalid("expected true or false"))?;
            }
            "sort.input_encoding" => {
                InputEncoding::from_label(value)?;
                sort.input_encoding = value.trim().to_string();
            }
            "sort.target_directory" => {
                sort.target_directory = optional_path(value);
            }
            "sort.output_suffix" => {
                if value.is_empty() {
                    return Err(invalid("suffix must not be empty"));
                }
                sort.output_suffix = value.to_string();
            }
            "sort.max_open_partitions" => {
                let n: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("expected a positive integer"))?;
                if n == 0 {
                    return Err(invalid("must be at least 1"));
                }
                sort.max_open_partitions = n;
            }
            "sort.spill_directory" => {
                sort.spill_directory = optional_path(value);
            }
            _ => {
                return Err(AnnoSortError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        let sort = &self.sort;
        let path_or_default = |p: &Option<PathBuf>, default: &str| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| default.to_string())
        };
        vec![
            (
                "sort.alpha_sort_within_category".to_string(),
                sort.alpha_sort_within_category.to_string(),
            ),
            (
                "sort.input_encoding".to_string(),
                sort.input_encoding.clone(),
            ),
            (
                "sort.target_directory".to_string(),
                path_or_default(&sort.target_directory, "(current directory)"),
            ),
            (
                "sort.output_suffix".to_string(),
                sort.output_suffix.clone(),
            ),
            (
                "sort.max_open_partitions".to_string(),
                sort.max_open_partitions.to_string(),
            ),
            (
                "sort.spill_directory".to_string(),
                path_or_default(&sort.spill_directory, "(system temp)"),
            ),
        ]
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Empty string clears the setting
fn optional_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

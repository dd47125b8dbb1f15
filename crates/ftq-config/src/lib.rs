//! Configuration system for ftq.
//!
//! ftq uses TOML configuration files named `.ftq.toml`. Configuration is resolved by walking
//! up the directory tree from the current working directory, collecting any `.ftq.toml` files
//! found, then loading `~/.ftq.toml` as the global config with lowest precedence.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
#[cfg(test)]
mod test_support;
mod validate;

use std::path::{Path, PathBuf};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
use ftq_query::{DEFAULT_MAX_DEPTH, IndexSchema, ParserOptions, QueryError, Stopwords};
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawConfig, RawParserSettings, RawSchemaSettings, parse_config, parse_config_file,
    parse_config_str,
};
use serde::Serialize;
pub use templates::{global_template, local_template};
pub use validate::ConfigWarning;
use validate::validate_config;

/// Top-level merged configuration for ftq.
///
/// This represents the fully resolved configuration after merging all discovered `.ftq.toml`
/// files according to precedence rules.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parser settings.
    pub parser: ParserSettings,
    /// Index schema used to resolve `@field` scopes.
    pub schema: SchemaSettings,
    /// Files that contributed to this configuration, highest precedence first.
    pub files: Vec<PathBuf>,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant `.ftq.toml` files.
    ///
    /// This is the main entry point for loading configuration. It:
    /// 1. Discovers all `.ftq.toml` files from `cwd` up to the filesystem root
    /// 2. Appends `~/.ftq.toml` if it exists
    /// 3. Parses each file
    /// 4. Merges them according to precedence rules (closest to `cwd` wins)
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// This checks for:
    /// - Duplicate field names in the schema
    /// - Schemas with more fields than a field mask can address
    /// - A zero nesting limit, which rejects every query
    /// - An empty schema
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML format.
    ///
    /// The output has the same layout as a `.ftq.toml` file.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableSettings {
            parser: &self.parser,
            schema: &self.schema,
        };
        toml::to_string_pretty(&serializable).map_err(ConfigError::Serialize)
    }

    /// Parser limits for this configuration.
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            max_depth: self.parser.max_depth,
        }
    }

    /// Stopwords for the lexer: the configured list, or the built-in one.
    pub fn stopwords(&self) -> Stopwords {
        self.parser
            .stopwords
            .as_ref()
            .map_or_else(Stopwords::default, Stopwords::custom)
    }

    /// Builds the index schema from `[schema] fields`.
    pub fn index_schema(&self) -> Result<IndexSchema, QueryError> {
        IndexSchema::new(&self.schema.fields)
    }
}

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserSettings {
    /// Maximum nesting depth of a query.
    pub max_depth: usize,
    /// Replacement stopword list; `None` keeps the built-in list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            stopwords: None,
        }
    }
}

/// Schema settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSettings {
    /// Field names in index order.
    pub fields: Vec<String>,
}

/// Borrowed view of the settings for TOML serialization.
#[derive(Serialize)]
struct SerializableSettings<'a> {
    /// Parser settings.
    parser: &'a ParserSettings,
    /// Schema settings.
    schema: &'a SchemaSettings,
}

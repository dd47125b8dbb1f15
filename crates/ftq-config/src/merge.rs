//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`, applying precedence
//! rules.

use std::path::PathBuf;

use crate::{
    Config, ParserSettings, SchemaSettings,
    parse::{RawConfig, RawParserSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first (closest to CWD),
/// lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins (highest precedence)
/// - Stopwords: the first defined list wins whole; lists are never combined
/// - Schema fields: the first defined list wins whole
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(PathBuf::from);

    Config {
        parser: merge_parser_settings(configs),
        schema: merge_schema_settings(configs),
        files: configs.iter().map(|c| c.path.clone()).collect(),
        config_root,
    }
}

/// Merges parser settings, taking first defined value for each field.
fn merge_parser_settings(configs: &[ParsedConfig]) -> ParserSettings {
    let mut result = ParserSettings::default();

    // Iterate in reverse (lowest precedence first) so higher precedence overwrites
    for parsed in configs.iter().rev() {
        if let Some(ref parser) = parsed.config.parser {
            apply_raw_parser(&mut result, parser);
        }
    }

    result
}

/// Applies raw parser settings to result, overwriting any present values.
fn apply_raw_parser(result: &mut ParserSettings, raw: &RawParserSettings) {
    if let Some(v) = raw.max_depth {
        result.max_depth = v;
    }
    if let Some(ref v) = raw.stopwords {
        result.stopwords = Some(v.clone());
    }
}

/// Takes the field list from the closest config that defines one.
fn merge_schema_settings(configs: &[ParsedConfig]) -> SchemaSettings {
    let fields = configs
        .iter()
        .find_map(|parsed| parsed.config.schema.as_ref()?.fields.clone())
        .unwrap_or_default();
    SchemaSettings { fields }
}

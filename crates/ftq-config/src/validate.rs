//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for potential issues.

use std::{collections::HashSet, fmt};

use ftq_query::{IndexSchema, MAX_DEPTH_LIMIT};

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No schema fields are defined, so every `@field` scope matches nothing.
    NoFieldsDefined,
    /// A field name appears more than once; only the first position is used.
    DuplicateField {
        /// The repeated field name.
        field: String,
    },
    /// More fields than a field mask can address.
    TooManyFields {
        /// Number of configured fields.
        count: usize,
        /// Maximum number of fields.
        limit: usize,
    },
    /// A nesting limit of zero rejects every non-empty query.
    ZeroMaxDepth,
    /// A nesting limit above what the parser accepts; the parser's cap applies instead.
    MaxDepthTooLarge {
        /// Configured limit.
        value: usize,
        /// The parser's cap.
        limit: usize,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFieldsDefined => write!(f, "no schema fields are defined in configuration"),
            Self::DuplicateField { field } => {
                write!(f, "schema field '{field}' is defined more than once")
            }
            Self::TooManyFields { count, limit } => {
                write!(f, "schema has {count} fields, at most {limit} are supported")
            }
            Self::ZeroMaxDepth => write!(f, "parser max_depth is 0, every query will fail"),
            Self::MaxDepthTooLarge { value, limit } => {
                write!(f, "parser max_depth is {value}, queries are capped at {limit}")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.parser.max_depth == 0 {
        warnings.push(ConfigWarning::ZeroMaxDepth);
    } else if config.parser.max_depth > MAX_DEPTH_LIMIT {
        warnings.push(ConfigWarning::MaxDepthTooLarge {
            value: config.parser.max_depth,
            limit: MAX_DEPTH_LIMIT,
        });
    }

    let fields = &config.schema.fields;
    if fields.is_empty() {
        warnings.push(ConfigWarning::NoFieldsDefined);
        return warnings;
    }

    if fields.len() > IndexSchema::MAX_FIELDS {
        warnings.push(ConfigWarning::TooManyFields {
            count: fields.len(),
            limit: IndexSchema::MAX_FIELDS,
        });
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for field in fields {
        if !seen.insert(field.as_str()) && reported.insert(field.as_str()) {
            warnings.push(ConfigWarning::DuplicateField {
                field: field.clone(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParserSettings, SchemaSettings};

    fn config_with_fields(fields: &[&str]) -> Config {
        Config {
            schema: SchemaSettings {
                fields: fields.iter().map(ToString::to_string).collect(),
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_empty_config() {
        let warnings = validate_config(&Config::default());
        assert_eq!(warnings, vec![ConfigWarning::NoFieldsDefined]);
    }

    #[test]
    fn test_validate_valid_config() {
        let warnings = validate_config(&config_with_fields(&["title", "body"]));
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_validate_duplicate_fields_reported_once() {
        let warnings = validate_config(&config_with_fields(&["title", "body", "title", "title"]));
        assert_eq!(
            warnings,
            vec![ConfigWarning::DuplicateField {
                field: "title".into()
            }]
        );
    }

    #[test]
    fn test_validate_too_many_fields() {
        let names: Vec<String> = (0..70).map(|i| format!("f{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let warnings = validate_config(&config_with_fields(&refs));
        assert_eq!(
            warnings,
            vec![ConfigWarning::TooManyFields {
                count: 70,
                limit: 64
            }]
        );
    }

    #[test]
    fn test_validate_zero_max_depth() {
        let config = Config {
            parser: ParserSettings {
                max_depth: 0,
                stopwords: None,
            },
            ..config_with_fields(&["title"])
        };
        assert_eq!(validate_config(&config), vec![ConfigWarning::ZeroMaxDepth]);
    }

    #[test]
    fn test_validate_max_depth_over_cap() {
        let config = Config {
            parser: ParserSettings {
                max_depth: 1_000_000,
                stopwords: None,
            },
            ..config_with_fields(&["title"])
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigWarning::MaxDepthTooLarge {
                value: 1_000_000,
                limit: MAX_DEPTH_LIMIT
            }]
        );

        let at_cap = Config {
            parser: ParserSettings {
                max_depth: MAX_DEPTH_LIMIT,
                stopwords: None,
            },
            ..config_with_fields(&["title"])
        };
        assert!(validate_config(&at_cap).is_empty());
    }

    #[test]
    fn test_warning_display() {
        assert_eq!(
            ConfigWarning::DuplicateField {
                field: "body".into()
            }
            .to_string(),
            "schema field 'body' is defined more than once"
        );
        assert_eq!(
            ConfigWarning::NoFieldsDefined.to_string(),
            "no schema fields are defined in configuration"
        );
    }
}

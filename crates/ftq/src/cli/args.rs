//! Clap argument definitions for the `ftq` CLI.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "ftq", version)]
#[command(about = "Inspect, tokenize and parse full-text search queries")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for `ftq parse`.
#[derive(Args, Debug, Clone)]
pub struct ParseCommand {
    /// Query to parse
    pub query: String,

    /// Schema field, in index order; replaces the configured schema (repeatable)
    #[arg(short = 'f', long = "field", value_name = "NAME")]
    pub fields: Vec<String>,

    /// Output the tree as JSON
    #[arg(long)]
    pub json: bool,

    /// Log every consumed token and reduced production to stderr
    #[arg(long)]
    pub trace: bool,

    /// Maximum nesting depth of the query, at most 128 [default: 100]
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

/// Arguments for `ftq tokens`.
#[derive(Args, Debug, Clone)]
pub struct TokensCommand {
    /// Query to tokenize
    pub query: String,

    /// Output tokens as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `ftq init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.ftq.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `ftq` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Parse a query and print its tree
    #[command(after_help = "\
QUERY SYNTAX:
  a b               Both expressions (intersection)
  a|b               Either expression (union)
  -a                Expression must NOT match
  ~a b              Optional up to ) or the end, affects ranking only
  \"a b\"             Exact phrase
  hel*              Prefix
  (a|b) c           Grouping

FIELD QUERIES:
  @title:a          Restrict to a field
  @title|body:a     Restrict to several fields
  @tags:{a, b c}    Tag values
  @price:[10 (20]   Numeric range, ( excludes the bound
  @loc:[lon lat r km]
                    Geo radius in m, km, mi or ft

EXAMPLES:
  ftq parse 'rust async'
  ftq parse '@title:guide (rust|golang) -deprecated'
  ftq parse -f title -f tags '@tags:{web, cli}' --json
  ftq parse '(a|b) c' --trace")]
    Parse(ParseCommand),

    /// Show the tokens of a query
    Tokens(TokensCommand),

    /// List the grammar productions
    Grammar,

    /// Initialize ftq configuration in current directory
    Init(InitCommand),

    /// Show configuration files and effective settings
    Config,

    /// Validate configuration and diagnose issues
    Check,
}

impl Commands {
    /// Returns true if the command reads the merged configuration.
    ///
    /// `init` and `grammar` must work even when an existing config file is invalid.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Self::Init(_) | Self::Grammar)
    }

    /// Returns true if parser events should be logged.
    pub fn traces_parser(&self) -> bool {
        matches!(self, Self::Parse(cmd) if cmd.trace)
    }
}

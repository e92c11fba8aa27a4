//! Command-line argument definitions for the ciyaml CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the configuration to check, the
//! configuration file, the report format and logging verbosity.

use clap::{Parser, ValueEnum};

/// How findings are written to standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Annotated source snippets.
    #[default]
    Human,
    /// One JSON document listing every diagnostic.
    Json,
}

/// Command-line arguments for the ciyaml checker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the pipeline configuration
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["ciyaml", ".circleci/config.yml"]);

        assert_eq!(args.input, ".circleci/config.yml");
        assert_eq!(args.config, None);
        assert_eq!(args.format, OutputFormat::Human);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_json_format() {
        let args = Args::parse_from([
            "ciyaml",
            "--format",
            "json",
            "-c",
            "ciyaml.toml",
            "config.yml",
        ]);

        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.config.as_deref(), Some("ciyaml.toml"));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Args::try_parse_from(["ciyaml"]).is_err());
    }
}

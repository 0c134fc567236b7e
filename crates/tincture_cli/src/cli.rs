//! Command-line interface for `tincture`.
//!
//! # Examples
//!
//! ```bash
//! # Check a theme file, failing on warnings too
//! tincture validate ocean.toml --strict
//!
//! # Contrast report
//! tincture score ocean.json
//!
//! # CSS custom properties for the merged and repaired theme
//! tincture vars ocean.yaml > theme.css
//!
//! # Engine settings from a file, debug logging as JSON
//! tincture --config tincture.toml -vv --log-json vars ocean.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tincture::ValidationOptions;

/// Validate, score, and render themes.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tincture",
    author,
    version,
    about = "Validate, score, and render themes",
    long_about = "Theme engine front end. Theme files may be JSON, TOML or YAML; \
                  the format is chosen by file extension."
)]
pub struct Cli {
    /// Engine configuration file (JSON, TOML or YAML)
    #[arg(long, short = 'c', global = true, env = "TINCTURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate a theme file and print its issues
    Validate(ValidateArgs),

    /// Print the accessibility report and health grade of a theme
    Score(ThemeArgs),

    /// Print the theme as CSS custom properties
    Vars(ThemeArgs),

    /// Print the short-key form of a complete theme
    Compress(ThemeArgs),

    /// Expand a short-key theme back to its full form
    Decompress(ThemeArgs),

    /// List the themes stored in a directory
    List(ListArgs),

    /// Print the built-in default theme
    Default,
}

/// A theme file argument.
#[derive(Parser, Debug, Clone)]
pub struct ThemeArgs {
    /// Theme file
    pub file: PathBuf,
}

/// Arguments for `validate`.
#[derive(Parser, Debug, Clone)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "CLI flags are naturally bools"
)]
pub struct ValidateArgs {
    /// Theme file
    pub file: PathBuf,

    /// Treat every non-harmony warning as an error
    #[arg(long)]
    pub strict: bool,

    /// Missing metadata fields are errors
    #[arg(long)]
    pub require_all_fields: bool,

    /// Skip the contrast checks
    #[arg(long)]
    pub no_accessibility: bool,

    /// Skip CSS value checks
    #[arg(long)]
    pub no_css: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    /// Apply the flags on top of configured options.
    pub fn options(&self, base: &ValidationOptions) -> ValidationOptions {
        ValidationOptions {
            strict: base.strict || self.strict,
            require_all_fields: base.require_all_fields || self.require_all_fields,
            check_accessibility: base.check_accessibility && !self.no_accessibility,
            validate_css: base.validate_css && !self.no_css,
        }
    }
}

/// Arguments for `list`.
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Directory holding one JSON file per theme
    pub dir: PathBuf,
}

impl Cli {
    /// Parse command line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter directive for the requested verbosity, if any.
    ///
    /// `None` means `RUST_LOG` decides, falling back to `warn`.
    #[must_use]
    pub const fn log_directive(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_validate_flags() {
        let cli = Cli::try_parse_from([
            "tincture",
            "validate",
            "theme.json",
            "--strict",
            "--no-css",
        ])
        .unwrap();

        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.file, PathBuf::from("theme.json"));
        let options = args.options(&ValidationOptions::default());
        assert!(options.strict);
        assert!(!options.validate_css);
        assert!(options.check_accessibility);
        assert!(!options.require_all_fields);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tincture", "default", "-vv", "--log-json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert_eq!(cli.log_directive(), Some("debug"));
    }

    #[test]
    fn test_default_verbosity_defers_to_env() {
        let cli = Cli::try_parse_from(["tincture", "default"]).unwrap();
        assert_eq!(cli.log_directive(), None);
    }

    #[test]
    fn test_flags_cannot_loosen_config() {
        let cli = Cli::try_parse_from(["tincture", "validate", "t.toml"]).unwrap();
        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        let base = ValidationOptions {
            strict: true,
            ..Default::default()
        };
        assert!(args.options(&base).strict);
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["tincture"]).is_err());
    }
}

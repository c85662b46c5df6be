//! scs-validate CLI tool.
//!
//! Usage:
//! ```bash
//! scs-validate [OPTIONS] [FILES]...
//! scs-validate --bundle context/bundle.yaml [--strict] [--output json]
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod schema_dir;

use schema_dir::SetupError;

/// Exit code when neither files nor a bundle were given.
const EXIT_NO_INPUT: u8 = 3;
/// Exit code when the schema directory cannot be located.
const EXIT_NO_SCHEMA_DIR: u8 = 4;
/// Exit code for any other setup or runtime failure.
const EXIT_INTERNAL: u8 = 5;

/// Validate SCS documents and bundles
#[derive(Parser)]
#[command(name = "scs-validate")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:
  scs-validate context/meta/roles.yaml
  scs-validate context/meta/*.yaml
  scs-validate --bundle context/bundle.yaml --strict
  scs-validate --bundle context/bundle.yaml --output json")]
pub struct Cli {
    /// SCD files to validate
    files: Vec<PathBuf>,

    /// Validate an SCD bundle file
    #[arg(short, long)]
    bundle: Option<PathBuf>,

    /// Directory containing JSON schema files (default: ./schema)
    #[arg(short, long, env = "SCS_SCHEMA_DIR")]
    schema_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Fail on warnings (exit code 2)
    #[arg(long)]
    strict: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Skip completeness validation for project bundles
    #[arg(long)]
    skip_completeness: bool,

    /// Path to custom completeness rules file
    #[arg(long)]
    completeness_rules: Option<PathBuf>,
}

/// Output format for validation reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

impl From<OutputFormat> for scs_validator_core::ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match commands::validate::run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            if cli.verbose {
                eprintln!("Error: {e:?}");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Maps a failed run to its exit code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<SetupError>().is_some() {
        EXIT_NO_SCHEMA_DIR
    } else {
        EXIT_INTERNAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bundle_flags() {
        let cli = Cli::try_parse_from([
            "scs-validate",
            "-b",
            "bundle.yaml",
            "-o",
            "json",
            "--strict",
            "--skip-completeness",
        ])
        .unwrap();
        assert_eq!(cli.bundle, Some(PathBuf::from("bundle.yaml")));
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(cli.strict && cli.skip_completeness);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn parses_positional_files() {
        let cli = Cli::try_parse_from(["scs-validate", "a.yaml", "b.yaml", "--no-color"]).unwrap();
        assert_eq!(cli.files.len(), 2);
        assert!(cli.no_color);
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn setup_errors_map_to_their_own_code() {
        let err = anyhow::Error::new(SetupError::SchemaDirNotFound {
            path: PathBuf::from("schema"),
        });
        assert_eq!(exit_code_for(&err), EXIT_NO_SCHEMA_DIR);

        let wrapped = err.context("while starting up");
        assert_eq!(exit_code_for(&wrapped), EXIT_NO_SCHEMA_DIR);

        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), EXIT_INTERNAL);
    }

    #[test]
    fn rejects_unknown_output_format() {
        assert!(Cli::try_parse_from(["scs-validate", "-o", "xml", "a.yaml"]).is_err());
    }
}

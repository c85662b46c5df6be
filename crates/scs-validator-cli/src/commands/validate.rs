//! Validate command implementation.

use anyhow::{Context, Result};
use clap::CommandFactory;
use scs_validator_core::{exit_code, Pipeline, Reporter, RulesLoader};

use crate::schema_dir;
use crate::{Cli, EXIT_NO_INPUT};

/// Runs validation and prints the report. Returns the process exit code.
pub fn run(cli: &Cli) -> Result<u8> {
    if cli.bundle.is_none() && cli.files.is_empty() {
        eprintln!("Error: No files or bundle specified\n");
        eprintln!("{}", Cli::command().render_help());
        return Ok(EXIT_NO_INPUT);
    }

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let schema_dir = schema_dir::locate(&cwd, cli.schema_dir.as_deref())?;

    let mut rules = RulesLoader::new().context("Failed to load built-in rules")?;
    if let Some(path) = &cli.completeness_rules {
        rules = rules
            .with_completeness_rules(path)
            .with_context(|| format!("Failed to load completeness rules: {}", path.display()))?;
    }

    let pipeline = Pipeline::builder()
        .rules(rules)
        .schema_dir(schema_dir)
        .build()
        .context("Failed to build validation pipeline")?;

    let results = if let Some(bundle) = &cli.bundle {
        pipeline.validate_bundle(bundle, cli.skip_completeness)
    } else {
        tracing::info!("Validating {} file(s)", cli.files.len());
        pipeline.validate_files(&cli.files)
    };

    let report = Reporter::new(!cli.no_color)
        .render(&results, env!("CARGO_PKG_VERSION"), cli.strict, cli.output.into())
        .context("Failed to render report")?;
    println!("{}", report.trim_end());

    Ok(exit_code(&results, cli.strict))
}

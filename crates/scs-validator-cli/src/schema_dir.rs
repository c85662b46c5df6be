//! Schema directory resolution with per-user fallback.
//!
//! Resolves the schema directory using a deterministic priority order:
//!
//! 1. `--schema-dir` flag (or `SCS_SCHEMA_DIR`)
//! 2. `./schema` in the working directory
//! 3. `$SCS_VALIDATOR_HOME/schema`, else `~/.scs-validator/schema`
//! 4. Not found → [`SetupError::SchemaDirNotFound`]

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Setup failures with a dedicated exit code.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No schema directory could be located.
    #[error("Schema directory not found: {}\nUse --schema-dir to specify the location", path.display())]
    SchemaDirNotFound {
        /// Directory that was looked for.
        path: PathBuf,
    },
}

/// Where the schema directory was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Explicitly specified via `--schema-dir`.
    Explicit(PathBuf),
    /// Found in the working directory.
    Project(PathBuf),
    /// Found in the per-user directory.
    Global(PathBuf),
    /// Nothing found; holds the working-directory candidate.
    Missing(PathBuf),
}

impl SchemaSource {
    /// Returns the resolved (or expected) directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) | Self::Missing(p) => p,
        }
    }
}

/// Directory name looked up under the working and per-user directories.
const SCHEMA_DIR_NAME: &str = "schema";

/// Resolves the schema directory and checks that it exists.
///
/// # Errors
///
/// Returns [`SetupError::SchemaDirNotFound`] if the chosen directory does not
/// exist.
pub fn locate(cwd: &Path, explicit: Option<&Path>) -> Result<PathBuf, SetupError> {
    let source = resolve_inner(cwd, explicit, global_dir());
    let path = source.path();
    if matches!(source, SchemaSource::Missing(_)) || !path.is_dir() {
        return Err(SetupError::SchemaDirNotFound {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!("Using schema directory {}", path.display());
    Ok(path.to_path_buf())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(cwd: &Path, explicit: Option<&Path>, global_dir: Option<PathBuf>) -> SchemaSource {
    if let Some(p) = explicit {
        return SchemaSource::Explicit(p.to_path_buf());
    }

    let project = cwd.join(SCHEMA_DIR_NAME);
    if project.is_dir() {
        return SchemaSource::Project(project);
    }

    if let Some(dir) = global_dir {
        let candidate = dir.join(SCHEMA_DIR_NAME);
        if candidate.is_dir() {
            return SchemaSource::Global(candidate);
        }
    }

    SchemaSource::Missing(project)
}

/// Returns the per-user validator directory.
///
/// Resolution: `$SCS_VALIDATOR_HOME` > `~/.scs-validator/`
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SCS_VALIDATOR_HOME") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".scs-validator"))
}

/*============================================================
  Synvera Project: Syn-Apk
  Module: synapk_probe::error
  Etiquette: Synvera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Apk probe error types to provide consistent
    diagnostics and exit semantics.

  Security / Safety Notes:
    Error contexts carry command names and reason strings only;
    no package payload data is embedded in errors.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate cycle failures and
    consolidate exit codes for the binary entry point.

  Revision History:
    2026-07-28 COD  Established shared error definitions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-Apk probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Enumerates high-level error domains surfaced by the probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Database: {0}")]
    Database(String),
    #[error("Solver: {0}")]
    Solver(String),
    #[error("Metadata: {0}")]
    Metadata(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProbeError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ProbeError::CommandMissing { .. } => ExitCode::from(10),
            ProbeError::Config(_) => ExitCode::from(20),
            ProbeError::Database(_) => ExitCode::from(30),
            ProbeError::Solver(_) => ExitCode::from(31),
            ProbeError::Metadata(_) => ExitCode::from(32),
            ProbeError::Filesystem(_) => ExitCode::from(40),
            ProbeError::Io(_) => ExitCode::from(41),
            ProbeError::Runtime(_) => ExitCode::from(50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ExitCode carries no PartialEq; compare the Debug renderings.
    fn code_of(err: &ProbeError) -> String {
        format!("{:?}", err.exit_code())
    }

    #[test]
    fn exit_codes_are_stable_per_category() {
        assert_eq!(
            code_of(&ProbeError::Database("failed to open apk database".into())),
            format!("{:?}", ExitCode::from(30))
        );
        assert_eq!(
            code_of(&ProbeError::Solver("solver returned errors".into())),
            format!("{:?}", ExitCode::from(31))
        );
        assert_eq!(
            code_of(&ProbeError::Metadata("unable to set value metadata".into())),
            format!("{:?}", ExitCode::from(32))
        );
    }

    #[test]
    fn categories_render_with_their_domain_prefix() {
        assert!(ProbeError::Config("bad toml".into())
            .to_string()
            .starts_with("Configuration:"));
        assert!(ProbeError::Solver("unsatisfiable world".into())
            .to_string()
            .starts_with("Solver:"));
    }

    #[test]
    fn missing_command_names_the_binary() {
        let err = ProbeError::CommandMissing {
            command: "apk".into(),
        };
        assert!(err.to_string().contains("`apk`"));
        assert_eq!(code_of(&err), format!("{:?}", ExitCode::from(10)));
    }
}

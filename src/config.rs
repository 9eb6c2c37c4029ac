/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load and validate Syn-Apk probe configuration from TOML,
    supplying defaults for unattended operation.

  Security / Safety Notes:
    Configuration is read from operator-controlled paths only;
    values are never executed, only passed as command flags.

  Dependencies:
    serde + toml for parsing, dirs for platform paths.

  Operational Scope:
    Consumed once at startup by the runner; the resulting
    configuration is immutable for the process lifetime.

  Revision History:
    2026-07-28 COD  Authored probe configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit defaults for every tunable
    - Deterministic precedence: CLI over file over default
    - Recoverable absence, fatal malformation
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ProbeError, Result};

/// Top-level configuration document for the Syn-Apk probe.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub probe: ProbeSection,
    pub apk: ApkSection,
}

/// Measurement and cycle tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeSection {
    /// Metric plugin instance name. Fixed to `upgradable` by default;
    /// consumers key on this spelling.
    pub instance: String,
    /// Path of the os-release descriptor consulted each cycle.
    pub os_release_path: PathBuf,
    /// Seconds between cycles when running as a scheduler; 0 = one-shot.
    pub interval_secs: u64,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            instance: "upgradable".to_string(),
            os_release_path: PathBuf::from("/etc/os-release"),
            interval_secs: 0,
        }
    }
}

/// External solver invocation tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApkSection {
    /// Solver executable name or path.
    pub program: String,
    /// Alternate installation root handed to the solver (`--root`).
    pub root: Option<PathBuf>,
    /// Resolve against fresh index data rather than the on-disk cache.
    pub no_cache: bool,
    /// Guarantee no filesystem mutation by the solver.
    pub simulate: bool,
}

impl Default for ApkSection {
    fn default() -> Self {
        Self {
            program: "apk".to_string(),
            root: None,
            no_cache: true,
            simulate: true,
        }
    }
}

impl ProbeConfig {
    /// Load configuration from an explicit path, or from the default
    /// location when none is given. An explicit path must exist and parse;
    /// an absent default location yields built-in defaults.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::load_from_file(explicit),
            None => match Self::default_path() {
                Some(default_path) if default_path.exists() => {
                    Self::load_from_file(&default_path)
                }
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ProbeError::Config(format!(
                "Failed to read configuration {}: {err}",
                path.display()
            ))
        })?;
        toml::from_str(&raw).map_err(|err| {
            ProbeError::Config(format!(
                "Failed to parse configuration {}: {err}",
                path.display()
            ))
        })
    }

    /// Default configuration file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("synapk").join("config.toml"))
    }

    /// Directory receiving session log files.
    pub fn log_dir(&self) -> PathBuf {
        dirs::state_dir()
            .map(|dir| dir.join("synapk").join("logs"))
            .unwrap_or_else(|| PathBuf::from("/var/tmp/synapk/logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_unattended_operation() {
        let config = ProbeConfig::default();
        assert_eq!(config.probe.instance, "upgradable");
        assert_eq!(config.probe.os_release_path, PathBuf::from("/etc/os-release"));
        assert_eq!(config.probe.interval_secs, 0);
        assert_eq!(config.apk.program, "apk");
        assert!(config.apk.root.is_none());
        assert!(config.apk.no_cache);
        assert!(config.apk.simulate);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[probe]\ninterval_secs = 300\n\n[apk]\nroot = \"/mnt/alpine\""
        )
        .unwrap();

        let config = ProbeConfig::load_from_optional_path(Some(&path)).unwrap();
        assert_eq!(config.probe.interval_secs, 300);
        assert_eq!(config.probe.instance, "upgradable");
        assert_eq!(config.apk.root, Some(PathBuf::from("/mnt/alpine")));
        assert_eq!(config.apk.program, "apk");
    }

    #[test]
    fn explicit_missing_path_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = ProbeConfig::load_from_optional_path(Some(&path)).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[probe\ninstance=").unwrap();
        let err = ProbeConfig::load_from_optional_path(Some(&path)).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }
}

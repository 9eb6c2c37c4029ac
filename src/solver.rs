/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::solver
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Interface with the external apk solver to open the local
    package database session and resolve the upgrade changeset.

  Security / Safety Notes:
    Executes the apk binary with user privileges only; the
    session is read-only and never commits filesystem changes.

  Dependencies:
    tokio::process for async command execution.

  Operational Scope:
    Supplies the changeset collector with solver-ordered
    proposed changes; one session per probe cycle.

  Revision History:
    2026-07-28 COD  Crafted apk solver integration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Structured parsing with clear failure modes
    - Contract breaches fail hard, never degrade silently
============================================================*/

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::change::{PackageChange, PackageDescriptor};
use crate::config::ApkSection;
use crate::error::{ProbeError, Result};
use crate::logger::Logger;

/// Immutable solver configuration captured at probe registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverFlags {
    /// Resolve against fresh index data; cached indexes may be stale and
    /// refreshing them would require elevated privilege.
    pub no_cache: bool,
    /// No filesystem mutation. The listing resolution is intrinsically
    /// read-only; the flag is carried so registration states the contract.
    pub simulate: bool,
}

/// The solver's complete output for one cycle: every package it considered
/// changing, in solver order, not yet filtered to real upgrades.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    pub changes: Vec<PackageChange>,
}

/// Factory seam for the external package database collaborator.
pub trait PackageBackend {
    type Session: DatabaseSession;

    /// Open a database session. Failure is a Database error carrying the
    /// underlying reason; nothing is left to release on failure.
    fn open(
        &self,
        flags: &SolverFlags,
        logger: &Logger,
    ) -> impl std::future::Future<Output = Result<Self::Session>>;
}

/// One opened database session. Must be closed exactly once; the probe
/// driver owns that discipline.
pub trait DatabaseSession {
    /// Request the "upgrade" resolution over the installed world.
    fn resolve_upgrade(
        &mut self,
        logger: &Logger,
    ) -> impl std::future::Future<Output = Result<Changeset>>;

    /// Release the session. A second close is a Runtime error.
    fn close(&mut self) -> Result<()>;
}

/// Production backend: drives the apk command-line solver.
pub struct ApkCli {
    program: String,
    root: Option<PathBuf>,
}

impl ApkCli {
    pub fn new(section: &ApkSection) -> Self {
        Self {
            program: section.program.clone(),
            root: section.root.clone(),
        }
    }
}

impl PackageBackend for ApkCli {
    type Session = ApkSession;

    async fn open(&self, flags: &SolverFlags, logger: &Logger) -> Result<ApkSession> {
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("/"));
        let installed_db = root.join("lib/apk/db/installed");
        if !installed_db.exists() {
            return Err(ProbeError::Database(format!(
                "failed to open apk database: {} not found",
                installed_db.display()
            )));
        }
        logger.debug(
            "DBOPEN",
            format!(
                "package database present at {} (no_cache={} simulate={})",
                installed_db.display(),
                flags.no_cache,
                flags.simulate
            ),
        );
        Ok(ApkSession {
            program: self.program.clone(),
            root: self.root.clone(),
            flags: *flags,
            closed: false,
        })
    }
}

/// An open apk database session bound to one probe cycle.
#[derive(Debug)]
pub struct ApkSession {
    program: String,
    root: Option<PathBuf>,
    flags: SolverFlags,
    closed: bool,
}

impl DatabaseSession for ApkSession {
    async fn resolve_upgrade(&mut self, logger: &Logger) -> Result<Changeset> {
        if self.closed {
            return Err(ProbeError::Runtime(
                "upgrade resolution requested on a closed database session".into(),
            ));
        }

        let mut args: Vec<String> = Vec::new();
        if self.flags.no_cache {
            args.push("--no-cache".into());
        }
        if let Some(root) = &self.root {
            args.push("--root".into());
            args.push(root.display().to_string());
        }
        args.push("list".into());
        args.push("--upgradable".into());

        let output = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| map_spawn_error(err, &self.program))?;

        let stderr_text = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(ProbeError::Solver(format!(
                "`{} {}` exited with status {}: {}",
                self.program,
                args.join(" "),
                output.status.code().unwrap_or(-1),
                stderr_text.trim()
            )));
        }

        // Diagnostics of a successful run still reach the operator via the
        // injected logging sink.
        for line in stderr_text.lines() {
            logger.route_solver_line(line);
        }

        let stdout = String::from_utf8(output.stdout).map_err(|err| {
            ProbeError::Solver(format!("solver listing emitted invalid UTF-8: {err}"))
        })?;

        let mut changes = Vec::new();
        for line in stdout.lines() {
            if let Some(change) = parse_listing_line(line)? {
                changes.push(change);
            }
        }
        Ok(Changeset { changes })
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(ProbeError::Runtime("database session closed twice".into()));
        }
        self.closed = true;
        Ok(())
    }
}

const UPGRADE_MARKER: &str = "[upgradable from: ";

/// Parse one listing line of the form
/// `name-newver arch {origin} (license) [upgradable from: name-oldver]`
/// into a proposed change with both sides present. Lines without the
/// upgrade marker are not change entries and yield `None`. A line that
/// claims to be upgradable but lacks identity fields breaks the solver
/// contract and fails the cycle.
fn parse_listing_line(line: &str) -> Result<Option<PackageChange>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(marker) = trimmed.find(UPGRADE_MARKER) else {
        return Ok(None);
    };

    let head = trimmed[..marker].trim_end();
    let tail = &trimmed[marker + UPGRADE_MARKER.len()..];
    let old_token = tail
        .trim_end()
        .strip_suffix(']')
        .ok_or_else(|| contract_error(trimmed, "unterminated upgrade marker"))?;

    let new_token = head
        .split_whitespace()
        .next()
        .ok_or_else(|| contract_error(trimmed, "missing package token"))?;

    let origin = head
        .find('{')
        .and_then(|start| {
            head[start + 1..]
                .find('}')
                .map(|len| &head[start + 1..start + 1 + len])
        })
        .ok_or_else(|| contract_error(trimmed, "missing origin"))?;
    if origin.is_empty() {
        return Err(contract_error(trimmed, "empty origin"));
    }

    let (new_name, new_version) = split_package_token(new_token)
        .ok_or_else(|| contract_error(trimmed, "unparseable candidate token"))?;
    let (old_name, old_version) = split_package_token(old_token.trim())
        .ok_or_else(|| contract_error(trimmed, "unparseable installed token"))?;
    if old_name != new_name {
        return Err(contract_error(trimmed, "installed and candidate names disagree"));
    }

    Ok(Some(PackageChange {
        old: Some(PackageDescriptor {
            name: old_name,
            origin: origin.to_string(),
            version: old_version,
        }),
        new: Some(PackageDescriptor {
            name: new_name,
            origin: origin.to_string(),
            version: new_version,
        }),
    }))
}

/// Split `name-1.2.3-r0` into name and version. The version spans the last
/// two `-` separated segments (upstream version plus release).
fn split_package_token(token: &str) -> Option<(String, String)> {
    let release_sep = token.rfind('-')?;
    let version_sep = token[..release_sep].rfind('-')?;
    let name = &token[..version_sep];
    let version = &token[version_sep + 1..];
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

fn contract_error(line: &str, reason: &str) -> ProbeError {
    ProbeError::Solver(format!(
        "solver listing violated contract ({reason}): {line}"
    ))
}

fn map_spawn_error(err: io::Error, command: &str) -> ProbeError {
    if err.kind() == io::ErrorKind::NotFound {
        ProbeError::CommandMissing {
            command: command.into(),
        }
    } else {
        ProbeError::Runtime(format!("Failed to spawn {command}: {err}"))
    }
}

/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::probe
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Orchestrate one full measurement cycle: open the database
    session, collect upgrades, assemble the payload, dispatch
    the gauge, and release the session on every path.

  Security / Safety Notes:
    The cycle is read-only end to end; dispatch targets are
    operator-controlled sinks.

  Dependencies:
    Solver seam, changeset collector, payload serializer,
    serde_json for the stdout sink line.

  Operational Scope:
    Registered once at startup; the read cycle is invoked per
    scheduler tick. No state is carried between cycles.

  Revision History:
    2026-07-28 COD  Authored probe driver and stdout sink.
    2026-08-03 COD  Merged OS identity into the read cycle.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Database closed exactly once on every opened path
    - No measurement emitted for a failed cycle
    - Immutable solver flags captured at registration
============================================================*/

use std::path::PathBuf;

use serde::Serialize;

use crate::collect::collect_upgrades;
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::logger::Logger;
use crate::os_release::read_os_identity;
use crate::payload::MeasurementPayload;
use crate::solver::{DatabaseSession, PackageBackend, SolverFlags};

/// Plugin identifier attached to every dispatched measurement.
pub const PLUGIN_NAME: &str = "synapk";
/// Gauge type identifier; consumers key on it together with the instance.
pub const GAUGE_TYPE: &str = "count";

/// External measurement-dispatch seam. The probe hands over one gauge
/// value plus its serialized metadata per successful cycle.
pub trait MetricSink {
    fn dispatch_gauge(
        &self,
        instance: &str,
        type_name: &str,
        value: f64,
        meta: &str,
    ) -> Result<()>;
}

#[derive(Serialize)]
struct MeasurementLine<'a> {
    plugin: &'a str,
    plugin_instance: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    value: f64,
    meta: &'a str,
}

/// Production sink: one self-delimiting JSON line per measurement on
/// stdout, for the host agent to ingest.
pub struct StdoutSink;

impl MetricSink for StdoutSink {
    fn dispatch_gauge(
        &self,
        instance: &str,
        type_name: &str,
        value: f64,
        meta: &str,
    ) -> Result<()> {
        let line = MeasurementLine {
            plugin: PLUGIN_NAME,
            plugin_instance: instance,
            type_name,
            value,
            meta,
        };
        let rendered = serde_json::to_string(&line).map_err(|err| {
            ProbeError::Metadata(format!("unable to encode measurement line: {err}"))
        })?;
        println!("{rendered}");
        Ok(())
    }
}

/// The registered probe: immutable configuration for every future cycle.
pub struct Probe {
    instance: String,
    os_release_path: PathBuf,
    flags: SolverFlags,
}

impl Probe {
    /// Capture solver flags and measurement identity once, at startup.
    pub fn register(config: &ProbeConfig, logger: &Logger) -> Self {
        let flags = SolverFlags {
            no_cache: config.apk.no_cache,
            simulate: config.apk.simulate,
        };
        logger.info(
            "REGISTER",
            format!(
                "registering probe {PLUGIN_NAME} {} (instance={})",
                env!("CARGO_PKG_VERSION"),
                config.probe.instance
            ),
        );
        Self {
            instance: config.probe.instance.clone(),
            os_release_path: config.probe.os_release_path.clone(),
            flags,
        }
    }

    /// Run one full measurement cycle. The database session, once opened,
    /// is closed exactly once on every path out of this function; a failed
    /// cycle emits no measurement.
    pub async fn read_cycle<B, S>(&self, backend: &B, sink: &S, logger: &Logger) -> Result<()>
    where
        B: PackageBackend,
        S: MetricSink,
    {
        logger.debug("CYCLE", "read cycle starting");

        let mut session = match backend.open(&self.flags, logger).await {
            Ok(session) => session,
            Err(err) => {
                logger.error("DBOPEN", format!("failed to open package database: {err}"));
                return Err(err);
            }
        };

        let summary = match collect_upgrades(&mut session, logger).await {
            Ok(summary) => summary,
            Err(err) => {
                logger.error("SOLVE", format!("upgrade resolution failed: {err}"));
                close_quietly(&mut session, logger);
                return Err(err);
            }
        };

        // Identity read failure degrades to empty fields inside the reader.
        let identity = read_os_identity(&self.os_release_path, logger);
        let payload = MeasurementPayload::assemble(summary, identity);
        let serialized = match payload.to_json() {
            Ok(serialized) => serialized,
            Err(err) => {
                logger.error("META", format!("payload assembly failed: {err}"));
                close_quietly(&mut session, logger);
                return Err(err);
            }
        };

        logger.info("PAYLOAD", format!("packages = {serialized}"));

        if let Err(err) =
            sink.dispatch_gauge(&self.instance, GAUGE_TYPE, payload.count as f64, &serialized)
        {
            logger.error("EMIT", format!("measurement dispatch failed: {err}"));
            close_quietly(&mut session, logger);
            return Err(err);
        }

        session.close().map_err(|err| {
            logger.error("DBCLOSE", format!("database close failed: {err}"));
            err
        })?;

        logger.info(
            "CYCLE",
            format!("cycle complete: {} upgradable packages", payload.count),
        );
        Ok(())
    }
}

/// Close on a failure path: the original error is what propagates, so a
/// close failure here is logged and swallowed.
fn close_quietly<S: DatabaseSession>(session: &mut S, logger: &Logger) {
    if let Err(err) = session.close() {
        logger.error("DBCLOSE", format!("database close failed: {err}"));
    }
}

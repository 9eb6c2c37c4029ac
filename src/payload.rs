/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::payload
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Assemble the per-cycle measurement payload and serialize
    it into the compact metadata string attached to the
    emitted gauge.

  Security / Safety Notes:
    Payload carries package names and versions only; no host
    identifiers beyond distribution id/version.

  Dependencies:
    serde for JSON serialization.

  Operational Scope:
    Consumed by the probe driver between collection and
    dispatch; one payload per cycle, never persisted.

  Revision History:
    2026-07-28 COD  Authored payload serializer.
    2026-08-03 COD  Added OS identity enrichment fields.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible payloads
    - No omitted fields, even when empty
    - Self-delimiting structured text for transport safety
============================================================*/

use serde::{Deserialize, Serialize};

use crate::change::UpgradeRecord;
use crate::collect::UpgradeSummary;
use crate::error::{ProbeError, Result};
use crate::os_release::OsIdentity;

/// The full structure emitted for one cycle: count, the upgrade records in
/// collection order, and host distribution identity. Field names are a
/// wire contract with metadata consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementPayload {
    pub count: usize,
    pub packages: Vec<UpgradeRecord>,
    #[serde(rename = "os-id")]
    pub os_id: String,
    #[serde(rename = "os-version")]
    pub os_version: String,
}

impl MeasurementPayload {
    /// Take ownership of the cycle's summary and identity and build the
    /// payload. Record order is preserved as collected.
    pub fn assemble(summary: UpgradeSummary, identity: OsIdentity) -> Self {
        Self {
            count: summary.count,
            packages: summary.records,
            os_id: identity.id,
            os_version: identity.version_id,
        }
    }

    /// Serialize to one compact JSON string suitable as a metric metadata
    /// value. Failure here is a metadata construction error and fatal to
    /// the cycle.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|err| ProbeError::Metadata(format!("unable to set value metadata: {err}")))
    }
}

/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::collect
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Drive the solver session for one cycle and accumulate the
    real upgrades out of the proposed changeset.

  Security / Safety Notes:
    Consumes solver output only; performs no I/O of its own.

  Dependencies:
    Solver session seam and the change classifier.

  Operational Scope:
    Called once per probe cycle between database open and
    payload assembly.

  Revision History:
    2026-07-28 COD  Authored changeset collector.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Solver ordering preserved end to end
    - Changeset consumed and released within the cycle
    - Silent skip only for classified non-changes
============================================================*/

use crate::change::{classify_change, UpgradeRecord};
use crate::error::Result;
use crate::logger::Logger;
use crate::solver::DatabaseSession;

/// Accumulated result of one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeSummary {
    pub count: usize,
    pub records: Vec<UpgradeRecord>,
}

/// Request the upgrade resolution and filter the changeset down to real
/// upgrades, in the order the solver produced them. Solver failure
/// propagates untouched; the caller owns logging and session teardown.
pub async fn collect_upgrades<S: DatabaseSession>(
    session: &mut S,
    logger: &Logger,
) -> Result<UpgradeSummary> {
    let changeset = session.resolve_upgrade(logger).await?;

    let mut records = Vec::new();
    for change in changeset.changes {
        if let Some(record) = classify_change(&change) {
            logger.debug(
                "COLLECT",
                format!(
                    "{} {} -> {}",
                    record.name, record.old_version, record.new_version
                ),
            );
            records.push(record);
        }
    }

    Ok(UpgradeSummary {
        count: records.len(),
        records,
    })
}

/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::change
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structures describing solver-proposed package
    changes and the classification of real upgrades.

  Security / Safety Notes:
    Pure data containers and a pure classifier; no I/O is
    performed in this module.

  Dependencies:
    serde for the reportable record's wire contract.

  Operational Scope:
    Used by the solver adapter, the changeset collector, and
    the payload serializer to pass change data between stages.

  Revision History:
    2026-07-28 COD  Introduced change model and classifier.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Classification without mutation
    - Compact wire keys fixed for downstream consumers
============================================================*/

use serde::{Deserialize, Serialize};

/// Identity and version of one package on one side of a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub origin: String,
    pub version: String,
}

/// A transition proposed by the solver for one package name. Either side
/// may be absent: install-from-nothing and removal-to-nothing are valid
/// solver output, they are just never upgrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageChange {
    pub old: Option<PackageDescriptor>,
    pub new: Option<PackageDescriptor>,
}

/// The reportable projection of a real upgrade. Wire keys are a contract
/// with metadata consumers: `p` name, `o` origin, `v` installed version,
/// `w` candidate version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRecord {
    #[serde(rename = "p")]
    pub name: String,
    #[serde(rename = "o")]
    pub origin: String,
    #[serde(rename = "v")]
    pub old_version: String,
    #[serde(rename = "w")]
    pub new_version: String,
}

/// Decide whether `change` is a real upgrade. Returns `None` when either
/// side is absent or the versions are identical; otherwise projects the
/// identity from the installed side and both version strings.
pub fn classify_change(change: &PackageChange) -> Option<UpgradeRecord> {
    let (old, new) = match (&change.old, &change.new) {
        (Some(old), Some(new)) => (old, new),
        _ => return None,
    };
    if old.version == new.version {
        return None;
    }
    Some(UpgradeRecord {
        name: old.name.clone(),
        origin: old.origin.clone(),
        old_version: old.version.clone(),
        new_version: new.version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, origin: &str, version: &str) -> PackageDescriptor {
        PackageDescriptor {
            name: name.to_string(),
            origin: origin.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn real_upgrade_projects_exact_fields() {
        let change = PackageChange {
            old: Some(descriptor("curl", "curl", "8.0.0-r0")),
            new: Some(descriptor("curl", "curl", "8.1.0-r0")),
        };
        let record = classify_change(&change).unwrap();
        assert_eq!(record.name, "curl");
        assert_eq!(record.origin, "curl");
        assert_eq!(record.old_version, "8.0.0-r0");
        assert_eq!(record.new_version, "8.1.0-r0");
    }

    #[test]
    fn identical_versions_are_not_upgrades() {
        let change = PackageChange {
            old: Some(descriptor("musl", "musl", "1.2.5-r1")),
            new: Some(descriptor("musl", "musl", "1.2.5-r1")),
        };
        assert!(classify_change(&change).is_none());
    }

    #[test]
    fn absent_sides_are_not_upgrades() {
        let installed = descriptor("zlib", "zlib", "1.3-r2");
        let install_from_nothing = PackageChange {
            old: None,
            new: Some(installed.clone()),
        };
        let removal_to_nothing = PackageChange {
            old: Some(installed),
            new: None,
        };
        let neither = PackageChange {
            old: None,
            new: None,
        };
        assert!(classify_change(&install_from_nothing).is_none());
        assert!(classify_change(&removal_to_nothing).is_none());
        assert!(classify_change(&neither).is_none());
    }

    #[test]
    fn classification_does_not_mutate_input() {
        let change = PackageChange {
            old: Some(descriptor("busybox", "busybox", "1.36.1-r0")),
            new: Some(descriptor("busybox", "busybox", "1.36.1-r1")),
        };
        let before = change.clone();
        let _ = classify_change(&change);
        assert_eq!(change, before);
    }

    #[test]
    fn record_serializes_with_compact_keys() {
        let record = UpgradeRecord {
            name: "curl".into(),
            origin: "curl".into(),
            old_version: "8.0.0-r0".into(),
            new_version: "8.1.0-r0".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"p":"curl","o":"curl","v":"8.0.0-r0","w":"8.1.0-r0"}"#
        );
    }
}

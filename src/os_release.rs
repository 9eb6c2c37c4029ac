/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::os_release
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Read distribution identity (ID, VERSION_ID) from an
    os-release style KEY=value descriptor file.

  Security / Safety Notes:
    Read-only file access; values are length-bounded before
    they reach any payload.

  Dependencies:
    None beyond std; warnings route through the probe logger.

  Operational Scope:
    Invoked once per probe cycle to enrich the measurement
    payload. Identity is never cached across cycles.

  Revision History:
    2026-08-03 COD  Added OS identity enrichment.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Degraded output over failure for environment data
    - Bounded values with silent truncation
    - No mutation of external state
============================================================*/

use std::path::Path;

use crate::logger::Logger;

/// Longest accepted key in a `KEY=value` line.
pub const KEY_MAX: usize = 32;
/// Byte bound applied to extracted identity values.
pub const VALUE_MAX: usize = 64;

/// Distribution identity as reported by the os-release file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsIdentity {
    pub id: String,
    pub version_id: String,
}

/// Read the identity from `path`. A missing or unreadable file is a
/// recoverable condition: it is logged as a warning and yields empty
/// fields, never a cycle failure.
pub fn read_os_identity(path: &Path, logger: &Logger) -> OsIdentity {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_os_release(&text),
        Err(err) => {
            logger.warn(
                "OSID",
                format!(
                    "Failed to read {}: {err}; reporting empty identity",
                    path.display()
                ),
            );
            OsIdentity::default()
        }
    }
}

/// Scan os-release text for the two keys of interest. All other keys,
/// comments, and malformed lines are ignored.
pub fn parse_os_release(text: &str) -> OsIdentity {
    let mut identity = OsIdentity::default();
    for line in text.lines() {
        let Some((key, raw_value)) = split_assignment(line) else {
            continue;
        };
        match key {
            "ID" => identity.id = scan_value(raw_value),
            "VERSION_ID" => identity.version_id = scan_value(raw_value),
            _ => {}
        }
    }
    identity
}

/// Split a line at its assignment, accepting only `[A-Za-z0-9_]{1,KEY_MAX}`
/// keys after optional leading whitespace.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start();
    let eq = rest.find('=')?;
    let key = &rest[..eq];
    if key.is_empty() || key.len() > KEY_MAX {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    Some((key, &rest[eq + 1..]))
}

/// Extract a value token. Quoted tokens run to the matching quote (no
/// escape handling; an unterminated quote takes the rest of the line);
/// unquoted tokens end at whitespace, `;`, or end of line.
fn scan_value(raw: &str) -> String {
    match raw.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let body = &raw[quote.len_utf8()..];
            let end = body.find(quote).unwrap_or(body.len());
            truncate_to(&body[..end], VALUE_MAX)
        }
        _ => {
            let end = raw
                .find(|c: char| c.is_whitespace() || c == ';')
                .unwrap_or(raw.len());
            truncate_to(&raw[..end], VALUE_MAX)
        }
    }
}

/// Bound `value` to at most `max` bytes without splitting a character.
/// Truncation is silent; the bounded buffers never grow and never error.
fn truncate_to(value: &str, max: usize) -> String {
    if value.len() <= max {
        return value.to_string();
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_logger() -> Logger {
        Logger::new(None, false).unwrap()
    }

    #[test]
    fn parses_typical_alpine_descriptor() {
        let text = concat!(
            "NAME=\"Alpine Linux\"\n",
            "ID=alpine\n",
            "VERSION_ID=3.20.2\n",
            "PRETTY_NAME=\"Alpine Linux v3.20\"\n",
            "HOME_URL=\"https://alpinelinux.org/\"\n",
        );
        let identity = parse_os_release(text);
        assert_eq!(identity.id, "alpine");
        assert_eq!(identity.version_id, "3.20.2");
    }

    #[test]
    fn accepts_single_and_double_quotes() {
        let identity = parse_os_release("ID='debian'\nVERSION_ID=\"12\"\n");
        assert_eq!(identity.id, "debian");
        assert_eq!(identity.version_id, "12");
    }

    #[test]
    fn unterminated_quote_takes_rest_of_line() {
        let identity = parse_os_release("ID=\"alpine\n");
        assert_eq!(identity.id, "alpine");
    }

    #[test]
    fn unquoted_value_stops_at_whitespace_and_semicolon() {
        assert_eq!(parse_os_release("ID=alpine extra\n").id, "alpine");
        assert_eq!(parse_os_release("ID=alpine;edge\n").id, "alpine");
    }

    #[test]
    fn comments_and_foreign_keys_are_ignored() {
        let text = "# ID=commented\nANSI_COLOR=\"0;36\"\nBAD KEY=x\nID=alpine\n";
        let identity = parse_os_release(text);
        assert_eq!(identity.id, "alpine");
        assert_eq!(identity.version_id, "");
    }

    #[test]
    fn leading_whitespace_before_key_is_accepted() {
        assert_eq!(parse_os_release("   ID=alpine\n").id, "alpine");
    }

    #[test]
    fn overlong_key_is_skipped() {
        let key = "K".repeat(KEY_MAX + 1);
        let identity = parse_os_release(&format!("{key}=value\nID=alpine\n"));
        assert_eq!(identity.id, "alpine");
    }

    #[test]
    fn values_truncate_silently_at_bound() {
        let long = "x".repeat(VALUE_MAX + 20);
        let identity = parse_os_release(&format!("ID={long}\n"));
        assert_eq!(identity.id.len(), VALUE_MAX);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'ß' is two bytes; an odd bound must not split it.
        let value = "ß".repeat(VALUE_MAX);
        let identity = parse_os_release(&format!("ID={value}\n"));
        assert!(identity.id.len() <= VALUE_MAX);
        assert!(identity.id.chars().all(|c| c == 'ß'));
    }

    #[test]
    fn missing_file_yields_empty_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        let identity = read_os_identity(&path, &quiet_logger());
        assert_eq!(identity, OsIdentity::default());
    }

    #[test]
    fn file_read_matches_inline_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("os-release");
        std::fs::write(&path, "ID=alpine\nVERSION_ID=3.20.2\n").unwrap();
        let identity = read_os_identity(&path, &quiet_logger());
        assert_eq!(identity.id, "alpine");
        assert_eq!(identity.version_id, "3.20.2");
    }
}

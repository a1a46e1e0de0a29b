//! Parsing of `loginctl` output
//!
//! `loginctl show-*` prints one `Key=Value` pair per line. Values are typed
//! as follows:
//! - keys that name other objects become reference lists
//! - `yes` / `no` become booleans
//! - decimal integers become integers, unless the key is textual by nature
//! - everything else stays a string

use seat_inspect_api::{AttrValue, PropertyBag};
use seat_inspect_source_api::{SourceError, SourceResult};
use seat_inspect_util::{EntityId, EntityKind};
use tracing::debug;

/// Keys holding identifiers of other objects, per object kind
pub fn reference_keys(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Seat => &["Sessions", "ActiveSession"],
        EntityKind::Session => &["Seat", "User"],
        EntityKind::User => &["Sessions"],
    }
}

/// Keys that look numeric on some hosts but are names
const TEXT_KEYS: &[&str] = &[
    "Id", "Name", "TTY", "Display", "Service", "Scope", "Type", "Class", "State", "Desktop",
    "RemoteHost", "RemoteUser", "Slice", "RuntimePath",
];

/// Parse `loginctl show-*` output into a property bag
pub fn parse_properties(kind: EntityKind, output: &str) -> SourceResult<PropertyBag> {
    let mut bag = PropertyBag::new();

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            debug!(kind = %kind, line = %line, "Skipping line without '='");
            continue;
        };

        bag.insert(key.to_string(), parse_value(kind, key, value));
    }

    if bag.is_empty() {
        return Err(SourceError::Protocol(format!("empty property list for {}", kind)));
    }

    Ok(bag)
}

fn parse_value(kind: EntityKind, key: &str, value: &str) -> AttrValue {
    if reference_keys(kind).contains(&key) {
        return AttrValue::Refs(value.split_whitespace().map(EntityId::from).collect());
    }

    if TEXT_KEYS.contains(&key) {
        return AttrValue::Str(value.to_string());
    }

    match value {
        "yes" => AttrValue::Bool(true),
        "no" => AttrValue::Bool(false),
        _ => value
            .parse::<i64>()
            .map(AttrValue::Int)
            .unwrap_or_else(|_| AttrValue::Str(value.to_string())),
    }
}

/// Parse `loginctl list-* --no-legend` output into identifiers.
///
/// The identifier is always the first column; the remaining columns vary
/// between systemd versions and are ignored.
pub fn parse_listing(output: &str) -> Vec<EntityId> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.ends_with("listed."))
        .filter_map(|line| line.split_whitespace().next())
        .map(EntityId::from)
        .collect()
}

/// Map `loginctl` stderr to a source error
pub fn classify_failure(stderr: &str) -> SourceError {
    let message = stderr.trim().to_string();
    let lower = message.to_lowercase();

    let denied = [
        "access denied",
        "permission denied",
        "interactive authentication required",
        "not authorized",
    ];
    let missing = [
        "not known",
        "no such session",
        "no such seat",
        "no such user",
        "does not exist",
    ];
    let unreachable = [
        "connect to bus",
        "connection refused",
        "timed out",
        "transport endpoint",
        "was not provided by any .service",
    ];

    if denied.iter().any(|p| lower.contains(p)) {
        SourceError::PermissionDenied(message)
    } else if missing.iter().any(|p| lower.contains(p)) {
        SourceError::NotFound(message)
    } else if unreachable.iter().any(|p| lower.contains(p)) {
        SourceError::Unavailable(message)
    } else {
        SourceError::Protocol(message)
    }
}

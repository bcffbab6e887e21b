//! Merging of source and requested track formats.

use tracing::error;

use super::error::FormatError;
use super::types::{FormatKey, FormatValue, MediaFormat, ValueType};

/// One mergeable key: the type it is read as from the overlay and the type it
/// is stored as in the result.
#[derive(Debug, Clone, Copy)]
struct MergeEntry {
    key: FormatKey,
    read_as: ValueType,
    store_as: ValueType,
}

const fn entry(key: FormatKey, value_type: ValueType) -> MergeEntry {
    MergeEntry {
        key,
        read_as: value_type,
        store_as: value_type,
    }
}

const fn coerced(key: FormatKey, read_as: ValueType, store_as: ValueType) -> MergeEntry {
    MergeEntry {
        key,
        read_as,
        store_as,
    }
}

/// Keys an overlay is allowed to override. Anything else is ignored.
const MERGEABLE_ENTRIES: &[MergeEntry] = &[
    entry(FormatKey::Mime, ValueType::String),
    entry(FormatKey::Duration, ValueType::Int64),
    entry(FormatKey::Width, ValueType::Int32),
    entry(FormatKey::Height, ValueType::Int32),
    entry(FormatKey::BitRate, ValueType::Int32),
    entry(FormatKey::Profile, ValueType::Int32),
    entry(FormatKey::Level, ValueType::Int32),
    entry(FormatKey::ColorFormat, ValueType::Int32),
    entry(FormatKey::ColorRange, ValueType::Int32),
    entry(FormatKey::ColorStandard, ValueType::Int32),
    entry(FormatKey::ColorTransfer, ValueType::Int32),
    entry(FormatKey::FrameRate, ValueType::Int32),
    entry(FormatKey::IFrameInterval, ValueType::Int32),
    entry(FormatKey::Priority, ValueType::Int32),
    coerced(FormatKey::OperatingRate, ValueType::Float, ValueType::Int32),
];

/// Returns true if `key` can be overridden by a requested track format.
pub fn is_mergeable_key(key: FormatKey) -> bool {
    MERGEABLE_ENTRIES.iter().any(|e| e.key == key)
}

/// Converts a value read from the overlay into the stored representation.
///
/// Returns `None` when the overlay holds the key with a different type than
/// the table expects.
fn convert(value: &FormatValue, read_as: ValueType, store_as: ValueType) -> Option<FormatValue> {
    if value.value_type() != read_as {
        return None;
    }

    match (value, store_as) {
        (v, t) if v.value_type() == t => Some(v.clone()),
        (FormatValue::Float(f), ValueType::Int32) => Some(FormatValue::Int32(*f as i32)),
        (FormatValue::Float(f), ValueType::Int64) => Some(FormatValue::Int64(*f as i64)),
        (FormatValue::Int32(i), ValueType::Int64) => Some(FormatValue::Int64(i64::from(*i))),
        _ => None,
    }
}

/// Combines a source track format with a requested override.
///
/// The result starts as a copy of `base`. Every allow-listed key that the
/// overlay defines with the expected type then replaces the base value.
/// Neither input is modified.
pub fn merge_formats(
    base: Option<&MediaFormat>,
    overlay: Option<&MediaFormat>,
) -> Result<MediaFormat, FormatError> {
    let base = base.ok_or_else(|| {
        error!("Cannot merge formats without a base format");
        FormatError::MissingBase
    })?;
    let overlay = overlay.ok_or_else(|| {
        error!("Cannot merge formats without an overlay format");
        FormatError::MissingOverlay
    })?;

    let mut merged = base.clone();
    for entry in MERGEABLE_ENTRIES {
        let Some(value) = overlay.get(entry.key) else {
            continue;
        };
        if let Some(converted) = convert(value, entry.read_as, entry.store_as) {
            merged.set(entry.key, converted);
        }
    }

    Ok(merged)
}

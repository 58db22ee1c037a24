//! Create-time validation of link kinds.

use serde_json::Value;

use super::KIND_ATTRIBUTES;
use crate::core::{get_str, ResourceKind, Snapshot};
use crate::errors::KindMismatchError;

/// Checks that `supplied`, if any, names the kind of record `uuid` refers
/// to.
///
/// # Errors
///
/// Returns [`KindMismatchError`] naming both the supplied and the inferred
/// kind when they differ, or when the supplied kind is not a kind at all.
pub fn check_uuid_kind(
    kind_attribute: &str,
    uuid: &str,
    supplied: Option<&Value>,
) -> Result<(), KindMismatchError> {
    let supplied = match supplied {
        None | Some(Value::Null) => return Ok(()),
        Some(value) => value,
    };
    let actual = ResourceKind::for_uuid(uuid);
    let declared = supplied.as_str().and_then(|s| s.parse::<ResourceKind>().ok());
    if declared.is_some() && declared == actual {
        return Ok(());
    }
    let label = supplied
        .as_str()
        .map_or_else(|| supplied.to_string(), str::to_string);
    tracing::debug!(attribute = kind_attribute, uuid, supplied = %label, "Link kind mismatch");
    Err(KindMismatchError::new(kind_attribute, label, uuid, actual))
}

/// Validates the kinds supplied with a new link and strips them.
///
/// The head is checked before the tail. On success neither kind attribute is
/// left in `attributes`; on failure `attributes` is untouched.
///
/// # Errors
///
/// Returns the first [`KindMismatchError`] found.
pub fn prepare_link_attributes(attributes: &mut Snapshot) -> Result<(), KindMismatchError> {
    for (kind_attribute, uuid_attribute) in KIND_ATTRIBUTES {
        let uuid = get_str(attributes, uuid_attribute).unwrap_or_default();
        check_uuid_kind(kind_attribute, uuid, attributes.get(kind_attribute))?;
    }
    for (kind_attribute, _) in KIND_ATTRIBUTES {
        attributes.remove(kind_attribute);
    }
    Ok(())
}

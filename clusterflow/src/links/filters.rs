//! Rewriting legacy `*_kind` constraints into `is_a` filters.

use serde_json::Value;
use tracing::debug;

use super::{uuid_attribute_for, KIND_ATTRIBUTES};
use crate::core::Snapshot;
use crate::store::{Filter, RecordQuery};

/// Rewrites `[head_kind, "=", K]` into `[head_uuid, "is_a", K]`, and the
/// same for `tail_kind`.
///
/// Every other filter, including other operators on the kind attributes, is
/// returned unchanged and in place.
#[must_use]
pub fn normalize_filters(filters: Vec<Filter>) -> Vec<Filter> {
    filters
        .into_iter()
        .map(|filter| {
            if filter.operator != Filter::EQ {
                return filter;
            }
            match uuid_attribute_for(&filter.attribute) {
                Some(uuid_attribute) => {
                    debug!(attribute = %filter.attribute, "Rewriting legacy kind filter");
                    Filter::is_a(uuid_attribute, filter.operand)
                }
                None => filter,
            }
        })
        .collect()
}

/// Removes `head_kind`/`tail_kind` from a where clause and returns the
/// equivalent `is_a` filters, head first.
///
/// `null` and `false` kinds are left in the where clause untouched.
pub fn normalize_where(where_clause: &mut Snapshot) -> Vec<Filter> {
    KIND_ATTRIBUTES
        .iter()
        .filter_map(|(kind_attribute, uuid_attribute)| {
            match where_clause.get(*kind_attribute) {
                None | Some(Value::Null | Value::Bool(false)) => return None,
                Some(_) => {}
            }
            let kind = where_clause.remove(*kind_attribute)?;
            debug!(attribute = kind_attribute, "Rewriting legacy kind where clause");
            Some(Filter::is_a(*uuid_attribute, kind))
        })
        .collect()
}

/// Normalizes a link query.
///
/// Filters are rewritten first; filters derived from the where clause are
/// appended after them.
#[must_use]
pub fn normalize_query(query: RecordQuery) -> RecordQuery {
    let RecordQuery {
        filters,
        mut where_clause,
    } = query;
    let mut filters = normalize_filters(filters);
    filters.extend(normalize_where(&mut where_clause));
    RecordQuery {
        filters,
        where_clause,
    }
}

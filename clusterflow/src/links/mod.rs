//! Link records: legacy kind filters and create-time kind checks.
//!
//! `head_kind` and `tail_kind` are no longer stored. The kind of either end
//! of a link is always derived from `head_uuid`/`tail_uuid`, so queries that
//! still mention the old attributes are rewritten into `is_a` filters and
//! create requests have the attributes checked and dropped.

mod create;
mod filters;

pub use create::{check_uuid_kind, prepare_link_attributes};
pub use filters::{normalize_filters, normalize_query, normalize_where};

/// Link attribute naming the head's kind.
pub const HEAD_KIND: &str = "head_kind";
/// Link attribute naming the tail's kind.
pub const TAIL_KIND: &str = "tail_kind";
/// Link attribute holding the head's UUID.
pub const HEAD_UUID: &str = "head_uuid";
/// Link attribute holding the tail's UUID.
pub const TAIL_UUID: &str = "tail_uuid";

/// The `(kind attribute, uuid attribute)` pairs, head first.
pub(crate) const KIND_ATTRIBUTES: [(&str, &str); 2] =
    [(HEAD_KIND, HEAD_UUID), (TAIL_KIND, TAIL_UUID)];

pub(crate) fn uuid_attribute_for(kind_attribute: &str) -> Option<&'static str> {
    KIND_ATTRIBUTES
        .iter()
        .find(|(kind, _)| *kind == kind_attribute)
        .map(|(_, uuid)| *uuid)
}

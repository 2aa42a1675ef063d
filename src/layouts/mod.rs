//! Layouts turn a record into the bytes stored in `Record::raw`.

pub(crate) mod binary;
mod hash;
mod json;
pub(crate) mod text;

pub use binary::BinaryLayout;
pub use hash::{fnv1a, HashLayout};
pub use json::JsonLayout;
pub use text::TextLayout;

use crate::{element::Element, record::Record};

pub trait Layout: Element + Send + Sync {
    fn layout_record(&self, record: &mut Record);
}

/// Leaves `raw` exactly as it is.
#[derive(Debug, Default)]
pub struct NullLayout;

impl Element for NullLayout {}

impl Layout for NullLayout {
    fn layout_record(&self, _record: &mut Record) {}
}

/// Produces an empty `raw`, so appenders skip the record.
#[derive(Debug, Default)]
pub struct EmptyLayout;

impl Element for EmptyLayout {}

impl Layout for EmptyLayout {
    fn layout_record(&self, record: &mut Record) {
        record.raw.clear();
    }
}

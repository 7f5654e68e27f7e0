//! Schema-less document payloads.

use serde_json::{Map, Value};

use super::DocumentId;

/// Field carrying the store-assigned id in every returned document.
pub const ID_FIELD: &str = "_id";

/// An untyped document: a JSON object of field name to value.
///
/// The gateway never depends on specific fields except the collection
/// rules in [`super::collection_rules`].
pub type Document = Map<String, Value>;

/// Returns `body` with any client-supplied `_id` removed.
///
/// Ids are assigned by the store and may never be set or changed through
/// an insert or update body.
#[must_use]
pub fn strip_id(mut body: Document) -> Document {
    body.shift_remove(ID_FIELD);
    body
}

/// Returns a copy of `body` with `_id` set as its first field.
#[must_use]
pub fn with_id(id: DocumentId, body: &Document) -> Document {
    let mut doc = Map::with_capacity(body.len() + 1);
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    for (key, value) in body {
        if key != ID_FIELD {
            doc.insert(key.clone(), value.clone());
        }
    }
    doc
}

/// Writes every field of `partial` into `target`, leaving unmentioned
/// fields untouched. `_id` in `partial` is ignored.
pub fn merge_fields(target: &mut Document, partial: &Document) {
    for (key, value) in partial {
        if key == ID_FIELD {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

//! Record identity and numeric normalization helpers.

use bson::{Bson, Document, oid::ObjectId};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Identity field as stored by the server.
pub const ID_FIELD: &str = "_id";

/// String identity field assigned by the facade on insert.
pub const AUTO_ID_FIELD: &str = "id";

/// Generate a fresh globally-unique identifier string.
pub fn generate_id() -> String {
    ObjectId::new().to_hex()
}

/// Assign a generated [`AUTO_ID_FIELD`] when the record has none.
///
/// A missing key, an explicit null, or a blank string all count as absent;
/// any other value is preserved unchanged. Returns whether an id was
/// assigned.
pub fn ensure_id(record: &mut Document) -> bool {
    let absent = match record.get(AUTO_ID_FIELD) {
        None | Some(Bson::Null) => true,
        Some(Bson::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if absent {
        record.insert(AUTO_ID_FIELD, generate_id());
    }
    absent
}

/// Narrow arbitrary-precision numeric values in place, recursing through
/// nested documents and arrays.
///
/// `Decimal128` values carrying an integral become `Int64` when they fit,
/// else `Int32` when they fit, else stay as-is; every other `Decimal128`
/// (including NaN and infinities) becomes the nearest `Double`.
pub fn normalize(record: &mut Document) {
    for (_, value) in record.iter_mut() {
        normalize_value(value);
    }
}

fn normalize_value(value: &mut Bson) {
    match value {
        Bson::Decimal128(decimal) => {
            if let Some(narrowed) = narrow_decimal(&decimal.to_string()) {
                *value = narrowed;
            }
        }
        Bson::Document(nested) => normalize(nested),
        Bson::Array(items) => {
            for item in items {
                normalize_value(item);
            }
        }
        _ => {}
    }
}

fn narrow_decimal(text: &str) -> Option<Bson> {
    if !text.contains(['.', 'e', 'E']) && !text.contains("NaN") && !text.contains("Inf") {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Bson::Int64(n));
        }
        if let Ok(n) = text.parse::<i32>() {
            return Some(Bson::Int32(n));
        }
        // integral wider than 64 bits, leave untouched
        return None;
    }
    text.parse::<f64>().ok().map(Bson::Double)
}

/// Extension trait for BSON documents.
pub trait DocumentExt {
    /// Get a string value, falling back when the key is absent or not a string.
    fn get_str_or<'a>(&'a self, key: &str, otherwise: &'a str) -> &'a str;

    /// The facade-assigned string id, when present.
    fn id_str(&self) -> Option<&str>;

    /// Convert to a typed struct.
    fn to_struct<T: DeserializeOwned>(&self) -> Result<T>;
}

impl DocumentExt for Document {
    fn get_str_or<'a>(&'a self, key: &str, otherwise: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(otherwise)
    }

    fn id_str(&self) -> Option<&str> {
        self.get_str(AUTO_ID_FIELD).ok()
    }

    fn to_struct<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(bson::from_document(self.clone())?)
    }
}

/// Convert a struct to a BSON document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    Ok(bson::to_document(value)?)
}

/// Convert a BSON document to a struct.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(bson::from_document(doc)?)
}

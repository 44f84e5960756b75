//! Body serializers: pure functions from a field mapping to request
//! bytes plus a content type.
//!
//! Three strategies ship by default (`json`, `formdata`, `urlencoded`);
//! the registry accepts replacements and additions by name.

use crate::collector::{FieldMap, FieldValue};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A serialized request body.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedBody {
    /// The body bytes.
    pub bytes: Vec<u8>,
    /// The content type to set, unless the caller already set one.
    pub content_type: Option<String>,
}

/// A body serialization function.
pub type SerializerFn = Arc<dyn Fn(&FieldMap) -> SerializedBody + Send + Sync>;

/// Registry of named serializers.
pub struct SerializerRegistry {
    serializers: RwLock<HashMap<String, SerializerFn>>,
}

impl SerializerRegistry {
    /// Creates a registry with the built-in strategies.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            serializers: RwLock::new(HashMap::new()),
        };
        registry.register("json", Arc::new(serialize_json));
        registry.register("formdata", Arc::new(serialize_formdata));
        registry.register("urlencoded", Arc::new(serialize_urlencoded));
        registry
    }

    /// Registers or replaces a serializer.
    pub fn register(&self, name: impl Into<String>, serializer: SerializerFn) {
        self.serializers.write().insert(name.into(), serializer);
    }

    /// Returns the serializer for a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SerializerFn> {
        self.serializers.read().get(name).cloned()
    }

    /// Lists registered serializer names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.serializers.read().keys().cloned().collect()
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Serializes the mapping as a single JSON object.
#[must_use]
pub fn serialize_json(data: &FieldMap) -> SerializedBody {
    let mut object = serde_json::Map::new();
    for (name, value) in data.iter() {
        let json = match value {
            FieldValue::Text(t) => serde_json::Value::String(t.clone()),
            FieldValue::List(l) => serde_json::Value::Array(
                l.iter().cloned().map(serde_json::Value::String).collect(),
            ),
            FieldValue::Flag(f) => serde_json::Value::Bool(*f),
            // Binary content has no JSON rendering
            FieldValue::Binary { .. } => serde_json::Value::Null,
        };
        object.insert(name.to_string(), json);
    }

    SerializedBody {
        bytes: serde_json::Value::Object(object).to_string().into_bytes(),
        content_type: Some("application/json".to_string()),
    }
}

/// Serializes the mapping as multipart form data, one part per field.
///
/// List values become repeated parts; binary values pass through with
/// their file name and content type.
#[must_use]
pub fn serialize_formdata(data: &FieldMap) -> SerializedBody {
    let boundary = format!("----uplink{}", Uuid::new_v4().simple());
    let mut bytes = Vec::new();

    let push_text = |name: &str, value: &str, bytes: &mut Vec<u8>| {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        bytes.extend_from_slice(value.as_bytes());
        bytes.extend_from_slice(b"\r\n");
    };

    for (name, value) in data.iter() {
        match value {
            FieldValue::Text(t) => push_text(name, t, &mut bytes),
            FieldValue::Flag(f) => push_text(name, &f.to_string(), &mut bytes),
            FieldValue::List(items) => {
                for item in items {
                    push_text(name, item, &mut bytes);
                }
            }
            FieldValue::Binary {
                file_name,
                content_type,
                bytes: payload,
            } => {
                bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
                bytes.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                    )
                    .as_bytes(),
                );
                bytes.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                bytes.extend_from_slice(payload);
                bytes.extend_from_slice(b"\r\n");
            }
        }
    }
    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    SerializedBody {
        bytes,
        content_type: Some(format!("multipart/form-data; boundary={boundary}")),
    }
}

/// Serializes the mapping as flat urlencoded pairs; list values repeat
/// the key.
#[must_use]
pub fn serialize_urlencoded(data: &FieldMap) -> SerializedBody {
    SerializedBody {
        bytes: urlencode_pairs(data).into_bytes(),
        content_type: Some("application/x-www-form-urlencoded".to_string()),
    }
}

/// Builds a urlencoded pair string from a field mapping.
///
/// Shared by the urlencoded serializer and GET query building.
#[must_use]
pub fn urlencode_pairs(data: &FieldMap) -> String {
    let mut pairs: Vec<String> = Vec::new();
    for (name, value) in data.iter() {
        match value {
            FieldValue::Text(t) => pairs.push(pair(name, t)),
            FieldValue::Flag(f) => pairs.push(pair(name, &f.to_string())),
            FieldValue::List(items) => {
                for item in items {
                    pairs.push(pair(name, item));
                }
            }
            // Binary content has no urlencoded rendering
            FieldValue::Binary { .. } => {}
        }
    }
    pairs.join("&")
}

fn pair(name: &str, value: &str) -> String {
    format!("{}={}", percent_encode(name), percent_encode(value))
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

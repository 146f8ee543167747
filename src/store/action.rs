use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action type reserved for seeding reducer state from storage.
pub const RESERVED_LOAD: &str = "load";

/// Anything that can be dispatched to a [`StoredReducer`](crate::StoredReducer).
///
/// The kind is only inspected to reject the reserved `"load"` type.
pub trait ActionKind {
    fn kind(&self) -> &str;

    fn is_reserved(&self) -> bool {
        self.kind() == RESERVED_LOAD
    }
}

/// A loosely typed `{ "type": ..., "payload": ... }` message.
///
/// Handy when actions arrive as JSON or when a full enum is overkill. Typed
/// enums implementing [`ActionKind`] work just as well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    pub fn new(kind: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// An action without a payload.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self::new(kind, Value::Null)
    }

    /// Decode the payload, or `None` if it has a different shape.
    pub fn payload_as<P: DeserializeOwned>(&self) -> Option<P> {
        P::deserialize(&self.payload).ok()
    }
}

impl ActionKind for Action {
    fn kind(&self) -> &str {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_type_field() {
        let action: Action = serde_json::from_str(r#"{"type": "add", "payload": [1, 2]}"#).unwrap();
        assert_eq!(action.kind, "add");
        assert_eq!(action.payload_as::<Vec<u8>>(), Some(vec![1, 2]));
        assert_eq!(action.payload_as::<String>(), None);

        let bare: Action = serde_json::from_str(r#"{"type": "reset"}"#).unwrap();
        assert_eq!(bare, Action::bare("reset"));
    }

    #[test]
    fn only_load_is_reserved() {
        assert!(Action::bare("load").is_reserved());
        assert!(!Action::bare("Load").is_reserved());
        assert!(!Action::new("inc", 1).is_reserved());
    }
}

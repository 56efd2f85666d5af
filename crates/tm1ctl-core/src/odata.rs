// OData response shaping.
//
// The service wraps single entities with `@odata.context` control
// information and collections in a `value` array. These helpers unwrap
// both for rendering.

use serde_json::Value;
use tm1ctl_api::JsonObject;

use crate::error::CoreError;

pub use tm1ctl_config::entity_key;

const CONTEXT: &str = "@odata.context";

/// A single entity with its `@odata.context` removed.
pub fn entity(mut obj: JsonObject) -> JsonObject {
    obj.remove(CONTEXT);
    obj
}

/// The `value` array of a collection response.
pub fn collection(mut obj: JsonObject) -> Result<Vec<Value>, CoreError> {
    match obj.remove("value") {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(CoreError::Decode {
            message: "'value' of collection is not an array".into(),
            body: Value::Object(obj).to_string(),
        }),
        None => Err(CoreError::Decode {
            message: "'value' not found in response".into(),
            body: Value::Object(obj).to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn entity_strips_context_only() {
        let obj = object(json!({
            "@odata.context": "$metadata#Databases/$entity",
            "@odata.etag": "W/\"1\"",
            "Name": "Sales"
        }));

        let shaped = entity(obj);
        assert_eq!(
            Value::Object(shaped),
            json!({ "@odata.etag": "W/\"1\"", "Name": "Sales" })
        );
    }

    #[test]
    fn collection_returns_value_array() {
        let obj = object(json!({
            "@odata.context": "$metadata#Instances",
            "value": [{ "Name": "prod1" }, { "Name": "dev" }]
        }));

        let items = collection(obj).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["Name"], "dev");
    }

    #[test]
    fn collection_without_value_is_decode_error() {
        let err = collection(object(json!({ "Name": "prod1" }))).unwrap_err();
        match err {
            CoreError::Decode { message, body } => {
                assert!(message.contains("'value'"), "{message}");
                assert!(body.contains("prod1"));
            }
            other => panic!("expected Decode, got: {other:?}"),
        }
    }

    #[test]
    fn collection_value_must_be_array() {
        let err = collection(object(json!({ "value": 3 }))).unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
    }
}

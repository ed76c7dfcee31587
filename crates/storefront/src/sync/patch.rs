//! Shallow JSON merge used to apply partial updates to entities.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors from applying a patch.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Patch is not a JSON object.
    #[error("patch must be a JSON object")]
    NotAnObject,

    /// Entity did not serialize to a JSON object.
    #[error("entity is not a JSON object")]
    EntityNotAnObject,

    /// Merged document no longer decodes as the entity.
    #[error("patched entity is invalid: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Overwrite the top-level fields of `entity` named in `patch`.
///
/// Nested objects are replaced wholesale, not merged.
///
/// # Errors
///
/// Returns `PatchError` if either side is not an object or the result does
/// not decode back into `T`.
pub fn merge_shallow<T>(entity: &T, patch: &Value) -> Result<T, PatchError>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(fields) = patch else {
        return Err(PatchError::NotAnObject);
    };

    let mut doc = serde_json::to_value(entity)?;
    let target = doc.as_object_mut().ok_or(PatchError::EntityNotAnObject)?;
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }

    Ok(serde_json::from_value(doc)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: i64,
        name: String,
        tags: Vec<String>,
    }

    fn item() -> Item {
        Item {
            id: 1,
            name: "a".into(),
            tags: vec!["x".into()],
        }
    }

    #[test]
    fn test_overwrites_named_fields_only() {
        let merged = merge_shallow(&item(), &json!({"name": "b"})).unwrap();
        assert_eq!(merged.name, "b");
        assert_eq!(merged.tags, vec!["x".to_string()]);
    }

    #[test]
    fn test_replaces_nested_values_wholesale() {
        let merged = merge_shallow(&item(), &json!({"tags": []})).unwrap();
        assert!(merged.tags.is_empty());
    }

    #[test]
    fn test_rejects_non_object_patch() {
        assert!(matches!(
            merge_shallow(&item(), &json!(true)),
            Err(PatchError::NotAnObject)
        ));
    }

    #[test]
    fn test_rejects_ill_typed_patch() {
        assert!(matches!(
            merge_shallow(&item(), &json!({"id": "one"})),
            Err(PatchError::Invalid(_))
        ));
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything that can stand in for a referenced record once it has been joined.
pub trait Identified {
    fn id(&self) -> Uuid;
}

/// A link to another record, either as the bare id or as the joined record.
///
/// List endpoints join owners, renters and cars into the payload while the
/// mutation paths load the bare row, so the same field carries both shapes.
/// Serialized untagged: a bare id is a JSON string, a populated value an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Reference<T> {
    Id(Uuid),
    Populated(T),
}

impl<T: Identified> Reference<T> {
    /// Canonical id of the referenced record. The nil UUID never identifies a
    /// real row and is reported as `None`.
    pub fn id(&self) -> Option<Uuid> {
        let id = match self {
            Reference::Id(id) => *id,
            Reference::Populated(value) => value.id(),
        };

        if id.is_nil() { None } else { Some(id) }
    }
}

impl<T> From<Uuid> for Reference<T> {
    fn from(id: Uuid) -> Self {
        Reference::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserSummary;
    use serde_json::json;

    #[test]
    fn id_is_the_same_for_both_representations() {
        let id = Uuid::new_v4();
        let raw: Reference<UserSummary> = Reference::Id(id);
        let populated = Reference::Populated(UserSummary {
            id,
            username: "dana".to_string(),
            ..UserSummary::default()
        });

        assert_eq!(raw.id(), Some(id));
        assert_eq!(populated.id(), Some(id));
    }

    #[test]
    fn nil_id_is_not_an_identity() {
        let raw: Reference<UserSummary> = Reference::Id(Uuid::nil());
        let populated = Reference::Populated(UserSummary::default());
        assert_eq!(raw.id(), None);
        assert_eq!(populated.id(), None);
    }

    #[test]
    fn deserializes_from_string_or_object() {
        let id = Uuid::new_v4();
        let raw: Reference<UserSummary> = serde_json::from_value(json!(id.to_string())).unwrap();
        assert_eq!(raw, Reference::Id(id));

        let populated: Reference<UserSummary> = serde_json::from_value(json!({ "id": id, "username": "dana" })).unwrap();
        assert_eq!(populated.id(), Some(id));
        assert!(matches!(&populated, Reference::Populated(user) if user.username == "dana"));
    }

    #[test]
    fn serializes_bare_id_as_string() {
        let id = Uuid::new_v4();
        let raw: Reference<UserSummary> = id.into();
        assert_eq!(serde_json::to_value(&raw).unwrap(), json!(id.to_string()));
    }
}

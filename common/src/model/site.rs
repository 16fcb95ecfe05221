use serde::{Deserialize, Serialize};

/// A tenant's deployed instance. Only the id takes part in namespacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    #[serde(deserialize_with = "crate::requests::id_from_string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

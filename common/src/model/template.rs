use serde::{Deserialize, Serialize};

/// A shared HTML/CSS/JS skeleton from the template catalog.
///
/// Templates are read-only inputs to generation: the engine never writes
/// back to them, it only produces site-scoped rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub html_content: String,
    #[serde(default)]
    pub css_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_content: Option<String>,
}

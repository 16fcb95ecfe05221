use serde::{Deserialize, Deserializer};

/// Body of `POST /templates/{template_id}/generate_unique_template`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateUniqueTemplateRequest {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub site_id: String,
    /// Draw a fresh namespace tag instead of the deterministic one.
    #[serde(default)]
    pub force_new: bool,
}

/// Body of `POST /templates/generate_css_class_list`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateClassListRequest {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub site_id: String,
    pub list_name: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub force_new: bool,
}

/// Query string of `GET`/`DELETE /templates/class_lists`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassListQuery {
    pub site_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `PUT /templates/class_lists`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClassListRequest {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub site_id: String,
    pub name: String,
    pub classes: Vec<String>,
}

/// Body of `POST /batch/generate_unique_templates`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchGenerateRequest {
    pub template_id: String,
    #[serde(deserialize_with = "ids_from_strings_or_numbers")]
    pub site_ids: Vec<String>,
    #[serde(default)]
    pub force_new: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

/// The admin UI sends site ids either as JSON strings or as numbers.
pub fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn ids_from_strings_or_numbers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawId>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(String::from).collect())
}

use crate::model::class_list::ClassList;
use crate::model::mapping::{ClassMapping, StyleMapping};
use serde::{Deserialize, Serialize};

/// Envelope returned by the generate and lookup endpoints. Field names are
/// consumed verbatim by the admin UI and the deployment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateUniqueTemplateResponse {
    pub success: bool,
    pub template_id: String,
    pub site_id: String,
    pub unique_classes: ClassMapping,
    pub unique_styles: StyleMapping,
    pub processed_content: String,
    pub custom_css: String,
    pub total_classes: usize,
    pub total_styles: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateUniqueTemplateResponse {
    pub fn failure(
        template_id: impl Into<String>,
        site_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            template_id: template_id.into(),
            site_id: site_id.into(),
            unique_classes: ClassMapping::default(),
            unique_styles: StyleMapping::default(),
            processed_content: String::new(),
            custom_css: String::new(),
            total_classes: 0,
            total_styles: 0,
            error: Some(error.into()),
        }
    }
}

/// Envelope returned by `POST /templates/generate_css_class_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateClassListResponse {
    pub success: bool,
    pub list_name: String,
    pub classes: Vec<String>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateClassListResponse {
    pub fn failure(list_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            list_name: list_name.into(),
            classes: Vec::new(),
            count: 0,
            error: Some(error.into()),
        }
    }
}

impl From<ClassList> for GenerateClassListResponse {
    fn from(list: ClassList) -> Self {
        Self {
            success: true,
            count: list.classes.len(),
            list_name: list.name,
            classes: list.classes,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassListsResponse {
    pub site_id: String,
    pub lists: Vec<ClassList>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCreatedResponse {
    pub job_id: String,
}

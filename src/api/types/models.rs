//! OpenAI-compatible model list types

use serde::Serialize;

use crate::domain::model::Model;

/// Model entry in `/v1/models`
#[derive(Debug, Clone, Serialize)]
pub struct ApiModel {
    pub id: String,
    pub object: String,
    pub owned_by: String,
    pub context_window: u32,
}

impl From<&Model> for ApiModel {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id().as_str().to_string(),
            object: "model".to_string(),
            owned_by: model.provider_id().as_str().to_string(),
            context_window: model.context_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ApiModel>,
}

impl ModelsResponse {
    pub fn new(data: Vec<ApiModel>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}

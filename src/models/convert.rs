use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form body of a conversion request
#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct ConvertForm {
    /// JSON document to convert
    #[serde(default)]
    pub json_content: Option<String>,
}

/// Response for a successful conversion
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    pub yaml: String,
}

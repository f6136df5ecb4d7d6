use serde::Deserialize;
use serde::Serialize;

/// A generated persona image. At most one per persona is the profile image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaImage {
    pub id: String,
    pub persona_id: String,
    pub file_path: String,
    pub prompt: String,
    #[serde(default)]
    pub is_profile: bool,
    #[serde(default)]
    pub created_at: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGenerateRequest {
    pub prompt: String,
}

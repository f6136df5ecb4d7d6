use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::ClientError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoraStatus {
    #[default]
    Pending,
    Training,
    Ready,
    Failed,
}

impl LoraStatus {
    pub fn is_terminal(&self) -> bool {
        return matches!(self, LoraStatus::Ready | LoraStatus::Failed);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub personality: String,
    pub speaking_style: String,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub lora_model_id: Option<String>,
    #[serde(default)]
    pub lora_trigger_word: Option<String>,
    #[serde(default)]
    pub lora_status: Option<LoraStatus>,
}

impl Persona {
    /// Image URLs may come back relative to the API host.
    pub fn profile_image(&self, api_url: &str) -> Option<String> {
        let url = self.profile_image_url.as_ref()?;
        if url.starts_with("http") {
            return Some(url.to_string());
        }

        return Some(format!("{}{url}", api_url.trim_end_matches('/')));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaCreate {
    pub name: String,
    pub personality: String,
    pub speaking_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaking_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoraStatusResponse {
    pub lora_status: LoraStatus,
    #[serde(default)]
    pub lora_model_id: Option<String>,
    #[serde(default)]
    pub lora_trigger_word: Option<String>,
    #[serde(default)]
    pub training_id: Option<String>,
    #[serde(default)]
    pub logs: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoraTrainRequest {
    pub trigger_word: String,
    pub steps: u32,
}

impl Default for LoraTrainRequest {
    fn default() -> LoraTrainRequest {
        return LoraTrainRequest {
            trigger_word: "ALTEREGO".to_string(),
            steps: 1000,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoraTrainResponse {
    pub training_id: String,
    pub status: LoraStatus,
    pub trigger_word: String,
}

#[async_trait]
pub trait LoraStatusSource: Send + Sync {
    async fn lora_status(&self, persona_id: &str) -> Result<LoraStatusResponse, ClientError>;
}

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::ClientError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub persona_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadCreate {
    pub persona_id: String,
}

#[async_trait]
pub trait ThreadProvisioner: Send + Sync {
    /// Asks the server for a fresh thread bound to the persona. Failures come
    /// back as `ThreadCreationFailed`, except a rejected token which stays
    /// `Unauthenticated`.
    async fn create_thread(&self, persona_id: &str) -> Result<Thread, ClientError>;
}

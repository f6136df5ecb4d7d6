#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ActivityLog;
use crate::domain::models::ActivityQuery;
use crate::domain::models::ClientError;
use crate::domain::models::CommandRequest;
use crate::domain::models::CommandResponse;
use crate::domain::models::Comment;
use crate::domain::models::CommentCreate;
use crate::domain::models::Follow;
use crate::domain::models::FollowCreate;
use crate::domain::models::ImageGenerateRequest;
use crate::domain::models::LikeToggle;
use crate::domain::models::LoraStatusResponse;
use crate::domain::models::LoraStatusSource;
use crate::domain::models::LoraTrainRequest;
use crate::domain::models::LoraTrainResponse;
use crate::domain::models::Page;
use crate::domain::models::Persona;
use crate::domain::models::PersonaCreate;
use crate::domain::models::PersonaImage;
use crate::domain::models::PersonaProfile;
use crate::domain::models::PersonaUpdate;
use crate::domain::models::Post;
use crate::domain::models::PostPersona;
use crate::domain::models::Schedule;
use crate::domain::models::ScheduleCreate;
use crate::domain::models::ScheduleUpdate;
use crate::domain::models::Thread;
use crate::domain::models::ThreadCreate;
use crate::domain::models::ThreadProvisioner;

fn convert_err(err: reqwest::Error) -> ClientError {
    return ClientError::Request(err.to_string());
}

/// FastAPI puts the reason in `detail`, either a string or a list of
/// validation errors.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        match json.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.to_string(),
            Some(detail) => return detail.to_string(),
            None => {}
        }
    }

    if !body.trim().is_empty() {
        return body.trim().to_string();
    }

    return status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string();
}

/// Bearer-authenticated client for the Alter Ego REST API.
pub struct ApiClient {
    url: String,
    token: String,
    client: reqwest::Client,
}

impl Default for ApiClient {
    fn default() -> ApiClient {
        return ApiClient::new(
            &Config::get(ConfigKey::ApiUrl),
            &Config::get(ConfigKey::Token),
        );
    }
}

impl ApiClient {
    pub fn new(url: &str, token: &str) -> ApiClient {
        return ApiClient {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        };
    }

    pub fn url(&self) -> &str {
        return &self.url;
    }

    pub fn has_token(&self) -> bool {
        return !self.token.is_empty();
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        if !self.has_token() {
            return Err(ClientError::Unauthenticated);
        }

        return Ok(self
            .client
            .request(method, format!("{url}{path}", url = self.url))
            .bearer_auth(&self.token));
    }

    async fn check(res: Response) -> Result<Response, ClientError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::warn!(status = status.as_u16(), url = %res.url(), "Request was not authenticated");
            return Err(ClientError::Unauthenticated);
        }

        let body = res.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::warn!(status = status.as_u16(), message, "Request failed");

        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
        let res = req.send().await.map_err(convert_err)?;
        let res = ApiClient::check(res).await?;

        return res.json::<T>().await.map_err(convert_err);
    }

    async fn send_empty(req: RequestBuilder) -> Result<(), ClientError> {
        let res = req.send().await.map_err(convert_err)?;
        ApiClient::check(res).await?;

        return Ok(());
    }

    pub async fn create_thread(&self, persona_id: &str) -> Result<Thread, ClientError> {
        let req = self
            .request(Method::POST, "/api/chat/thread")?
            .json(&ThreadCreate {
                persona_id: persona_id.to_string(),
            });

        return ApiClient::send_json(req).await;
    }

    pub async fn list_personas(&self) -> Result<Vec<Persona>, ClientError> {
        return ApiClient::send_json(self.request(Method::GET, "/api/persona")?).await;
    }

    pub async fn get_persona(&self, persona_id: &str) -> Result<Persona, ClientError> {
        let path = format!("/api/persona/{persona_id}");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    pub async fn create_persona(&self, persona: &PersonaCreate) -> Result<Persona, ClientError> {
        let req = self.request(Method::POST, "/api/persona")?.json(persona);
        return ApiClient::send_json(req).await;
    }

    pub async fn update_persona(
        &self,
        persona_id: &str,
        persona: &PersonaUpdate,
    ) -> Result<Persona, ClientError> {
        let path = format!("/api/persona/{persona_id}");
        let req = self.request(Method::PUT, &path)?.json(persona);
        return ApiClient::send_json(req).await;
    }

    pub async fn delete_persona(&self, persona_id: &str) -> Result<(), ClientError> {
        let path = format!("/api/persona/{persona_id}");
        return ApiClient::send_empty(self.request(Method::DELETE, &path)?).await;
    }

    pub async fn feed(&self, limit: u32, cursor: Option<&str>) -> Result<Page<Post>, ClientError> {
        return self.fetch_feed("/api/sns/feed", limit, cursor).await;
    }

    /// Posts by the personas `persona_id` follows.
    pub async fn following_feed(
        &self,
        persona_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Post>, ClientError> {
        let path = format!("/api/sns/feed/{persona_id}");
        return self.fetch_feed(&path, limit, cursor).await;
    }

    async fn fetch_feed(
        &self,
        path: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Post>, ClientError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let req = self.request(Method::GET, path)?.query(&params);
        return ApiClient::send_json(req).await;
    }

    pub async fn post(&self, post_id: &str) -> Result<Post, ClientError> {
        let path = format!("/api/sns/post/{post_id}");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    /// Top-level comments with their replies nested under them.
    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>, ClientError> {
        let path = format!("/api/sns/post/{post_id}/comments");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    pub async fn create_comment(
        &self,
        post_id: &str,
        comment: &CommentCreate,
    ) -> Result<Comment, ClientError> {
        let path = format!("/api/sns/post/{post_id}/comment");
        let req = self.request(Method::POST, &path)?.json(comment);
        return ApiClient::send_json(req).await;
    }

    pub async fn toggle_like(
        &self,
        post_id: &str,
        persona_id: &str,
    ) -> Result<LikeToggle, ClientError> {
        let path = format!("/api/sns/post/{post_id}/like");
        let req = self
            .request(Method::POST, &path)?
            .query(&[("persona_id", persona_id)]);
        return ApiClient::send_json(req).await;
    }

    pub async fn follow(
        &self,
        target_persona_id: &str,
        follower_id: &str,
    ) -> Result<Follow, ClientError> {
        let path = format!("/api/sns/follow/{target_persona_id}");
        let req = self.request(Method::POST, &path)?.json(&FollowCreate {
            follower_id: follower_id.to_string(),
        });
        return ApiClient::send_json(req).await;
    }

    pub async fn unfollow(
        &self,
        target_persona_id: &str,
        follower_id: &str,
    ) -> Result<(), ClientError> {
        let path = format!("/api/sns/follow/{target_persona_id}");
        let req = self.request(Method::DELETE, &path)?.json(&FollowCreate {
            follower_id: follower_id.to_string(),
        });
        return ApiClient::send_empty(req).await;
    }

    pub async fn following(&self, persona_id: &str) -> Result<Vec<PostPersona>, ClientError> {
        let path = format!("/api/sns/persona/{persona_id}/following");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    pub async fn followers(&self, persona_id: &str) -> Result<Vec<PostPersona>, ClientError> {
        let path = format!("/api/sns/persona/{persona_id}/followers");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    pub async fn profile(&self, persona_id: &str) -> Result<PersonaProfile, ClientError> {
        let path = format!("/api/sns/persona/{persona_id}/profile");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    pub async fn is_following(
        &self,
        follower_id: &str,
        target_persona_id: &str,
    ) -> Result<bool, ClientError> {
        let following = self.following(follower_id).await?;
        return Ok(following
            .iter()
            .any(|persona| return persona.id == target_persona_id));
    }

    pub async fn activity_logs(
        &self,
        persona_id: &str,
        query: &ActivityQuery,
    ) -> Result<Page<ActivityLog>, ClientError> {
        let path = format!("/api/persona/{persona_id}/activity-logs");
        let req = self.request(Method::GET, &path)?.query(&query.to_params());
        return ApiClient::send_json(req).await;
    }

    pub async fn send_command(
        &self,
        persona_id: &str,
        command: &str,
    ) -> Result<CommandResponse, ClientError> {
        let path = format!("/api/persona/{persona_id}/command");
        let req = self.request(Method::POST, &path)?.json(&CommandRequest {
            command: command.to_string(),
        });
        return ApiClient::send_json(req).await;
    }

    pub async fn schedules(&self, persona_id: &str) -> Result<Vec<Schedule>, ClientError> {
        let path = format!("/api/persona/{persona_id}/schedules");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    pub async fn create_schedule(
        &self,
        persona_id: &str,
        schedule: &ScheduleCreate,
    ) -> Result<Schedule, ClientError> {
        let path = format!("/api/persona/{persona_id}/schedule");
        let req = self.request(Method::POST, &path)?.json(schedule);
        return ApiClient::send_json(req).await;
    }

    pub async fn update_schedule(
        &self,
        persona_id: &str,
        schedule_id: &str,
        schedule: &ScheduleUpdate,
    ) -> Result<Schedule, ClientError> {
        let path = format!("/api/persona/{persona_id}/schedule/{schedule_id}");
        let req = self.request(Method::PUT, &path)?.json(schedule);
        return ApiClient::send_json(req).await;
    }

    pub async fn delete_schedule(
        &self,
        persona_id: &str,
        schedule_id: &str,
    ) -> Result<(), ClientError> {
        let path = format!("/api/persona/{persona_id}/schedule/{schedule_id}");
        return ApiClient::send_empty(self.request(Method::DELETE, &path)?).await;
    }

    /// Newest first.
    pub async fn images(&self, persona_id: &str) -> Result<Vec<PersonaImage>, ClientError> {
        let path = format!("/api/persona/{persona_id}/images");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    /// Generates with the persona's LoRA model when it is ready. The first
    /// image a persona gets becomes its profile image.
    pub async fn generate_image(
        &self,
        persona_id: &str,
        prompt: &str,
    ) -> Result<PersonaImage, ClientError> {
        let path = format!("/api/persona/{persona_id}/image/generate");
        let req = self
            .request(Method::POST, &path)?
            .json(&ImageGenerateRequest {
                prompt: prompt.to_string(),
            });
        return ApiClient::send_json(req).await;
    }

    pub async fn set_profile_image(
        &self,
        persona_id: &str,
        image_id: &str,
    ) -> Result<PersonaImage, ClientError> {
        let path = format!("/api/persona/{persona_id}/image/{image_id}/set-profile");
        return ApiClient::send_json(self.request(Method::PUT, &path)?).await;
    }

    pub async fn delete_image(&self, persona_id: &str, image_id: &str) -> Result<(), ClientError> {
        let path = format!("/api/persona/{persona_id}/image/{image_id}");
        return ApiClient::send_empty(self.request(Method::DELETE, &path)?).await;
    }

    pub async fn lora_status(&self, persona_id: &str) -> Result<LoraStatusResponse, ClientError> {
        let path = format!("/api/persona/{persona_id}/lora/status");
        return ApiClient::send_json(self.request(Method::GET, &path)?).await;
    }

    pub async fn train_lora(
        &self,
        persona_id: &str,
        request: &LoraTrainRequest,
    ) -> Result<LoraTrainResponse, ClientError> {
        let path = format!("/api/persona/{persona_id}/lora/train");
        let req = self.request(Method::POST, &path)?.json(request);
        return ApiClient::send_json(req).await;
    }
}

#[async_trait]
impl ThreadProvisioner for ApiClient {
    #[allow(clippy::implicit_return)]
    async fn create_thread(&self, persona_id: &str) -> Result<Thread, ClientError> {
        return ApiClient::create_thread(self, persona_id)
            .await
            .map_err(|err| match err {
                ClientError::Unauthenticated => return ClientError::Unauthenticated,
                err => return ClientError::ThreadCreationFailed(err.to_string()),
            });
    }
}

#[async_trait]
impl LoraStatusSource for ApiClient {
    #[allow(clippy::implicit_return)]
    async fn lora_status(&self, persona_id: &str) -> Result<LoraStatusResponse, ClientError> {
        return ApiClient::lora_status(self, persona_id).await;
    }
}

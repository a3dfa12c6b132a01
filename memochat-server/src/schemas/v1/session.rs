use crate::entities::{ChatMessage, ChatSession, SessionWithModel};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ListSessionsQuery {
    /// Page size, 1 to 100 (default 20).
    pub limit: Option<i64>,
    /// Rows to skip (default 0).
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(custom(function = "crate::extract::not_blank", message = "modelId is required"))]
    pub model_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateSessionRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
}

/// Display fields of the session's model, when it is in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionModelResponse {
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub model_id: String,
    pub category_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_models: Option<SessionModelResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub model_id: String,
    pub memo_ids: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionEnvelope {
    pub session: SessionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionDetailResponse {
    pub session: SessionResponse,
    pub messages: Vec<MessageResponse>,
}

impl ChatSession {
    pub fn to_response(&self) -> SessionResponse {
        SessionResponse {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            title: self.title.clone(),
            model_id: self.model_id.clone(),
            category_id: self.category_id.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
            ai_models: None,
        }
    }
}

impl SessionWithModel {
    pub fn to_response(&self) -> SessionResponse {
        let mut response = self.session.to_response();
        if let (Some(name), Some(provider)) = (&self.model_name, &self.model_provider) {
            response.ai_models = Some(SessionModelResponse {
                name: name.clone(),
                provider: provider.clone(),
            });
        }
        response
    }
}

impl ChatMessage {
    pub fn to_response(&self) -> MessageResponse {
        MessageResponse {
            id: self.id.clone(),
            session_id: self.session_id.clone(),
            role: self.role.to_string(),
            content: self.content.clone(),
            model_id: self.model_id.clone(),
            memo_ids: self.memo_ids.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

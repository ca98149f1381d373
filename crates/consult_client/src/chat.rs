use std::sync::Arc;

use consult_core::{
    Conversation, CreateConversationRequest, CredentialStore, ExpertAssignment, ExpertProfile,
    Message, SendMessageRequest, ServiceConfig, UpdateConversationRequest,
    UpdateExpertProfileRequest,
};
use serde::Serialize;

use crate::cookies::SessionCookies;
use crate::error::{ApiError, Result};
use crate::executor::{RequestDescriptor, RequestExecutor};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateConversationBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_message: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody<'a> {
    conversation_id: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct UpdateExpertProfileBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expertise: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<bool>,
}

/// Conversation, message and expert endpoints.
///
/// Every call carries the stored credential as a bearer token when one is
/// present. Failures are returned unchanged; in particular a 401 here does
/// not touch the credential store.
#[derive(Debug)]
pub struct ChatService {
    executor: RequestExecutor,
}

impl ChatService {
    pub fn new(
        config: &ServiceConfig,
        credentials: Arc<dyn CredentialStore>,
        cookies: SessionCookies,
    ) -> Result<Self> {
        let executor = RequestExecutor::new(config, cookies)?.with_credentials(credentials);
        Ok(Self { executor })
    }

    // Conversations

    pub async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        self.executor
            .execute(RequestDescriptor::get("/conversations"))
            .await
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        self.executor
            .execute(RequestDescriptor::get(format!("/conversations/{id}")))
            .await
    }

    pub async fn create_conversation(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<Conversation> {
        let body = CreateConversationBody {
            title: request.title.as_deref(),
            initial_message: request.initial_message.as_deref(),
        };
        self.executor
            .execute(RequestDescriptor::post("/conversations").json(&body)?)
            .await
    }

    /// Not exposed by the server yet.
    pub async fn update_conversation(
        &self,
        _id: &str,
        _request: &UpdateConversationRequest,
    ) -> Result<Conversation> {
        Err(ApiError::unsupported("update_conversation"))
    }

    /// Not exposed by the server yet.
    pub async fn delete_conversation(&self, _id: &str) -> Result<()> {
        Err(ApiError::unsupported("delete_conversation"))
    }

    // Messages

    pub async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.executor
            .execute(RequestDescriptor::get(format!(
                "/conversations/{conversation_id}/messages"
            )))
            .await
    }

    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<Message> {
        let body = SendMessageBody {
            conversation_id: &request.conversation_id,
            content: &request.content,
        };
        self.executor
            .execute(RequestDescriptor::post("/messages").json(&body)?)
            .await
    }

    /// Not exposed by the server yet.
    pub async fn mark_message_as_read(&self, _message_id: &str) -> Result<()> {
        Err(ApiError::unsupported("mark_message_as_read"))
    }

    // Expert

    pub async fn get_expert_queue(&self) -> Result<Vec<Conversation>> {
        self.executor
            .execute(RequestDescriptor::get("/expert/queue"))
            .await
    }

    pub async fn claim_conversation(&self, conversation_id: &str) -> Result<()> {
        self.executor
            .execute(RequestDescriptor::post(format!(
                "/expert/conversations/{conversation_id}/claim"
            )))
            .await
    }

    pub async fn unclaim_conversation(&self, conversation_id: &str) -> Result<()> {
        self.executor
            .execute(RequestDescriptor::post(format!(
                "/expert/conversations/{conversation_id}/unclaim"
            )))
            .await
    }

    pub async fn get_expert_profile(&self) -> Result<ExpertProfile> {
        self.executor
            .execute(RequestDescriptor::get("/expert/profile"))
            .await
    }

    pub async fn update_expert_profile(
        &self,
        request: &UpdateExpertProfileRequest,
    ) -> Result<ExpertProfile> {
        let body = UpdateExpertProfileBody {
            bio: request.bio.as_deref(),
            expertise: request.expertise.as_deref(),
            available: request.available,
        };
        self.executor
            .execute(RequestDescriptor::put("/expert/profile").json(&body)?)
            .await
    }

    pub async fn get_expert_assignment_history(&self) -> Result<Vec<ExpertAssignment>> {
        self.executor
            .execute(RequestDescriptor::get("/expert/assignments/history"))
            .await
    }
}

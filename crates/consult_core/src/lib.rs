//! consult_core - Shared types for the consult API client
//!
//! This crate provides the pieces shared by every service client:
//! - `credential` - the bearer `Credential` and the `CredentialStore` contract
//! - `models` - users, conversations, messages and expert resources
//! - `config` - per-service settings loaded from file and environment
//! - `paths` - locations of the on-disk config and credential files

pub mod config;
pub mod credential;
pub mod models;
pub mod paths;

pub use config::{ClientConfig, ServiceConfig};
pub use credential::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use models::{
    AuthEnvelope, Conversation, CreateConversationRequest, ExpertAssignment, ExpertProfile,
    Message, RegisterRequest, SendMessageRequest, UpdateConversationRequest,
    UpdateExpertProfileRequest, User, UserRole,
};

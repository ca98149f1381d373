//! Models module - Resources exchanged with the consult API
//!
//! Wire format is camelCase JSON. Optional fields tolerate absence, but a
//! present field with the wrong type fails deserialization.

mod conversation;
mod expert;
mod user;

pub use conversation::{
    Conversation, CreateConversationRequest, Message, SendMessageRequest,
    UpdateConversationRequest,
};
pub use expert::{ExpertAssignment, ExpertProfile, UpdateExpertProfileRequest};
pub use user::{AuthEnvelope, RegisterRequest, User, UserRole};

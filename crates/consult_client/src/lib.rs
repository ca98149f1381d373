//! consult_client - HTTP mediation layer for the consult API
//!
//! Both services run every call through a [`RequestExecutor`]:
//! - [`AuthService`] logs in, registers, refreshes and logs out, writing the
//!   shared credential store around each call
//! - [`ChatService`] exposes the conversation, message and expert endpoints
//!   and attaches the current credential as a bearer token
//!
//! [`ConsultClient`] wires both services to one credential store and one
//! [`SessionCookies`] jar.

pub mod auth;
pub mod chat;
pub mod client;
pub mod cookies;
pub mod error;
pub mod executor;
pub mod observer;

pub use auth::AuthService;
pub use chat::ChatService;
pub use client::ConsultClient;
pub use cookies::SessionCookies;
pub use error::{ApiError, Result};
pub use executor::{RequestDescriptor, RequestExecutor};
pub use observer::{LogObserver, RequestObserver, RequestTrace};

pub use consult_core::{ClientConfig, Credential, CredentialStore, ServiceConfig};

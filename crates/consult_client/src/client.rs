use std::sync::Arc;

use consult_core::{ClientConfig, CredentialStore, FileCredentialStore};

use crate::auth::AuthService;
use crate::chat::ChatService;
use crate::cookies::SessionCookies;
use crate::error::Result;

/// Both services wired to one credential store and one cookie jar.
#[derive(Debug)]
pub struct ConsultClient {
    credentials: Arc<dyn CredentialStore>,
    cookies: SessionCookies,
    auth: AuthService,
    chat: ChatService,
}

impl ConsultClient {
    /// Client with an in-memory cookie jar.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        Self::with_cookies(config, credentials, SessionCookies::in_memory())
    }

    pub fn with_cookies(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        cookies: SessionCookies,
    ) -> Result<Self> {
        let auth = AuthService::new(&config.auth, Arc::clone(&credentials), cookies.clone())?;
        let chat = ChatService::new(&config.chat, Arc::clone(&credentials), cookies.clone())?;
        Ok(Self {
            credentials,
            cookies,
            auth,
            chat,
        })
    }

    /// Client whose credential and cookies live in the files named by
    /// `config`, so a session carries over to the next process.
    pub fn persistent(config: &ClientConfig) -> Result<Self> {
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::open(&config.credential_path));
        Self::with_cookies(config, credentials, SessionCookies::open(&config.cookie_path))
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }
}

//! Authentication flow.
//!
//! Identity is either anonymous (no credential in the store) or
//! authenticated. Login, register and refresh enter the authenticated state
//! by writing the returned token; logout and a failed current-user check
//! return to anonymous by clearing it. The auth executor never attaches the
//! stored credential itself.

use std::sync::Arc;

use consult_core::{
    AuthEnvelope, Credential, CredentialStore, RegisterRequest, ServiceConfig, User, UserRole,
};
use log::{debug, info, warn};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::cookies::SessionCookies;
use crate::error::Result;
use crate::executor::{RequestDescriptor, RequestExecutor};
use crate::observer::{LogObserver, RequestObserver};

const LOGIN_ENDPOINT: &str = "/auth/login";
const REGISTER_ENDPOINT: &str = "/auth/register";
const LOGOUT_ENDPOINT: &str = "/auth/logout";
const REFRESH_ENDPOINT: &str = "/auth/refresh";
const CURRENT_USER_ENDPOINT: &str = "/auth/me";

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<UserRole>,
}

impl<'a> From<&'a RegisterRequest> for RegisterBody<'a> {
    fn from(request: &'a RegisterRequest) -> Self {
        Self {
            username: &request.username,
            email: &request.email,
            password: &request.password,
            display_name: request.display_name.as_deref(),
            role: request.role,
        }
    }
}

#[derive(Deserialize)]
struct CurrentUserEnvelope {
    user: User,
}

#[derive(Debug)]
pub struct AuthService {
    executor: RequestExecutor,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthService {
    /// Outgoing requests are reported to a [`LogObserver`] by default.
    pub fn new(
        config: &ServiceConfig,
        credentials: Arc<dyn CredentialStore>,
        cookies: SessionCookies,
    ) -> Result<Self> {
        let executor =
            RequestExecutor::new(config, cookies)?.with_observer(Arc::new(LogObserver));
        Ok(Self {
            executor,
            credentials,
        })
    }

    /// Replaces the diagnostic sink for outgoing requests.
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.executor = self.executor.with_observer(observer);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.get().is_some()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let request =
            RequestDescriptor::post(LOGIN_ENDPOINT).json(&LoginBody { username, password })?;
        let envelope: AuthEnvelope = self.executor.execute(request).await?;
        Ok(self.establish_session(envelope))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let request =
            RequestDescriptor::post(REGISTER_ENDPOINT).json(&RegisterBody::from(request))?;
        let envelope: AuthEnvelope = self.executor.execute(request).await?;
        Ok(self.establish_session(envelope))
    }

    /// Exchanges the current session for a fresh token.
    ///
    /// On failure the stored credential is left as it was, even if stale.
    pub async fn refresh_token(&self) -> Result<User> {
        let envelope: AuthEnvelope = self
            .executor
            .execute(RequestDescriptor::post(REFRESH_ENDPOINT))
            .await?;
        Ok(self.establish_session(envelope))
    }

    /// Notifies the server and drops the local session.
    ///
    /// The credential is cleared whether or not the server was reached.
    pub async fn logout(&self) {
        let outcome = self
            .executor
            .execute::<IgnoredAny>(RequestDescriptor::post(LOGOUT_ENDPOINT))
            .await;
        self.credentials.clear();
        match outcome {
            Ok(_) => info!("Logged out"),
            Err(e) => warn!("Logout request failed, local session cleared anyway: {e}"),
        }
    }

    /// Returns the signed-in user, or `None` when there is none.
    ///
    /// Any failure clears the stored credential; no error is returned.
    pub async fn current_user(&self) -> Option<User> {
        match self
            .executor
            .execute::<CurrentUserEnvelope>(RequestDescriptor::get(CURRENT_USER_ENDPOINT))
            .await
        {
            Ok(envelope) => Some(envelope.user),
            Err(e) => {
                debug!("No current user: {e}");
                self.credentials.clear();
                None
            }
        }
    }

    fn establish_session(&self, envelope: AuthEnvelope) -> User {
        self.credentials.set(Credential::new(envelope.token));
        info!("Authenticated as user {}", envelope.user.id);
        envelope.user
    }
}

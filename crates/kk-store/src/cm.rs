//! Principal store backed by the cluster-manager user API.
//!
//! Present-only by design: the observed deployments create local users
//! through this API and never delete or re-key through it, so `delete` and
//! `change_password` report [`StoreError::Unsupported`] instead of pretending
//! to a parity the backend does not have. Creation carries the full Present
//! semantics, including the already-exists no-op.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use kk_common::config::ClusterManagerConfig;
use kk_common::Credential;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{PrincipalStore, Result, StoreError};

const BACKEND: &str = "cluster-manager";

/// Role granted to a user created through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmRole {
    Admin,
    #[default]
    User,
}

impl CmRole {
    /// The API-side role constant.
    pub fn as_api_role(self) -> &'static str {
        match self {
            CmRole::Admin => "ROLE_ADMIN",
            CmRole::User => "ROLE_USER",
        }
    }
}

impl FromStr for CmRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(CmRole::Admin),
            "user" => Ok(CmRole::User),
            other => Err(format!("invalid role '{}', expected admin or user", other)),
        }
    }
}

/// `POST /api/v{n}/users` request envelope. The API takes a list of users;
/// the module always sends exactly one.
#[derive(Debug, Serialize)]
struct UserItems<'a> {
    items: Vec<UserItem<'a>>,
}

#[derive(Debug, Serialize)]
struct UserItem<'a> {
    name: &'a str,
    password: &'a str,
    roles: Vec<&'static str>,
}

/// Store that talks to the cluster-manager REST API with basic auth.
pub struct CmStore {
    client: Client,
    base_url: String,
    api_version: u32,
    username: String,
    password: String,
    role: CmRole,
    timeout: Duration,
}

impl CmStore {
    pub fn new(config: &ClusterManagerConfig, role: CmRole) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_version: config.api_version,
            username: config.username.clone(),
            password: config.password.clone(),
            role,
            timeout,
        })
    }

    fn users_url(&self) -> String {
        format!("{}/api/v{}/users", self.base_url, self.api_version)
    }
}

#[async_trait]
impl PrincipalStore for CmStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn create(
        &self,
        principal: &str,
        credential: &Credential,
        attributes: Option<&str>,
    ) -> Result<()> {
        // The API has no random-key notion; inventing one client-side would
        // silently change the security model, so refuse instead.
        let Credential::Password(password) = credential else {
            return Err(StoreError::Unsupported {
                backend: BACKEND,
                operation: "random-key create",
            });
        };

        if attributes.is_some() {
            warn!("Principal attributes are not supported by the cluster-manager API; ignoring");
        }

        let url = self.users_url();
        let body = UserItems {
            items: vec![UserItem {
                name: principal,
                password,
                roles: vec![self.role.as_api_role()],
            }],
        };

        debug!(%url, user = principal, role = self.role.as_api_role(), "Creating cluster-manager user");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::Timeout {
                        target: url.clone(),
                        timeout: self.timeout,
                    }
                } else {
                    StoreError::Http(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        // A duplicate user comes back as a 400 whose message names the
        // conflict; that is the Present idempotency signal here.
        if status == StatusCode::BAD_REQUEST && message.contains("already exists") {
            return Err(StoreError::AlreadyExists(principal.to_string()));
        }

        warn!(%url, status = status.as_u16(), "Cluster-manager API rejected user creation");
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn delete(&self, _principal: &str) -> Result<()> {
        Err(StoreError::Unsupported {
            backend: BACKEND,
            operation: "delete",
        })
    }

    async fn change_password(&self, _principal: &str, _credential: &Credential) -> Result<()> {
        Err(StoreError::Unsupported {
            backend: BACKEND,
            operation: "change_password",
        })
    }
}

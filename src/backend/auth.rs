//! Identity delegation to the GoTrue API.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use crate::backend::client::SupabaseClient;
use crate::backend::types::{BackendError, Session, User};
use crate::backend::IdentityProvider;

/// `IdentityProvider` backed by `/auth/v1`.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

/// Signup answers with a bare user when email confirmation is on and with a
/// session wrapping the user when it is off.
fn signup_user(value: Value) -> Result<User, BackendError> {
    let user = match value {
        Value::Object(mut map) if map.contains_key("user") => map.remove("user").unwrap_or_default(),
        other => other,
    };
    Ok(serde_json::from_value(user)?)
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, BackendError> {
        let url = self.client.auth_url("signup")?;
        let request = self
            .client
            .request(Method::POST, url, None)
            .json(&json!({ "email": email, "password": password }));

        let body: Value = SupabaseClient::send(request).await?.json().await?;
        signup_user(body)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let url = self.client.auth_url("token")?;
        let request = self
            .client
            .request(Method::POST, url, None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        Ok(SupabaseClient::send(request).await?.json().await?)
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        let url = self.client.auth_url("user")?;
        let request = self.client.request(Method::GET, url, Some(access_token));

        match SupabaseClient::send(request).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(e) if matches!(e.status(), Some(401 | 403)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.client.auth_url("logout")?;
        SupabaseClient::send(self.client.request(Method::POST, url, Some(access_token))).await?;
        Ok(())
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        let url = self.client.auth_url("recover")?;
        let request = self
            .client
            .request(Method::POST, url, None)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }));

        SupabaseClient::send(request).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let url = self.client.auth_url("health")?;
        SupabaseClient::send(self.client.request(Method::GET, url, None)).await?;
        Ok(())
    }
}

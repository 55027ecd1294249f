use async_trait::async_trait;

use wsrelay_core::error::{RelayError, Result};
use wsrelay_core::protocol::auth::{AuthCredential, AUTHORIZATION_HEADER, SESSION_TOKEN_HEADER};
use wsrelay_core::protocol::status::UpstreamReply;

use super::{transport_error, IdentityVerifier};

/// Identity service client.
///
/// `POST <url>` with the client's own authorization + session token headers
/// and `user_id` as a form field. Success requires a 2xx reply whose JSON
/// body carries `"status": "success"`.
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    url: String,
}

impl HttpIdentityVerifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, identity: &str, credential: &AuthCredential) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION_HEADER, credential.authorization())
            .header(SESSION_TOKEN_HEADER, credential.session_token())
            .form(&[("user_id", identity)])
            .send()
            .await
            .map_err(|e| transport_error("identity service", e))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(RelayError::Upstream(format!("identity service returned {status}")));
        }
        if !status.is_success() {
            return Err(RelayError::AuthFailed);
        }

        let reply: UpstreamReply = resp
            .json()
            .await
            .map_err(|e| RelayError::Upstream(format!("identity service reply: {e}")))?;

        if reply.is_success() {
            Ok(())
        } else {
            Err(RelayError::AuthFailed)
        }
    }
}

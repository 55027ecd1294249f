use async_trait::async_trait;

use wsrelay_core::error::{RelayError, Result};
use wsrelay_core::protocol::auth::{AuthCredential, AUTHORIZATION_HEADER, SESSION_TOKEN_HEADER};
use wsrelay_core::protocol::status::{PresenceStatus, UpstreamReply};

use super::{transport_error, StatusNotifier};

/// Status service client.
///
/// `POST <url>` with the fixed service token as authorization, the user's
/// session token, and `user_id` + `status` form fields. A 2xx reply is a
/// success unless its body is a JSON reply with a non-success status.
pub struct HttpStatusNotifier {
    client: reqwest::Client,
    url: String,
    service_token: String,
}

impl HttpStatusNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>, service_token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            service_token: service_token.into(),
        }
    }
}

#[async_trait]
impl StatusNotifier for HttpStatusNotifier {
    async fn notify(
        &self,
        identity: &str,
        credential: &AuthCredential,
        status: PresenceStatus,
    ) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION_HEADER, self.service_token.as_str())
            .header(SESSION_TOKEN_HEADER, credential.session_token())
            .form(&[("user_id", identity), ("status", status.as_str())])
            .send()
            .await
            .map_err(|e| transport_error("status service", e))?;

        let code = resp.status();
        if !code.is_success() {
            return Err(RelayError::Upstream(format!("status service returned {code}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| transport_error("status service", e))?;
        if let Ok(reply) = serde_json::from_slice::<UpstreamReply>(&body) {
            if !reply.is_success() {
                return Err(RelayError::Upstream(format!(
                    "status service rejected {status}: {:?}",
                    reply.status
                )));
            }
        }
        Ok(())
    }
}

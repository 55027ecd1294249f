use serde::Deserialize;
use wsrelay_core::error::{RelayError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub upstream: UpstreamSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            relay: RelaySection::default(),
            upstream: UpstreamSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::UnsupportedVersion);
        }

        self.gateway.validate()?;   // Verify the scope of value
        self.relay.validate()?;
        self.upstream.validate()?;

        Ok(())
    }

    /// Apply `WSRELAY_*` overrides from `lookup` (normally the process env).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WSRELAY_LISTEN") {
            self.gateway.listen = v;
        }
        if let Some(v) = lookup("WSRELAY_SERVICE_SECRET") {
            self.relay.service_secret = v;
        }
        if let Some(v) = lookup("WSRELAY_VERIFIER_URL") {
            self.upstream.verifier_url = v;
        }
        if let Some(v) = lookup("WSRELAY_NOTIFIER_URL") {
            self.upstream.notifier_url = v;
        }
        if let Some(v) = lookup("WSRELAY_NOTIFIER_TOKEN") {
            self.upstream.notifier_token = v;
        }
        if let Some(v) = lookup("WSRELAY_UPSTREAM_TIMEOUT_MS") {
            self.upstream.timeout_ms = v.trim().parse().map_err(|e| {
                RelayError::BadRequest(format!("WSRELAY_UPSTREAM_TIMEOUT_MS: {e}"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(RelayError::BadRequest(
                "gateway.listen must be a valid socket address".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(RelayError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(RelayError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(RelayError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(RelayError::BadRequest(
                "gateway.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_outbound_queue() -> usize {
    256
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Static secret the broadcast caller presents as `authorization`.
    #[serde(default)]
    pub service_secret: String,

    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            service_secret: String::new(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl RelaySection {
    pub fn validate(&self) -> Result<()> {
        if self.service_secret.is_empty() {
            return Err(RelayError::BadRequest("relay.service_secret must be set".into()));
        }
        if !(1..=60000).contains(&self.send_timeout_ms) {
            return Err(RelayError::BadRequest(
                "relay.send_timeout_ms must be between 1 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_send_timeout_ms() -> u64 {
    1500
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamSection {
    #[serde(default)]
    pub verifier_url: String,

    #[serde(default)]
    pub notifier_url: String,

    /// Fixed authorization value sent to the status service.
    #[serde(default)]
    pub notifier_token: String,

    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            verifier_url: String::new(),
            notifier_url: String::new(),
            notifier_token: String::new(),
            timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

impl UpstreamSection {
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("upstream.verifier_url", &self.verifier_url),
            ("upstream.notifier_url", &self.notifier_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(RelayError::BadRequest(format!(
                    "{name} must be an http(s) url"
                )));
            }
        }
        if self.notifier_token.is_empty() {
            return Err(RelayError::BadRequest("upstream.notifier_token must be set".into()));
        }
        if !(100..=30000).contains(&self.timeout_ms) {
            return Err(RelayError::BadRequest(
                "upstream.timeout_ms must be between 100 and 30000".into(),
            ));
        }
        Ok(())
    }
}

fn default_upstream_timeout_ms() -> u64 {
    3000
}

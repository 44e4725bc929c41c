//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! The client never talks to a socket directly. It hands an `HttpRequest` to
//! a `Transport` and gets back either an `HttpResponse` (any status) or a
//! `TransportError` when no response was obtained. Tests swap in their own
//! implementation; production code uses `UreqTransport`.
//!
//! Redirects, timeouts and connection pooling are left at ureq's defaults.

use tracing::debug;

use crate::config::Config;
use crate::error::{ConfigError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Something that can perform one HTTP round-trip.
///
/// Implementations must return non-2xx responses as `Ok` so the client can
/// map status codes itself.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Build an agent honouring the configured proxy and TLS policy.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let proxy = config
            .proxy()
            .map(|p| {
                ureq::Proxy::new(p).map_err(|e| ConfigError::InvalidProxy {
                    proxy: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let verify = config.verify_tls();
        if !verify {
            debug!(endpoint = config.endpoint(), "TLS certificate verification disabled");
        }

        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .proxy(proxy)
            .tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(!verify)
                    .build(),
            )
            .build()
            .new_agent();

        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Post => self.agent.post(&request.path),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = match &request.body {
            Some(body) => builder.send(body.as_bytes())?,
            None => builder.send_empty()?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

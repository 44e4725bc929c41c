//! Serviceability client: validation, request building, and response mapping.
//!
//! # Design
//! `ServiceabilityClient` owns one validated `Config`, one `SessionState`,
//! and one `Transport`. Each operation is split the same way:
//!
//! - `build_*` validates the address and produces an `HttpRequest`. Any
//!   problem is returned synchronously as a `ValidationError`.
//! - `parse_response` maps an `HttpResponse` to the body or a `CallError`.
//! - `check` / `select` glue the two halves around one transport call and
//!   report the outcome through a `Callback`, invoked exactly once.
//!
//! So a caller handles bad input with the `Result` of `check`/`select` and
//! network or protocol failures inside the callback; the two never mix.
//!
//! # Concurrency
//! Calls take `&mut self` because successful responses may update the
//! session cookies. The client is `Send` when its transport is, but sharing
//! one across threads needs external locking (e.g. a `Mutex`). The callback
//! runs on the calling thread before `check`/`select` returns.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info};

use crate::address::{validate_address, Address};
use crate::config::Config;
use crate::error::{CallError, ClientError, ValidationError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::state::SessionState;
use crate::transport::{Transport, UreqTransport};

const CHECK_PATH: &str = "/shop/check";
const SELECT_PATH: &str = "/shop/select";

/// What a response callback receives.
pub type CallResult = Result<Value, CallError>;

/// Response handler for `check` and `select`.
pub struct Callback(Box<dyn FnOnce(CallResult) + Send>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(CallResult) + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// A handler that discards the outcome.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    fn invoke(self, result: CallResult) {
        (self.0)(result)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// Client for the serviceability `check` and `select` endpoints.
pub struct ServiceabilityClient<T = UreqTransport> {
    config: Config,
    base_url: String,
    session: SessionState,
    transport: T,
}

impl ServiceabilityClient<UreqTransport> {
    /// Validate `config`, build a ureq transport for it, and restore
    /// `saved_state` if given.
    pub fn new(config: Config, saved_state: Option<&str>) -> Result<Self, ClientError> {
        let config = config.validate()?;
        let transport = UreqTransport::from_config(&config)?;
        Self::assemble(config, saved_state, transport)
    }

    /// Like [`ServiceabilityClient::new`] but reads the configuration from
    /// untyped JSON.
    pub fn from_value(config: &Value, saved_state: Option<&str>) -> Result<Self, ClientError> {
        Self::new(Config::from_value(config)?, saved_state)
    }
}

impl<T: Transport> ServiceabilityClient<T> {
    pub fn with_transport(
        config: Config,
        saved_state: Option<&str>,
        transport: T,
    ) -> Result<Self, ClientError> {
        let config = config.validate()?;
        Self::assemble(config, saved_state, transport)
    }

    fn assemble(config: Config, saved_state: Option<&str>, transport: T) -> Result<Self, ClientError> {
        let mut session = SessionState::new(config.endpoint());
        if let Some(saved) = saved_state {
            session.decode(saved)?;
        }
        Ok(Self {
            base_url: config.endpoint().trim_end_matches('/').to_string(),
            config,
            session,
            transport,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session cookies as an opaque string suitable for persisting.
    ///
    /// Before the service has set any cookie this is the empty string,
    /// which `set_state` and `saved_state` reject. Persist it only when it
    /// is non-empty, and pass `None` otherwise.
    pub fn state(&self) -> String {
        self.session.encode()
    }

    /// Merge a string previously returned by [`ServiceabilityClient::state`]
    /// into the session.
    pub fn set_state(&mut self, encoded: &str) -> Result<(), ValidationError> {
        self.session.decode(encoded)
    }

    pub fn build_check(&self, address: &Address) -> Result<HttpRequest, ValidationError> {
        self.build_request(CHECK_PATH, address)
    }

    pub fn build_select(&self, address: &Address) -> Result<HttpRequest, ValidationError> {
        self.build_request(SELECT_PATH, address)
    }

    fn build_request(&self, path: &str, address: &Address) -> Result<HttpRequest, ValidationError> {
        let address = validate_address(address)?;
        let body = serde_json::to_string(&address)
            .map_err(|e| ValidationError::Unserializable(e.to_string()))?;

        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(cookie) = self.session.cookie_header() {
            headers.push(("cookie".to_string(), cookie));
        }

        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{path}", self.base_url),
            headers,
            body: Some(body),
        })
    }

    /// Map a response to the parsed body (status 200) or a protocol error.
    ///
    /// The body is not interpreted: valid JSON is returned as-is, an empty
    /// body becomes `Value::Null`, anything else is returned as a JSON string.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, CallError> {
        if response.status != 200 {
            return Err(CallError::Protocol {
                status: response.status,
                body: response.body,
            });
        }
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&response.body).unwrap_or_else(|_| Value::String(response.body)))
    }

    /// Ask whether `address` can be serviced.
    ///
    /// Returns `Err` without touching the network if the address is invalid.
    /// Otherwise the outcome goes to `callback` (or nowhere, if `None`).
    pub fn check(&mut self, address: &Address, callback: Option<Callback>) -> Result<(), ValidationError> {
        self.call(CHECK_PATH, address, callback)
    }

    /// Select a serviceable candidate, typically one returned by `check`
    /// with its `LocationId`/`UnitId` filled in.
    pub fn select(&mut self, address: &Address, callback: Option<Callback>) -> Result<(), ValidationError> {
        self.call(SELECT_PATH, address, callback)
    }

    /// [`ServiceabilityClient::check`] for an untyped JSON address.
    pub fn check_value(&mut self, address: &Value, callback: Option<Callback>) -> Result<(), ValidationError> {
        self.call(CHECK_PATH, &Address::from_value(address)?, callback)
    }

    /// [`ServiceabilityClient::select`] for an untyped JSON address.
    pub fn select_value(&mut self, address: &Value, callback: Option<Callback>) -> Result<(), ValidationError> {
        self.call(SELECT_PATH, &Address::from_value(address)?, callback)
    }

    fn call(&mut self, path: &str, address: &Address, callback: Option<Callback>) -> Result<(), ValidationError> {
        let request = self.build_request(path, address)?;
        let callback = callback.unwrap_or_else(Callback::noop);
        let verbose = self.config.is_verbose();

        if verbose {
            info!(url = %request.path, cookies = self.session.len(), "sending serviceability request");
        } else {
            debug!(url = %request.path, cookies = self.session.len(), "sending serviceability request");
        }

        let outcome = match self.transport.execute(&request) {
            Ok(response) => {
                let set_cookies: Vec<String> = response
                    .header_values("set-cookie")
                    .map(str::to_string)
                    .collect();
                let status = response.status;
                let result = self.parse_response(response);
                if result.is_ok() {
                    for header in &set_cookies {
                        self.session.absorb_set_cookie(header);
                    }
                }
                if verbose {
                    info!(path, status, ok = result.is_ok(), "serviceability response");
                } else {
                    debug!(path, status, ok = result.is_ok(), "serviceability response");
                }
                result
            }
            Err(e) => {
                debug!(path, error = %e, "serviceability request failed");
                Err(CallError::Transport(e))
            }
        };

        callback.invoke(outcome);
        Ok(())
    }
}

impl<T> fmt::Debug for ServiceabilityClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceabilityClient")
            .field("config", &self.config)
            .field("cookies", &self.session.len())
            .finish_non_exhaustive()
    }
}

//! Client for an address serviceability API.
//!
//! # Overview
//! Given a mailing address, asks a remote service whether it can be serviced
//! (`check`) and lets the caller pick one of the returned candidates
//! (`select`). Session cookies set by the service are kept per client and
//! can be exported as an opaque string and restored later.
//!
//! # Design
//! - Validation is pure and synchronous: bad configuration fails
//!   construction, bad addresses fail the call before any I/O.
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`);
//!   a `Transport` executes them, so the mapping logic is testable without a
//!   network. `UreqTransport` is the default.
//! - Network outcomes are delivered to a `Callback` exactly once per call.
//!
//! ```no_run
//! use serviceability_core::{Address, Callback, Config, ServiceabilityClient};
//!
//! let mut client = ServiceabilityClient::new(Config::new("https://mcc.com/svc"), None)?;
//! client.check(
//!     &Address::new("718 25th St", "50312"),
//!     Some(Callback::new(|result| match result {
//!         Ok(body) => println!("{body}"),
//!         Err(e) => eprintln!("check failed: {e}"),
//!     })),
//! )?;
//! let saved = client.state();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod state;
pub mod transport;

pub use address::{validate_address, Address};
pub use client::{CallResult, Callback, ServiceabilityClient};
pub use config::{Config, FieldKind, FieldSpec, CONFIG_SCHEMA};
pub use error::{CallError, ClientError, ConfigError, TransportError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use state::SessionState;
pub use transport::{Transport, UreqTransport};

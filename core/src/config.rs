//! Client configuration and its validation rules.
//!
//! # Design
//! `Config` is the only configuration shape the client understands. It can
//! be built in code with the `with_*` methods or read from loosely-typed JSON
//! through `Config::from_value`, which walks `CONFIG_SCHEMA` and reports the
//! first missing or mistyped key. Both paths end in `Config::validate`, so
//! the trimming and non-empty rules are enforced in exactly one place.

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// JSON type a configuration key must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }
}

/// One row of the configuration schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Keys recognised by `Config::from_value`. Anything else is ignored.
pub const CONFIG_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        key: "endpoint",
        kind: FieldKind::String,
        required: true,
    },
    FieldSpec {
        key: "proxy",
        kind: FieldKind::String,
        required: false,
    },
    FieldSpec {
        key: "verbose",
        kind: FieldKind::Boolean,
        required: false,
    },
    FieldSpec {
        key: "accept_invalid_certs",
        kind: FieldKind::Boolean,
        required: false,
    },
];

/// Validated client configuration.
///
/// `endpoint` is the base URL of the serviceability API, e.g.
/// `https://mcc.com/svc`. Optional settings that were not supplied stay
/// `None` rather than being defaulted, so `verify_tls` can tell "not set"
/// apart from "set to false".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    endpoint: String,
    proxy: Option<String>,
    verbose: Option<bool>,
    accept_invalid_certs: Option<bool>,
}

impl Config {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            proxy: None,
            verbose: None,
            accept_invalid_certs: None,
        }
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Explicitly enable or disable certificate verification, overriding
    /// the proxy-based default described on [`Config::verify_tls`].
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = Some(accept);
        self
    }

    /// Build a configuration from an untyped JSON value.
    ///
    /// Keys are checked in `CONFIG_SCHEMA` order and the first problem wins.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let empty = Map::new();
        let map = match value {
            Value::Null => return Err(ConfigError::Missing),
            Value::Object(map) => map,
            // Any non-object has no keys, so the first required key is missing.
            _ => &empty,
        };

        for spec in CONFIG_SCHEMA {
            match map.get(spec.key) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(ConfigError::Required { key: spec.key });
                    }
                }
                Some(v) if !spec.kind.matches(v) => {
                    return Err(ConfigError::TypeMismatch {
                        key: spec.key,
                        expected: spec.kind.name(),
                    });
                }
                Some(_) => {}
            }
        }

        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let boolean = |key: &str| map.get(key).and_then(Value::as_bool);

        Config {
            endpoint: string("endpoint").unwrap_or_default(),
            proxy: string("proxy"),
            verbose: boolean("verbose"),
            accept_invalid_certs: boolean("accept_invalid_certs"),
        }
        .validate()
    }

    /// Parse JSON text and validate it with [`Config::from_value`].
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Return a trimmed copy, rejecting blank strings.
    pub fn validate(&self) -> Result<Self, ConfigError> {
        let endpoint = non_empty(&self.endpoint, "endpoint")?;
        let proxy = self
            .proxy
            .as_deref()
            .map(|p| non_empty(p, "proxy"))
            .transpose()?;

        Ok(Config {
            endpoint,
            proxy,
            verbose: self.verbose,
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn verbose(&self) -> Option<bool> {
        self.verbose
    }

    pub fn accept_invalid_certs(&self) -> Option<bool> {
        self.accept_invalid_certs
    }

    /// Whether server certificates are verified.
    ///
    /// An explicit `accept_invalid_certs` always wins. Without it,
    /// verification is on unless a proxy is configured: a configured proxy
    /// is assumed to be a local intercepting proxy with its own certificate
    /// chain. Callers that route through an untrusted proxy should set
    /// `accept_invalid_certs(false)` to keep verification on.
    pub fn verify_tls(&self) -> bool {
        match self.accept_invalid_certs {
            Some(accept) => !accept,
            None => self.proxy.is_none(),
        }
    }

    pub(crate) fn is_verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }
}

fn non_empty(s: &str, key: &'static str) -> Result<String, ConfigError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { key });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({ "endpoint": "https://mcc.com/svc", "verbose": false })
    }

    #[test]
    fn null_config_is_rejected() {
        assert!(matches!(
            Config::from_value(&Value::Null),
            Err(ConfigError::Missing)
        ));
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let err = Config::from_value(&json!({ "verbose": true })).unwrap_err();
        assert!(matches!(err, ConfigError::Required { key: "endpoint" }));
    }

    #[test]
    fn null_endpoint_is_rejected() {
        let err = Config::from_value(&json!({ "endpoint": null })).unwrap_err();
        assert!(matches!(err, ConfigError::Required { key: "endpoint" }));
    }

    #[test]
    fn blank_endpoint_is_rejected() {
        for blank in ["", " \t "] {
            let err = Config::from_value(&json!({ "endpoint": blank })).unwrap_err();
            assert!(matches!(err, ConfigError::Empty { key: "endpoint" }), "{blank:?}");
        }
    }

    #[test]
    fn mistyped_fields_are_rejected() {
        for (key, bad) in [("endpoint", json!(1)), ("verbose", json!("yes")), ("proxy", json!([]))] {
            let mut config = valid();
            config[key] = bad;
            let err = Config::from_value(&config).unwrap_err();
            assert!(
                matches!(err, ConfigError::TypeMismatch { key: k, .. } if k == key),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn optional_fields_stay_unset() {
        let config = Config::from_value(&json!({ "endpoint": "https://mcc.com/svc", "proxy": null }))
            .unwrap();
        assert_eq!(config.proxy(), None);
        assert_eq!(config.verbose(), None);
        assert_eq!(config.accept_invalid_certs(), None);
    }

    #[test]
    fn strings_are_trimmed() {
        let config = Config::from_value(&json!({
            "endpoint": "  https://mcc.com/svc\t",
            "proxy": " http://127.0.0.1:8888 ",
        }))
        .unwrap();
        assert_eq!(config.endpoint(), "https://mcc.com/svc");
        assert_eq!(config.proxy(), Some("http://127.0.0.1:8888"));
    }

    #[test]
    fn blank_proxy_is_rejected() {
        let err = Config::new("https://mcc.com/svc")
            .with_proxy("   ")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Empty { key: "proxy" }));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config =
            Config::from_value(&json!({ "endpoint": "https://mcc.com/svc", "extra": 1 })).unwrap();
        assert_eq!(config.endpoint(), "https://mcc.com/svc");
    }

    #[test]
    fn non_object_config_reports_missing_endpoint() {
        let err = Config::from_value(&json!("https://mcc.com/svc")).unwrap_err();
        assert!(matches!(err, ConfigError::Required { key: "endpoint" }));
    }

    #[test]
    fn from_json_str_reports_bad_json() {
        assert!(matches!(
            Config::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn tls_verified_without_proxy() {
        assert!(Config::new("https://mcc.com/svc").verify_tls());
    }

    #[test]
    fn tls_relaxed_behind_proxy_by_default() {
        let config = Config::new("https://mcc.com/svc").with_proxy("http://127.0.0.1:8888");
        assert!(!config.verify_tls());
    }

    #[test]
    fn explicit_flag_overrides_proxy_default() {
        let config = Config::new("https://mcc.com/svc")
            .with_proxy("http://127.0.0.1:8888")
            .with_accept_invalid_certs(false);
        assert!(config.verify_tls());

        let config = Config::new("https://mcc.com/svc").with_accept_invalid_certs(true);
        assert!(!config.verify_tls());
    }
}

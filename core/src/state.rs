//! Session cookies and their opaque string encoding.
//!
//! # Design
//! The service keeps its session in cookies. `SessionState` holds them for
//! one endpoint, in insertion order, and converts to and from the
//! `name1=value1; name2=value2` string callers persist between runs. The
//! store itself is never handed out; callers only see the encoded form.
//!
//! Decoding is all-or-nothing: a single malformed segment rejects the whole
//! string and leaves the session as it was.

use std::time::SystemTime;

use tracing::warn;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cookie {
    name: String,
    value: String,
}

/// Cookies accumulated for a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    scope: String,
    cookies: Vec<Cookie>,
}

impl SessionState {
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            cookies: Vec::new(),
        }
    }

    /// The endpoint these cookies belong to.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Serialize as `name=value` pairs joined by `"; "`.
    pub fn encode(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Value for the `Cookie` request header, or `None` with no cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.encode())
        }
    }

    /// Merge an encoded state string into the session.
    ///
    /// Empty segments (e.g. from a trailing `;`) are skipped. Any other
    /// segment must be `name=value` with a non-empty name.
    pub fn decode(&mut self, encoded: &str) -> Result<(), ValidationError> {
        if encoded.trim().is_empty() {
            return Err(ValidationError::InvalidState);
        }

        let pairs = encoded
            .split(';')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                parse_pair(segment)
                    .ok_or_else(|| ValidationError::MalformedStateSegment(segment.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (name, value) in pairs {
            self.insert(name, value);
        }
        Ok(())
    }

    /// Apply one `Set-Cookie` header value from a response.
    ///
    /// Domain and path attributes are ignored; every cookie is scoped to
    /// this session's endpoint. A non-positive `Max-Age`, an `Expires` in
    /// the past, or an empty value removes the cookie.
    pub fn absorb_set_cookie(&mut self, header: &str) {
        let cookie = match cookie::Cookie::parse(header) {
            Ok(cookie) => cookie,
            Err(e) => {
                warn!(header, error = %e, "ignoring malformed Set-Cookie header");
                return;
            }
        };

        let expired = cookie
            .max_age()
            .is_some_and(|age| age.is_zero() || age.is_negative())
            || cookie
                .expires_datetime()
                .is_some_and(|at| at <= SystemTime::now());

        if expired || cookie.value().is_empty() {
            self.cookies.retain(|c| c.name != cookie.name());
        } else {
            self.insert(cookie.name().to_string(), cookie.value().to_string());
        }
    }

    fn insert(&mut self, name: String, value: String) {
        match self.cookies.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.value = value,
            None => self.cookies.push(Cookie { name, value }),
        }
    }
}

fn parse_pair(segment: &str) -> Option<(String, String)> {
    let (name, value) = segment.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

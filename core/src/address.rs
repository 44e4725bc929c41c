//! Mailing address sent to the serviceability endpoints.
//!
//! Only `Address1` and `Zip` are checked locally; those are the two fields
//! the remote API cannot work without. Everything else is forwarded as-is
//! and left to the server to judge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A mailing address, serialized with the field names the service expects.
///
/// Only `address1` and `zip` are typed. The optional fields keep whatever
/// JSON the caller supplied, and `location_id`/`unit_id` are opaque
/// identifiers returned by a previous `check` and echoed back on `select`.
/// Keys the client does not model are kept in `extra` and sent unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "Address1")]
    pub address1: String,
    #[serde(rename = "City", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<Value>,
    #[serde(rename = "State", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(rename = "UnitNumber", default, skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<Value>,
    #[serde(rename = "Zip")]
    pub zip: String,
    #[serde(rename = "LocationId", default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Value>,
    #[serde(rename = "UnitId", default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const MODELLED: [&str; 7] = [
    "Address1",
    "City",
    "State",
    "UnitNumber",
    "Zip",
    "LocationId",
    "UnitId",
];

impl Address {
    pub fn new(address1: impl Into<String>, zip: impl Into<String>) -> Self {
        Self {
            address1: address1.into(),
            zip: zip.into(),
            ..Self::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<Value>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<Value>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_unit_number(mut self, unit_number: impl Into<Value>) -> Self {
        self.unit_number = Some(unit_number.into());
        self
    }

    pub fn with_location_id(mut self, id: impl Into<Value>) -> Self {
        self.location_id = Some(id.into());
        self
    }

    pub fn with_unit_id(mut self, id: impl Into<Value>) -> Self {
        self.unit_id = Some(id.into());
        self
    }

    /// Add a field the client does not model; it is sent as-is.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Read an address from an untyped JSON value.
    ///
    /// Null, non-object, and missing or non-string `Address1`/`Zip` are
    /// rejected. Blank required fields are left for [`validate_address`].
    /// Every other key is carried through without inspection.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let map = match value {
            Value::Null => return Err(ValidationError::AddressMissing),
            Value::Object(map) => map,
            _ => return Err(ValidationError::AddressNotObject),
        };

        let required = |field: &'static str| match map.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(ValidationError::InvalidField { field }),
        };
        let passthrough = |field: &str| map.get(field).filter(|v| !v.is_null()).cloned();

        let extra = map
            .iter()
            .filter(|(key, _)| !MODELLED.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Address {
            address1: required("Address1")?,
            city: passthrough("City"),
            state: passthrough("State"),
            unit_number: passthrough("UnitNumber"),
            zip: required("Zip")?,
            location_id: passthrough("LocationId"),
            unit_id: passthrough("UnitId"),
            extra,
        })
    }
}

/// Return a copy of `address` with `Address1` and `Zip` trimmed.
///
/// Fails if either is empty once trimmed. The input is never modified.
pub fn validate_address(address: &Address) -> Result<Address, ValidationError> {
    let address1 = required_string(&address.address1, "Address1")?;
    let zip = required_string(&address.zip, "Zip")?;
    Ok(Address {
        address1,
        zip,
        ..address.clone()
    })
}

fn required_string(s: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidField { field });
    }
    Ok(trimmed.to_string())
}

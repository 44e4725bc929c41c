use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

/// Address as posted by the client. Every field is optional here so the
/// handlers can answer 400 instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct AddressInput {
    #[serde(rename = "Address1")]
    pub address1: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "UnitNumber")]
    pub unit_number: Option<String>,
    #[serde(rename = "Zip")]
    pub zip: Option<String>,
    #[serde(rename = "LocationId")]
    pub location_id: Option<Value>,
    #[serde(rename = "UnitId")]
    pub unit_id: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "Address1")]
    pub address1: String,
    #[serde(rename = "City", skip_serializing_if = "Option::is_none", default)]
    pub city: Option<String>,
    #[serde(rename = "State", skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(rename = "Zip")]
    pub zip: String,
    #[serde(rename = "LocationId")]
    pub location_id: Uuid,
    #[serde(rename = "UnitId", skip_serializing_if = "Option::is_none", default)]
    pub unit_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub serviceable: bool,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectResponse {
    pub selected: bool,
    #[serde(rename = "LocationId")]
    pub location_id: Uuid,
}

/// Issued session ids, each with the location ids offered to it by `check`.
pub type Sessions = Arc<RwLock<HashMap<Uuid, HashSet<Uuid>>>>;

pub fn app() -> Router {
    let sessions: Sessions = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/shop/check", post(check))
        .route("/shop/select", post(select))
        .with_state(sessions)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn check(
    State(sessions): State<Sessions>,
    headers: HeaderMap,
    Json(input): Json<AddressInput>,
) -> Response {
    let Some((address1, zip)) = required_fields(&input) else {
        return (StatusCode::BAD_REQUEST, "Address1 and Zip are required").into_response();
    };

    let mut sessions = sessions.write().await;
    let (session, issued) = match session_id(&headers).filter(|id| sessions.contains_key(id)) {
        Some(id) => (id, false),
        None => {
            let id = Uuid::new_v4();
            sessions.insert(id, HashSet::new());
            (id, true)
        }
    };

    // Zips in the 0xxxx range are outside the service area.
    let serviceable = !zip.starts_with('0');
    let mut candidates = Vec::new();
    if serviceable {
        let candidate = Candidate {
            address1,
            city: input.city,
            state: input.state,
            zip,
            location_id: Uuid::new_v4(),
            unit_id: input.unit_number.map(|unit| format!("unit-{}", unit.trim())),
        };
        if let Some(offered) = sessions.get_mut(&session) {
            offered.insert(candidate.location_id);
        }
        candidates.push(candidate);
    }
    info!(%session, serviceable, "check");

    let mut response = Json(CheckResponse {
        serviceable,
        candidates,
    })
    .into_response();
    if issued {
        let cookie = format!("{SESSION_COOKIE}={session}; Path=/");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

async fn select(
    State(sessions): State<Sessions>,
    headers: HeaderMap,
    Json(input): Json<AddressInput>,
) -> Result<Json<SelectResponse>, StatusCode> {
    if required_fields(&input).is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let sessions = sessions.read().await;
    let offered = session_id(&headers)
        .and_then(|id| sessions.get(&id))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let location_id = input
        .location_id
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
        .filter(|id| offered.contains(id))
        .ok_or(StatusCode::NOT_FOUND)?;

    debug!(%location_id, unit = ?input.unit_id, "select");
    Ok(Json(SelectResponse {
        selected: true,
        location_id,
    }))
}

/// Trimmed `Address1` and `Zip`, or `None` if either is missing or blank.
fn required_fields(input: &AddressInput) -> Option<(String, String)> {
    let non_blank = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some((non_blank(&input.address1)?, non_blank(&input.zip)?))
}

/// The `session` cookie from the request, if present and well-formed.
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

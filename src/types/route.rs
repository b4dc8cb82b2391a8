//! Mock route definitions and save-time validation

use axum::http::{HeaderName, HeaderValue};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{normalize_path, RouteId, ServerId};
use crate::error::{SimulationError, SimulatorResult};

/// Methods a route may be configured with
pub const SUPPORTED_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Ordered response headers, as configured on a route
pub type HeaderList = IndexMap<String, String>;

/// One simulated endpoint under a mock server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockRoute {
    pub id: RouteId,
    pub mock_server_id: ServerId,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub response_body: String,
    #[serde(with = "headers_json")]
    pub response_headers: HeaderList,
    pub is_enabled: bool,
    pub delay_ms: u64,
    pub chaos_enabled: bool,
    pub failure_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl MockRoute {
    /// A route with the dashboard's "New Route" defaults
    pub fn draft(id: RouteId, mock_server_id: ServerId) -> Self {
        Self {
            id,
            mock_server_id,
            method: "GET".to_string(),
            path: "/".to_string(),
            status_code: 200,
            response_body: String::new(),
            response_headers: HeaderList::new(),
            is_enabled: true,
            delay_ms: 0,
            chaos_enabled: false,
            failure_rate: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Chaos settings as seen by the chaos policy
    pub fn chaos_settings(&self) -> ChaosSettings {
        ChaosSettings {
            enabled: self.chaos_enabled,
            failure_rate: self.failure_rate,
        }
    }
}

/// Per-route chaos configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaosSettings {
    pub enabled: bool,
    /// Already clamped to `0.0..=1.0` when the route was saved
    pub failure_rate: f64,
}

/// Limits enforced when a route is saved
#[derive(Debug, Clone, Copy)]
pub struct RouteRules {
    pub max_delay_ms: u64,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self { max_delay_ms: 60_000 }
    }
}

/// Payload for creating or updating a route.
///
/// Every field is optional: on update, omitted fields keep their stored
/// value, which is how the dashboard toggles `isEnabled` on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_server_id: Option<ServerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(
        default,
        deserialize_with = "headers_json::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_headers: Option<HeaderList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chaos_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_rate: Option<f64>,
}

impl RouteInput {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: Some(method.to_string()),
            path: Some(path.to_string()),
            ..Default::default()
        }
    }

    pub fn for_server(mut self, server_id: ServerId) -> Self {
        self.mock_server_id = Some(server_id);
        self
    }

    pub fn status(mut self, status: i64) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.response_body = Some(body.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.response_headers
            .get_or_insert_with(HeaderList::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn delay(mut self, delay_ms: i64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn chaos(mut self, failure_rate: f64) -> Self {
        self.chaos_enabled = Some(true);
        self.failure_rate = Some(failure_rate);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = Some(enabled);
        self
    }

    /// Validate the provided fields and write them onto `route`.
    ///
    /// `route` is left untouched when validation fails.
    pub fn apply_to(&self, route: &mut MockRoute, rules: &RouteRules) -> SimulatorResult<()> {
        let mut updated = route.clone();

        if let Some(method) = &self.method {
            updated.method = validate_method(method)?;
        }
        if let Some(path) = &self.path {
            updated.path = validate_route_path(path)?;
        }
        if let Some(status) = self.status_code {
            updated.status_code = validate_status(status)?;
        }
        if let Some(body) = &self.response_body {
            updated.response_body = body.clone();
        }
        if let Some(headers) = &self.response_headers {
            validate_headers(headers)?;
            updated.response_headers = headers.clone();
        }
        if let Some(enabled) = self.is_enabled {
            updated.is_enabled = enabled;
        }
        if let Some(delay) = self.delay_ms {
            updated.delay_ms = validate_delay(delay, rules)?;
        }
        if let Some(chaos) = self.chaos_enabled {
            updated.chaos_enabled = chaos;
        }
        if let Some(rate) = self.failure_rate {
            updated.failure_rate = clamp_failure_rate(rate);
        }

        *route = updated;
        Ok(())
    }
}

/// Clamp a failure rate into `0.0..=1.0`; NaN becomes `0.0`
pub fn clamp_failure_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

fn validate_method(method: &str) -> SimulatorResult<String> {
    let method = method.trim().to_ascii_uppercase();
    if SUPPORTED_METHODS.contains(&method.as_str()) {
        Ok(method)
    } else {
        Err(SimulationError::invalid(
            "method",
            format!("unsupported method '{}'", method),
        ))
    }
}

fn validate_route_path(path: &str) -> SimulatorResult<String> {
    let path = path.trim();
    if path.contains(['?', '#']) || path.chars().any(char::is_whitespace) {
        return Err(SimulationError::invalid(
            "path",
            "path may not contain a query, fragment or whitespace",
        ));
    }
    // Inbound paths are compared as they appear on the wire, so only
    // characters a client sends unescaped can ever match
    if let Some(c) = path.chars().find(|&c| !is_path_char(c)) {
        return Err(SimulationError::invalid(
            "path",
            format!("path may not contain '{}'; use plain ASCII segments", c),
        ));
    }
    Ok(normalize_path(path))
}

/// RFC 3986 `pchar` without percent-escapes, plus the segment separator
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "/-._~!$&'()*+,;=:@".contains(c)
}

fn validate_status(status: i64) -> SimulatorResult<u16> {
    if (100..=599).contains(&status) {
        Ok(status as u16)
    } else {
        Err(SimulationError::invalid(
            "statusCode",
            format!("status code {} is outside 100-599", status),
        ))
    }
}

fn validate_delay(delay: i64, rules: &RouteRules) -> SimulatorResult<u64> {
    if delay < 0 {
        return Err(SimulationError::invalid("delayMs", "delay cannot be negative"));
    }
    let delay = delay as u64;
    if delay > rules.max_delay_ms {
        return Err(SimulationError::invalid(
            "delayMs",
            format!("delay {}ms exceeds the maximum of {}ms", delay, rules.max_delay_ms),
        ));
    }
    Ok(delay)
}

fn validate_headers(headers: &HeaderList) -> SimulatorResult<()> {
    for (name, value) in headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(SimulationError::invalid(
                "responseHeaders",
                format!("invalid header name '{}'", name),
            ));
        }
        if HeaderValue::from_str(value).is_err() {
            return Err(SimulationError::invalid(
                "responseHeaders",
                format!("invalid value for header '{}'", name),
            ));
        }
    }
    Ok(())
}

/// Headers travel as a JSON-encoded object string, the dashboard's format.
/// Plain objects are accepted too.
mod headers_json {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::HeaderList;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Encoded(String),
        Map(HeaderList),
    }

    impl Repr {
        fn into_headers<E: de::Error>(self) -> Result<HeaderList, E> {
            match self {
                Repr::Encoded(s) if s.trim().is_empty() => Ok(HeaderList::new()),
                Repr::Encoded(s) => serde_json::from_str(&s).map_err(E::custom),
                Repr::Map(map) => Ok(map),
            }
        }
    }

    pub fn serialize<S>(headers: &HeaderList, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = serde_json::to_string(headers).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HeaderList, D::Error>
    where
        D: Deserializer<'de>,
    {
        Repr::deserialize(deserializer)?.into_headers()
    }

    pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<HeaderList>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Repr>::deserialize(deserializer)?
            .map(Repr::into_headers)
            .transpose()
    }
}

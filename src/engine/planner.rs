//! Response planning for matched routes

use bytes::Bytes;

use crate::types::MockRoute;

/// Status, ordered headers and body to emit for a request
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePlan {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Builds the response contract configured on a route
pub struct ResponsePlanner;

impl ResponsePlanner {
    /// Route headers come first, in the order they were configured. A
    /// `Content-Type` is inferred from the body only when none is set.
    pub fn plan(route: &MockRoute) -> ResponsePlan {
        let mut headers: Vec<(String, String)> = route
            .response_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if !has_content_type {
            headers.push((
                "Content-Type".to_string(),
                infer_content_type(&route.response_body).to_string(),
            ));
        }

        ResponsePlan {
            status: route.status_code,
            headers,
            body: Bytes::from(route.response_body.clone()),
        }
    }
}

fn infer_content_type(body: &str) -> &'static str {
    if serde_json::from_str::<serde::de::IgnoredAny>(body).is_ok() {
        "application/json"
    } else {
        "text/plain"
    }
}

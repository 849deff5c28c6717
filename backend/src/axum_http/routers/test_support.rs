use axum::{
    Extension, Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::auth::{
    JwtVerifier,
    tests::{SECRET, valid_token},
};

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 15, 30, 0).unwrap()
}

/// Sends a GET through `app`, optionally authenticated with a token for `role`.
pub(crate) async fn get(app: Router, uri: &str, role: Option<&str>) -> (StatusCode, Value) {
    let app = app.layer(Extension(Arc::new(JwtVerifier::new(SECRET))));

    let mut request = Request::builder().uri(uri);
    if let Some(role) = role {
        request = request.header(AUTHORIZATION, format!("Bearer {}", valid_token(role)));
    }

    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

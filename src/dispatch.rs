//! Handler dispatch and response translation.
//!
//! Invokes the matched handler with the normalized query and maps its
//! `Answer` onto the HTTP response: status, JSON body, Set-Cookie headers
//! with forced attributes, and the login-required message rewrite on the
//! failure path.

use chrono::Utc;
use hyper::header::{HeaderValue, SET_COOKIE};
use hyper::{Body, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::handler::registry::Route;
use crate::handler::Answer;
use crate::outbound::OutboundClient;
use crate::query::QueryMap;

/// Fixed localized message written when a handler signals re-authentication
pub const LOGIN_REQUIRED_MSG: &str = "需要登录";

/// CORS headers attached to every gateway response
pub const CORS_ALLOW_HEADERS: &str = "X-Requested-With,Content-Type";
pub const CORS_ALLOW_METHODS: &str = "PUT,POST,GET,DELETE,OPTIONS";

/// Invoke the matched handler and translate its answer into a response.
pub async fn dispatch(
    route: &Route,
    query: QueryMap,
    client: &OutboundClient,
    original_url: &str,
) -> Response<Body> {
    let request_id = Uuid::new_v4();
    let start_time = Utc::now();

    debug!("Request {} dispatched to {}", request_id, route.path);

    let mut answer = route.handler.handle(query, client).await;

    let duration = Utc::now() - start_time;
    if answer.is_success() {
        info!(
            "[OK] {} ({}ms)",
            decode_url(original_url),
            duration.num_milliseconds()
        );
    } else {
        warn!(
            "[ERR] {} status={} body={}",
            decode_url(original_url),
            answer.status,
            answer.body
        );
        rewrite_login_required(&mut answer);
    }

    answer_to_response(&answer)
}

/// Build the HTTP response for an answer.
///
/// One formatting path serves both verdicts; the failure-only rewrite has
/// already happened by the time this runs.
fn answer_to_response(answer: &Answer) -> Response<Body> {
    let payload = serde_json::to_vec(&answer.body).unwrap_or_else(|e| {
        warn!("Failed to serialize answer body: {}", e);
        b"{}".to_vec()
    });

    let mut response = Response::builder()
        .status(answer.status)
        .header("Content-Type", "application/json; charset=utf-8");

    for cookie in &answer.cookies {
        let forced = force_cookie_attributes(cookie);
        if let Ok(value) = HeaderValue::from_str(&forced) {
            response = response.header(SET_COOKIE, value);
        } else {
            warn!("Dropping unparsable Set-Cookie value");
        }
    }

    response.body(Body::from(payload)).unwrap_or_else(|e| {
        warn!("Failed to build response: {}", e);
        let mut fallback = Response::new(Body::from("{}"));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Rewrite the body message when the handler signals re-authentication.
///
/// The sentinel `code` of `'301'` is a handler-level "must log in again"
/// marker, not an HTTP redirect; both the string and numeric spellings are
/// accepted.
fn rewrite_login_required(answer: &mut Answer) {
    let is_sentinel = match answer.body.get("code") {
        Some(Value::String(code)) => code == "301",
        Some(Value::Number(code)) => code.as_i64() == Some(301),
        _ => false,
    };

    if is_sentinel {
        if let Value::Object(body) = &mut answer.body {
            body.insert("msg".to_string(), Value::from(LOGIN_REQUIRED_MSG));
        }
    }
}

/// Force `SameSite=None; Secure` onto a Set-Cookie string, regardless of
/// the attributes the handler supplied.
pub fn force_cookie_attributes(cookie: &str) -> String {
    let trimmed = cookie.trim_end().trim_end_matches(';').trim_end();
    format!("{}; SameSite=None; Secure", trimmed)
}

/// Attach the CORS header set to a response.
///
/// The allowed origin echoes the request origin when one was sent.
pub fn apply_cors_headers(response: &mut Response<Body>, origin: Option<&str>) {
    let headers = response.headers_mut();

    let allow_origin = origin
        .and_then(|o| HeaderValue::from_str(o).ok())
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    headers.insert("Access-Control-Allow-Origin", allow_origin);
    headers.insert(
        "Access-Control-Allow-Credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
}

/// Empty 204 reply for CORS preflight requests.
pub fn preflight_response(origin: Option<&str>) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    apply_cors_headers(&mut response, origin);
    response
}

/// JSON error reply for paths no handler owns.
pub fn not_found_response() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Body::from(r#"{"error": "not found"}"#))
        .expect("static not-found response is valid")
}

fn decode_url(url: &str) -> String {
    percent_decode_str(url).decode_utf8_lossy().into_owned()
}

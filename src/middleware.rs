pub mod rate_limit;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::{Data, Response};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Correlates every log line of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }

    /// Reuses an upstream id when it is a UUID, otherwise mints a fresh one.
    fn from_header(value: Option<&str>) -> Self {
        value
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(|id| RequestId(id.to_string()))
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct RequestStart(Instant);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestId {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cached = request.local_cache(|| None::<RequestId>).clone();
        Outcome::Success(cached.unwrap_or_default())
    }
}

/// Tags requests with an id, logs both ends, and sets the response headers
/// every API reply carries.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let request_id = RequestId::from_header(request.headers().get_one(REQUEST_ID_HEADER));
        request.local_cache(|| Some(request_id.clone()));
        request.local_cache(|| Some(RequestStart(Instant::now())));

        info!(
            request_id = %request_id.0,
            method = %request.method(),
            uri = %request.uri(),
            "incoming request"
        );
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = request
            .local_cache(|| None::<RequestId>)
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let elapsed_ms = request
            .local_cache(|| None::<RequestStart>)
            .as_ref()
            .map(|start| start.0.elapsed().as_millis() as u64)
            .unwrap_or_default();

        let status = response.status();

        response.set_header(Header::new(REQUEST_ID_HEADER, request_id.clone()));
        response.set_header(Header::new("X-Content-Type-Options", "nosniff"));
        response.set_header(Header::new("X-Frame-Options", "DENY"));
        response.set_header(Header::new("Cache-Control", "no-store"));

        if status.class().is_server_error() || status.class().is_client_error() {
            warn!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                elapsed_ms,
                "request completed with error"
            );
        } else {
            info!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                elapsed_ms,
                "request completed"
            );
        }
    }
}

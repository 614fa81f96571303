use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::{SESSION_COOKIE, parse_user_cookie_value};
use crate::config::RateLimitConfig;
use rocket::http::{Method, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Bucket {
    Read,
    Mutation,
    /// Login and registration. Keyed by address only, since the caller has no session yet.
    Auth,
    /// Booking creation. Keyed by renter so one account cannot flood owners
    /// with pending requests, while renters behind a shared address keep
    /// their own budget.
    BookingRequest,
}

impl Bucket {
    fn for_method(method: Method) -> Self {
        match method {
            Method::Get | Method::Head | Method::Options => Bucket::Read,
            _ => Bucket::Mutation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Caller {
    Ip(String),
    User(Uuid),
}

/// Fixed-window counter for one caller in one bucket.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

impl Window {
    fn roll(&mut self, now: Instant, length: Duration) {
        if now.duration_since(self.started) >= length {
            self.started = now;
            self.hits = 0;
        }
    }

    fn retry_after(&self, now: Instant, length: Duration) -> Duration {
        length.saturating_sub(now.duration_since(self.started))
    }
}

#[derive(Debug)]
pub(crate) struct RateLimiter {
    config: RateLimitConfig,
    window: Duration,
    windows: Mutex<HashMap<(Caller, Bucket), Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_seconds.max(1)),
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Periodically drops windows that have fully elapsed.
    pub fn spawn_cleanup_task(self: Arc<Self>) {
        let every = Duration::from_secs(self.config.cleanup_interval_seconds.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                self.windows.lock().await.retain(|_, window| now.duration_since(window.started) < self.window);
            }
        });
    }

    fn limit(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::Read => self.config.read_limit,
            Bucket::Mutation => self.config.mutation_limit,
            Bucket::Auth => self.config.auth_limit,
            Bucket::BookingRequest => self.config.booking_request_limit,
        }
    }

    /// Counts one hit against every caller identity, or none of them if any
    /// is already at its limit. `Err` carries the wait until the longest
    /// exhausted window resets.
    async fn check(&self, callers: &[Caller], bucket: Bucket) -> Result<(), Duration> {
        let limit = self.limit(bucket);
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let mut wait: Option<Duration> = None;
        for caller in callers {
            let window = windows.entry((caller.clone(), bucket)).or_insert(Window { started: now, hits: 0 });
            window.roll(now, self.window);
            if window.hits >= limit {
                let remaining = window.retry_after(now, self.window);
                wait = Some(wait.map_or(remaining, |longest| longest.max(remaining)));
            }
        }

        if let Some(wait) = wait {
            return Err(wait);
        }

        for caller in callers {
            if let Some(window) = windows.get_mut(&(caller.clone(), bucket)) {
                window.hits += 1;
            }
        }

        Ok(())
    }
}

/// Seconds until the caller may retry, read by the 429 catcher.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimitRetryAfter(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RateLimitError {
    TooManyRequests,
    MissingClientIp,
}

macro_rules! rate_limit_guard {
    ($(#[$meta:meta])* $name:ident => $bucket:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub(crate) struct $name;

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = RateLimitError;

            async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
                let bucket: fn(&Request<'_>) -> Bucket = $bucket;
                match enforce(request, bucket(request)).await {
                    Ok(()) => Outcome::Success($name),
                    Err(error) => Outcome::Error(error),
                }
            }
        }

        impl<'a> OpenApiFromRequest<'a> for $name {
            fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
                Ok(RequestHeaderInput::None)
            }

            fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
                Ok(too_many_requests_response())
            }
        }
    };
}

rate_limit_guard! {
    /// Guard for ordinary API routes; the bucket follows the HTTP method.
    RateLimit => |request| Bucket::for_method(request.method())
}

rate_limit_guard! {
    /// Stricter guard for credential endpoints.
    AuthRateLimit => |_| Bucket::Auth
}

rate_limit_guard! {
    /// Guard for `POST /bookings/create`.
    BookingRateLimit => |_| Bucket::BookingRequest
}

fn callers(request: &Request<'_>, bucket: Bucket) -> Vec<Caller> {
    let ip = request.client_ip().map(|ip| Caller::Ip(ip.to_string()));
    let user = session_user_id(request).map(Caller::User);

    match bucket {
        Bucket::Auth => ip.into_iter().collect(),
        Bucket::BookingRequest => user.or(ip).into_iter().collect(),
        Bucket::Read | Bucket::Mutation => ip.into_iter().chain(user).collect(),
    }
}

fn session_user_id(request: &Request<'_>) -> Option<Uuid> {
    let cookie = request.cookies().get_private(SESSION_COOKIE)?;
    parse_user_cookie_value(cookie.value()).map(|(_, user_id)| user_id)
}

async fn enforce(request: &Request<'_>, bucket: Bucket) -> Result<(), (Status, RateLimitError)> {
    let Some(limiter) = request.rocket().state::<Arc<RateLimiter>>() else {
        return Ok(());
    };

    let request_id = request
        .local_cache(|| None::<crate::middleware::RequestId>)
        .as_ref()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let mut callers = callers(request, bucket);
    if callers.is_empty() {
        warn!(request_id = %request_id, uri = %request.uri(), "client ip unavailable for rate limiting");
        if limiter.config.require_client_ip {
            return Err((Status::BadRequest, RateLimitError::MissingClientIp));
        }
        callers.push(Caller::Ip("unknown".to_string()));
    }

    limiter.check(&callers, bucket).await.map_err(|wait| {
        let retry_after = (wait.as_millis().div_ceil(1000) as u64).max(1);
        request.local_cache(|| Some(RateLimitRetryAfter(retry_after)));
        warn!(
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
            bucket = ?bucket,
            retry_after,
            "rate limit exceeded"
        );
        (Status::TooManyRequests, RateLimitError::TooManyRequests)
    })
}

fn too_many_requests_response() -> Responses {
    let mut responses = Responses::default();
    responses.responses.insert(
        "429".to_string(),
        RefOr::Object(OpenApiResponse {
            description: "Too Many Requests".to_string(),
            ..Default::default()
        }),
    );
    responses
}

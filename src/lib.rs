mod auth;
mod config;
mod database;
mod db;
mod error;
mod maintenance;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
pub use maintenance::{CompleteBookingsResult, complete_finished_bookings};

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::middleware::rate_limit::RateLimiter;
use crate::routes as app_routes;
use rocket::fairing::AdHoc;
use rocket::{Build, Catcher, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=autorent::service=debug,info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // Tests build several rockets in one process; only the first install wins.
    if json_format {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

fn ensure_rocket_secret_key() {
    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());

    // Session cookies are encrypted with this key; debug builds may use Rocket's ephemeral one.
    if profile != "debug" && std::env::var("ROCKET_SECRET_KEY").is_err() {
        panic!(
            "ROCKET_SECRET_KEY is required for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Put, Method::Delete, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Accept", "X-Request-Id"]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

fn get_swagger_config(openapi_url: &str) -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: openapi_url.to_string(),
        ..Default::default()
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

/// The primary base path first, then each additional one, without duplicates.
fn collect_base_paths(api_config: &config::ApiConfig) -> Vec<String> {
    let mut normalized: Vec<String> = vec![normalize_base_path(&api_config.base_path)];

    for extra in &api_config.additional_base_paths {
        let extra = normalize_base_path(extra);
        if !normalized.contains(&extra) {
            normalized.push(extra);
        }
    }

    normalized
}

struct RouteSpec {
    path: &'static str,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

impl RouteSpec {
    fn new(path: &'static str, (routes, openapi): (Vec<rocket::Route>, rocket_okapi::okapi::openapi3::OpenApi)) -> Self {
        RouteSpec { path, routes, openapi }
    }
}

fn collect_route_specs() -> Vec<RouteSpec> {
    vec![
        RouteSpec::new("/bookings", app_routes::booking::routes()),
        RouteSpec::new("/cars", app_routes::car::routes()),
        RouteSpec::new("/admin", app_routes::admin::routes()),
        RouteSpec::new("/dashboard", app_routes::dashboard::routes()),
        RouteSpec::new("/reviews", app_routes::review::routes()),
        RouteSpec::new("/chat", app_routes::chat::routes()),
        RouteSpec::new("/users", app_routes::user::routes()),
        RouteSpec::new("/health", app_routes::health::routes()),
    ]
}

fn api_catchers() -> Vec<Catcher> {
    catchers![
        app_routes::error::bad_request,
        app_routes::error::unauthorized,
        app_routes::error::forbidden,
        app_routes::error::not_found,
        app_routes::error::conflict,
        app_routes::error::unprocessable,
        app_routes::error::too_many_requests,
    ]
}

fn mount_api_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Rocket<Build> {
    let route_specs = collect_route_specs();

    if enable_swagger {
        let mut openapi_list = Vec::new();
        for spec in route_specs {
            rocket = rocket.mount(join_base_path(base_path, spec.path), spec.routes);
            openapi_list.push((spec.path, spec.openapi));
        }

        let openapi_docs = match marge_spec_list(&openapi_list) {
            Ok(docs) => docs,
            Err(err) => panic!("Could not merge OpenAPI spec: {}", err),
        };

        let settings = rocket_okapi::settings::OpenApiSettings::default();
        rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

        let docs_path = join_base_path(base_path, "docs");
        let openapi_url = join_base_path(base_path, "openapi.json");
        rocket = rocket.mount(docs_path, make_swagger_ui(&get_swagger_config(&openapi_url)));
    } else {
        for spec in route_specs {
            rocket = rocket.mount(join_base_path(base_path, spec.path), spec.routes);
        }
    }

    rocket.register(base_path, api_catchers())
}

fn stage_rate_limiter(rate_limit_config: config::RateLimitConfig) -> AdHoc {
    AdHoc::on_ignite("Rate Limiter", move |rocket| {
        let limiter = Arc::new(RateLimiter::new(rate_limit_config.clone()));
        limiter.clone().spawn_cleanup_task();

        Box::pin(async move { rocket.manage(limiter) })
    })
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);
    ensure_rocket_secret_key();

    let cors = match build_cors(&config.cors).to_cors() {
        Ok(cors) => cors,
        Err(err) => panic!("Failed to create CORS fairing: {}", err),
    };

    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    let mut rocket = rocket::custom(figment)
        .attach(stage_rate_limiter(config.rate_limit.clone()))
        .attach(cors)
        .attach(RequestLogger)
        .attach(stage_db(config.database.clone()));

    for base_path in collect_base_paths(&config.api) {
        rocket = mount_api_routes(rocket, &base_path, config.api.enable_swagger);
    }

    rocket.manage(config)
}

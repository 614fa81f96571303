use crate::middleware::rate_limit::RateLimitRetryAfter;
use rocket::http::{Header, Status};
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::{Request, catch};
use schemars::JsonSchema;
use serde::Serialize;

/// Body of every error response.
#[derive(Serialize, Debug, JsonSchema)]
pub struct ErrorResponse {
    pub message: String,
}

fn message(text: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse { message: text.to_string() })
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorResponse> {
    message("Bad request")
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<ErrorResponse> {
    message("Not authorized")
}

#[catch(403)]
pub fn forbidden(_: &Request) -> Json<ErrorResponse> {
    message("Forbidden")
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorResponse> {
    message("Not found")
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<ErrorResponse> {
    message("Conflict")
}

#[catch(422)]
pub fn unprocessable(_: &Request) -> Json<ErrorResponse> {
    message("Malformed request body")
}

pub struct TooManyRequests {
    retry_after: Option<u64>,
}

impl<'r> Responder<'r, 'static> for TooManyRequests {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let mut response = Response::build_from(message("Too many requests").respond_to(req)?);
        response.status(Status::TooManyRequests);
        if let Some(seconds) = self.retry_after {
            response.header(Header::new("Retry-After", seconds.to_string()));
        }
        response.ok()
    }
}

#[catch(429)]
pub fn too_many_requests(req: &Request) -> TooManyRequests {
    let retry_after = req.local_cache(|| None::<RateLimitRetryAfter>).as_ref().map(|value| value.0);
    TooManyRequests { retry_after }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::catchers;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;

    #[rocket::async_test]
    async fn unknown_routes_get_a_json_message() {
        let rocket = rocket::build().register("/", catchers![not_found]);
        let client = Client::tracked(rocket).await.expect("valid rocket instance");

        let response = client.get("/nowhere").dispatch().await;

        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.content_type(), Some(ContentType::JSON));
        assert_eq!(response.into_string().await.as_deref(), Some(r#"{"message":"Not found"}"#));
    }
}

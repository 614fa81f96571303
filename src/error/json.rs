use rocket::data::{ByteUnit, Data, FromData, Outcome};
use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::{Json, serde_json};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::RequestBody;
use rocket_okapi::request::OpenApiFromData;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::ops::Deref;
use tracing::warn;

/// JSON request body that logs why a payload was rejected.
///
/// Booking and car payloads come from browser forms, so a bad date string or a
/// missing `carId` is the common failure; the warning carries line, column and a
/// preview of the body to make those visible without enabling debug logs.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> Deref for JsonBody<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T: DeserializeOwned> FromData<'r> for JsonBody<T> {
    type Error = serde_json::Error;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        let limit = req.limits().get("json").unwrap_or(ByteUnit::Mebibyte(1));

        let bytes = match data.open(limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    "JSON payload exceeded size limit"
                );
                return Outcome::Error((
                    Status::PayloadTooLarge,
                    serde_json::Error::io(std::io::Error::new(std::io::ErrorKind::Other, "payload too large")),
                ));
            }
            Err(e) => {
                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    error = %e,
                    "Failed to read request body"
                );
                return Outcome::Error((Status::BadRequest, serde_json::Error::io(e)));
            }
        };

        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Outcome::Success(JsonBody(value)),
            Err(e) => {
                let body_preview = preview(&String::from_utf8_lossy(&bytes), 500);

                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    error_message = %e,
                    error_line = e.line(),
                    error_column = e.column(),
                    error_category = ?e.classify(),
                    request_body = %body_preview,
                    "Failed to parse JSON request body"
                );

                Outcome::Error((Status::UnprocessableEntity, e))
            }
        }
    }
}

impl<'r, T: DeserializeOwned + JsonSchema> OpenApiFromData<'r> for JsonBody<T> {
    fn request_body(r#gen: &mut OpenApiGenerator) -> rocket_okapi::Result<RequestBody> {
        Json::<T>::request_body(r#gen)
    }
}

/// Truncates on a char boundary so multi-byte input never splits.
fn preview(body: &str, max_chars: usize) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() { format!("{}...", head) } else { head }
}

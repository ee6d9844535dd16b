//! Mapping results onto the API Gateway proxy response envelope.

use crate::{
    error::{ApplicationError, ErrorResponse},
    parser::bind_response,
};

use aws_lambda_events::{encodings::Body, event::apigw::ApiGatewayProxyResponse};
use http::HeaderMap;
use serde::Serialize;

#[allow(clippy::field_reassign_with_default)]
fn proxy_response(status: u16, body: String, headers: HeaderMap) -> ApiGatewayProxyResponse {
    let mut response = ApiGatewayProxyResponse::default();
    response.status_code = i64::from(status);
    response.headers = headers;
    response.body = Some(Body::Text(body));
    response
}

/// Render `error` as `{"message": ...}` with its HTTP status.
pub fn map_error(error: &ApplicationError) -> ApiGatewayProxyResponse {
    let body = bind_response(&ErrorResponse::from(error)).unwrap_or_default();
    proxy_response(error.http_status(), body, HeaderMap::new())
}

/// Render `body` as JSON with `status` and no extra headers.
pub fn map_response<T: Serialize + ?Sized>(status: u16, body: &T) -> ApiGatewayProxyResponse {
    map_response_with_headers(status, body, HeaderMap::new())
}

/// Render `body` as JSON with `status` and `headers`.
///
/// When `body` cannot be serialized the requested status is dropped and the
/// result is the generic 500 error response.
pub fn map_response_with_headers<T: Serialize + ?Sized>(
    status: u16,
    body: &T,
    headers: HeaderMap,
) -> ApiGatewayProxyResponse {
    match bind_response(body) {
        Ok(body) => proxy_response(status, body, headers),
        Err(error) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(status, "response body could not be serialized");
            map_error(&error)
        }
    }
}

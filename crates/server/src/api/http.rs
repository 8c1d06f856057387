use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use cirrus_core::FunctionResponse;

/// Query string pairs in the order they were sent.
type QueryPairs = Vec<(String, String)>;

/// First `name` value in the query string. Later repeats are ignored.
fn first_name(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .find(|(key, _)| key == "name")
        .map(|(_, value)| value.as_str())
}

fn into_http(response: FunctionResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}

/// `GET|POST /api/myroute` -- static greeting.
pub async fn first_http_function() -> Response {
    into_http(cirrus_functions::first_http_function())
}

/// `GET|POST /api/newroute?name=` -- validated greeting.
///
/// An undecodable query string counts as a missing name.
pub async fn second_http_function(query: Result<Query<QueryPairs>, QueryRejection>) -> Response {
    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "ignoring undecodable query string");
            Vec::new()
        }
    };
    into_http(cirrus_functions::second_http_function(first_name(&pairs)))
}

use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, HeaderName};
use uuid::Uuid;

use crate::auth::Session;

pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// `Authorization: Token <token>`, or nothing when the session has no usable token.
pub fn authorization_value(session: &Session) -> Option<String> {
    session.token().map(|token| format!("Token {token}"))
}

/// Decorate an outgoing request with the session credential and a fresh
/// correlation id. Returns the id so the caller can log it.
pub fn authorize(builder: RequestBuilder, session: &Session) -> (RequestBuilder, Uuid) {
    let request_id = Uuid::new_v4();
    let builder = builder.header(REQUEST_ID, request_id.to_string());
    let builder = match authorization_value(session) {
        Some(value) => builder.header(AUTHORIZATION, value),
        None => builder,
    };
    (builder, request_id)
}

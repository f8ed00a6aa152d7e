//! Request-metadata extraction for event publication.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use orders_events::service::RequestContext;

/// Header carrying the gateway-assigned request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extractor wrapping [`RequestContext`] for order handlers. Never
/// rejects: absent headers simply leave fields unset.
#[derive(Debug, Clone)]
pub struct RequestMeta(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.to_string());

        std::future::ready(Ok(Self(RequestContext {
            request_id,
            user_agent,
            remote_addr,
        })))
    }
}

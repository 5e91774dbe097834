//! Request body extraction that reports failures in the API error shape.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::RpcError;

/// JSON body extractor. Unlike [`axum::Json`], a rejected body is rendered
/// through [`RpcError`] so clients always get `{error, message}`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RpcError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for RpcError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::MalformedBody(e.body_text()),
            other => Self::InvalidRequest(other.body_text()),
        }
    }
}

/// Decode an optional JSON body. An empty body yields `T::default()`.
pub fn optional_json<T>(bytes: &[u8]) -> Result<T, RpcError>
where
    T: DeserializeOwned + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| {
        if e.is_data() {
            RpcError::MalformedBody(e.to_string())
        } else {
            RpcError::InvalidRequest(e.to_string())
        }
    })
}

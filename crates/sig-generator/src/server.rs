use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::config::KeyFileSource;
use crate::error::SigningServiceError;
use crate::model::{Deployment, SignatureResponse};
use crate::signing::DeploymentSigner;

/// Per-process handler state. Immutable once the server starts.
#[derive(Clone)]
pub struct AppState {
    pub signer: Arc<dyn DeploymentSigner>,
    pub key_file: KeyFileSource,
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Limits applied by the server layer, outside the handler.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Deadline for the whole request. Exceeding it yields an empty 408.
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

pub fn router(state: AppState, options: ServerOptions) -> Router {
    Router::new()
        .route("/healthcheck", get(|| async move { (StatusCode::OK, "Ok").into_response() }))
        .route("/encrypt", post(encrypt_handler))
        .layer(DefaultBodyLimit::max(options.max_body_bytes))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(host: String, port: u16, options: ServerOptions, state: AppState) -> Result<()> {
    let app = router(state, options);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("Server listening at {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}

async fn encrypt_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = SigningServiceError::UnreadableBody {
                status: rejection.status(),
                message: rejection.body_text(),
            };
            warn!("{err}");
            return err.into_response();
        }
    };

    info!(body_len = body.len(), "POST /encrypt");

    match sign_deployment(&state, body).await {
        Ok(signature) => {
            debug!("Deployment signature: {signature}");
            json_response(
                StatusCode::OK,
                &SignatureResponse {
                    deployment_signature: signature,
                },
            )
        }
        Err(err) => {
            if err.status().is_server_error() {
                error!("{err}");
            } else {
                warn!("{err}");
            }
            err.into_response()
        }
    }
}

/// Validate the descriptor and sign the body exactly as received.
///
/// Checks run in a fixed order: parse, image, key file, sign. The first
/// failure wins.
pub async fn sign_deployment(state: &AppState, body: Bytes) -> Result<String, SigningServiceError> {
    let deployment: Option<Deployment> = serde_json::from_slice(&body)
        .map_err(|e| SigningServiceError::MalformedRequest(e.to_string()))?;

    if deployment.unwrap_or_default().image().is_none() {
        return Err(SigningServiceError::MissingImage);
    }

    let key_file = state
        .key_file
        .resolve()
        .ok_or(SigningServiceError::KeyFileNotConfigured)?;

    let signer = Arc::clone(&state.signer);
    tokio::task::spawn_blocking(move || signer.sign(&key_file, &body))
        .await
        .map_err(|e| SigningServiceError::Signing(e.to_string()))?
        .map_err(|e| SigningServiceError::Signing(format!("{e:#}")))
}

/// Encode `body` as JSON under `status`. An encoding failure is logged and
/// the status is kept, with an empty body.
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(err) => {
            error!("unable to encode response, {err}");
            status.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::Path;

    struct StaticSigner;

    impl DeploymentSigner for StaticSigner {
        fn sign(&self, _key_file: &Path, _data: &[u8]) -> anyhow::Result<String> {
            Ok("sig".into())
        }

        fn algorithm(&self) -> &str {
            "static"
        }
    }

    fn state(key_file: Option<&str>) -> AppState {
        AppState {
            signer: Arc::new(StaticSigner),
            key_file: KeyFileSource::Fixed(key_file.map(str::to_string)),
        }
    }

    #[tokio::test]
    async fn null_body_is_missing_image() {
        let err = sign_deployment(&state(Some("/k")), Bytes::from_static(b"null"))
            .await
            .unwrap_err();
        assert!(matches!(err, SigningServiceError::MissingImage));
    }

    #[tokio::test]
    async fn empty_body_is_malformed() {
        let err = sign_deployment(&state(Some("/k")), Bytes::new()).await.unwrap_err();
        assert!(matches!(err, SigningServiceError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn image_checked_before_key_file() {
        let err = sign_deployment(&state(None), Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, SigningServiceError::MissingImage));
    }

    #[tokio::test]
    async fn returns_signer_output() {
        let body = Bytes::from_static(br#"{"services":{"location":{"image":"app"}}}"#);
        let signature = sign_deployment(&state(Some("/k")), body).await.unwrap();
        assert_eq!(signature, "sig");
    }

    #[test]
    fn encoding_failure_keeps_status() {
        // Non-string map keys cannot be encoded as JSON.
        let mut body = BTreeMap::new();
        body.insert(vec![1u8], "value");

        let response = json_response(StatusCode::OK, &body);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}

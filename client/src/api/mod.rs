//! HTTP transport to the remote auth/2FA service.
//!
//! The controller layer never sees transport detail: every network
//! failure, timeout or unstructured non-2xx is normalized into the single
//! "service unavailable" condition at this boundary, while structured
//! `{"error": ...}` bodies map to their typed domain errors. Retry is
//! user-initiated — nothing here retries silently.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, header};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use thiserror::Error;
use tokio::time;
use tracing::{debug, warn};

use shared::config::LiveConfig;
use shared::types::{
    ErrorBody, LoginError, LoginRequest, StatusResponse, TwoFaError, TwoFaSetup, TwoFaStatus,
    VerifyCodeData,
};

// ---------------------------------------------------------------------------
// Transport abstraction
// ---------------------------------------------------------------------------

/// The remote 2FA endpoints, as the controller consumes them.
///
/// Static dispatch on purpose: production uses [`HttpApi`], the test suite
/// substitutes in-memory fakes without a network in the loop.
#[allow(async_fn_in_trait)]
pub trait TwoFaApi {
    /// `GET /api/2fa`
    async fn fetch_state(&self) -> Result<TwoFaStatus, TwoFaError>;

    /// `POST /api/2fa/setup` — mints a NEW secret server-side.
    async fn request_setup(&self) -> Result<TwoFaSetup, TwoFaError>;

    /// `GET /api/2fa/qr` — re-renders the EXISTING pending secret.
    async fn fetch_qr(&self) -> Result<TwoFaSetup, TwoFaError>;

    /// `POST /api/2fa/verify`
    async fn verify(&self, code: &str) -> Result<(), TwoFaError>;

    /// `POST /api/2fa/disable`
    async fn disable(&self) -> Result<(), TwoFaError>;
}

// ---------------------------------------------------------------------------
// Hyper-backed implementation
// ---------------------------------------------------------------------------

/// Internal transport-tier failure, before per-endpoint error mapping.
#[derive(Error, Debug)]
enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Failed(String),
}

pub struct HttpApi {
    http: Client<HttpConnector, Full<Bytes>>,
    config: LiveConfig,
}

impl HttpApi {
    pub fn new(config: LiveConfig) -> Self {
        Self {
            http: Client::builder(TokioExecutor::new()).build_http(),
            config,
        }
    }

    /// Sign in against `POST /api/login`.
    ///
    /// The successful payload is returned raw — its shape is loose by
    /// design and [`crate::session::SessionStore::set_user`] persists it
    /// as-is for derivation on read.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, LoginError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LoginError::MissingField("username".to_string()));
        }
        if password.is_empty() {
            return Err(LoginError::MissingField("password".to_string()));
        }

        let body = serde_json::to_vec(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .map_err(|_| LoginError::ServiceUnavailable)?;

        let (status, bytes) = self
            .call(Method::POST, "/api/login", Some(body))
            .await
            .map_err(|e| {
                warn!("Login transport failure: {}", e);
                LoginError::ServiceUnavailable
            })?;

        if status.is_success() {
            return serde_json::from_slice::<Value>(&bytes).map_err(|e| {
                warn!("Login response body is not JSON: {}", e);
                LoginError::ServiceUnavailable
            });
        }

        match ErrorBody::parse(&bytes) {
            Some(err) => {
                warn!("Login rejected: {}", err.error);
                Err(LoginError::InvalidCredentials)
            }
            None => Err(LoginError::ServiceUnavailable),
        }
    }

    /// Issue one request with the configured timeout imposed client-side.
    /// The remote contract specifies no timeout of its own.
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Bytes), TransportError> {
        // Copy config values out before awaiting; never hold the guard.
        let (url, timeout) = {
            let cfg = self.config.read().await;
            (cfg.api.url(path), cfg.api.request_timeout())
        };

        debug!("{} {}", method, url);

        let mut builder = Request::builder().method(method).uri(url);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(body.map(Bytes::from).unwrap_or_default()))
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        let round_trip = async {
            let res = self
                .http
                .request(req)
                .await
                .map_err(|e| TransportError::Failed(e.to_string()))?;
            let status = res.status();
            let bytes = res
                .into_body()
                .collect()
                .await
                .map_err(|e| TransportError::Failed(e.to_string()))?
                .to_bytes();
            Ok((status, bytes))
        };

        match time::timeout(timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Request timed out after {:?}", timeout);
                Err(TransportError::Timeout)
            }
        }
    }

    /// One 2FA round trip: transport failures and unstructured non-2xx
    /// become `Unavailable`; structured bodies map to domain errors.
    async fn twofa_call(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, TwoFaError> {
        let (status, bytes) = self.call(method, path, body).await.map_err(|e| {
            warn!("2FA transport failure on {}: {}", path, e);
            TwoFaError::Unavailable
        })?;

        if status.is_success() {
            return Ok(bytes);
        }

        match ErrorBody::parse(&bytes).and_then(|b| TwoFaError::from_wire(&b.error)) {
            Some(domain) => Err(domain),
            None => {
                warn!("2FA endpoint {} failed with status {}", path, status);
                Err(TwoFaError::Unavailable)
            }
        }
    }
}

impl TwoFaApi for HttpApi {
    async fn fetch_state(&self) -> Result<TwoFaStatus, TwoFaError> {
        let bytes = self.twofa_call(Method::GET, "/api/2fa", None).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Malformed 2FA state body: {}", e);
            TwoFaError::Unavailable
        })
    }

    async fn request_setup(&self) -> Result<TwoFaSetup, TwoFaError> {
        let bytes = self.twofa_call(Method::POST, "/api/2fa/setup", None).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Malformed 2FA setup body: {}", e);
            TwoFaError::Unavailable
        })
    }

    async fn fetch_qr(&self) -> Result<TwoFaSetup, TwoFaError> {
        let bytes = self.twofa_call(Method::GET, "/api/2fa/qr", None).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Malformed 2FA QR body: {}", e);
            TwoFaError::Unavailable
        })
    }

    async fn verify(&self, code: &str) -> Result<(), TwoFaError> {
        let body = serde_json::to_vec(&VerifyCodeData {
            code: code.to_string(),
        })
        .map_err(|_| TwoFaError::Unavailable)?;
        let bytes = self
            .twofa_call(Method::POST, "/api/2fa/verify", Some(body))
            .await?;
        if let Ok(ack) = serde_json::from_slice::<StatusResponse>(&bytes) {
            debug!("2FA verify acknowledged: {}", ack.status);
        }
        Ok(())
    }

    async fn disable(&self) -> Result<(), TwoFaError> {
        let bytes = self
            .twofa_call(Method::POST, "/api/2fa/disable", None)
            .await?;
        if let Ok(ack) = serde_json::from_slice::<StatusResponse>(&bytes) {
            debug!("2FA disable acknowledged: {}", ack.status);
        }
        Ok(())
    }
}

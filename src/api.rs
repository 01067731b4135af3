//! Client for the parliament's public web API (`/cgi-bin/web-api-pub`).
//!
//! Three read endpoints are used, each answering with an XML document:
//!
//! | Endpoint | Parameters | Empty root |
//! |----------|------------|------------|
//! | `ulesnap.cgi` (sittings of a term) | `p_ckl` | `<ulesnapok/>` |
//! | `felszolalasok.cgi` (speeches of a sitting) | `p_ckl`, `p_nap` | `<felszolalasok/>` |
//! | `felszolalas.cgi` (one speech) | `p_ckl`, `p_uln`, `p_felsz` | `<felszolalas/>` |
//!
//! The empty root is the API's only in-band way of saying "nothing here";
//! it is returned as `Ok(None)` rather than as an error.
//!
//! [`ParliamentApi`] is the seam the harvester talks to, so tests and other
//! transports can stand in for [`HttpApi`].

use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::ApiConfig;
use crate::extract::is_empty_root;
use crate::models::{SessionId, SpeechKey, TermId};

pub const TERM_LISTING_ROOT: &str = "ulesnapok";
pub const SITTING_LISTING_ROOT: &str = "felszolalasok";
pub const SPEECH_ROOT: &str = "felszolalas";

/// A failed API call.
#[derive(Debug)]
pub enum ApiError {
    /// The request never got a response (connect, DNS, timeout, reset).
    Connection(String),
    /// The server answered with a non-success HTTP status.
    Status { status: u16, url: String },
    /// The response body could not be read.
    Body(String),
}

impl ApiError {
    /// Only connection-level failures are worth repeating.
    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Connection(_))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Connection(e) => write!(f, "connection failed: {}", e),
            ApiError::Status { status, url } => write!(f, "HTTP {} from {}", status, url),
            ApiError::Body(e) => write!(f, "failed to read response body: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// The three documents the harvester reads. `Ok(None)` is the empty-root answer.
pub trait ParliamentApi {
    /// Sitting listing of a term.
    fn term_sittings(&self, term: TermId) -> Result<Option<String>, ApiError>;

    /// Speech listing of one sitting.
    fn sitting_speeches(
        &self,
        term: TermId,
        session: SessionId,
    ) -> Result<Option<String>, ApiError>;

    /// Content of one speech.
    fn speech(&self, key: SpeechKey) -> Result<Option<String>, ApiError>;
}

/// [`ParliamentApi`] over HTTP with a blocking `reqwest` client.
pub struct HttpApi {
    client: reqwest::blocking::Client,
    base_url: String,
    access_token: String,
}

impl HttpApi {
    /// The access token is passed in explicitly; see [`crate::config::load_access_token`].
    pub fn new(config: &ApiConfig, access_token: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn get(
        &self,
        script: &str,
        params: &[(&str, u32)],
        empty_root: &str,
    ) -> Result<Option<String>, ApiError> {
        let url = format!("{}/cgi-bin/web-api-pub/{}", self.base_url, script);

        let mut request = self
            .client
            .get(&url)
            .query(&[("access_token", self.access_token.as_str())]);
        for (name, value) in params {
            request = request.query(&[(name, value)]);
        }

        let response = request
            .send()
            .map_err(|e| ApiError::Connection(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        // The API serves UTF-8 regardless of what the headers claim.
        let bytes = response
            .bytes()
            .map_err(|e| ApiError::Body(e.without_url().to_string()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        if is_empty_root(&text, empty_root) {
            return Ok(None);
        }
        Ok(Some(text))
    }
}

impl ParliamentApi for HttpApi {
    fn term_sittings(&self, term: TermId) -> Result<Option<String>, ApiError> {
        self.get("ulesnap.cgi", &[("p_ckl", term)], TERM_LISTING_ROOT)
    }

    fn sitting_speeches(
        &self,
        term: TermId,
        session: SessionId,
    ) -> Result<Option<String>, ApiError> {
        self.get(
            "felszolalasok.cgi",
            &[("p_ckl", term), ("p_nap", session)],
            SITTING_LISTING_ROOT,
        )
    }

    fn speech(&self, key: SpeechKey) -> Result<Option<String>, ApiError> {
        self.get(
            "felszolalas.cgi",
            &[
                ("p_ckl", key.term),
                ("p_uln", key.session),
                ("p_felsz", key.speech),
            ],
            SPEECH_ROOT,
        )
    }
}

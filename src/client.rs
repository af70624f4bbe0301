//! Client for the remote diagram rendering service.
//!
//! One render is one `GET <service>/<payload>`. Every outcome, including
//! transport faults, comes back as a [`RenderResult`]; nothing is returned as
//! an `Err` or allowed to panic across this boundary.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::graphic::{Graphic, RenderFailure, RenderResult};
use crate::source::{DiagramSource, EncodedPayload, normalize};
use crate::viewport::correct_viewport;

/// Public mermaid.ink SVG endpoint.
pub const DEFAULT_SERVICE_URL: &str = "https://mermaid.ink/svg/";

/// Failures that happen before a usable status and body are obtained.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("service URL {0} cannot take a path segment")]
    NotABase(Url),
    #[error("{0}")]
    Http(#[from] ureq::Error),
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
struct Fetched {
    status: u16,
    body: String,
}

/// Renders diagram sources through the rendering service.
///
/// Holds configuration only. Connections are opened per call and released
/// when the call returns, so a client can be shared freely between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderClient {
    service: Url,
    timeout: Option<Duration>,
}

impl Default for RenderClient {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_SERVICE_URL).expect("default service URL is valid"))
    }
}

impl RenderClient {
    pub const fn new(service: Url) -> Self {
        Self {
            service,
            timeout: None,
        }
    }

    /// Build a client from a service URL string.
    ///
    /// # Errors
    ///
    /// Returns an error if `service` is not an absolute URL.
    pub fn parse(service: &str) -> Result<Self, url::ParseError> {
        Url::parse(service).map(Self::new)
    }

    /// Overall deadline per request. `None` leaves it to the transport.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn service_url(&self) -> &Url {
        &self.service
    }

    /// The URL a payload is fetched from: the service URL with the payload
    /// appended as the final path segment.
    ///
    /// # Errors
    ///
    /// Returns an error for service URLs without a path (e.g. `data:`).
    pub fn request_url(&self, payload: &EncodedPayload) -> Result<Url, FetchError> {
        let mut url = self.service.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| FetchError::NotABase(self.service.clone()))?;
            segments.pop_if_empty().push(payload.as_str());
        }
        Ok(url)
    }

    /// Normalize `raw` and render it.
    pub async fn render_text(&self, raw: &str) -> RenderResult {
        self.render(&normalize(raw)).await
    }

    /// Render `source` and correct the returned viewport.
    ///
    /// Empty sources are sent like any other; whatever the service answers is
    /// classified as usual.
    pub async fn render(&self, source: &DiagramSource) -> RenderResult {
        let started = Instant::now();
        let fetched = match self.request_url(&source.encode()) {
            Ok(url) => {
                debug!(%url, source_len = source.as_str().len(), "requesting render");
                let timeout = self.timeout;
                tokio::task::spawn_blocking(move || fetch(&url, timeout))
                    .await
                    .map_err(FetchError::from)
                    .and_then(|fetched| fetched)
            }
            Err(err) => Err(err),
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match fetched {
            Ok(Fetched { status: 200, body }) => {
                let correction = correct_viewport(&body);
                info!(
                    elapsed_ms,
                    markup_len = correction.markup.len(),
                    corrected = correction.viewport.is_some(),
                    "diagram rendered"
                );
                Graphic {
                    markup: correction.markup,
                    viewport: correction.viewport,
                }
                .into()
            }
            Ok(Fetched { status, .. }) => {
                warn!(status, elapsed_ms, "rendering service rejected diagram");
                RenderFailure::rejected(status).into()
            }
            Err(err) => {
                warn!(%err, elapsed_ms, "render request failed");
                RenderFailure::transport(err).into()
            }
        }
    }
}

/// Perform the blocking exchange with an agent scoped to this request.
fn fetch(url: &Url, timeout: Option<Duration>) -> Result<Fetched, FetchError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build()
        .into();

    let mut response = agent.get(url.as_str()).call()?;
    let status = response.status().as_u16();
    if status != 200 {
        return Ok(Fetched {
            status,
            body: String::new(),
        });
    }
    let body = response.body_mut().read_to_string()?;
    Ok(Fetched { status, body })
}

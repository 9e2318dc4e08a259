//! HTTP inference bridge backend
//!
//! Talks to a model server over two endpoints:
//! - `GET {url}/labels` returns `{"labels": [...]}`, fetched once at load
//! - `POST {url}/classify` takes `{sample_rate, samples}` and returns `{logits}`
//!
//! Requires the `http-backend` feature; without it, constructing a bridge
//! is a configuration error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{BackendInfo, InferenceBackend};
use crate::engine::ANALYSIS_SAMPLE_RATE;
use crate::error::{DetectorError, Result};

/// Default bridge address
pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:8001";

/// Default per-request timeout
pub const DEFAULT_BRIDGE_TIMEOUT_MS: u64 = 30_000;

/// Timeout for the label fetch at load time
#[cfg(feature = "http-backend")]
const LABELS_TIMEOUT_MS: u64 = 5_000;

/// Request body for `/classify`
#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    sample_rate: u32,
    samples: &'a [f32],
}

impl<'a> ClassifyRequest<'a> {
    /// Samples are always at the 16 kHz analysis rate
    fn canonical(samples: &'a [f32]) -> Self {
        Self {
            sample_rate: ANALYSIS_SAMPLE_RATE,
            samples,
        }
    }
}

/// Response body for `/classify`
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    logits: Vec<f32>,
}

/// Response body for `/labels`
#[cfg_attr(not(feature = "http-backend"), allow(dead_code))]
#[derive(Debug, Deserialize)]
struct LabelsResponse {
    labels: Vec<String>,
}

/// Remote backend reached over HTTP
pub struct BridgeBackend {
    info: BackendInfo,
    bridge_url: String,
    timeout_ms: u64,
    #[cfg(feature = "http-backend")]
    client: reqwest::blocking::Client,
}

impl BridgeBackend {
    /// Connect to a bridge and fetch its class tags
    #[cfg(feature = "http-backend")]
    pub fn connect(bridge_url: &str, timeout_ms: u64) -> Result<Self> {
        let bridge_url = bridge_url.trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| DetectorError::configuration(format!("cannot build HTTP client: {}", e)))?;

        let labels = Self::fetch_labels(&client, &bridge_url)?;
        tracing::info!("Bridge at {} reports {} classes: {:?}", bridge_url, labels.len(), labels);

        Ok(Self {
            info: Self::create_info(&bridge_url, labels),
            bridge_url,
            timeout_ms,
            client,
        })
    }

    #[cfg(not(feature = "http-backend"))]
    pub fn connect(_bridge_url: &str, _timeout_ms: u64) -> Result<Self> {
        Err(DetectorError::configuration(
            "HTTP bridge support not compiled. Build with --features http-backend",
        ))
    }

    #[cfg_attr(not(feature = "http-backend"), allow(dead_code))]
    fn create_info(bridge_url: &str, labels: Vec<String>) -> BackendInfo {
        BackendInfo::new(
            "bridge",
            "Inference Bridge",
            "1.0",
            &format!("Remote classifier at {}", bridge_url),
            labels,
        )
    }

    pub fn bridge_url(&self) -> &str {
        &self.bridge_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[cfg(feature = "http-backend")]
    fn fetch_labels(client: &reqwest::blocking::Client, bridge_url: &str) -> Result<Vec<String>> {
        let url = format!("{}/labels", bridge_url);
        let response = client
            .get(&url)
            .timeout(std::time::Duration::from_millis(LABELS_TIMEOUT_MS))
            .send()
            .map_err(|e| {
                DetectorError::configuration(format!("Cannot reach bridge at {}: {}", bridge_url, e))
            })?;

        if !response.status().is_success() {
            return Err(DetectorError::configuration(format!(
                "Bridge label fetch returned {}",
                response.status()
            )));
        }

        let body = response.text().map_err(|e| {
            DetectorError::configuration(format!("Cannot read label response from bridge: {}", e))
        })?;
        parse_labels(&body).map_err(|e| {
            DetectorError::configuration(format!("Invalid label response from bridge: {}", e))
        })
    }

    /// Send samples to the bridge
    #[cfg(feature = "http-backend")]
    fn send_request(&self, request: &ClassifyRequest<'_>) -> Result<ClassifyResponse> {
        let url = format!("{}/classify", self.bridge_url);

        let response = self.client.post(&url).json(request).send().map_err(|e| {
            if e.is_timeout() {
                DetectorError::inference(format!("Bridge timed out after {}ms", self.timeout_ms))
            } else if e.is_connect() {
                DetectorError::inference(format!(
                    "Cannot connect to bridge at {}: {}",
                    self.bridge_url, e
                ))
            } else {
                DetectorError::inference(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(DetectorError::inference(format!(
                "Bridge returned error: {}",
                response.status()
            )));
        }

        response
            .json::<ClassifyResponse>()
            .map_err(|e| DetectorError::inference(format!("Invalid response from bridge: {}", e)))
    }

    #[cfg(not(feature = "http-backend"))]
    fn send_request(&self, _request: &ClassifyRequest<'_>) -> Result<ClassifyResponse> {
        Err(DetectorError::inference(
            "HTTP bridge support not compiled. Build with --features http-backend",
        ))
    }
}

impl InferenceBackend for BridgeBackend {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn infer(&self, samples: &[f32]) -> Result<Vec<f32>> {
        debug!("Sending {} samples to {}", samples.len(), self.bridge_url);
        Ok(self.send_request(&ClassifyRequest::canonical(samples))?.logits)
    }
}

/// Parse a `/labels` body
#[cfg_attr(not(feature = "http-backend"), allow(dead_code))]
fn parse_labels(json: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str::<LabelsResponse>(json)?.labels)
}

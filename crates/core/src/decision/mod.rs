//! Decision backends: map an observation to a candidate [`Action`].
//!
//! Every backend implements [`DecisionBackend`]. Backends report failures as
//! [`DecisionError`] and never substitute their own default; the loop hands
//! every result to [`crate::action::resolve`] instead.

pub mod ollama;
pub mod open_api;

use std::io::Cursor;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageOutputFormat, RgbImage};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::action::{self, Action, DecisionError};
use crate::config::ModelConfig;
use crate::logger;
use crate::types::Observation;

pub use ollama::OllamaBackend;
pub use open_api::OpenApiBackend;

pub trait DecisionBackend: Send {
    fn name(&self) -> &str;

    fn generate_action(&self, prompt: &str, obs: &Observation) -> Result<Action, DecisionError>;
}

/// Pick the backend named by `config.backend`. Fails only when the HTTP
/// client cannot be built from the configured timeout and headers.
pub fn create_backend(config: &ModelConfig) -> Result<Box<dyn DecisionBackend>> {
    logger::register_prefix("decision", logger::COLOR_BLUE);
    let backend: Box<dyn DecisionBackend> = match config.backend.to_lowercase().as_str() {
        "ollama" => Box::new(OllamaBackend::new(config)?),
        "open_api" | "openapi" => Box::new(OpenApiBackend::new(config)?),
        other => {
            if other != "dummy" {
                logger::warn_p("decision", &format!("unknown backend '{}', using dummy", config.backend));
            }
            Box::new(DummyBackend)
        }
    };
    logger::info_p("decision", &format!("backend: {} ({})", backend.name(), config.url));
    Ok(backend)
}

/// Always clicks the centre; no I/O.
pub struct DummyBackend;

impl DecisionBackend for DummyBackend {
    fn name(&self) -> &str { "dummy" }

    fn generate_action(&self, _prompt: &str, obs: &Observation) -> Result<Action, DecisionError> {
        Ok(Action::new((obs.width() / 2) as i32, (obs.height() / 2) as i32, false, "dummy"))
    }
}

/// `{"response": "..."}` body shared by both HTTP backends.
#[derive(Debug, Deserialize)]
pub(crate) struct TextResponse {
    #[serde(default)]
    pub response: String,
}

/// Blocking client carrying the configured timeout and extra headers.
pub(crate) fn http_client(config: &ModelConfig) -> Result<reqwest::blocking::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let key = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name {:?}", name))?;
        let val = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for header {}", name))?;
        headers.insert(key, val);
    }
    reqwest::blocking::Client::builder()
        .timeout(config.timeout())
        .default_headers(headers)
        .build()
        .context("cannot build HTTP client")
}

/// Send a prepared request and parse the action out of its `response` text.
pub(crate) fn post_for_action(req: reqwest::blocking::RequestBuilder) -> Result<Action, DecisionError> {
    let resp = req.send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DecisionError::Status(status.as_u16()));
    }
    let body: TextResponse = serde_json::from_str(&resp.text()?)?;
    action::parse_action(&body.response)
}

/// Lossless PNG encoding of an RGB frame.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, DecisionError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png)
        .map_err(|e| DecisionError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

pub fn encode_base64_png(img: &RgbImage) -> Result<String, DecisionError> {
    Ok(STANDARD.encode(encode_png(img)?))
}

pub fn encode_data_uri(img: &RgbImage) -> Result<String, DecisionError> {
    Ok(format!("data:image/png;base64,{}", encode_base64_png(img)?))
}

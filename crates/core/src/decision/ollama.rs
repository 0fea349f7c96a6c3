use serde::Serialize;

use crate::action::{Action, DecisionError};
use crate::config::ModelConfig;
use crate::types::{DetectedObject, Observation};
use super::{encode_base64_png, http_client, post_for_action, DecisionBackend};

pub const DEFAULT_MODEL: &str = "qwen2.5-vl";

/// Local Ollama server, `POST /api/generate`.
pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    images: Vec<String>,
    stream: bool,
}

impl OllamaBackend {
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model_name.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Ollama has no object field, so objects ride along in the prompt text.
fn prompt_with_objects(prompt: &str, objects: Option<&[DetectedObject]>) -> String {
    match objects {
        Some(objs) if !objs.is_empty() => {
            let json = serde_json::to_string(objs).unwrap_or_default();
            format!("{}\n\nVisible objects: {}", prompt, json)
        }
        _ => prompt.to_string(),
    }
}

impl DecisionBackend for OllamaBackend {
    fn name(&self) -> &str { "ollama" }

    fn generate_action(&self, prompt: &str, obs: &Observation) -> Result<Action, DecisionError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: prompt_with_objects(prompt, obs.objects.as_deref()),
            images: vec![encode_base64_png(&obs.image)?],
            stream: false,
        };
        post_for_action(self.client.post(&self.url).json(&body))
    }
}

use serde::Serialize;

use crate::action::{Action, DecisionError};
use crate::config::ModelConfig;
use crate::types::{DetectedObject, Observation};
use super::{encode_data_uri, http_client, post_for_action, DecisionBackend};

/// Any HTTP endpoint accepting `{prompt, image, objects}` and answering
/// `{"response": "..."}`. Configured headers ride on the client.
pub struct OpenApiBackend {
    client: reqwest::blocking::Client,
    url: String,
    model_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ActionRequest<'a> {
    prompt: &'a str,
    image: String,
    objects: &'a [DetectedObject],
    #[serde(skip_serializing_if = "Option::is_none")]
    model_name: Option<&'a str>,
}

impl OpenApiBackend {
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            url: config.url.clone(),
            model_name: config.model_name.clone(),
        })
    }
}

impl DecisionBackend for OpenApiBackend {
    fn name(&self) -> &str { "open_api" }

    fn generate_action(&self, prompt: &str, obs: &Observation) -> Result<Action, DecisionError> {
        let body = ActionRequest {
            prompt,
            image: encode_data_uri(&obs.image)?,
            objects: obs.objects.as_deref().unwrap_or(&[]),
            model_name: self.model_name.as_deref(),
        };
        post_for_action(self.client.post(&self.url).json(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_missing_model_name() {
        let body = ActionRequest { prompt: "p", image: "data:".into(), objects: &[], model_name: None };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["objects"], serde_json::json!([]));
        assert!(v.get("model_name").is_none());
    }

    #[test]
    fn request_carries_objects() {
        let objs = [DetectedObject { bbox: [0, 0, 10, 10], name: "Bank booth".into() }];
        let body = ActionRequest { prompt: "p", image: "data:".into(), objects: &objs, model_name: Some("qwen") };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["objects"][0]["bbox"], serde_json::json!([0, 0, 10, 10]));
        assert_eq!(v["model_name"], "qwen");
    }
}

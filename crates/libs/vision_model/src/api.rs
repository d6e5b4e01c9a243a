use base64::{Engine as _, engine::general_purpose};
use bon::bon;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Serialize, Debug, Clone)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum MessagePart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Debug, Clone)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    temperature: f32,
}

#[derive(Deserialize)]
pub struct ChatFullResponse {
    pub choices: Vec<FullChoice>,
}

#[derive(Deserialize)]
pub struct FullChoice {
    pub message: FullMessage,
}

#[derive(Deserialize)]
pub struct FullMessage {
    pub content: Option<String>,
}

/// Client for an OpenAI-compatible vision-language service.
///
/// Images travel inline as base64 data URLs; the reply is free-form prose and
/// is never treated as structured data.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

#[bon]
impl VisionClient {
    #[builder(start_fn = with_base_url)]
    #[must_use]
    pub fn new(
        #[builder(start_fn)] base_url: &str,
        model: Option<String>,
        api_key: Option<String>,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.unwrap_or_default(),
            api_key,
            temperature: temperature.unwrap_or(0.7),
        }
    }

    /// Builds a single user message. With images, the prompt and each image
    /// become separate content parts; without, the content is plain text.
    fn prepare_message(prompt: &str, images: &[Vec<u8>]) -> Message {
        if images.is_empty() {
            return Message {
                role: "user".to_string(),
                content: MessageContent::Text(prompt.to_string()),
            };
        }
        let mut parts = vec![MessagePart::Text {
            text: prompt.to_string(),
        }];
        for bytes in images {
            let mime_type = infer::get(bytes).map_or("image/jpeg", |kind| kind.mime_type());
            let b64 = general_purpose::STANDARD.encode(bytes);
            parts.push(MessagePart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{mime_type};base64,{b64}"),
                },
            });
        }
        Message {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }

    #[builder]
    pub async fn chat(
        &self,
        #[builder(start_fn)] prompt: &str,
        images: Option<&[Vec<u8>]>,
    ) -> VisionResult<String> {
        let msg = Self::prepare_message(prompt, images.unwrap_or_default());
        self.call(vec![msg]).await
    }

    pub async fn call(&self, messages: Vec<Message>) -> VisionResult<String> {
        let req_body = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            temperature: self.temperature,
        };
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(%url, "sending chat completion request");
        let mut request = self.http.post(url).json(&req_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(VisionError::Api {
                status: response.status(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let full: ChatFullResponse = response.json().await?;
        Ok(full
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

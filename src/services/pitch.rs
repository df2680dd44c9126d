//! AI pitch generation.
//!
//! Builds a templated outreach prompt from a lead and fetches a completion
//! from an OpenAI-compatible chat endpoint (Groq in production).

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::{AppError, AppResult};
use crate::models::Lead;

/// Caller-tunable pitch options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PitchOptions {
    pub tone: Option<String>,
    pub length: Option<String>,
    pub custom_instructions: Option<String>,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PitchUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPitch {
    pub pitch: String,
    pub usage: PitchUsage,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<PitchUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct PitchService {
    client: reqwest::Client,
    config: AiConfig,
}

impl PitchService {
    pub fn new(config: AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Generates an outreach pitch for `lead`
    pub async fn generate(&self, lead: &Lead, options: &PitchOptions) -> AppResult<GeneratedPitch> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::Upstream("AI provider is not configured".to_string()))?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::build_prompt(lead, options),
                },
            ],
            temperature: 0.7,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("AI provider request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::warn!("AI provider returned {}: {}", status, body);
            return Err(AppError::Upstream(format!(
                "AI provider returned HTTP {}",
                status
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed AI provider response: {}", e)))?;

        let pitch = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Upstream("AI provider returned no choices".to_string()))?;

        Ok(GeneratedPitch {
            pitch,
            usage: completion.usage.unwrap_or_default(),
        })
    }

    /// Assembles the user prompt from lead fields and caller options
    fn build_prompt(lead: &Lead, options: &PitchOptions) -> String {
        let mut prompt = format!("Write an outreach pitch for this opportunity:\n\nTitle: {}\n", lead.title);
        if let Some(company) = &lead.company {
            prompt.push_str(&format!("Company: {}\n", company));
        }
        if let Some(budget) = &lead.budget {
            prompt.push_str(&format!("Budget: {}\n", budget));
        }
        if let Some(skill) = &lead.skill {
            prompt.push_str(&format!("Primary skill: {}\n", skill));
        }
        if !lead.description.is_empty() {
            prompt.push_str(&format!("\nDescription:\n{}\n", lead.description));
        }

        let tone = options.tone.as_deref().unwrap_or("professional");
        let length = options.length.as_deref().unwrap_or("medium");
        prompt.push_str(&format!("\nTone: {}. Length: {}.\n", tone, length));

        if let Some(instructions) = &options.custom_instructions {
            if !instructions.is_empty() {
                prompt.push_str(&format!("\nAdditional instructions: {}\n", instructions));
            }
        }

        prompt
    }
}

const SYSTEM_PROMPT: &str = "You are an expert freelance proposal writer. Write a concise, \
specific outreach pitch that addresses the client's stated needs. Do not invent credentials. \
Return only the pitch text, no preamble.";

use crate::config::toml_config::LlmConfig;
use crate::core::drafting::extract_skills;
use crate::domain::ports::{DraftRequest, Drafter};
use crate::utils::error::{JobPilotError, Result};
use crate::utils::validation::require_credential;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You write concise, professional cover letters. \
    Use only facts present in the resume. Do not invent employers, degrees or numbers. \
    Return the letter text only, without any preamble.";

// 履歷太長時只送前面這段
const MAX_RESUME_CHARS: usize = 6000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// 透過 OpenAI 相容的 chat completions API 產生求職信。單次請求，不重試。
pub struct ChatDrafter {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatDrafter {
    pub fn new(llm: &LlmConfig, client: Client) -> Result<Self> {
        let api_key = require_credential("llm.api_key", &llm.api_key).map_err(|_| {
            JobPilotError::config("Language model key 'llm.api_key' (GROQ_API_KEY) must be set")
        })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", llm.base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: llm.model.clone(),
        })
    }

    fn build_prompt(request: &DraftRequest) -> String {
        let resume: String = request.resume_text.chars().take(MAX_RESUME_CHARS).collect();
        let skills = extract_skills(&request.description);

        format!(
            "Write a cover letter for the {title} position at {company}.\n\n\
             Skills the posting asks for: {skills}\n\n\
             Job description:\n{description}\n\n\
             Resume:\n{resume}\n\n\
             Sign the letter with the applicant's name and contact details from the resume.",
            title = request.job_title,
            company = request.company,
            skills = if skills.is_empty() {
                "(none detected)".to_string()
            } else {
                skills.join(", ")
            },
            description = request.description,
            resume = resume,
        )
    }
}

#[async_trait]
impl Drafter for ChatDrafter {
    async fn draft(&self, request: &DraftRequest) -> Result<String> {
        let prompt = Self::build_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.4,
        };

        tracing::info!(
            "✨ Drafting cover letter for '{}' at '{}' with {}",
            request.job_title,
            request.company,
            self.model
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(JobPilotError::DraftError {
                message: format!("language model returned HTTP {}: {}", status.as_u16(), text),
            });
        }

        let completion: ChatResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| JobPilotError::DraftError {
                message: "language model returned no content".to_string(),
            })
    }
}

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    digest::NewsSection,
    llm::composer::{ComposedPage, PageComposer},
};

static SUMMARY_DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="summary">(.*?)</div>"#).unwrap());
static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Client for any OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("model returned no content")]
    NoContent,
    #[error("model did not return an HTML document: {preview}")]
    NotHtml { preview: String },
}

impl OpenAIClient {
    const SYSTEM_PROMPT: &'static str = include_str!("./prompts/page_composer.txt");

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.deepseek.com/v1".into(),
            model: Self::COMPOSER_MODEL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn send_completion_request(
        &self,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = serde_json::json!({
            "model": self.model,
            // low temperature so the model sticks to the template
            "temperature": 0.3,
            "max_tokens": 4000,
            "messages": [
                {
                    "role": "system",
                    "content": Self::SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl PageComposer for OpenAIClient {
    const COMPOSER_MODEL: &'static str = "deepseek-chat";

    type Error = OpenAIError;

    async fn compose(
        &self,
        section: &NewsSection,
        detail_template: &str,
        number: usize,
    ) -> Result<ComposedPage, Self::Error> {
        let user_prompt = format!(
            r#"Task: Fill the provided HTML template with the news content.

News Content:
{content}

HTML Template:
{detail_template}

Requirements:
1. Return the FULL HTML code.
2. Do NOT change the CSS or structure of the template.
3. Replace `{{{{NUMBER}}}}` with the number "{number:02}".
4. Replace `{{{{TITLE}}}}` with the news headline.
5. Replace `{{{{SUMMARY}}}}` with a 1-sentence summary (around 30-40 Chinese characters).
6. Replace `{{{{CONTENT}}}}` with the full news body (wrap paragraphs in <p> tags).
7. Ensure all text is in Chinese.
8. IMPORTANT: The content must fit within a single 1920x1080 page. Summarize the body text to approximately 100-200 Chinese characters to prevent overflow. Keep it concise.
"#,
            content = section.markdown(),
        );

        let response = self
            .send_completion_request(user_prompt)
            .await
            .inspect_err(|e| tracing::error!(error = %e, number, "Failed to compose page"))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or(OpenAIError::NoContent)?;

        let html = strip_code_fences(&content).to_string();
        if !html.starts_with("<!DOCTYPE") && !html.starts_with("<html") {
            return Err(OpenAIError::NotHtml {
                preview: html.chars().take(200).collect(),
            });
        }

        let summary = extract_summary(&html, section);
        Ok(ComposedPage { html, summary })
    }
}

/// Models love wrapping HTML in markdown fences no matter what the prompt
/// says; peel them off.
fn strip_code_fences(content: &str) -> &str {
    let mut content = content.trim();
    if let Some(rest) = content.strip_prefix("```html") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}

/// Pulls the card summary out of the composed page, falling back to the first
/// body line of the source section clipped to 40 characters.
fn extract_summary(html: &str, section: &NewsSection) -> String {
    if let Some(caps) = SUMMARY_DIV_RE.captures(html) {
        let summary = HTML_TAG_RE.replace_all(&caps[1], "").trim().to_string();
        if !summary.is_empty() {
            return summary;
        }
    }

    section
        .body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let clipped: String = line.chars().take(40).collect();
            format!("{clipped}...")
        })
        .unwrap_or_default()
}

//! The external reasoning service that produces the categorical judgment.
//!
//! The instruction template is fixed and versioned so a classification is
//! reproducible given identical grounding context. The judgment is advisory:
//! deterministic rule layers downstream may override it.

use async_trait::async_trait;
use kfund_core::{Classification, Confidence, Error, Judgment, LineItem};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const SERVICE: &str = "reasoning service";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Instruction template version; bump when the prompt wording changes.
pub const CLASSIFY_PROMPT_VERSION: &str = "2025-06";

const CLASSIFY_SYSTEM_PROMPT: &str = "\
You are a K Fund (EDCS) classification expert for the U.S. Department of State.
Classify the line item as one of:
- K_FUND_ALLOWABLE: Representational expense for foreign officials (gifts, hospitality, courtesies)
- NOT_ALLOWABLE: Operational, capital, personnel, or transportation expense
- LEGAL_REVIEW: Unclear - needs Legal Adviser determination

Respond in this exact JSON format:
{
    \"classification\": \"K_FUND_ALLOWABLE\" or \"NOT_ALLOWABLE\" or \"LEGAL_REVIEW\",
    \"authority\": \"specific statute like 22 U.S.C. § 2671 or 22 U.S.C. § 2694\",
    \"rationale\": \"one sentence explanation\",
    \"regulation_text\": \"relevant quote from regulations\",
    \"confidence\": \"high\" or \"medium\" or \"low\",
    \"needs_proration\": true or false,
    \"questions\": [\"question1\", \"question2\"] (only if LEGAL_REVIEW)
}";

const ANSWER_SYSTEM_PROMPT: &str = "\
You are an expert K Fund (EDCS) compliance assistant for the U.S. Department of State.
Answer questions about K Fund allowability for representational expenses based ONLY on the provided guidelines.
Cite specific authorities (22 U.S.C. § 2671, 22 U.S.C. § 2694, GAO guidance, etc.).
End with a confidence level: HIGH, MEDIUM, or LOW.";

/// Categorical judgment producer; the classification engine consumes its
/// output through this seam, so tests can substitute a fake.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn classify(&self, item: &LineItem, context: &str) -> Result<Judgment, Error>;

    /// Free-text answer to a compliance question, grounded in `context`.
    /// The answer states its own confidence level in prose.
    async fn answer(&self, question: &str, context: &str) -> Result<String, Error>;
}

/// Chat-completions client producing JSON-mode judgments.
pub struct OpenAiReasoner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Raw judgment shape as the model emits it; tolerant of omitted fields,
/// strict about the classification label.
#[derive(Deserialize)]
struct RawJudgment {
    classification: String,
    #[serde(default)]
    authority: String,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    regulation_text: String,
    confidence: Option<Confidence>,
    #[serde(default)]
    needs_proration: bool,
    #[serde(default)]
    questions: Vec<String>,
}

impl OpenAiReasoner {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Configuration("OPENAI_API_KEY is not set".into()))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(base_url, api_key, model))
    }

    fn upstream(message: impl ToString) -> Error {
        Error::Upstream {
            service: SERVICE,
            message: message.to_string(),
        }
    }

    /// Send one chat-completions request and return the first choice's text.
    async fn chat(&self, body: serde_json::Value) -> Result<String, Error> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::upstream)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::upstream(format!("{status}: {text}")));
        }

        let parsed: ChatResponse = resp.json().await.map_err(Self::upstream)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Self::upstream("response contained no choices"))
    }
}

/// Build the user message for one line item and its grounding context.
fn user_prompt(item: &LineItem, context: &str) -> String {
    format!(
        "Line item: {}\nCost: ${}\nForeign guests: {}/{}\n\nK Fund Guidelines:\n{}",
        item.item, item.cost, item.foreign_guests, item.total_guests, context
    )
}

/// Build the user message for a free-text question.
fn answer_prompt(question: &str, context: &str) -> String {
    format!("Question: {question}\n\nRegulations:\n{context}")
}

/// Parse the model's JSON payload into a [`Judgment`].
///
/// A malformed payload or unknown label means the collaborator violated
/// its contract — an upstream error, never a fabricated judgment.
fn parse_judgment(payload: &str) -> Result<Judgment, Error> {
    let raw: RawJudgment = serde_json::from_str(payload)
        .map_err(|e| OpenAiReasoner::upstream(format!("malformed judgment JSON: {e}")))?;

    let classification = Classification::parse(&raw.classification).ok_or_else(|| {
        OpenAiReasoner::upstream(format!(
            "unknown classification label: {}",
            raw.classification
        ))
    })?;

    Ok(Judgment {
        classification,
        authority: raw.authority,
        rationale: raw.rationale,
        regulation_text: raw.regulation_text,
        confidence: raw.confidence.unwrap_or(Confidence::Medium),
        needs_proration: raw.needs_proration,
        questions: raw.questions,
    })
}

#[async_trait]
impl Reasoner for OpenAiReasoner {
    async fn classify(&self, item: &LineItem, context: &str) -> Result<Judgment, Error> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": CLASSIFY_SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(item, context) }
            ],
            "response_format": { "type": "json_object" },
            "max_completion_tokens": 1000,
        });

        debug!(
            item = %item.item,
            prompt_version = CLASSIFY_PROMPT_VERSION,
            "requesting judgment"
        );

        let content = self.chat(body).await?;
        parse_judgment(&content)
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String, Error> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": ANSWER_SYSTEM_PROMPT },
                { "role": "user", "content": answer_prompt(question, context) }
            ],
            "max_completion_tokens": 2000,
        });

        debug!(question, "requesting grounded answer");
        self.chat(body).await
    }
}

//! HTTP-backed content generator
//!
//! One concrete [`ContentGenerator`] speaking to an Ollama-style JSON
//! completion endpoint. The core engine never sees reqwest; any transport
//! or payload problem maps onto [`GeneratorError`] and lands on the
//! offline fallback path.
use async_trait::async_trait;
use heroquiz_game::{BossDraft, ContentGenerator, GeneratorError, QuestionDraft};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Ollama generate-endpoint response envelope.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct QuestionBatch {
    questions: Vec<QuestionDraft>,
}

pub struct HttpGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

impl HttpGenerator {
    /// Build the generator and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Unavailable`] when the client cannot be
    /// constructed.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    async fn complete_json(&self, prompt: &str) -> Result<serde_json::Value, GeneratorError> {
        let url = format!("{}/api/generate", self.config.endpoint);
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GeneratorError::Unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeneratorError::Status(status.as_u16()));
        }

        let envelope: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Malformed(e.to_string()))?;
        serde_json::from_str(&envelope.response)
            .map_err(|e| GeneratorError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ContentGenerator for HttpGenerator {
    async fn generate_questions(
        &self,
        subject_label: &str,
        level: u32,
        recent_texts: &[String],
    ) -> Result<Vec<QuestionDraft>, GeneratorError> {
        let prompt = question_prompt(subject_label, level, recent_texts);
        let value = self.complete_json(&prompt).await?;
        let batch: QuestionBatch =
            serde_json::from_value(value).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
        Ok(batch.questions)
    }

    async fn generate_boss(
        &self,
        subject_label: &str,
        level: u32,
    ) -> Result<BossDraft, GeneratorError> {
        let prompt = boss_prompt(subject_label, level);
        let value = self.complete_json(&prompt).await?;
        serde_json::from_value(value).map_err(|e| GeneratorError::Malformed(e.to_string()))
    }
}

fn question_prompt(subject_label: &str, level: u32, recent_texts: &[String]) -> String {
    let mut prompt = format!(
        "你是國小出題老師。請為「{subject_label}」科目第 {level} 關出 3 到 5 題選擇題，\
         以 JSON 回答：{{\"questions\": [{{\"id\": \"...\", \"text\": \"...\", \
         \"options\": [\"...\", \"...\", \"...\", \"...\"], \"correctIndex\": 0, \
         \"explanation\": \"...\", \"difficulty\": 1}}]}}。\
         每題恰好四個選項，difficulty 介於 1 到 3。"
    );
    if !recent_texts.is_empty() {
        prompt.push_str("請避免出以下已出過的題目：");
        for text in recent_texts {
            prompt.push('「');
            prompt.push_str(text);
            prompt.push('」');
        }
    }
    prompt
}

fn boss_prompt(subject_label: &str, level: u32) -> String {
    format!(
        "請為「{subject_label}」科目第 {level} 關設計一個可愛的怪物頭目，\
         以 JSON 回答：{{\"name\": \"...\", \"taunt\": \"...\"}}。\
         name 是怪物名字，taunt 是一句挑釁台詞。"
    )
}

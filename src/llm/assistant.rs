//! 助手边界：自由文本提问（ask）与按 Schema 约束的结构化提问（structured_ask）
//!
//! 流水线各阶段只依赖 `Assistant` trait；`LlmAssistant` 把任意 `LlmClient` 适配为助手：
//! 人设作为 system 消息，结构化提问额外把 JSON Schema 拼进人设，并从回复中提取 JSON。

use std::sync::Arc;

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::llm::{LlmClient, LlmError, Message};

/// 助手调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// 内容被拦截（仅影响当前条目）
    #[error("content blocked")]
    ContentBlocked,

    /// 空回复（仅影响当前条目）
    #[error("empty response")]
    Empty,

    /// 结构化回复无法解析或不符合预期形状（仅影响当前条目）
    #[error("invalid structured output: {0}")]
    InvalidStructuredOutput(String),

    /// 传输或服务端错误
    #[error("provider error: {0}")]
    Provider(String),
}

impl AssistantError {
    /// 是否只需丢弃当前条目（而非终止整次运行）
    pub fn is_item_local(&self) -> bool {
        !matches!(self, AssistantError::Provider(_))
    }
}

impl From<LlmError> for AssistantError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::ContentBlocked => AssistantError::ContentBlocked,
            other => AssistantError::Provider(other.to_string()),
        }
    }
}

/// 外部内容生成能力：两种提问方式，均可能失败或返回空
#[async_trait]
pub trait Assistant: Send + Sync {
    /// 自由文本提问
    async fn ask(&self, persona: &str, request: &str) -> Result<String, AssistantError>;

    /// 结构化提问，返回原始 JSON；调用方按期望形状解析
    async fn structured_ask(
        &self,
        persona: &str,
        request: &str,
        schema: &Value,
    ) -> Result<Value, AssistantError>;

    /// 累计 token 使用：(prompt_tokens, completion_tokens, total_tokens)；不计费的助手返回 0
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// 由类型派生 Schema，结构化提问并解析为该类型
pub async fn ask_structured<T>(
    assistant: &dyn Assistant,
    persona: &str,
    request: &str,
) -> Result<T, AssistantError>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = schema_value::<T>();
    let raw = assistant.structured_ask(persona, request, &schema).await?;
    serde_json::from_value(raw).map_err(|e| AssistantError::InvalidStructuredOutput(e.to_string()))
}

/// 类型 -> JSON Schema（serde_json::Value）
pub fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

/// 把 LlmClient 适配为 Assistant
pub struct LlmAssistant {
    llm: Arc<dyn LlmClient>,
}

impl LlmAssistant {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Assistant for LlmAssistant {
    fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    async fn ask(&self, persona: &str, request: &str) -> Result<String, AssistantError> {
        let messages = vec![Message::system(persona), Message::user(request)];
        let response = self.llm.complete(&messages).await?;
        let response = response.trim();
        if response.is_empty() {
            return Err(AssistantError::Empty);
        }
        tracing::debug!(chars = response.len(), "assistant answered");
        Ok(response.to_string())
    }

    async fn structured_ask(
        &self,
        persona: &str,
        request: &str,
        schema: &Value,
    ) -> Result<Value, AssistantError> {
        let schema_text = serde_json::to_string_pretty(schema).unwrap_or_default();
        let system = format!(
            "{}\n\nRespond with JSON only, no commentary, matching this JSON Schema:\n{}",
            persona.trim(),
            schema_text
        );
        let messages = vec![Message::system(system), Message::user(request)];
        let response = self.llm.complete(&messages).await?;
        if response.trim().is_empty() {
            return Err(AssistantError::Empty);
        }
        extract_json(&response)
    }
}

/// 从回复中提取 JSON：```json 代码块、``` 代码块，或第一个 `{`/`[` 到最后一个 `}`/`]`
pub fn extract_json(output: &str) -> Result<Value, AssistantError> {
    let trimmed = output.trim();

    let candidate = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else {
        let start = match (trimmed.find('{'), trimmed.find('[')) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let end = match (trimmed.rfind('}'), trimmed.rfind(']')) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        match (start, end) {
            (Some(s), Some(e)) if s <= e => &trimmed[s..=e],
            _ => trimmed,
        }
    };

    serde_json::from_str(candidate)
        .map_err(|e| AssistantError::InvalidStructuredOutput(format!("{}: {}", e, candidate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    struct CannedLlm(Result<String, LlmError>);

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            self.0.clone()
        }
    }

    struct MeteredLlm;

    #[async_trait]
    impl LlmClient for MeteredLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            Ok("ok".to_string())
        }

        fn token_usage(&self) -> (u64, u64, u64) {
            (12, 30, 42)
        }
    }

    fn assistant(answer: Result<&str, LlmError>) -> LlmAssistant {
        LlmAssistant::new(Arc::new(CannedLlm(answer.map(String::from))))
    }

    #[derive(Deserialize, JsonSchema)]
    struct Pick {
        index: i64,
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json("```json\n{\"a\": 1}\n```").unwrap(), json!({"a": 1}));
        assert_eq!(extract_json("Sure:\n[1, 2]\nDone").unwrap(), json!([1, 2]));
        assert_eq!(
            extract_json("text {\"a\": [1]} tail").unwrap(),
            json!({"a": [1]})
        );
        assert!(matches!(
            extract_json("no json here"),
            Err(AssistantError::InvalidStructuredOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_ask_maps_empty_and_blocked() {
        assert_eq!(
            assistant(Ok("   ")).ask("p", "r").await,
            Err(AssistantError::Empty)
        );
        assert_eq!(
            assistant(Err(LlmError::ContentBlocked)).ask("p", "r").await,
            Err(AssistantError::ContentBlocked)
        );
        assert!(matches!(
            assistant(Err(LlmError::Request("boom".into()))).ask("p", "r").await,
            Err(AssistantError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn test_ask_structured_parses_shape() {
        let a = assistant(Ok("```json\n{\"index\": 3}\n```"));
        let pick: Pick = ask_structured(&a, "p", "r").await.unwrap();
        assert_eq!(pick.index, 3);

        let a = assistant(Ok("{\"other\": true}"));
        let result: Result<Pick, _> = ask_structured(&a, "p", "r").await;
        assert!(matches!(result, Err(AssistantError::InvalidStructuredOutput(_))));
    }

    #[test]
    fn test_item_local_classification() {
        assert!(AssistantError::ContentBlocked.is_item_local());
        assert!(AssistantError::Empty.is_item_local());
        assert!(AssistantError::InvalidStructuredOutput("x".into()).is_item_local());
        assert!(!AssistantError::Provider("x".into()).is_item_local());
    }

    #[test]
    fn test_token_usage_passes_through() {
        let metered: Arc<dyn Assistant> = Arc::new(LlmAssistant::new(Arc::new(MeteredLlm)));
        assert_eq!(metered.token_usage(), (12, 30, 42));
        assert_eq!(assistant(Ok("x")).token_usage(), (0, 0, 0));
    }
}

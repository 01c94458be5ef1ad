//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek）实现 LlmClient：complete（非流式）。
//! 内容审查拦截单独成为一种错误，上层据此只丢弃当前文章而不终止整次运行。

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::Message;

/// LLM 后端错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// 服务端内容过滤（finish_reason = content_filter 等）
    #[error("content blocked by provider")]
    ContentBlocked,

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Request(String),
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

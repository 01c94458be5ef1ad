//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）与助手边界

pub mod assistant;
pub mod deepseek;
pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;

pub use assistant::{ask_structured, schema_value, Assistant, AssistantError, LlmAssistant};
pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use message::{Message, Role};
pub use mock::MockAssistant;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{LlmClient, LlmError};

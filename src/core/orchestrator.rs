//! 主控：按配置创建助手，驱动一次报刊生成

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::document::Document;
use crate::generator::{ContentGenerator, ContentRequest, NewspaperGenerator};
use crate::llm::{create_deepseek_client, Assistant, LlmAssistant, MockAssistant, OpenAiClient};

/// 根据 [llm] 配置创建助手
///
/// - `mock`：无需 API Key 的确定性助手
/// - `openai`：需要 `OPENAI_API_KEY`，可用 base_url 指向兼容端点
/// - `deepseek`（默认）：需要 `DEEPSEEK_API_KEY` 或 `OPENAI_API_KEY`
pub fn create_assistant_from_config(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Assistant>> {
    let provider = cfg.llm.provider.trim().to_lowercase();
    let timeout = cfg.llm.timeouts.request;

    match provider.as_str() {
        "mock" => {
            tracing::info!("Using mock assistant");
            Ok(Arc::new(MockAssistant::new()))
        }
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("provider 'openai' requires OPENAI_API_KEY"))?;
            tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
            let client = OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                Some(api_key.as_str()),
            )
            .with_request_timeout(timeout);
            Ok(Arc::new(LlmAssistant::new(Arc::new(client))))
        }
        "deepseek" => {
            if std::env::var("DEEPSEEK_API_KEY").is_err() && std::env::var("OPENAI_API_KEY").is_err() {
                anyhow::bail!("provider 'deepseek' requires DEEPSEEK_API_KEY");
            }
            tracing::info!("Using DeepSeek LLM ({})", cfg.llm.model);
            let client = create_deepseek_client(Some(&cfg.llm.model), timeout);
            Ok(Arc::new(LlmAssistant::new(Arc::new(client))))
        }
        other => anyhow::bail!("unknown provider '{}' (expected deepseek, openai or mock)", other),
    }
}

/// 生成一期报刊：创建助手、挂上取消信号、运行生成器
pub async fn run_newspaper(
    cfg: &AppConfig,
    request: &ContentRequest,
    cancel: CancellationToken,
) -> anyhow::Result<Document> {
    let assistant = create_assistant_from_config(cfg)?;
    let generator = NewspaperGenerator::from_config(cfg).with_cancel_token(cancel);
    let result = generator.generate(request, Arc::clone(&assistant)).await;

    let (prompt_tokens, completion_tokens, total_tokens) = assistant.token_usage();
    tracing::info!(prompt_tokens, completion_tokens, total_tokens, "token usage");

    let doc = result?;
    tracing::info!(
        title = %doc.title,
        sections = doc.sections.len(),
        length = doc.length(),
        "newspaper ready"
    );
    Ok(doc)
}

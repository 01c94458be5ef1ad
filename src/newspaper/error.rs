//! 报刊流水线错误类型
//!
//! 只有「终止整次运行」的错误才会变成 NewspaperError；单篇文章的失败用 `Draft::Dropped` 表达。

use thiserror::Error;

use crate::llm::AssistantError;
use crate::pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum NewspaperError {
    /// 某个版面一篇文章都没规划出来
    #[error("no articles planned for section '{section}'")]
    NoArticles { section: String },

    #[error("{step} failed: {source}")]
    Assistant {
        step: &'static str,
        #[source]
        source: AssistantError,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed during newspaper pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    /// 流水线正常结束却没有产出文档
    #[error("pipeline finished without producing a document")]
    MissingDocument,
}

impl NewspaperError {
    pub fn assistant(step: &'static str, source: AssistantError) -> Self {
        NewspaperError::Assistant { step, source }
    }
}

//! 单元测试用的脚本化助手

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::llm::{Assistant, AssistantError};
use crate::newspaper::{
    Article, ArticlePlan, DateWindow, Depth, NewspaperContext, NewspaperOptions, Section,
};

type AskFn = dyn Fn(&str, &str) -> Result<String, AssistantError> + Send + Sync;
type StructuredFn = dyn Fn(&str, &str, &Value) -> Result<Value, AssistantError> + Send + Sync;

/// 回复由闭包决定的助手
pub(crate) struct FnAssistant {
    ask: Box<AskFn>,
    structured: Box<StructuredFn>,
}

impl FnAssistant {
    pub(crate) fn new(
        ask: impl Fn(&str, &str) -> Result<String, AssistantError> + Send + Sync + 'static,
        structured: impl Fn(&str, &str, &Value) -> Result<Value, AssistantError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            ask: Box::new(ask),
            structured: Box::new(structured),
        }
    }
}

#[async_trait]
impl Assistant for FnAssistant {
    async fn ask(&self, persona: &str, request: &str) -> Result<String, AssistantError> {
        (self.ask)(persona, request)
    }

    async fn structured_ask(
        &self,
        persona: &str,
        request: &str,
        schema: &Value,
    ) -> Result<Value, AssistantError> {
        (self.structured)(persona, request, schema)
    }
}

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 30).unwrap()
}

pub(crate) fn context(assistant: impl Assistant + 'static, depth: Depth) -> NewspaperContext {
    NewspaperContext::new(
        Arc::new(assistant),
        NewspaperOptions {
            window: DateWindow::DaysBack(2),
            location: "Ohio".to_string(),
            max_length: 500,
            depth,
        },
        today(),
    )
}

pub(crate) fn article(headline: &str) -> Article {
    Article::from_plan(
        Section::new("Technology", "Technology news."),
        ArticlePlan {
            headline: headline.to_string(),
            slug: String::new(),
            summary: format!("Summary of {}", headline),
            questions: vec!["What happened?".to_string()],
        },
    )
}

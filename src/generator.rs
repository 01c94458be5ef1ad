//! 运行边界：`ContentRequest -> Document`
//!
//! 请求体是一个 JSON 对象，识别的键：
//! `days_back` | `date_range {start, end}`、`location`、`max_length`、`depth`、
//! `section_title` + `section_description`（给出则只生成单个版面）。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, PipelineSection};
use crate::document::Document;
use crate::llm::Assistant;
use crate::newspaper::{
    DateWindow, Depth, NewspaperError, NewspaperOptions, Newsroom, Section, Topology,
};

/// 一次生成请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub body: Map<String, Value>,
}

impl ContentRequest {
    pub fn new(body: Map<String, Value>) -> Self {
        Self { body }
    }

    /// 设置一个键，便于链式构造
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_string(), value.into());
        self
    }
}

/// 内容生成器：请求 + 助手 -> 文档
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &ContentRequest,
        assistant: Arc<dyn Assistant>,
    ) -> Result<Document, NewspaperError>;
}

/// 报刊生成器
#[derive(Debug, Clone, Default)]
pub struct NewspaperGenerator {
    settings: PipelineSection,
    author: Option<String>,
    seed: Option<u64>,
    protected: Vec<String>,
    default_depth: Depth,
    today: Option<NaiveDate>,
    cancel: CancellationToken,
}

impl NewspaperGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            settings: config.pipeline.clone(),
            author: config.newspaper.author.clone(),
            seed: config.newspaper.seed,
            protected: config.newspaper.protected_sections.clone(),
            default_depth: config.newspaper.depth,
            today: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 解析并校验请求
    pub fn parse_request(
        &self,
        request: &ContentRequest,
    ) -> Result<(Topology, NewspaperOptions), NewspaperError> {
        let body = &request.body;

        let window = match body.get("date_range") {
            Some(range) => parse_date_range(range)?,
            None => {
                let days = positive_int(body, "days_back")?;
                let days = u32::try_from(days)
                    .map_err(|_| invalid(format!("invalid 'days_back' {} (too large)", days)))?;
                DateWindow::DaysBack(days)
            }
        };

        let max_length = positive_int(body, "max_length")?;
        let max_length = usize::try_from(max_length)
            .map_err(|_| invalid(format!("invalid 'max_length' {} (too large)", max_length)))?;

        let depth = match text(body, "depth") {
            Some(depth) if !depth.is_empty() => depth.parse::<Depth>().map_err(invalid)?,
            _ => self.default_depth,
        };

        let location = text(body, "location").unwrap_or_default();

        let title = text(body, "section_title").unwrap_or_default();
        let description = text(body, "section_description").unwrap_or_default();
        let topology = match (title.is_empty(), description.is_empty()) {
            (true, true) => Topology::WholeEdition,
            (false, false) => Topology::SingleSection(Section::new(title, description)),
            (true, false) => return Err(invalid("no 'section_title' provided")),
            (false, true) => return Err(invalid("no 'section_description' provided")),
        };

        Ok((
            topology,
            NewspaperOptions {
                window,
                location,
                max_length,
                depth,
            },
        ))
    }
}

#[async_trait]
impl ContentGenerator for NewspaperGenerator {
    async fn generate(
        &self,
        request: &ContentRequest,
        assistant: Arc<dyn Assistant>,
    ) -> Result<Document, NewspaperError> {
        let (topology, options) = self.parse_request(request)?;

        let mut newsroom = Newsroom::new(assistant)
            .with_settings(self.settings.clone())
            .with_author(self.author.clone())
            .with_seed(self.seed)
            .with_protected_sections(self.protected.clone())
            .with_cancel_token(self.cancel.clone());
        if let Some(today) = self.today {
            newsroom = newsroom.with_today(today);
        }

        newsroom.create(topology, options).await
    }
}

fn invalid(message: impl Into<String>) -> NewspaperError {
    NewspaperError::InvalidRequest(message.into())
}

/// 去掉首尾空白的字符串值；非字符串视为缺失
fn text(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
}

/// 正整数值；浮点数截断取整
fn positive_int(body: &Map<String, Value>, key: &str) -> Result<u64, NewspaperError> {
    let value = body
        .get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .ok_or_else(|| invalid(format!("no '{}' provided (expected positive integer)", key)))?;
    if value <= 0 {
        return Err(invalid(format!("invalid '{}' {} (must be positive)", key, value)));
    }
    Ok(value as u64)
}

fn parse_date_range(value: &Value) -> Result<DateWindow, NewspaperError> {
    let date = |key: &str| -> Result<NaiveDate, NewspaperError> {
        let raw = value
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("no 'date_range.{}' provided (expected YYYY-MM-DD)", key)))?;
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| invalid(format!("invalid 'date_range.{}' '{}': {}", key, raw, e)))
    };

    let start = date("start")?;
    let end = date("end")?;
    if start > end {
        return Err(invalid(format!(
            "invalid 'date_range': start {} is after end {}",
            start, end
        )));
    }
    Ok(DateWindow::Range { start, end })
}

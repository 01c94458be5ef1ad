//! Mock 助手（用于测试与 `--provider mock`，无需 API）
//!
//! 回复完全由请求与 Schema 决定：同样的输入永远得到同样的输出。
//! 结构化提问按 Schema 形状给出罐头 JSON：选题计划 / 知识条目 / 追问列表 / 删除下标。

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{Assistant, AssistantError};

/// 默认正文：三段，每段一句
const DEFAULT_BODY: &str = "Officials confirmed the details of the event on Monday.\n\
Local residents described the impact on their daily routines.\n\
Further updates are expected later in the week.";

/// Mock 助手
#[derive(Debug)]
pub struct MockAssistant {
    /// 每个版面返回的文章数
    pub articles_per_section: usize,
    /// 所有自由文本提问的回复
    pub body: String,
    /// 追问分析的回复（为空表示调研已收敛）
    pub follow_ups: Vec<String>,
    /// 版面编辑器删除下标的回复
    pub remove_index: i64,
    asks: AtomicUsize,
    structured_asks: AtomicUsize,
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self {
            articles_per_section: 3,
            body: DEFAULT_BODY.to_string(),
            follow_ups: Vec::new(),
            remove_index: 0,
            asks: AtomicUsize::new(0),
            structured_asks: AtomicUsize::new(0),
        }
    }
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles_per_section(mut self, n: usize) -> Self {
        self.articles_per_section = n;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_follow_ups(mut self, follow_ups: Vec<String>) -> Self {
        self.follow_ups = follow_ups;
        self
    }

    pub fn with_remove_index(mut self, index: i64) -> Self {
        self.remove_index = index;
        self
    }

    /// (自由文本提问次数, 结构化提问次数)
    pub fn call_counts(&self) -> (usize, usize) {
        (
            self.asks.load(Ordering::SeqCst),
            self.structured_asks.load(Ordering::SeqCst),
        )
    }

    fn plan_answer(&self, request: &str) -> Value {
        let section = section_label(request);
        let articles: Vec<Value> = (1..=self.articles_per_section)
            .map(|i| {
                json!({
                    "headline": format!("{} story {}", section, i),
                    "slug": format!("story-{}", i),
                    "summary": format!("Summary of {} story {}.", section, i),
                    "questions": ["What happened?", "Who was involved?"],
                })
            })
            .collect();
        json!({ "articles": articles })
    }
}

/// 请求中 `Section: xxx` 行的值；没有则为 "General"
fn section_label(request: &str) -> String {
    request
        .lines()
        .find_map(|line| line.trim().strip_prefix("Section:"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "General".to_string())
}

#[async_trait]
impl Assistant for MockAssistant {
    async fn ask(&self, _persona: &str, _request: &str) -> Result<String, AssistantError> {
        self.asks.fetch_add(1, Ordering::SeqCst);
        if self.body.trim().is_empty() {
            return Err(AssistantError::Empty);
        }
        Ok(self.body.clone())
    }

    async fn structured_ask(
        &self,
        _persona: &str,
        request: &str,
        schema: &Value,
    ) -> Result<Value, AssistantError> {
        self.structured_asks.fetch_add(1, Ordering::SeqCst);
        let shape = schema.to_string();

        if shape.contains("\"articles\"") {
            Ok(self.plan_answer(request))
        } else if shape.contains("\"index\"") {
            Ok(json!({ "index": self.remove_index }))
        } else if shape.contains("\"topic\"") {
            Ok(json!([{ "topic": "Overview", "information": self.body }]))
        } else {
            Ok(json!(self.follow_ups))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_label() {
        assert_eq!(section_label("## Header\nSection: Technology\nmore"), "Technology");
        assert_eq!(section_label("nothing"), "General");
    }

    #[tokio::test]
    async fn test_structured_shapes() {
        let mock = MockAssistant::new().with_articles_per_section(2);
        let plan = mock
            .structured_ask("p", "Section: World News", &json!({"properties": {"articles": {}}}))
            .await
            .unwrap();
        assert_eq!(plan["articles"].as_array().map(Vec::len), Some(2));
        assert_eq!(plan["articles"][0]["headline"], "World News story 1");

        let index = mock
            .structured_ask("p", "r", &json!({"properties": {"index": {}}}))
            .await
            .unwrap();
        assert_eq!(index, json!({"index": 0}));

        let follow_ups = mock
            .structured_ask("p", "r", &json!({"type": "array", "items": {"type": "string"}}))
            .await
            .unwrap();
        assert_eq!(follow_ups, json!([]));
        assert_eq!(mock.call_counts(), (0, 3));
    }
}

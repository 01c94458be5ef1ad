//! 报刊数据模型：版面、文章、知识条目、运行参数
//!
//! 文章的「有效性」用 `Draft` 表达：`Ready(Article)` 继续流转，`Dropped` 在过滤阶段被丢弃，绝不修复。

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::llm::AssistantError;

/// 篇幅 / 调研深度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    #[default]
    Short,
    Medium,
    Long,
}

impl Depth {
    /// 调研细化循环的最大轮数
    pub fn max_iterations(self) -> usize {
        match self {
            Depth::Short => 0,
            Depth::Medium => 2,
            Depth::Long => 5,
        }
    }

    /// 每个版面的文章数
    pub fn article_count(self) -> usize {
        match self {
            Depth::Short => 3,
            Depth::Medium => 5,
            Depth::Long => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Short => "short",
            Depth::Medium => "medium",
            Depth::Long => "long",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Depth::Short),
            "medium" => Ok(Depth::Medium),
            "long" => Ok(Depth::Long),
            other => Err(format!(
                "invalid length '{}'. Must be one of: short, medium, long",
                other
            )),
        }
    }
}

/// 版面：标题 + 描述，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub description: String,
}

impl Section {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// 选题计划中的一篇文章（结构化提问的返回形状）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ArticlePlan {
    /// A concise, informative headline for the article.
    pub headline: String,
    /// A short identifier for the story.
    #[serde(default)]
    pub slug: String,
    /// 1-3 sentence summary of the story and its angle.
    pub summary: String,
    /// Research questions that must be answered to write the article.
    #[serde(default)]
    pub questions: Vec<String>,
}

/// 调研得到的一条知识：(主题, 信息)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Knowledge {
    /// A short description of the topic this information covers.
    pub topic: String,
    /// A detailed report of information about this topic.
    pub information: String,
}

impl Knowledge {
    pub fn is_complete(&self) -> bool {
        !self.topic.trim().is_empty() && !self.information.trim().is_empty()
    }
}

/// 文章：由选题阶段创建，依次经调研、撰写、润色阶段修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub section: Section,
    pub headline: String,
    pub summary: String,
    pub questions: Vec<String>,
    pub knowledge: Vec<Knowledge>,
    pub research: String,
    pub body: String,
}

impl Article {
    pub fn from_plan(section: Section, plan: ArticlePlan) -> Self {
        Self {
            section,
            headline: plan.headline,
            summary: plan.summary,
            questions: plan.questions,
            knowledge: Vec::new(),
            research: String::new(),
            body: String::new(),
        }
    }

    /// 文档中的小节标题：`<版面>: <标题>`
    pub fn document_title(&self) -> String {
        format!("{}: {}", self.section.title, self.headline)
    }
}

/// 文章被丢弃的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    ContentBlocked,
    EmptyResponse,
    InvalidStructuredOutput(String),
    AssistantFailed(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::ContentBlocked => f.write_str("content blocked"),
            DropReason::EmptyResponse => f.write_str("empty response"),
            DropReason::InvalidStructuredOutput(e) => write!(f, "invalid structured output: {}", e),
            DropReason::AssistantFailed(e) => write!(f, "assistant failed: {}", e),
        }
    }
}

impl From<AssistantError> for DropReason {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::ContentBlocked => DropReason::ContentBlocked,
            AssistantError::Empty => DropReason::EmptyResponse,
            AssistantError::InvalidStructuredOutput(e) => DropReason::InvalidStructuredOutput(e),
            AssistantError::Provider(e) => DropReason::AssistantFailed(e),
        }
    }
}

/// 流转中的文章：有效则继续，无效则在过滤阶段丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Ready(Article),
    Dropped {
        section: String,
        headline: String,
        step: &'static str,
        reason: DropReason,
    },
}

impl Draft {
    pub fn dropped(article: &Article, step: &'static str, reason: DropReason) -> Self {
        Draft::Dropped {
            section: article.section.title.clone(),
            headline: article.headline.clone(),
            step,
            reason,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Draft::Ready(_))
    }

    /// 过滤阶段使用：有效返回文章，无效记录警告并返回 None
    pub fn into_ready(self) -> Option<Article> {
        match self {
            Draft::Ready(article) => Some(article),
            Draft::Dropped {
                section,
                headline,
                step,
                reason,
            } => {
                tracing::warn!(%section, %headline, step, %reason, "article dropped");
                None
            }
        }
    }
}

/// 报道时间窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// 截至今天，往前追溯 N 天
    DaysBack(u32),
    /// 明确的起止日期（含两端）
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateWindow {
    /// 以 `today` 为基准解析为起止日期
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            DateWindow::DaysBack(days) => {
                let start = today
                    .checked_sub_days(Days::new(u64::from(days)))
                    .unwrap_or(NaiveDate::MIN);
                (start, today)
            }
            DateWindow::Range { start, end } => (start, end),
        }
    }

    /// 人类可读文本：`Jan 2, 2006`，或 `Jan 2, 2006 to Jan 5, 2006`
    pub fn text(&self, today: NaiveDate) -> String {
        let (start, end) = self.resolve(today);
        if start == end {
            format_date(end)
        } else {
            format!("{} to {}", format_date(start), format_date(end))
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// 一次运行的参数：构造后只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewspaperOptions {
    pub window: DateWindow,
    pub location: String,
    pub max_length: usize,
    pub depth: Depth,
}

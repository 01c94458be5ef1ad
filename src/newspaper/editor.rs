//! 版面编辑器：文档超出长度预算时逐节删除，直到满足预算或没有小节
//!
//! 每轮让助手从表格里挑一个下标；提问失败、解析失败或下标越界时，改用随机下标，保证每轮必删一节。
//! 随机源由调用方注入，给定种子即可复现。

use std::sync::Arc;

use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::document::Document;
use crate::llm::{ask_structured, Assistant};
use crate::newspaper::prompts;

/// 删除哪一节（结构化提问的返回形状）
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemovalChoice {
    /// The index of the article to remove.
    pub index: i64,
}

/// 一次裁剪的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    pub initial_sections: usize,
    pub initial_length: usize,
    pub final_length: usize,
    /// 被删除小节的标题，按删除顺序
    pub removed: Vec<String>,
    /// 使用随机回退的次数
    pub fallbacks: usize,
}

pub struct LengthEditor<R> {
    assistant: Arc<dyn Assistant>,
    rng: R,
    protected: Vec<String>,
}

impl<R: Rng + Send> LengthEditor<R> {
    pub fn new(assistant: Arc<dyn Assistant>, rng: R) -> Self {
        Self {
            assistant,
            rng,
            protected: Vec::new(),
        }
    }

    /// 提示助手尽量不要删除的版面
    pub fn with_protected(mut self, protected: Vec<String>) -> Self {
        self.protected = protected;
        self
    }

    pub async fn fit(&mut self, doc: &mut Document, max_length: usize) -> EditReport {
        let mut report = EditReport {
            initial_sections: doc.sections.len(),
            initial_length: doc.length(),
            ..EditReport::default()
        };
        // 硬上限：初始节数的两倍
        let cap = report.initial_sections * 2;

        while doc.length() > max_length && !doc.sections.is_empty() {
            if report.removed.len() >= cap {
                tracing::warn!(cap, length = doc.length(), max_length, "length editor hit its safety cap");
                break;
            }

            let count = doc.sections.len();
            let index = match self.choose(doc, max_length).await {
                Some(index) => index,
                None => {
                    report.fallbacks += 1;
                    self.rng.random_range(0..count)
                }
            };

            if let Some(section) = doc.remove_section(index) {
                tracing::info!(
                    index,
                    title = %section.title,
                    removed_length = section.length(),
                    length = doc.length(),
                    max_length,
                    remaining = doc.sections.len(),
                    "removed section"
                );
                report.removed.push(section.title);
            }
        }

        report.final_length = doc.length();
        report
    }

    /// 让助手选出要删除的下标；任何失败都返回 None
    async fn choose(&self, doc: &Document, max_length: usize) -> Option<usize> {
        let request = prompts::length_edit(max_length, doc.length(), &section_table(doc), &self.protected);
        match ask_structured::<RemovalChoice>(self.assistant.as_ref(), prompts::LENGTH_EDIT_PERSONA, &request).await {
            Ok(choice) => match usize::try_from(choice.index) {
                Ok(index) if index < doc.sections.len() => Some(index),
                _ => {
                    tracing::warn!(index = choice.index, sections = doc.sections.len(), "editor picked an out-of-range index");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "editor index request failed");
                None
            }
        }
    }
}

/// 当前小节表：下标 | 版面 | 标题 | 长度
pub fn section_table(doc: &Document) -> String {
    let mut table = String::from("| Index | Section | Headline | Length |\n|---|---|---|---|\n");
    for (i, section) in doc.sections.iter().enumerate() {
        let (name, headline) = section
            .title
            .split_once(": ")
            .unwrap_or(("", section.title.as_str()));
        table.push_str(&format!("| {} | {} | {} | {} |\n", i, name, headline, section.length()));
    }
    table
}

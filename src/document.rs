//! 文档模型：报刊成品（标题、作者、有序小节）与长度度量
//!
//! 长度只统计段落字节数，小节标题不计入。

use serde::{Deserialize, Serialize};

/// 文档中的一个小节：标题 + 有序段落
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl DocumentSection {
    pub fn new(title: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            title: title.into(),
            paragraphs,
        }
    }

    /// 本节段落字节数之和
    pub fn length(&self) -> usize {
        self.paragraphs.iter().map(String::len).sum()
    }
}

/// 最终输出的文档
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub sections: Vec<DocumentSection>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            sections: Vec::new(),
        }
    }

    /// 追加一节，正文按行拆分为段落（去掉首尾空白与空行）
    pub fn add_section(&mut self, title: impl Into<String>, body: &str) {
        self.sections
            .push(DocumentSection::new(title, split_paragraphs(body)));
    }

    /// 所有段落的字节数之和
    pub fn length(&self) -> usize {
        self.sections.iter().map(DocumentSection::length).sum()
    }

    /// 按标题稳定排序
    pub fn sort_sections(&mut self) {
        self.sections.sort_by(|a, b| a.title.cmp(&b.title));
    }

    /// 移除指定下标的小节并返回；越界返回 None
    pub fn remove_section(&mut self, index: usize) -> Option<DocumentSection> {
        if index < self.sections.len() {
            Some(self.sections.remove(index))
        } else {
            None
        }
    }

    /// 纯文本渲染（命令行 `--format text`）
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        if let Some(author) = &self.author {
            out.push_str("By ");
            out.push_str(author);
            out.push('\n');
        }
        for section in &self.sections {
            out.push('\n');
            out.push_str("## ");
            out.push_str(&section.title);
            out.push('\n');
            for paragraph in &section.paragraphs {
                out.push('\n');
                out.push_str(paragraph);
                out.push('\n');
            }
        }
        out
    }
}

/// 正文 -> 段落：按换行拆分，丢弃空行
pub fn split_paragraphs(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

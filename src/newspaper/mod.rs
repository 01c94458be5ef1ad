//! 报刊生成：选题 -> 调研 -> 撰写 -> 润色 -> 汇总 -> 长度裁剪
//!
//! 每个阶段都是接收 `NewspaperContext` 的普通 async 函数，由 `Newsroom` 接入流水线。

pub mod context;
pub mod create;
pub mod editor;
pub mod error;
pub mod models;
pub mod plan;
pub mod polish;
pub mod prompts;
pub mod research;
pub mod sections;
pub mod synthesize;

#[cfg(test)]
pub(crate) mod testing;

pub use context::NewspaperContext;
pub use create::{Newsroom, Topology};
pub use editor::{EditReport, LengthEditor};
pub use error::NewspaperError;
pub use models::{
    Article, ArticlePlan, DateWindow, Depth, Draft, DropReason, Knowledge, NewspaperOptions,
    Section,
};
pub use plan::plan_section;
pub use polish::{polish_article, BODY_CEILING};
pub use research::{refine_research, research_article};
pub use sections::create_sections;
pub use synthesize::synthesize_article;

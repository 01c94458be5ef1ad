//! Newsroom - 并发分阶段流水线驱动外部助手生成报刊
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 助手装配、单次运行主控、关闭信号
//! - **document**: 文档模型与长度度量
//! - **generator**: `ContentRequest -> Document` 运行边界与请求校验
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek）、助手边界、Mock 助手
//! - **newspaper**: 选题、调研、撰写、润色、版面裁剪各阶段与编排
//! - **observability**: 日志初始化
//! - **pipeline**: 有界队列 + worker 池 + 首错取消的阶段执行引擎

pub mod config;
pub mod core;
pub mod document;
pub mod generator;
pub mod llm;
pub mod newspaper;
pub mod observability;
pub mod pipeline;

pub use document::{Document, DocumentSection};
pub use generator::{ContentGenerator, ContentRequest, NewspaperGenerator};

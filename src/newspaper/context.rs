//! 运行上下文：助手句柄 + 运行参数，显式传给每个阶段函数

use std::sync::Arc;

use chrono::NaiveDate;

use crate::llm::Assistant;
use crate::newspaper::NewspaperOptions;

/// 一次运行内只读共享的状态
pub struct NewspaperContext {
    pub assistant: Arc<dyn Assistant>,
    pub options: NewspaperOptions,
    /// 时间窗口文本，运行开始时计算一次
    pub date_range: String,
}

impl NewspaperContext {
    pub fn new(assistant: Arc<dyn Assistant>, options: NewspaperOptions, today: NaiveDate) -> Self {
        let date_range = options.window.text(today);
        Self {
            assistant,
            options,
            date_range,
        }
    }
}

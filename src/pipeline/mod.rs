//! 阶段执行引擎：有界队列 + 每阶段 worker 池 + 首错取消

pub mod engine;
pub mod stages;
pub mod types;

pub use engine::Pipeline;
pub use stages::{retain, Filter, Flatten, Transform};
pub use types::{channel, Emitter, PipelineError, Stage, MAX_CAPACITY};

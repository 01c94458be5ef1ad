//! 核心编排层：助手装配、单次运行主控、关闭信号

pub mod orchestrator;
pub mod shutdown;

pub use orchestrator::{create_assistant_from_config, run_newspaper};
pub use shutdown::{ShutdownManager, ShutdownReason};

//! 流水线类型定义
//!
//! 定义阶段（Stage）抽象、带取消检查的输出端（Emitter）与引擎错误类型

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 阶段之间的有界缓冲上限
pub const MAX_CAPACITY: usize = 100;

/// 流水线错误类型
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 某个阶段函数返回错误（整次运行终止）
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// 阶段 worker panic
    #[error("stage '{stage}' panicked")]
    Panicked { stage: String },
    /// 运行已被取消
    #[error("context canceled")]
    Cancelled,
}

impl PipelineError {
    pub fn stage(stage: impl Into<String>, source: anyhow::Error) -> Self {
        PipelineError::Stage {
            stage: stage.into(),
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// 创建阶段间的有界队列（容量限制在 1..=MAX_CAPACITY）
pub fn channel<T>(capacity: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(capacity.clamp(1, MAX_CAPACITY))
}

/// 阶段输出端：发送前检查取消信号，队列满时阻塞（背压）
pub struct Emitter<T> {
    tx: mpsc::Sender<T>,
    token: CancellationToken,
}

impl<T: Send> Emitter<T> {
    pub(crate) fn new(tx: mpsc::Sender<T>, token: CancellationToken) -> Self {
        Self { tx, token }
    }

    /// 发送一个单元；运行取消或下游已退出时返回 `Cancelled`，不会投递半成品
    pub async fn emit(&self, item: T) -> Result<(), PipelineError> {
        if self.token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PipelineError::Cancelled),
            sent = self.tx.send(item) => sent.map_err(|_| PipelineError::Cancelled),
        }
    }
}

/// 流水线阶段：每个输入单元可产出 0..n 个输出单元
///
/// 同一阶段的 K 个 worker 共享同一个 Stage 实例，因此 `process` 只拿 `&self`。
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn process(
        &self,
        input: Self::Input,
        out: &Emitter<Self::Output>,
    ) -> anyhow::Result<()>;
}

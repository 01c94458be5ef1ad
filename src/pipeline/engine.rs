//! 流水线引擎
//!
//! 把阶段用有界队列串成有向链：每个阶段 K 个 worker 共享输入队列、共享输出队列，
//! 全部 worker 退出后输出队列自动关闭，关闭沿链向下游传播。
//! 任一阶段出错：记录第一个错误并取消整次运行的 CancellationToken，
//! 所有阻塞中的收发都会观察到取消并尽快退出，不会死锁。

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::pipeline::types::{Emitter, PipelineError, Stage};

/// 运行范围内共享的状态：取消信号 + 第一个错误
struct RunState {
    token: CancellationToken,
    error: Mutex<Option<PipelineError>>,
}

impl RunState {
    /// 记录错误（只保留第一个）并取消整次运行
    fn fail(&self, err: PipelineError) {
        {
            let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                tracing::error!(error = %err, "pipeline failed, cancelling run");
                *slot = Some(err);
            }
        }
        self.token.cancel();
    }

    fn take_error(&self) -> Option<PipelineError> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// 流水线：注册阶段 worker，`run_to_completion` 等待全部退出
pub struct Pipeline {
    state: Arc<RunState>,
    tasks: JoinSet<()>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// 创建新的流水线（独立取消信号）
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// 挂在外部取消信号下（如 Ctrl+C）；外部取消会传到本次运行，反之不会
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self::with_token(parent.child_token())
    }

    fn with_token(token: CancellationToken) -> Self {
        Self {
            state: Arc::new(RunState {
                token,
                error: Mutex::new(None),
            }),
            tasks: JoinSet::new(),
        }
    }

    /// 本次运行的取消信号
    pub fn token(&self) -> CancellationToken {
        self.state.token.clone()
    }

    /// 源阶段：依次发出 `items` 中的单元，发完关闭输出队列
    pub fn source<T, I>(&mut self, name: &str, items: I, out: mpsc::Sender<T>)
    where
        T: Send + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let emitter = Emitter::new(out, self.state.token.clone());
        let items = items.into_iter();
        let stage = name.to_string();

        self.spawn(name, async move {
            for item in items {
                if emitter.emit(item).await.is_err() {
                    tracing::debug!(stage = %stage, "source stopped by cancellation");
                    return;
                }
            }
        });
    }

    /// 连接一个阶段：注册 `concurrency` 个 worker，
    /// 每个 worker 循环「接收 -> 处理 -> 发送」，直到输入队列关闭且耗尽
    pub fn connect<S: Stage>(
        &mut self,
        name: &str,
        stage: S,
        input: mpsc::Receiver<S::Input>,
        out: mpsc::Sender<S::Output>,
        concurrency: usize,
    ) {
        let stage = Arc::new(stage);
        let input = Arc::new(AsyncMutex::new(input));

        for _ in 0..concurrency.max(1) {
            let stage = Arc::clone(&stage);
            let input = Arc::clone(&input);
            let emitter = Emitter::new(out.clone(), self.state.token.clone());
            let state = Arc::clone(&self.state);
            let name = name.to_string();

            self.spawn(&name.clone(), async move {
                let token = state.token.clone();
                loop {
                    let item = tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        item = async { input.lock().await.recv().await } => item,
                    };
                    let Some(item) = item else {
                        return;
                    };

                    let result = tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        result = stage.process(item, &emitter) => result,
                    };

                    if let Err(err) = result {
                        if is_cancellation(&err) {
                            return;
                        }
                        state.fail(PipelineError::stage(name, err));
                        return;
                    }
                }
            });
        }
        // 原始发送端在此释放：最后一个 worker 退出时输出队列关闭
    }

    /// 聚合阶段：收集全部输入，输入耗尽后作为一个整体发出
    pub fn aggregate<T>(&mut self, name: &str, mut input: mpsc::Receiver<T>, out: mpsc::Sender<Vec<T>>)
    where
        T: Send + 'static,
    {
        let emitter = Emitter::new(out, self.state.token.clone());
        let token = self.state.token.clone();

        self.spawn(name, async move {
            let mut items = Vec::new();
            loop {
                let item = tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    item = input.recv() => item,
                };
                match item {
                    Some(item) => items.push(item),
                    None => break,
                }
            }
            let _ = emitter.emit(items).await;
        });
    }

    /// 阻塞直到所有阶段退出；返回第一个错误
    pub async fn run_to_completion(mut self) -> Result<(), PipelineError> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "pipeline supervisor task failed");
                self.state.token.cancel();
            }
        }

        if let Some(err) = self.state.take_error() {
            return Err(err);
        }
        if self.state.token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    /// 每个 worker 跑在独立任务里，外层监督任务把 panic 转成 `Panicked` 并取消运行
    fn spawn<F>(&mut self, stage: &str, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let stage = stage.to_string();
        self.tasks.spawn(async move {
            if let Err(e) = tokio::spawn(work).await {
                if e.is_panic() {
                    state.fail(PipelineError::Panicked { stage });
                }
            }
        });
    }
}

/// 阶段错误是否只是取消（发送时下游已退出 / 运行被取消）
fn is_cancellation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<PipelineError>()
        .is_some_and(PipelineError::is_cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::channel;
    use crate::pipeline::{retain, Flatten, Transform};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_linear_chain_delivers_all_items() {
        let mut pipe = Pipeline::new();
        let (tx0, rx0) = channel(1);
        let (tx1, rx1) = channel(1);
        let (tx2, rx2) = channel(1);
        let (tx3, mut rx3) = channel(1);

        pipe.source("numbers", 1..=10u32, tx0);
        pipe.connect("double", Transform::new(|n: u32| async move { Ok(n * 2) }), rx0, tx1, 3);
        pipe.connect("even_only", retain(|n: &u32| n % 4 == 0), rx1, tx2, 2);
        pipe.aggregate("collect", rx2, tx3);

        pipe.run_to_completion().await.unwrap();

        let mut all = rx3.recv().await.unwrap();
        all.sort_unstable();
        assert_eq!(all, vec![4, 8, 12, 16, 20]);
    }

    #[tokio::test]
    async fn test_flatten_emits_each_item() {
        let mut pipe = Pipeline::new();
        let (tx0, rx0) = channel(1);
        let (tx1, rx1) = channel(1);
        let (tx2, mut rx2) = channel(1);

        pipe.source("batches", vec![vec![1, 2], vec![], vec![3]], tx0);
        pipe.connect("flatten", Flatten::new(), rx0, tx1, 1);
        pipe.aggregate("collect", rx1, tx2);

        pipe.run_to_completion().await.unwrap();
        assert_eq!(rx2.recv().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_first_error_wins() {
        let mut pipe = Pipeline::new();
        let (tx0, rx0) = channel(1);
        let (tx1, rx1) = channel(1);
        let (tx2, _rx2) = channel::<Vec<u32>>(1);

        pipe.source("numbers", 0..100u32, tx0);
        pipe.connect(
            "explode",
            Transform::new(|n: u32| async move {
                if n == 3 {
                    anyhow::bail!("bad item {}", n)
                }
                Ok(n)
            }),
            rx0,
            tx1,
            1,
        );
        pipe.aggregate("collect", rx1, tx2);

        let err = pipe.run_to_completion().await.unwrap_err();
        match err {
            PipelineError::Stage { stage, source } => {
                assert_eq!(stage, "explode");
                assert!(source.to_string().contains("bad item 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let mut pipe = Pipeline::new();
        let (tx0, rx0) = channel(1);
        let (tx1, _rx1) = channel::<u32>(10);

        pipe.source("numbers", 0..3u32, tx0);
        pipe.connect(
            "boom",
            Transform::new(|n: u32| async move {
                if n == 1 {
                    panic!("worker panic");
                }
                Ok(n)
            }),
            rx0,
            tx1,
            1,
        );

        let err = pipe.run_to_completion().await.unwrap_err();
        assert!(matches!(err, PipelineError::Panicked { ref stage } if stage == "boom"));
    }

    #[tokio::test]
    async fn test_external_cancellation() {
        let parent = CancellationToken::new();
        let mut pipe = Pipeline::with_parent(&parent);
        let (tx0, rx0) = channel(1);
        let (tx1, _rx1) = channel::<u32>(1);

        pipe.source("forever", 0u32.., tx0);
        pipe.connect(
            "slow",
            Transform::new(|n: u32| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(n)
            }),
            rx0,
            tx1,
            2,
        );

        parent.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), pipe.run_to_completion())
            .await
            .expect("pipeline must unwind promptly");
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_concurrency_runs_workers_in_parallel() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut pipe = Pipeline::new();
        let (tx0, rx0) = channel(10);
        let (tx1, rx1) = channel(10);
        let (tx2, mut rx2) = channel(1);

        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        pipe.source("items", 0..8u32, tx0);
        pipe.connect(
            "work",
            Transform::new(move |n: u32| {
                let (a, p) = (Arc::clone(&a), Arc::clone(&p));
                async move {
                    let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                    p.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    a.fetch_sub(1, Ordering::SeqCst);
                    Ok(n)
                }
            }),
            rx0,
            tx1,
            4,
        );
        pipe.aggregate("collect", rx1, tx2);

        pipe.run_to_completion().await.unwrap();
        assert_eq!(rx2.recv().await.unwrap().len(), 8);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak > 1 && peak <= 4, "peak concurrency was {peak}");
    }
}

//! 通用阶段：Transform（一进一出）、Filter（一进零或一出）、Flatten（一批进、逐个出）

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::pipeline::types::{Emitter, Stage};

/// 一进一出：对每个单元调用异步函数，错误终止整次运行
pub struct Transform<I, O, F> {
    f: F,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O, F, Fut> Transform<I, O, F>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = anyhow::Result<O>>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<I, O, F, Fut> Stage for Transform<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
{
    type Input = I;
    type Output = O;

    async fn process(&self, input: I, out: &Emitter<O>) -> anyhow::Result<()> {
        let output = (self.f)(input).await?;
        out.emit(output).await?;
        Ok(())
    }
}

/// 过滤：`f` 返回 None 的单元被丢弃，其余转发
///
/// 这是流水线唯一的「部分失败」机制：失败条目在这里消失，运行继续。
pub struct Filter<I, O, F> {
    f: F,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O, F> Filter<I, O, F>
where
    F: Fn(I) -> Option<O>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

/// 谓词过滤：只转发满足 `predicate` 的单元
pub fn retain<T, P>(predicate: P) -> Filter<T, T, impl Fn(T) -> Option<T> + Send + Sync + 'static>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    Filter::new(move |item: T| if predicate(&item) { Some(item) } else { None })
}

#[async_trait]
impl<I, O, F> Stage for Filter<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Option<O> + Send + Sync + 'static,
{
    type Input = I;
    type Output = O;

    async fn process(&self, input: I, out: &Emitter<O>) -> anyhow::Result<()> {
        if let Some(output) = (self.f)(input) {
            out.emit(output).await?;
        }
        Ok(())
    }
}

/// 展平：一批单元逐个发出
pub struct Flatten<T> {
    _types: PhantomData<fn(Vec<T>) -> T>,
}

impl<T> Flatten<T> {
    pub fn new() -> Self {
        Self {
            _types: PhantomData,
        }
    }
}

impl<T> Default for Flatten<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Stage for Flatten<T> {
    type Input = Vec<T>;
    type Output = T;

    async fn process(&self, input: Vec<T>, out: &Emitter<T>) -> anyhow::Result<()> {
        for item in input {
            out.emit(item).await?;
        }
        Ok(())
    }
}

//! 编排：把各阶段接成流水线，产出最终文档
//!
//! 拓扑：
//! sections -> plan(K) -> flatten -> research(K) -> filter -> synthesize(K) -> filter
//!          -> [edit(K)] -> aggregate -> finalize（组装文档、排序、长度裁剪）

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineSection;
use crate::document::Document;
use crate::llm::Assistant;
use crate::newspaper::editor::LengthEditor;
use crate::newspaper::{
    create_sections, plan_section, polish_article, research_article, synthesize_article, Article,
    Draft, NewspaperContext, NewspaperError, NewspaperOptions, Section,
};
use crate::pipeline::{channel, Filter, Flatten, Pipeline, Transform};

/// 源阶段发出的版面集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// 整期报刊：固定的六个版面
    WholeEdition,
    /// 单个调用方给定的版面
    SingleSection(Section),
}

impl Topology {
    pub fn sections(&self, location: &str) -> Vec<Section> {
        match self {
            Topology::WholeEdition => create_sections(location),
            Topology::SingleSection(section) => vec![section.clone()],
        }
    }

    pub fn document_title(&self, date_range: &str) -> String {
        match self {
            Topology::WholeEdition => format!("News Report: {}", date_range),
            Topology::SingleSection(section) => format!("{}: {}", section.title, date_range),
        }
    }
}

/// 编辑部：持有助手与流水线设置，按拓扑生成一期报刊
pub struct Newsroom {
    assistant: Arc<dyn Assistant>,
    settings: PipelineSection,
    author: Option<String>,
    seed: Option<u64>,
    protected: Vec<String>,
    today: NaiveDate,
    cancel: CancellationToken,
}

impl Newsroom {
    pub fn new(assistant: Arc<dyn Assistant>) -> Self {
        Self {
            assistant,
            settings: PipelineSection::default(),
            author: None,
            seed: None,
            protected: Vec::new(),
            today: Local::now().date_naive(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSection) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// 编辑器随机回退的种子
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_protected_sections(mut self, protected: Vec<String>) -> Self {
        self.protected = protected;
        self
    }

    /// 计算时间窗口用的「今天」
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// 外部取消信号（如 Ctrl+C）
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn create(
        &self,
        topology: Topology,
        options: NewspaperOptions,
    ) -> Result<Document, NewspaperError> {
        let ctx = Arc::new(NewspaperContext::new(
            Arc::clone(&self.assistant),
            options,
            self.today,
        ));
        let sections = topology.sections(&ctx.options.location);
        let title = topology.document_title(&ctx.date_range);
        tracing::info!(
            title = %title,
            sections = sections.len(),
            depth = %ctx.options.depth,
            max_length = ctx.options.max_length,
            "creating newspaper"
        );

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let editor = Arc::new(Mutex::new(
            LengthEditor::new(Arc::clone(&self.assistant), rng)
                .with_protected(self.protected.clone()),
        ));

        let settings = &self.settings;
        let capacity = settings.capacity;
        let mut pipe = Pipeline::with_parent(&self.cancel);

        let (section_tx, section_rx) = channel::<Section>(capacity);
        let (planned_tx, planned_rx) = channel::<Vec<Article>>(capacity);
        let (article_tx, article_rx) = channel::<Article>(capacity);
        let (researched_tx, researched_rx) = channel::<Draft>(capacity);
        let (research_ok_tx, research_ok_rx) = channel::<Article>(capacity);
        let (written_tx, written_rx) = channel::<Draft>(capacity);
        let (ready_tx, ready_rx) = channel::<Article>(capacity);
        let (all_tx, all_rx) = channel::<Vec<Article>>(1);
        let (doc_tx, mut doc_rx) = channel::<Document>(1);

        pipe.source("sections", sections, section_tx);

        let plan_ctx = Arc::clone(&ctx);
        pipe.connect(
            "plan",
            Transform::new(move |section: Section| {
                let ctx = Arc::clone(&plan_ctx);
                async move { plan_section(&ctx, section).await.map_err(anyhow::Error::from) }
            }),
            section_rx,
            planned_tx,
            settings.plan_concurrency,
        );

        pipe.connect("flatten", Flatten::new(), planned_rx, article_tx, 1);

        let research_ctx = Arc::clone(&ctx);
        pipe.connect(
            "research",
            Transform::new(move |article: Article| {
                let ctx = Arc::clone(&research_ctx);
                async move { research_article(&ctx, article).await.map_err(anyhow::Error::from) }
            }),
            article_rx,
            researched_tx,
            settings.research_concurrency,
        );

        pipe.connect("research_filter", Filter::new(Draft::into_ready), researched_rx, research_ok_tx, 1);

        let write_ctx = Arc::clone(&ctx);
        pipe.connect(
            "synthesize",
            Transform::new(move |article: Article| {
                let ctx = Arc::clone(&write_ctx);
                async move { Ok(synthesize_article(&ctx, article).await) }
            }),
            research_ok_rx,
            written_tx,
            settings.synthesize_concurrency,
        );

        pipe.connect("synthesize_filter", Filter::new(Draft::into_ready), written_rx, ready_tx, 1);

        let final_rx = if settings.polish {
            let (edited_tx, edited_rx) = channel::<Article>(capacity);
            let edit_ctx = Arc::clone(&ctx);
            pipe.connect(
                "edit",
                Transform::new(move |article: Article| {
                    let ctx = Arc::clone(&edit_ctx);
                    async move { Ok(polish_article(&ctx, article).await) }
                }),
                ready_rx,
                edited_tx,
                settings.edit_concurrency,
            );
            edited_rx
        } else {
            ready_rx
        };

        pipe.aggregate("aggregate", final_rx, all_tx);

        let author = self.author.clone();
        let max_length = ctx.options.max_length;
        pipe.connect(
            "finalize",
            Transform::new(move |articles: Vec<Article>| {
                let editor = Arc::clone(&editor);
                let title = title.clone();
                let author = author.clone();
                async move {
                    let mut doc = assemble(title, author, articles);
                    let report = editor.lock().await.fit(&mut doc, max_length).await;
                    tracing::info!(
                        sections = doc.sections.len(),
                        removed = report.removed.len(),
                        fallbacks = report.fallbacks,
                        length = report.final_length,
                        max_length,
                        "newspaper finalized"
                    );
                    Ok(doc)
                }
            }),
            all_rx,
            doc_tx,
            1,
        );

        pipe.run_to_completion().await?;
        doc_rx.recv().await.ok_or(NewspaperError::MissingDocument)
    }
}

/// 把全部有效文章组装成文档，小节按标题稳定排序
fn assemble(title: String, author: Option<String>, articles: Vec<Article>) -> Document {
    let mut doc = Document::new(title);
    doc.author = author;
    for article in &articles {
        doc.add_section(article.document_title(), &article.body);
    }
    doc.sort_sections();
    doc
}

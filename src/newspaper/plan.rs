//! 选题阶段：每个版面先自由文本头脑风暴，再结构化挑选最终文章
//!
//! 一个版面一篇都没选出来是致命错误（取消整次运行）。

use schemars::JsonSchema;
use serde::Deserialize;

use crate::llm::ask_structured;
use crate::newspaper::{prompts, Article, ArticlePlan, NewspaperContext, NewspaperError, Section};

/// 单个版面的选题计划（结构化提问的返回形状）
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SectionPlan {
    /// A list of article plans for this section.
    pub articles: Vec<ArticlePlan>,
}

/// 为一个版面规划文章
pub async fn plan_section(
    ctx: &NewspaperContext,
    section: Section,
) -> Result<Vec<Article>, NewspaperError> {
    let depth = ctx.options.depth;
    tracing::info!(section = %section.title, depth = %depth, "planning section");

    let ideas = ctx
        .assistant
        .ask(
            prompts::SECTION_IDEAS_PERSONA,
            &prompts::section_ideas(&section, &ctx.date_range, depth.as_str()),
        )
        .await
        .map_err(|e| NewspaperError::assistant("section ideas", e))?;

    let plan: SectionPlan = ask_structured(
        ctx.assistant.as_ref(),
        prompts::SECTION_PLAN_PERSONA,
        &prompts::section_plan(&section, &ctx.date_range, depth.article_count(), &ideas),
    )
    .await
    .map_err(|e| NewspaperError::assistant("section plan", e))?;

    let articles: Vec<Article> = plan
        .articles
        .into_iter()
        .filter(|p| !p.headline.trim().is_empty())
        .take(depth.article_count())
        .map(|p| Article::from_plan(section.clone(), p))
        .collect();

    if articles.is_empty() {
        return Err(NewspaperError::NoArticles {
            section: section.title,
        });
    }

    tracing::info!(section = %section.title, articles = articles.len(), "planned section");
    Ok(articles)
}

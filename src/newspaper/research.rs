//! 调研阶段：基础知识收集 + 按深度限次的追问细化循环
//!
//! 每轮收集是两次提问：先自由文本搜集，再把原始笔记结构化为 (主题, 信息) 对。
//! 细化循环每轮先分析缺口得到追问，追问为空即收敛；循环内任何错误只会提前结束循环，
//! 已收集的知识保留。单篇最坏情况的收集轮数为 `1 + max_iterations`。

use crate::llm::{ask_structured, AssistantError};
use crate::newspaper::{prompts, Article, Draft, Knowledge, NewspaperContext, NewspaperError};

/// 一轮知识收集：返回 (原始笔记, 完整的知识条目)
pub async fn gather_knowledge(
    ctx: &NewspaperContext,
    article: &Article,
    questions: &[String],
) -> Result<(String, Vec<Knowledge>), AssistantError> {
    let raw = ctx
        .assistant
        .ask(
            prompts::KNOWLEDGE_PERSONA,
            &prompts::gather_knowledge(article, &ctx.date_range, &ctx.options.location, questions),
        )
        .await?;
    if raw.trim().is_empty() {
        return Err(AssistantError::Empty);
    }
    tracing::debug!(headline = %article.headline, chars = raw.len(), "gathered raw notes");

    let knowledge: Vec<Knowledge> = ask_structured(
        ctx.assistant.as_ref(),
        prompts::KNOWLEDGE_STRUCTURE_PERSONA,
        &prompts::structure_knowledge(&raw),
    )
    .await?;

    let knowledge = knowledge.into_iter().filter(Knowledge::is_complete).collect();
    Ok((raw, knowledge))
}

/// 分析已有知识，返回追问列表（空表示足够成文）
pub async fn analyze_knowledge(
    ctx: &NewspaperContext,
    article: &Article,
    questions: &[String],
) -> Result<Vec<String>, AssistantError> {
    let goal = format!("Write a complete, balanced news article: {}", article.headline);
    let follow_ups: Vec<String> = ask_structured(
        ctx.assistant.as_ref(),
        prompts::ANALYZE_PERSONA,
        &prompts::analyze_knowledge(article, &goal, &ctx.date_range, questions, &article.knowledge),
    )
    .await?;

    Ok(follow_ups
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect())
}

/// 调研一篇文章
///
/// 内容拦截、空回复、知识无法解析：文章被丢弃（`Draft::Dropped`）；其他助手错误终止整次运行。
pub async fn research_article(
    ctx: &NewspaperContext,
    mut article: Article,
) -> Result<Draft, NewspaperError> {
    let questions = if article.questions.is_empty() {
        vec![format!("What are the key facts about: {}?", article.summary)]
    } else {
        article.questions.clone()
    };

    match gather_knowledge(ctx, &article, &questions).await {
        Ok((raw, knowledge)) => {
            article.research = raw;
            article.knowledge = knowledge;
        }
        Err(e) if e.is_item_local() => return Ok(Draft::dropped(&article, "research", e.into())),
        Err(e) => return Err(NewspaperError::assistant("research", e)),
    }

    let rounds = refine_research(ctx, &mut article, &questions).await;
    tracing::info!(
        section = %article.section.title,
        headline = %article.headline,
        knowledge = article.knowledge.len(),
        rounds,
        "researched article"
    );
    Ok(Draft::Ready(article))
}

/// 细化循环：最多 `depth.max_iterations()` 轮，返回完成的追问轮数
///
/// 每轮收集成功后，下一轮分析针对的是本轮的追问。
pub async fn refine_research(
    ctx: &NewspaperContext,
    article: &mut Article,
    questions: &[String],
) -> usize {
    let max_iterations = ctx.options.depth.max_iterations();
    let mut questions = questions.to_vec();
    let mut rounds = 0;

    while rounds < max_iterations {
        let follow_ups = match analyze_knowledge(ctx, article, &questions).await {
            Ok(follow_ups) => follow_ups,
            Err(e) => {
                tracing::warn!(headline = %article.headline, error = %e, "analysis failed, stopping refinement");
                break;
            }
        };
        if follow_ups.is_empty() {
            tracing::debug!(headline = %article.headline, rounds, "research converged");
            break;
        }

        match gather_knowledge(ctx, article, &follow_ups).await {
            Ok((raw, knowledge)) => {
                if !article.research.is_empty() {
                    article.research.push_str("\n\n");
                }
                article.research.push_str(&raw);
                article.knowledge.extend(knowledge);
                questions = follow_ups;
            }
            Err(e) => {
                tracing::warn!(headline = %article.headline, error = %e, "follow-up research failed, stopping refinement");
                break;
            }
        }
        rounds += 1;
    }

    rounds
}

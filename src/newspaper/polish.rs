//! 逐篇润色阶段（可选）：中立化改写 + 字数上限
//!
//! 宽松策略：改写或缩写失败都保留上一版正文；5 次缩写后仍超限则记录警告并接受当前正文。

use crate::document::split_paragraphs;
use crate::newspaper::{prompts, Article, NewspaperContext};

/// 单篇正文字数上限（字符）
pub const BODY_CEILING: usize = 2500;
/// 缩写最多尝试次数
pub const SHORTEN_ATTEMPTS: usize = 5;

pub async fn polish_article(ctx: &NewspaperContext, mut article: Article) -> Article {
    match ctx
        .assistant
        .ask(prompts::NEUTRAL_EDIT_PERSONA, &prompts::neutral_edit(&article.body))
        .await
    {
        Ok(body) if has_paragraphs(&body) => article.body = body,
        Ok(_) => tracing::warn!(headline = %article.headline, "neutral edit was empty, keeping body"),
        Err(e) => {
            tracing::warn!(headline = %article.headline, error = %e, "neutral edit failed, keeping body")
        }
    }

    let mut attempts = 0;
    while article.body.chars().count() > BODY_CEILING && attempts < SHORTEN_ATTEMPTS {
        attempts += 1;
        let current = article.body.chars().count();
        match ctx
            .assistant
            .ask(
                prompts::SHORTEN_PERSONA,
                &prompts::shorten(&article.body, current, BODY_CEILING),
            )
            .await
        {
            Ok(body) if has_paragraphs(&body) && body.chars().count() < current => article.body = body,
            Ok(_) => tracing::debug!(headline = %article.headline, attempts, "shortened body was empty or not shorter"),
            Err(e) => tracing::warn!(headline = %article.headline, error = %e, "shorten failed"),
        }
    }

    let length = article.body.chars().count();
    if length > BODY_CEILING {
        tracing::warn!(
            headline = %article.headline,
            length,
            ceiling = BODY_CEILING,
            "body still over ceiling, accepting best effort"
        );
    }
    article
}

/// 改写结果至少要有一个非空段落才会替换正文
fn has_paragraphs(body: &str) -> bool {
    !split_paragraphs(body).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::AssistantError;
    use crate::newspaper::prompts::{NEUTRAL_EDIT_PERSONA, SHORTEN_PERSONA};
    use crate::newspaper::testing::{article, context, FnAssistant};
    use crate::newspaper::Depth;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_shortens_until_under_ceiling() {
        let ctx = context(
            FnAssistant::new(
                |persona, request| match persona {
                    NEUTRAL_EDIT_PERSONA => Ok("x".repeat(4000)),
                    SHORTEN_PERSONA => {
                        let body = request.rsplit("## Article\n").next().unwrap_or_default();
                        Ok("x".repeat(body.len() - 1000))
                    }
                    _ => unreachable!(),
                },
                |_, _, _| Ok(json!(null)),
            ),
            Depth::Short,
        );
        let done = polish_article(&ctx, article("Chips")).await;
        assert_eq!(done.body.len(), 2000);
    }

    #[tokio::test]
    async fn test_gives_up_after_five_attempts() {
        let shortens = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&shortens);
        let ctx = context(
            FnAssistant::new(
                move |persona, _| {
                    if persona == SHORTEN_PERSONA {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok("y".repeat(5000))
                    } else {
                        Ok("x".repeat(3000))
                    }
                },
                |_, _, _| Ok(json!(null)),
            ),
            Depth::Short,
        );
        let done = polish_article(&ctx, article("Chips")).await;
        assert_eq!(shortens.load(Ordering::SeqCst), SHORTEN_ATTEMPTS);
        assert_eq!(done.body, "x".repeat(3000));
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_body() {
        let ctx = context(
            FnAssistant::new(|_, _| Err(AssistantError::Empty), |_, _, _| Ok(json!(null))),
            Depth::Short,
        );
        let mut a = article("Chips");
        a.body = "Original body.".into();
        assert_eq!(polish_article(&ctx, a).await.body, "Original body.");
    }

    #[tokio::test]
    async fn test_empty_answers_keep_body() {
        let shortens = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&shortens);
        let ctx = context(
            FnAssistant::new(
                move |persona, _| {
                    if persona == SHORTEN_PERSONA {
                        seen.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(" \n\n ".to_string())
                },
                |_, _, _| Ok(json!(null)),
            ),
            Depth::Short,
        );

        let mut a = article("Chips");
        a.body = "Original body.".into();
        assert_eq!(polish_article(&ctx, a).await.body, "Original body.");

        let long = "z".repeat(3000);
        let mut a = article("Chips");
        a.body = long.clone();
        assert_eq!(polish_article(&ctx, a).await.body, long);
        assert_eq!(shortens.load(Ordering::SeqCst), SHORTEN_ATTEMPTS);
    }
}

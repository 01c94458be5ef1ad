//! 撰写阶段：一次自由文本提问生成正文，任何失败都只丢弃当前文章

use crate::document::split_paragraphs;
use crate::newspaper::{prompts, Article, Draft, DropReason, NewspaperContext};

pub async fn synthesize_article(ctx: &NewspaperContext, mut article: Article) -> Draft {
    let body = match ctx
        .assistant
        .ask(
            prompts::SYNTHESIZE_PERSONA,
            &prompts::synthesize(&article, &ctx.date_range),
        )
        .await
    {
        Ok(body) => body,
        Err(e) => return Draft::dropped(&article, "synthesize", e.into()),
    };

    if split_paragraphs(&body).is_empty() {
        return Draft::dropped(&article, "synthesize", DropReason::EmptyResponse);
    }

    tracing::info!(
        section = %article.section.title,
        headline = %article.headline,
        length = body.len(),
        "synthesized article"
    );
    article.body = body;
    Draft::Ready(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::AssistantError;
    use crate::newspaper::testing::{article, context, FnAssistant};
    use crate::newspaper::Depth;
    use serde_json::json;

    #[tokio::test]
    async fn test_body_is_stored() {
        let ctx = context(
            FnAssistant::new(|_, _| Ok("One.\n\nTwo.".into()), |_, _, _| Ok(json!(null))),
            Depth::Short,
        );
        let Draft::Ready(done) = synthesize_article(&ctx, article("Chips")).await else {
            panic!("expected a ready article");
        };
        assert_eq!(done.body, "One.\n\nTwo.");
    }

    #[tokio::test]
    async fn test_any_failure_drops() {
        for error in [
            AssistantError::ContentBlocked,
            AssistantError::Provider("timeout".into()),
        ] {
            let ctx = context(
                FnAssistant::new(move |_, _| Err(error.clone()), |_, _, _| Ok(json!(null))),
                Depth::Short,
            );
            assert!(!synthesize_article(&ctx, article("Chips")).await.is_ready());
        }

        let ctx = context(
            FnAssistant::new(|_, _| Ok("\n  \n".into()), |_, _, _| Ok(json!(null))),
            Depth::Short,
        );
        let draft = synthesize_article(&ctx, article("Chips")).await;
        assert!(matches!(draft, Draft::Dropped { reason: DropReason::EmptyResponse, .. }));
    }

    #[tokio::test]
    async fn test_empty_answer_drops() {
        let ctx = context(
            FnAssistant::new(|_, _| Ok(String::new()), |_, _, _| Ok(json!(null))),
            Depth::Short,
        );
        let draft = synthesize_article(&ctx, article("Chips")).await;
        assert!(matches!(
            draft,
            Draft::Dropped { step: "synthesize", reason: DropReason::EmptyResponse, .. }
        ));
    }
}

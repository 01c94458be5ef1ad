//! 各阶段的人设（system）与请求模板
//!
//! 日期窗口在每个请求里都作为硬性过滤条件出现。

use crate::newspaper::{Article, Knowledge, Section};

pub const SECTION_IDEAS_PERSONA: &str = "You are an expert newspaper editor and news planner. \
Your task is to use web search and your knowledge of recent events to brainstorm candidate \
news stories for a single newspaper section.";

pub const SECTION_PLAN_PERSONA: &str = "You are an expert newspaper editor and news planner. \
Your sole task is to read a list of candidate stories for a single section, select the best \
ones to include, and output a structured plan in JSON.";

pub const KNOWLEDGE_PERSONA: &str = "You are an expert news reporter and researcher. Your sole \
task is to search the web and available information to gather facts about a specific news \
story by answering a set of questions.";

pub const KNOWLEDGE_STRUCTURE_PERSONA: &str = "You are an expert news researcher and organizer. \
Your sole task is to take raw gathered notes about a news story and structure them into an \
organized list of (topic, information) pairs.";

pub const ANALYZE_PERSONA: &str = "You are an expert news editor and analyst. Your sole task is \
to review the information gathered for a news story and determine whether it is sufficient \
to write a complete, accurate, and balanced article.";

pub const SYNTHESIZE_PERSONA: &str = "You are an expert newspaper writer. Write a complete news \
article from the researched information. The article must have at least four paragraphs of \
at least three sentences each, separated by blank lines. Do not use markdown, headings, \
bullet points, or any other markup. Only report facts that fall inside the given date range.";

pub const NEUTRAL_EDIT_PERSONA: &str = "You are a strict copy editor. Rewrite the article in a \
neutral, factual tone without opinion or sensational language. Keep the paragraph structure \
and do not add markup. Return only the article text.";

pub const SHORTEN_PERSONA: &str = "You are a strict copy editor. Shorten the article so it fits \
the character limit while keeping the most important facts. Keep plain paragraphs separated \
by blank lines. Return only the article text.";

pub const LENGTH_EDIT_PERSONA: &str = "You are an expert newspaper editor. Your task is to trim \
down the newspaper to fit within a specific length, while retaining the most important articles.";

pub fn section_ideas(section: &Section, date_range: &str, depth: &str) -> String {
    format!(
        "## Date Range\n{date_range}\n\n## Length\n{depth}\n\n## Section\nSection: {title}\nDescription: {description}\n\n\
## Task\nList significantly more candidate stories than will ultimately be used for this section \
(aim for at least twice the target number). Only include events that happened inside the date \
range, inclusive. For each candidate story, provide a working headline, a short description of \
the event, and any key details that help decide whether it should be included. Present the \
result in a clear, readable format (not JSON).",
        title = section.title,
        description = section.description,
    )
}

pub fn section_plan(section: &Section, date_range: &str, count: usize, ideas: &str) -> String {
    format!(
        "## Date Range\n{date_range}\n\n## Section\nSection: {title}\nDescription: {description}\n\n\
## Candidate Stories\n{ideas}\n\n## Task\nFrom the candidate stories above, select exactly {count} \
real news stories inside the date range for this section. For each selected article provide a \
concise headline, a short slug, a 1-3 sentence summary, and a list of detailed research \
questions that must be answered to write a complete news article about the story.",
        title = section.title,
        description = section.description,
    )
}

pub fn gather_knowledge(article: &Article, date_range: &str, location: &str, questions: &[String]) -> String {
    format!(
        "## Section\n{section}\n\n## Date Range\n{date_range}\n\n## Location\n{location}\n\n\
## Article Headline\n{headline}\n\n## Article Summary\n{summary}\n\n## Questions To Answer\n{questions}\n\n\
## Goal\nUsing web search and reliable sources, gather factual information that answers each of the \
questions above and provides the background needed to write a complete, balanced news article about \
this story. Only use facts from inside the date range. Clearly indicate which information answers \
which question.",
        section = article.section.title,
        headline = article.headline,
        summary = article.summary,
        questions = numbered(questions),
    )
}

pub fn structure_knowledge(raw: &str) -> String {
    format!("## Information Gathered\n{raw}")
}

pub fn analyze_knowledge(
    article: &Article,
    goal: &str,
    date_range: &str,
    questions: &[String],
    knowledge: &[Knowledge],
) -> String {
    format!(
        "## Article Goal\n{goal}\n\n## Section\n{section}\n\n## Date Range\n{date_range}\n\n\
## Article Headline\n{headline}\n\n## Article Summary\n{summary}\n\n## Questions To Answer\n{questions}\n\n\
## Information Gathered\n{knowledge}\n\n## Task\nReview the gathered information and determine whether \
each question has been answered with enough detail and context to support a strong news article. If \
there are gaps, ambiguities, missing perspectives, or important facts that are not covered, provide a \
list of follow-up research questions. If no additional research is needed, return an empty list.",
        section = article.section.title,
        headline = article.headline,
        summary = article.summary,
        questions = numbered(questions),
        knowledge = knowledge_list(knowledge),
    )
}

pub fn synthesize(article: &Article, date_range: &str) -> String {
    format!(
        "## Date Range\n{date_range}\n\n## Section\n{section}\n\n## Headline\n{headline}\n\n\
## Summary\n{summary}\n\n## Knowledge\n{knowledge}\n\n## Research Notes\n{research}\n\n\
## Goal\nWrite the full article body for this headline. Exclude any fact dated outside the date range.",
        section = article.section.title,
        headline = article.headline,
        summary = article.summary,
        knowledge = knowledge_list(&article.knowledge),
        research = article.research,
    )
}

pub fn neutral_edit(body: &str) -> String {
    format!("## Article\n{body}")
}

pub fn shorten(body: &str, current: usize, ceiling: usize) -> String {
    format!(
        "## Character Limit\n{ceiling}\n\n## Current Length\n{current}\n\n## Article\n{body}"
    )
}

pub fn length_edit(max_length: usize, current_length: usize, table: &str, protected: &[String]) -> String {
    let protected = if protected.is_empty() {
        String::new()
    } else {
        format!(" Avoid removing articles from these sections: {}.", protected.join(", "))
    };
    format!(
        "## Max Length\n{max_length}\n\n## Current Length\n{current_length}\n\n## Articles\n{table}\n\
## Task\nReview the list of articles and their lengths. Decide which single article to remove to help \
bring the total length closer to the maximum, while sacrificing the least amount of important \
content.{protected} The list of articles is provided as a markdown table; answer with its index."
    )
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}

fn knowledge_list(knowledge: &[Knowledge]) -> String {
    knowledge
        .iter()
        .map(|k| format!("- {}: {}", k.topic, k.information))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_line_is_present() {
        let section = Section::new("Technology", "Tech news");
        let prompt = section_ideas(&section, "Jan 1, 2025", "short");
        assert!(prompt.contains("Section: Technology\n"));
        let prompt = section_plan(&section, "Jan 1, 2025", 3, "ideas");
        assert!(prompt.contains("select exactly 3"));
    }

    #[test]
    fn test_length_edit_mentions_protected() {
        let prompt = length_edit(10, 20, "| 0 |", &["Local News".to_string()]);
        assert!(prompt.contains("Avoid removing articles from these sections: Local News."));
        assert!(!length_edit(10, 20, "", &[]).contains("Avoid"));
    }
}

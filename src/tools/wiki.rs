//! Knowledge-base (wiki) tools for the wiki sub-agent.
//!
//! Thin wrappers over the internal wiki service's HTTP API: page tree,
//! page contents, and the retrieval-backed Q&A endpoint.

use genai::chat::{Tool, ToolCall};
use serde_json::json;

use super::{body_or_error, optional_str, require_str, ToolContext};

/// System prompt for the wiki sub-agent.
pub const WIKI_AGENT_INSTRUCTIONS: &str = "\
You are the knowledge-base agent for the project wiki. You answer questions
about system architecture, service dependencies, deployment topology, and
runbooks by reading the wiki, never from memory.

Approach:
1. Call `wiki_read_structure` first to see which pages exist.
2. Read the pages relevant to the question with `wiki_read_contents`.
3. For broad or fuzzy questions, `wiki_ask_question` queries the wiki's own
   retrieval index; cross-check its answer against the pages it cites.

When asked about a fault or incident, focus on: which services sit on the
affected path, what they depend on, and which runbook applies. Quote page
paths for every claim so the orchestrator can verify. If the wiki does not
cover the topic, say so explicitly.";

/// Tool schemas for the wiki sub-agent.
pub fn define_tools() -> Vec<Tool> {
    vec![
        Tool::new("wiki_read_structure")
            .with_description(
                "List the wiki page tree. Returns a JSON tree of page paths and \
                 titles, optionally restricted to a subtree.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "root": {
                        "type": "string",
                        "description": "Optional subtree path, e.g. 'architecture/'"
                    }
                }
            })),
        Tool::new("wiki_read_contents")
            .with_description(
                "Read the full contents of a wiki page. Returns the page body \
                 as Markdown.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Page path as returned by wiki_read_structure"
                    }
                },
                "required": ["path"]
            })),
        Tool::new("wiki_ask_question")
            .with_description(
                "Ask the wiki's retrieval index a free-form question. Returns a \
                 JSON object with an answer and the source page paths it cites.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question to answer from wiki content"
                    }
                },
                "required": ["question"]
            })),
    ]
}

pub async fn read_structure(call: &ToolCall, ctx: &ToolContext) -> String {
    let url = format!("{}/api/structure", ctx.endpoints.wiki_base_url);
    let mut req = ctx.http.get(&url);
    if let Some(root) = optional_str(call, "root") {
        req = req.query(&[("root", root)]);
    }
    body_or_error(req.send().await, "wiki_read_structure").await
}

pub async fn read_contents(call: &ToolCall, ctx: &ToolContext) -> String {
    let path = match require_str(call, "path") {
        Ok(p) => p,
        Err(e) => return e,
    };
    let url = format!("{}/api/pages", ctx.endpoints.wiki_base_url);
    body_or_error(
        ctx.http.get(&url).query(&[("path", path)]).send().await,
        "wiki_read_contents",
    )
    .await
}

pub async fn ask_question(call: &ToolCall, ctx: &ToolContext) -> String {
    let question = match require_str(call, "question") {
        Ok(q) => q,
        Err(e) => return e,
    };
    let url = format!("{}/api/ask", ctx.endpoints.wiki_base_url);
    body_or_error(
        ctx.http
            .post(&url)
            .json(&json!({ "question": question }))
            .send()
            .await,
        "wiki_ask_question",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_three_tools_with_expected_names() {
        let tools = define_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["wiki_read_structure", "wiki_read_contents", "wiki_ask_question"]
        );
    }

    #[test]
    fn instructions_are_nonempty_and_mention_the_tools() {
        assert!(!WIKI_AGENT_INSTRUCTIONS.is_empty());
        assert!(WIKI_AGENT_INSTRUCTIONS.contains("wiki_read_structure"));
        assert!(WIKI_AGENT_INSTRUCTIONS.contains("wiki_read_contents"));
        assert!(WIKI_AGENT_INSTRUCTIONS.contains("wiki_ask_question"));
    }
}

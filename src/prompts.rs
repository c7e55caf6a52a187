//! Orchestrator instruction templates and composition.
//!
//! The orchestrator's system prompt is the workflow template, a divider, and
//! the delegation template with the two numeric limits substituted. The
//! divider is purely visual; nothing parses it downstream.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PromptError;

/// Matches `{name}` placeholders left in a template after substitution.
/// Compiled once; the pattern is a literal in this file.
static LEFTOVER_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"));

/// Top-level investigation workflow for the orchestrator.
pub const SRE_WORKFLOW_INSTRUCTIONS: &str = "\
You are a senior SRE orchestrator. You coordinate the investigation of
production incidents, faults, and anomalies. You do not query systems
yourself; you delegate to specialist sub-agents and synthesize their
findings.

## Workflow

1. Read the user's report carefully. Identify the affected service, the time
   window, and the observed symptom.
2. Form an initial hypothesis set. When the report concerns a system fault or
   incident, consult the knowledge base first to understand the architecture
   involved before looking at raw signals.
3. Plan concrete investigation steps and delegate each to the sub-agent whose
   domain matches: architecture and runbooks to the knowledge-base agent,
   error logs to the log agent, metrics and alert state to the Prometheus
   agent, data-level verification to the MySQL agent.
4. Cross-check findings from different domains against each other. A metric
   anomaly without matching log evidence is a weak signal; say so.
5. Conclude with: the most likely root cause, the evidence supporting it,
   what was ruled out, and recommended next actions. If the evidence is
   inconclusive, state what additional data would settle it.

## Rules

- Never invent metric values, log lines, or table contents. Every factual
  claim must come from a sub-agent result.
- Prefer narrow, well-scoped delegation tasks over broad ones.
- Time windows matter: always pass the relevant window to sub-agents.";

/// Delegation rules for the orchestrator, parameterized by the two advisory
/// limits. Placeholders: `{max_concurrent_research_units}`,
/// `{max_researcher_iterations}`.
pub const SRE_SUBAGENT_DELEGATION_INSTRUCTIONS: &str = "\
## Delegation

You delegate work with the `task` tool. Each call names a sub-agent and gives
it a self-contained task description: the sub-agent sees only that
description, not the conversation, so include every identifier, time window,
and threshold it needs.

- Launch at most {max_concurrent_research_units} sub-agent tasks in parallel.
  Parallel tasks must be independent of each other's results.
- Perform at most {max_researcher_iterations} rounds of delegation per
  investigation. Budget them: broad reconnaissance first, then targeted
  follow-ups on the strongest signal.
- A sub-agent returns a single text report. If a report is unusable, refine
  the task description rather than repeating it verbatim.
- Do not delegate work outside a sub-agent's domain; it has no tools for it.";

/// Prefix attached to each user question before it enters the conversation.
/// Placeholder: `{date}`.
pub const SRE_TASK_DESCRIPTION_PREFIX: &str = "\
[Investigation request, received {date}]\n";

/// Substitute `{name}` placeholders in a template.
///
/// Both directions are hard errors: a supplied name that never occurs in the
/// template ([`PromptError::UnknownValue`]) and a placeholder left in the
/// template with no supplied value ([`PromptError::UnfilledPlaceholder`]).
/// This runs once at start-up; failures abort before any model client is
/// constructed.
pub fn fill_placeholders(
    template: &str,
    values: &[(&str, String)],
) -> Result<String, PromptError> {
    let mut out = template.to_string();

    for (name, value) in values {
        let placeholder = format!("{{{name}}}");
        if !out.contains(&placeholder) {
            return Err(PromptError::UnknownValue {
                name: (*name).to_string(),
            });
        }
        out = out.replace(&placeholder, value);
    }

    // Any placeholder-shaped token still present had no supplied value.
    if let Some(cap) = LEFTOVER_PLACEHOLDER.captures(&out) {
        return Err(PromptError::UnfilledPlaceholder {
            name: cap[1].to_string(),
        });
    }

    Ok(out)
}

/// Compose the orchestrator's full instruction string.
///
/// Layout: workflow template, blank line, 80 `=` characters, blank line,
/// delegation template with both limits substituted.
pub fn compose_instructions(
    max_concurrent_research_units: usize,
    max_researcher_iterations: usize,
) -> Result<String, PromptError> {
    compose_with_templates(
        SRE_WORKFLOW_INSTRUCTIONS,
        SRE_SUBAGENT_DELEGATION_INSTRUCTIONS,
        max_concurrent_research_units,
        max_researcher_iterations,
    )
}

/// Template-parameterized variant of [`compose_instructions`], split out so
/// malformed templates are testable.
pub fn compose_with_templates(
    workflow: &str,
    delegation: &str,
    max_concurrent_research_units: usize,
    max_researcher_iterations: usize,
) -> Result<String, PromptError> {
    let delegation = fill_placeholders(
        delegation,
        &[
            (
                "max_concurrent_research_units",
                max_concurrent_research_units.to_string(),
            ),
            (
                "max_researcher_iterations",
                max_researcher_iterations.to_string(),
            ),
        ],
    )?;

    Ok(format!("{workflow}\n\n{}\n\n{delegation}", "=".repeat(80)))
}

/// Render the per-question task prefix with the given date.
pub fn task_description_prefix(date: chrono::NaiveDate) -> Result<String, PromptError> {
    fill_placeholders(
        SRE_TASK_DESCRIPTION_PREFIX,
        &[("date", date.format("%Y-%m-%d").to_string())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_instructions_contain_both_templates_in_order() {
        let composed = compose_instructions(3, 3).unwrap();

        let workflow_pos = composed
            .find(SRE_WORKFLOW_INSTRUCTIONS)
            .expect("workflow template must appear verbatim");
        let delegation_start = composed
            .find("## Delegation")
            .expect("delegation template must appear");
        assert!(workflow_pos < delegation_start);
    }

    #[test]
    fn divider_is_exactly_80_equals_surrounded_by_blank_lines() {
        let composed = compose_instructions(3, 3).unwrap();

        let divider = format!("\n\n{}\n\n", "=".repeat(80));
        assert!(composed.contains(&divider));
        // No wider run of '=' exists.
        assert!(!composed.contains(&"=".repeat(81)));
    }

    #[test]
    fn limits_substitute_into_delegation_text() {
        let composed = compose_instructions(3, 3).unwrap();

        assert!(composed.contains("at most 3 sub-agent tasks in parallel"));
        assert!(composed.contains("at most 3 rounds of delegation"));
        assert!(!composed.contains("{max_concurrent_research_units}"));
        assert!(!composed.contains("{max_researcher_iterations}"));
    }

    #[test]
    fn distinct_limits_land_in_their_own_placeholders() {
        let composed = compose_instructions(7, 2).unwrap();

        assert!(composed.contains("at most 7 sub-agent tasks in parallel"));
        assert!(composed.contains("at most 2 rounds of delegation"));
    }

    #[test]
    fn template_missing_a_placeholder_fails_composition() {
        let bad_delegation = "Delegate wisely, {max_researcher_iterations} rounds.";

        let result =
            compose_with_templates(SRE_WORKFLOW_INSTRUCTIONS, bad_delegation, 3, 3);

        match result {
            Err(PromptError::UnknownValue { name }) => {
                assert_eq!(name, "max_concurrent_research_units");
            }
            other => panic!("Expected UnknownValue, got: {other:?}"),
        }
    }

    #[test]
    fn unfilled_placeholder_in_template_fails() {
        let template = "Window: {window}, mode: {mode}";

        let result = fill_placeholders(template, &[("window", "5m".to_string())]);

        match result {
            Err(PromptError::UnfilledPlaceholder { name }) => assert_eq!(name, "mode"),
            other => panic!("Expected UnfilledPlaceholder, got: {other:?}"),
        }
    }

    #[test]
    fn task_prefix_includes_the_date() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let prefix = task_description_prefix(date).unwrap();
        assert!(prefix.contains("2026-08-29"));
    }
}

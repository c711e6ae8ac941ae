//! Prompt assembly for the planning and generation collaborators
//!
//! The plan prompt asks for a fixed set of headed sections so the plan is
//! skimmable at the approval gate; it is displayed verbatim and never parsed.
//! The change prompt carries the repository context, the file-block format
//! rules, and the previous failure's corrective feedback when there is one.

use ferry_agent::{END_MARKER, FILE_MARKER_PREFIX, MARKER_SUFFIX};

use crate::attempt::FailureReport;
use crate::context::ProjectContext;

pub const PLAN_SYSTEM_PROMPT: &str = "You are a senior engineer planning a \
feature for an existing web project. Be concrete and brief; list real files \
and endpoints where you can.";

pub const CODER_SYSTEM_PROMPT: &str = "You are a senior engineer implementing \
a feature in an existing web project. You output complete files only, in the \
exact block format requested. You never abbreviate file content.";

/// Prompt for the planning call
pub fn build_plan_prompt(request: &str, context: &ProjectContext) -> String {
    let mut prompt = String::new();

    prompt.push_str("# FEATURE REQUEST\n\n");
    prompt.push_str(request);
    prompt.push_str("\n\n## BACKEND CONTEXT\n\n");
    prompt.push_str(&context.backend);
    prompt.push_str("\n## FRONTEND CONTEXT\n\n");
    prompt.push_str(&context.frontend);
    prompt.push_str("\n## OUTPUT FORMAT\n\n");
    prompt.push_str("Respond with exactly these sections:\n\n");
    prompt.push_str("BACKEND TASKS:\n- <task>\n\n");
    prompt.push_str("FRONTEND TASKS:\n- <task>\n\n");
    prompt.push_str("DATABASE CHANGES: yes|no\n\n");
    prompt.push_str("ESTIMATED COMPLEXITY: low|medium|high\n\n");
    prompt.push_str("RISKS:\n- <risk>\n");

    prompt
}

/// Prompt for the generation call
pub fn build_change_prompt(
    request: &str,
    context: &ProjectContext,
    feedback: Option<&FailureReport>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("# FEATURE REQUEST\n\n");
    prompt.push_str(request);
    prompt.push_str("\n\n## REPOSITORY CONTEXT\n\n");
    prompt.push_str(&context.combined());

    if let Some(report) = feedback {
        prompt.push_str("\n\n## PREVIOUS ATTEMPT FAILED\n\n");
        prompt.push_str(&report.to_feedback());
    }

    prompt.push_str("\n\n");
    prompt.push_str(&change_format_instructions());

    prompt
}

/// File-block format rules, shared with the parser via the marker constants
pub fn change_format_instructions() -> String {
    format!(
        "## OUTPUT FORMAT\n\n\
         Emit every file you create or change in full, one block per file:\n\n\
         {prefix} <relative path>{suffix}\n\
         <complete file content>\n\
         {end}\n\n\
         No text outside the blocks. Do not abbreviate or elide file content.",
        prefix = FILE_MARKER_PREFIX,
        suffix = MARKER_SUFFIX,
        end = END_MARKER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::Stage;

    fn context() -> ProjectContext {
        ProjectContext {
            backend: "FastAPI routes in app/api".to_string(),
            frontend: "Next.js pages in app/".to_string(),
        }
    }

    #[test]
    fn plan_prompt_names_the_required_sections() {
        let prompt = build_plan_prompt("Add an impressum page", &context());

        assert!(prompt.contains("Add an impressum page"));
        assert!(prompt.contains("FastAPI routes"));
        assert!(prompt.contains("BACKEND TASKS:"));
        assert!(prompt.contains("FRONTEND TASKS:"));
        assert!(prompt.contains("DATABASE CHANGES: yes|no"));
        assert!(prompt.contains("ESTIMATED COMPLEXITY: low|medium|high"));
        assert!(prompt.contains("RISKS:"));
    }

    #[test]
    fn change_prompt_spells_out_the_markers() {
        let prompt = build_change_prompt("Add an impressum page", &context(), None);

        assert!(prompt.contains("===FILE: <relative path>==="));
        assert!(prompt.contains("===END==="));
        assert!(prompt.contains("Next.js pages"));
        assert!(!prompt.contains("PREVIOUS ATTEMPT FAILED"));
    }

    #[test]
    fn change_prompt_renders_feedback_when_present() {
        let report = FailureReport::new(Stage::Testing, "2 tests failing");
        let prompt = build_change_prompt("Add an impressum page", &context(), Some(&report));

        assert!(prompt.contains("PREVIOUS ATTEMPT FAILED"));
        assert!(prompt.contains("2 tests failing"));
    }
}

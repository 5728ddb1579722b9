//! Prompt definitions shipped with the binary.

use crate::types::PromptDefinition;
use edurag_core::{AppError, AppResult};

/// Per-candidate grounded answer.
pub const SUMMARY_PROMPT_ID: &str = "rag.summary";

/// Synthesis of a new knowledge-base document.
pub const EXPANSION_PROMPT_ID: &str = "rag.expansion";

const SUMMARY_YAML: &str = include_str!("../prompts/rag.summary.yml");
const EXPANSION_YAML: &str = include_str!("../prompts/rag.expansion.yml");

/// Look up a built-in definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let yaml = match prompt_id {
        SUMMARY_PROMPT_ID => SUMMARY_YAML,
        EXPANSION_PROMPT_ID => EXPANSION_YAML,
        _ => {
            return Err(AppError::Prompt(format!(
                "No built-in prompt named '{}'",
                prompt_id
            )))
        }
    };

    serde_yaml::from_str(yaml).map_err(|e| {
        AppError::Prompt(format!("Built-in prompt '{}' is malformed: {}", prompt_id, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_parse() {
        let summary = builtin_prompt(SUMMARY_PROMPT_ID).unwrap();
        assert_eq!(summary.id, SUMMARY_PROMPT_ID);
        assert!(summary.system.unwrap().contains("Based ONLY"));
        assert!(summary.template.contains("{{content}}"));

        let expansion = builtin_prompt(EXPANSION_PROMPT_ID).unwrap();
        assert_eq!(expansion.id, EXPANSION_PROMPT_ID);
        assert_eq!(expansion.output.format, "json");
        assert!(expansion.template.contains("{{query}}"));
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("agent.ask.default").is_err());
    }
}

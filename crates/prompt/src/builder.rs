//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use edurag_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders both the system instruction and the user template with Handlebars.
/// HTML escaping is disabled; variables are inserted verbatim.
///
/// # Example
/// ```no_run
/// use edurag_prompt::{build_prompt, builtin_prompt, SUMMARY_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(SUMMARY_PROMPT_ID)?;
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "phonics".to_string());
/// vars.insert("content".to_string(), "Report text".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    let handlebars = registry();

    let user = render(&handlebars, &definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|system| render(&handlebars, system, &variables))
        .transpose()?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

fn registry() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}

/// Render a Handlebars template with variables.
fn render(
    handlebars: &Handlebars<'_>,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    handlebars
        .render_template(template, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

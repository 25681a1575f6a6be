use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

#[derive(Debug, Clone, Serialize)]
pub struct SystemPromptContext {
    pub restaurant_tool: String,
    pub forecast_tool: String,
    pub recommendations: usize,
}

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();
    let template_content = fs::read_to_string(&template_path)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

/// Render the system prompt, from `template_file` when given or the built-in template otherwise
pub fn system_prompt(
    template_file: Option<&PathBuf>,
    context: &SystemPromptContext,
) -> Result<String, TeraError> {
    match template_file {
        Some(path) => load_prompt_file(path.clone(), context),
        None => load_prompt(SYSTEM_TEMPLATE, context),
    }
}

use std::string::FromUtf8Error;
use std::sync::OnceLock;

use tera::{Context, Tera};
use thiserror::Error;

use super::types::BreakdownRequest;
use crate::assets::Assets;

pub const PROMPT_TEMPLATE: &str = "breakdown_prompt.md";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template {0} is not embedded")]
    MissingTemplate(&'static str),
    #[error("prompt template is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("render prompt template: {0}")]
    Render(#[from] tera::Error),
}

fn load_templates() -> Result<Tera, PromptError> {
    let file = Assets::get(PROMPT_TEMPLATE).ok_or(PromptError::MissingTemplate(PROMPT_TEMPLATE))?;
    let source = String::from_utf8(file.data.into_owned())?;
    let mut tera = Tera::default();
    tera.add_raw_template(PROMPT_TEMPLATE, &source)?;
    Ok(tera)
}

/// The embedded template, parsed on first use.
fn templates() -> Result<&'static Tera, PromptError> {
    static TERA: OnceLock<Tera> = OnceLock::new();
    if let Some(tera) = TERA.get() {
        return Ok(tera);
    }
    let tera = load_templates()?;
    Ok(TERA.get_or_init(|| tera))
}

/// Render the instruction sent to the model for one request.
pub fn build_prompt(req: &BreakdownRequest) -> Result<String, PromptError> {
    let mut context = Context::new();
    context.insert("idea", &req.idea);
    context.insert("depth", &req.depth);
    if let Some(focus) = &req.focus_area {
        context.insert("focus_area", focus);
    }
    Ok(templates()?.render(PROMPT_TEMPLATE, &context)?)
}

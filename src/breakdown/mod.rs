//! The `/breakdown` pipeline: validate, prompt, invoke, extract, normalize.

mod extract;
mod handler;
mod normalize;
mod prompt;
mod request;
pub mod types;

pub use extract::ExtractionMode;
pub use handler::{AppState, breakdown};

//! Output formatting module.

mod json;
mod pretty;

use crate::cli::Args;
use crate::error::Result;
use serde::Serialize;

pub use json::format_json;

/// Human-readable rendering of a response document.
pub trait Render {
    fn render(&self, args: &Args) -> Result<String>;
}

/// Format a response according to the output flags.
pub fn format_output<T: Serialize + Render>(value: &T, args: &Args) -> Result<String> {
    if args.json {
        format_json(value)
    } else {
        value.render(args)
    }
}

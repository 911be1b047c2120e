use std::collections::HashMap;
use std::panic;

use html2md::containers::ContainerHandler;
use html2md::dummy::DummyHandler;
use html2md::{Handle, StructuredPrinter, TagHandler, TagHandlerFactory, parse_html_custom};
use once_cell::sync::Lazy;
use regex::Regex;

use super::nesting;
use crate::error::NormalizationFailure;

/// Deepest element nesting that is converted. html2md recurses once per
/// level, deeper documents are refused before parsing.
pub const MAX_NESTING: usize = 512;

/// Elements dropped together with their content.
const DROPPED: &[&str] = &[
    "head", "title", "style", "script", "noscript", "template", "img", "iframe",
];

static MARKDOWN_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\([\\<>*_~=+#-])").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

/// Converts an HTML document into plain text with markdown emphasis.
///
/// Links keep their text only, images, scripts, styles and the document head
/// disappear, lines are never wrapped and the result is trimmed.
pub fn run(html: &str) -> Result<String, NormalizationFailure> {
    let depth = nesting::nesting_depth(html, MAX_NESTING);
    if depth > MAX_NESTING {
        return Err(NormalizationFailure::TooDeep(MAX_NESTING));
    }

    // html2md panics on some malformed input
    let markdown = panic::catch_unwind(|| parse_html_custom(html, &tag_handlers()))
        .map_err(|cause| NormalizationFailure::ConverterPanicked(panic_message(cause)))?;

    Ok(tidy(&markdown))
}

fn tag_handlers() -> HashMap<String, Box<dyn TagHandlerFactory>> {
    let mut handlers: HashMap<String, Box<dyn TagHandlerFactory>> = HashMap::new();
    for tag in DROPPED {
        handlers.insert(tag.to_string(), Box::new(DroppedHandler::default));
    }
    // a link prints its text and nothing else
    handlers.insert("a".to_string(), Box::new(DummyHandler::default));

    // html2md renders table cells without custom handlers, so tables are
    // laid out here
    for tag in ["table", "thead", "tbody", "tfoot", "caption"] {
        handlers.insert(tag.to_string(), Box::new(ContainerHandler::default));
    }
    handlers.insert("tr".to_string(), Box::new(RowHandler::default));
    for tag in ["td", "th"] {
        handlers.insert(tag.to_string(), Box::new(CellHandler::default));
    }
    handlers
}

#[derive(Default)]
struct DroppedHandler;

impl TagHandler for DroppedHandler {
    fn handle(&mut self, _tag: &Handle, _printer: &mut StructuredPrinter) {}

    fn after_handle(&mut self, _printer: &mut StructuredPrinter) {}

    fn skip_descendants(&self) -> bool {
        true
    }
}

/// One table row per line.
#[derive(Default)]
struct RowHandler;

impl TagHandler for RowHandler {
    fn handle(&mut self, _tag: &Handle, printer: &mut StructuredPrinter) {
        if !printer.data.is_empty() && !printer.data.ends_with('\n') {
            printer.insert_newline();
        }
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        printer.insert_newline();
    }
}

/// Trimmed cell content. Empty cells vanish, the others are joined by ` | `
/// within a row.
#[derive(Default)]
struct CellHandler {
    start: usize,
}

impl TagHandler for CellHandler {
    fn handle(&mut self, _tag: &Handle, printer: &mut StructuredPrinter) {
        self.start = printer.data.len();
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        let content = printer.data[self.start..].trim().to_string();
        printer.data.truncate(self.start);
        if content.is_empty() {
            return;
        }

        let line_start = printer.data.rfind('\n').map_or(0, |idx| idx + 1);
        if !printer.data[line_start..].trim().is_empty() {
            let end = printer.data.trim_end().len();
            printer.data.truncate(end);
            printer.append_str(" | ");
        }
        printer.append_str(&content);
    }
}

// html2md escapes markdown characters in text; the text is meant for people
fn tidy(markdown: &str) -> String {
    let text = MARKDOWN_ESCAPE.replace_all(markdown, "$1");
    let text = BLANK_RUN.replace_all(&text, "\n\n");

    text.trim().to_string()
}

fn panic_message(cause: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! HTML email body to cleaned text and rendered markdown.
//!
//! [`normalize`] never fails: non-string input yields empty text, and a
//! document the converter cannot handle yields the original input unchanged.

use serde::Serialize;

use crate::generator::{html2text, md2html};
use crate::table::CellValue;

/// Closing script tag split by string concatenation in templated emails.
const SPLIT_SCRIPT_CLOSE: &str = "</' + 'script>";
/// Leftover concatenation operator.
const CONCAT_ARTIFACT: &str = "' + '";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub cleaned_text: String,
    pub rendered_html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    NotText,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub text: String,
    pub outcome: Outcome,
}

pub fn normalize(input: &CellValue) -> ConversionResult {
    let cleaned = clean(input);
    let rendered_html = md2html::run(&cleaned.text);

    ConversionResult {
        cleaned_text: cleaned.text,
        rendered_html,
    }
}

pub fn normalize_str(html: &str) -> ConversionResult {
    normalize(&CellValue::Text(html.to_string()))
}

/// Cleaned text only, without the markdown rendering.
pub fn clean(input: &CellValue) -> Cleaned {
    let Some(html) = input.as_text() else {
        return Cleaned {
            text: String::new(),
            outcome: Outcome::NotText,
        };
    };

    match html2text::run(&presanitize(html)) {
        Ok(text) => Cleaned {
            text,
            outcome: Outcome::Converted,
        },
        Err(e) => {
            tracing::warn!(error = %e, input_len = html.len(), "Falling back to raw input");
            Cleaned {
                text: html.to_string(),
                outcome: Outcome::Degraded,
            }
        }
    }
}

/// Repairs concatenation artifacts left in templated email sources.
pub fn presanitize(html: &str) -> String {
    html.replace(SPLIT_SCRIPT_CLOSE, "</script>")
        .replace(CONCAT_ARTIFACT, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_bold() {
        let result = normalize_str("<p>Hello <b>World</b></p>");
        assert_eq!(result.cleaned_text, "Hello **World**");
        assert!(result.rendered_html.contains("<strong>World</strong>"));
    }

    #[test]
    fn test_non_string_yields_empty() {
        for value in [
            CellValue::Int(42),
            CellValue::Float(1.5),
            CellValue::Bool(true),
            CellValue::Empty,
            CellValue::Other("{}".into()),
        ] {
            let cleaned = clean(&value);
            assert_eq!(cleaned.text, "");
            assert_eq!(cleaned.outcome, Outcome::NotText);
        }
        let result = normalize(&CellValue::Int(42));
        assert_eq!(result.cleaned_text, "");
        assert_eq!(result.rendered_html, md2html::run(""));
    }

    #[test]
    fn test_presanitize_repairs_split_script_close() {
        assert_eq!(presanitize("</' + 'script>"), "</script>");
    }

    #[test]
    fn test_presanitize_order() {
        // the repair must run before the artifact removal
        assert_eq!(
            presanitize("<script>var a = 1;</' + 'script>x' + 'y"),
            "<script>var a = 1;</script>xy"
        );
    }

    #[test]
    fn test_split_script_does_not_leak_fragment() {
        let result = normalize_str("<p>Hi</p><script>track();</' + 'script><p>Bye</p>");
        assert!(!result.cleaned_text.contains("' + '"));
        assert!(result.cleaned_text.contains("Hi"));
        assert!(result.cleaned_text.contains("Bye"));
    }

    #[test]
    fn test_style_and_title_do_not_leak() {
        let result = normalize_str(
            "<html><head><style>.a{color:red}</style><title>Subj</title></head>\
             <body><p>Hi</p></body></html>",
        );
        assert_eq!(result.cleaned_text, "Hi");
        assert_eq!(result.rendered_html, "<p>Hi</p>");
    }

    #[test]
    fn test_split_script_body_is_dropped() {
        let result = normalize_str("<p>Hi</p><script>track();</' + 'script><p>Bye</p>");
        assert_eq!(result.cleaned_text, "Hi\n\nBye");
    }

    #[test]
    fn test_unconvertible_input_falls_back_to_raw() {
        let deep = format!("{}x{}", "<b>".repeat(3000), "</b>".repeat(3000));

        let cleaned = clean(&CellValue::Text(deep.clone()));
        assert_eq!(cleaned.outcome, Outcome::Degraded);
        assert_eq!(cleaned.text, deep);

        let result = normalize_str(&deep);
        assert_eq!(result.cleaned_text, deep);
        assert!(!result.rendered_html.is_empty());
    }

    #[test]
    fn test_links_and_images_removed() {
        let html = r#"<p>See <a href="https://track.example.com/x">our offer</a>
            <img src="https://cdn.example.com/pixel.gif"></p>"#;
        let result = normalize_str(html);
        assert!(result.cleaned_text.contains("our offer"));
        assert!(!result.cleaned_text.contains("track.example.com"));
        assert!(!result.cleaned_text.contains("pixel.gif"));
        assert!(!result.cleaned_text.contains("<a"));
    }

    #[test]
    fn test_output_is_trimmed() {
        for html in ["", "   ", "\n<p> x </p>\n", "<br><br>text<br><br>"] {
            let text = normalize_str(html).cleaned_text;
            assert_eq!(text, text.trim());
        }
    }

    #[test]
    fn test_plain_prose_renders_single_paragraph() {
        let result = normalize_str("Thanks for your order");
        assert_eq!(result.cleaned_text, "Thanks for your order");
        assert_eq!(result.rendered_html, "<p>Thanks for your order</p>");
    }

    #[test]
    fn test_conversion_result_serializes_field_names() {
        let json = serde_json::to_value(normalize_str("<b>x</b>")).unwrap();
        assert_eq!(json["cleaned_text"], "**x**");
        assert!(json["rendered_html"].as_str().unwrap().contains("<strong>x</strong>"));
    }
}

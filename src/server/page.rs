use quick_xml::escape::escape;

use crate::normalizer::ConversionResult;

#[derive(Default)]
pub struct PageView<'a> {
    pub html_input: &'a str,
    pub result: Option<&'a ConversionResult>,
    pub error: Option<&'a str>,
    pub default_column: &'a str,
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Email HTML cleaner</title>
<style>
body { font-family: sans-serif; max-width: 60rem; margin: 2rem auto; }
textarea { width: 100%; min-height: 12rem; font-family: monospace; }
pre { white-space: pre-wrap; background: #f4f4f4; padding: 1rem; }
.error { color: #b00020; }
.rendered { border: 1px solid #ddd; padding: 1rem; }
</style>
</head>
<body>
<h1>Email HTML cleaner</h1>
"#;

/// The single page of the web form. `rendered_html` is inserted as is.
pub fn render(view: &PageView<'_>) -> String {
    let mut page = String::from(HEAD);

    if let Some(error) = view.error {
        page.push_str(&format!(r#"<p class="error">{}</p>"#, escape(error)));
    }

    page.push_str(&format!(
        r#"<form method="post" action="/clean">
<label for="html">Paste the HTML body of an email</label>
<textarea id="html" name="html">{}</textarea>
<button type="submit">Clean</button>
</form>
"#,
        escape(view.html_input)
    ));

    if let Some(result) = view.result {
        page.push_str(&format!(
            r#"<h2>Cleaned text</h2>
<pre>{}</pre>
<h2>Rendered</h2>
<div class="rendered">{}</div>
"#,
            escape(result.cleaned_text.as_str()),
            result.rendered_html
        ));
    }

    page.push_str(&format!(
        r#"<h2>Batch conversion</h2>
<form method="post" action="/batch" enctype="multipart/form-data">
<input type="file" name="file" accept=".csv,.xlsx">
<label for="column">Column</label>
<input type="text" id="column" name="column" value="{}">
<button type="submit">Convert file</button>
</form>
</body>
</html>
"#,
        escape(view.default_column)
    ));

    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_is_escaped_output_is_not() {
        let result = ConversionResult {
            cleaned_text: "a < b".to_string(),
            rendered_html: "<p>a &lt; b</p>".to_string(),
        };
        let page = render(&PageView {
            html_input: "<b>x</b>",
            result: Some(&result),
            default_column: "raw_html",
            ..Default::default()
        });
        assert!(page.contains("&lt;b&gt;x&lt;/b&gt;</textarea>"));
        assert!(page.contains("<pre>a &lt; b</pre>"));
        assert!(page.contains(r#"<div class="rendered"><p>a &lt; b</p></div>"#));
        assert!(page.contains(r#"value="raw_html""#));
    }

    #[test]
    fn test_error_is_shown() {
        let page = render(&PageView {
            error: Some("No HTML content provided"),
            ..Default::default()
        });
        assert!(page.contains(r#"<p class="error">No HTML content provided</p>"#));
        assert!(!page.contains("Cleaned text"));
    }
}

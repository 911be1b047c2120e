use pulldown_cmark::{Parser, html};

/// Renders markdown to HTML with plain CommonMark semantics.
pub fn run(markdown: &str) -> String {
    let parser = Parser::new(markdown);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output.trim_end().to_string()
}

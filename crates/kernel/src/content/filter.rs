//! Text format filter pipeline.
//!
//! Provides output filtering for stored text based on format:
//! - plain_text: HTML-escapes content and keeps line breaks
//! - markdown: renders CommonMark, then sanitizes the HTML

use pulldown_cmark::{Options, Parser, html};

/// Trait for text filters in the pipeline.
pub trait TextFilter: Send + Sync {
    /// Filter name for debugging.
    fn name(&self) -> &str;

    /// Process the input text and return filtered output.
    fn process(&self, input: &str) -> String;
}

/// Pipeline of text filters applied in sequence.
pub struct FilterPipeline {
    filters: Vec<Box<dyn TextFilter>>,
}

impl FilterPipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline.
    pub fn add<F: TextFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Create pipeline for a specific format.
    pub fn for_format(format: &str) -> Self {
        match format {
            "markdown" => Self::markdown(),
            _ => Self::plain_text(), // Default to safest option
        }
    }

    /// Create a plain text pipeline (escapes all HTML).
    pub fn plain_text() -> Self {
        Self::new().add(HtmlEscapeFilter).add(NewlineFilter)
    }

    /// Create a Markdown pipeline; output is sanitized.
    pub fn markdown() -> Self {
        Self::new().add(MarkdownFilter).add(SanitizeFilter)
    }

    /// Process text through all filters in the pipeline.
    pub fn process(&self, input: &str) -> String {
        self.filters
            .iter()
            .fold(input.to_string(), |acc, filter| filter.process(&acc))
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::plain_text()
    }
}

/// Filter that escapes all HTML characters.
pub struct HtmlEscapeFilter;

impl TextFilter for HtmlEscapeFilter {
    fn name(&self) -> &str {
        "html_escape"
    }

    fn process(&self, input: &str) -> String {
        input
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#x27;")
    }
}

/// Filter that converts newlines to <br> tags.
pub struct NewlineFilter;

impl TextFilter for NewlineFilter {
    fn name(&self) -> &str {
        "newline"
    }

    fn process(&self, input: &str) -> String {
        input.replace('\n', "<br>\n")
    }
}

/// CommonMark to HTML, with tables and strikethrough.
pub struct MarkdownFilter;

impl TextFilter for MarkdownFilter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn process(&self, input: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(input, options);
        let mut output = String::with_capacity(input.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

/// Allowlist HTML sanitizer (ammonia defaults: no scripts, styles, or event handlers).
pub struct SanitizeFilter;

impl TextFilter for SanitizeFilter {
    fn name(&self) -> &str {
        "sanitize"
    }

    fn process(&self, input: &str) -> String {
        ammonia::clean(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_escapes_and_breaks_lines() {
        let out = FilterPipeline::plain_text().process("<b>Hi</b>\nthere");
        assert_eq!(out, "&lt;b&gt;Hi&lt;/b&gt;<br>\nthere");
    }

    #[test]
    fn markdown_renders_basic_markup() {
        let out = FilterPipeline::markdown().process("# Title\n\n**bold** text");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<strong>bold</strong>"));
    }

    #[test]
    fn markdown_strips_scripts() {
        let out = FilterPipeline::markdown().process("hello <script>alert(1)</script>");
        assert!(!out.contains("<script"));
        assert!(out.contains("hello"));
    }

    #[test]
    fn markdown_strips_javascript_links() {
        let out = FilterPipeline::markdown().process("[x](javascript:alert(1))");
        assert!(!out.contains("javascript:"));
    }

    #[test]
    fn unknown_format_is_plain_text() {
        let out = FilterPipeline::for_format("full_html").process("<i>x</i>");
        assert_eq!(out, "&lt;i&gt;x&lt;/i&gt;");
    }
}

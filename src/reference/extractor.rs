//! Pattern-based extraction of media references from source text.
//!
//! Each markup dialect is a [`ReferenceExtractor`]. The scanner runs every
//! configured extractor over every text-bearing file and feeds the raw captures
//! to the classifier, so adding a dialect never touches the pipeline.

use regex::Regex;
use tracing::trace;

/// Media extensions recognized when no configuration overrides them.
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "mp4", "webm", "mov", "mp3", "wav", "pdf", "tiff", "bmp",
];

/// Extracts raw media reference strings from decoded file text.
pub trait ReferenceExtractor: Send + Sync {
    /// Short dialect name used in logs.
    fn name(&self) -> &'static str;

    /// Returns every raw reference found in `text`, in text order.
    fn extract<'t>(&self, text: &'t str) -> Vec<&'t str>;
}

/// Builds the `(?:jpg|jpeg|...)` alternation shared by every dialect.
fn extension_alternation(extensions: &[String]) -> String {
    let escaped: Vec<String> = extensions
        .iter()
        .map(|ext| regex::escape(ext.trim_start_matches('.')))
        .collect();
    format!("(?:{})", escaped.join("|"))
}

/// Runs `pattern` and returns the first participating capture group of each match.
fn collect_captures<'t>(pattern: &Regex, text: &'t str, dialect: &'static str) -> Vec<&'t str> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.iter().skip(1).flatten().next())
        .map(|m| {
            trace!(dialect, reference = m.as_str(), "found reference candidate");
            m.as_str()
        })
        .collect()
}

/// Text between matching single or double quotes that ends in a media extension.
///
/// Matches `src="img/logo.png"`, `import hero from './hero.jpg'` and any other
/// quoted literal. The literal may not itself contain a quote character.
#[derive(Debug, Clone)]
pub struct QuotedLiteralExtractor {
    pattern: Regex,
}

impl QuotedLiteralExtractor {
    /// Compiles the pattern for the given extension set.
    ///
    /// # Errors
    ///
    /// Returns the regex error if an extension produces an invalid pattern.
    pub fn new(extensions: &[String]) -> Result<Self, regex::Error> {
        let ext = extension_alternation(extensions);
        let pattern = Regex::new(&format!(
            r#"(?i)"([^"']+?\.{ext})"|'([^"']+?\.{ext})'"#
        ))?;
        Ok(Self { pattern })
    }
}

impl ReferenceExtractor for QuotedLiteralExtractor {
    fn name(&self) -> &'static str {
        "quoted"
    }

    fn extract<'t>(&self, text: &'t str) -> Vec<&'t str> {
        collect_captures(&self.pattern, text, self.name())
    }
}

/// Bare `http(s)://` URLs ending in a media extension, quoted or not.
#[derive(Debug, Clone)]
pub struct BareUrlExtractor {
    pattern: Regex,
}

impl BareUrlExtractor {
    /// Compiles the pattern for the given extension set.
    ///
    /// # Errors
    ///
    /// Returns the regex error if an extension produces an invalid pattern.
    pub fn new(extensions: &[String]) -> Result<Self, regex::Error> {
        let ext = extension_alternation(extensions);
        let pattern = Regex::new(&format!(r#"(?i)(https?://[^\s"'>]+\.{ext})"#))?;
        Ok(Self { pattern })
    }
}

impl ReferenceExtractor for BareUrlExtractor {
    fn name(&self) -> &'static str {
        "url"
    }

    fn extract<'t>(&self, text: &'t str) -> Vec<&'t str> {
        collect_captures(&self.pattern, text, self.name())
    }
}

/// Markdown image syntax: `![alt](path/to/image.png)`.
#[derive(Debug, Clone)]
pub struct MarkdownImageExtractor {
    pattern: Regex,
}

impl MarkdownImageExtractor {
    /// Compiles the pattern for the given extension set.
    ///
    /// # Errors
    ///
    /// Returns the regex error if an extension produces an invalid pattern.
    pub fn new(extensions: &[String]) -> Result<Self, regex::Error> {
        let ext = extension_alternation(extensions);
        let pattern = Regex::new(&format!(
            r#"(?i)!\[[^\]]*\]\(\s*<?([^)\s>]+\.{ext})>?(?:\s+"[^"]*")?\s*\)"#
        ))?;
        Ok(Self { pattern })
    }
}

impl ReferenceExtractor for MarkdownImageExtractor {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extract<'t>(&self, text: &'t str) -> Vec<&'t str> {
        collect_captures(&self.pattern, text, self.name())
    }
}

/// CSS `url(...)` values, with or without quotes.
#[derive(Debug, Clone)]
pub struct CssUrlExtractor {
    pattern: Regex,
}

impl CssUrlExtractor {
    /// Compiles the pattern for the given extension set.
    ///
    /// # Errors
    ///
    /// Returns the regex error if an extension produces an invalid pattern.
    pub fn new(extensions: &[String]) -> Result<Self, regex::Error> {
        let ext = extension_alternation(extensions);
        let pattern = Regex::new(&format!(
            r#"(?i)url\(\s*["']?([^"')\s]+\.{ext})["']?\s*\)"#
        ))?;
        Ok(Self { pattern })
    }
}

impl ReferenceExtractor for CssUrlExtractor {
    fn name(&self) -> &'static str {
        "css"
    }

    fn extract<'t>(&self, text: &'t str) -> Vec<&'t str> {
        collect_captures(&self.pattern, text, self.name())
    }
}

/// Returns the default dialect set: quoted literals, bare URLs, Markdown images
/// and CSS `url()` values.
///
/// # Errors
///
/// Returns the regex error if an extension produces an invalid pattern.
pub fn default_extractors(
    extensions: &[String],
) -> Result<Vec<Box<dyn ReferenceExtractor>>, regex::Error> {
    Ok(vec![
        Box::new(QuotedLiteralExtractor::new(extensions)?),
        Box::new(BareUrlExtractor::new(extensions)?),
        Box::new(MarkdownImageExtractor::new(extensions)?),
        Box::new(CssUrlExtractor::new(extensions)?),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        DEFAULT_MEDIA_EXTENSIONS
            .iter()
            .map(|ext| (*ext).to_string())
            .collect()
    }

    #[test]
    fn test_quoted_double_and_single() {
        let extractor = QuotedLiteralExtractor::new(&extensions()).unwrap();
        let text = r#"<img src="assets/pic.png"> import hero from './hero.JPG';"#;
        assert_eq!(extractor.extract(text), vec!["assets/pic.png", "./hero.JPG"]);
    }

    #[test]
    fn test_quoted_requires_matching_quote() {
        let extractor = QuotedLiteralExtractor::new(&extensions()).unwrap();
        assert!(extractor.extract(r#"title="logo.png' alt"#).is_empty());
    }

    #[test]
    fn test_quoted_ignores_non_media_extension() {
        let extractor = QuotedLiteralExtractor::new(&extensions()).unwrap();
        assert!(extractor.extract(r#"<script src="app.js"></script>"#).is_empty());
    }

    #[test]
    fn test_quoted_captures_url_literal() {
        let extractor = QuotedLiteralExtractor::new(&extensions()).unwrap();
        let found = extractor.extract(r#"fetch("https://cdn.example.com/a/b.webm")"#);
        assert_eq!(found, vec!["https://cdn.example.com/a/b.webm"]);
    }

    #[test]
    fn test_bare_url_in_prose() {
        let extractor = BareUrlExtractor::new(&extensions()).unwrap();
        let text = "see https://cdn.example.com/img/photo.jpg for the hero shot";
        assert_eq!(
            extractor.extract(text),
            vec!["https://cdn.example.com/img/photo.jpg"]
        );
    }

    #[test]
    fn test_bare_url_prefers_longest_extension() {
        let extractor = BareUrlExtractor::new(&extensions()).unwrap();
        assert_eq!(
            extractor.extract("http://x.test/a.jpeg"),
            vec!["http://x.test/a.jpeg"]
        );
    }

    #[test]
    fn test_bare_url_stops_at_angle_bracket() {
        let extractor = BareUrlExtractor::new(&extensions()).unwrap();
        let found = extractor.extract("<a href=https://x.test/doc.pdf>doc</a>");
        assert_eq!(found, vec!["https://x.test/doc.pdf"]);
    }

    #[test]
    fn test_markdown_image() {
        let extractor = MarkdownImageExtractor::new(&extensions()).unwrap();
        let text = "![alt](../outside/secret.png) and ![x](img/a.gif \"title\")";
        assert_eq!(
            extractor.extract(text),
            vec!["../outside/secret.png", "img/a.gif"]
        );
    }

    #[test]
    fn test_css_url_variants() {
        let extractor = CssUrlExtractor::new(&extensions()).unwrap();
        let text = "a { background: url(bg.png) } b { background-image: url('x/y.svg'); }";
        assert_eq!(extractor.extract(text), vec!["bg.png", "x/y.svg"]);
    }

    #[test]
    fn test_custom_extension_set() {
        let extractor = QuotedLiteralExtractor::new(&["webp".to_string()]).unwrap();
        assert_eq!(extractor.extract(r#""a.webp" "b.png""#), vec!["a.webp"]);
    }

    #[test]
    fn test_default_extractors_has_four_dialects() {
        let names: Vec<&str> = default_extractors(&extensions())
            .unwrap()
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(names, vec!["quoted", "url", "markdown", "css"]);
    }
}

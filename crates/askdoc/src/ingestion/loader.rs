//! Source loaders normalizing files and web pages into plain text
//!
//! Each loader tries one primary extraction method and at most one fallback.
//! There are no retries: a failed fallback propagates `Error::Load` carrying
//! the original cause.

use std::path::Path;
use std::time::Duration;

use scraper::{Html, Selector};

use crate::error::{Error, Result};

const WEB_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Loader for PDF files: pdf-extract first, lopdf page-wise as fallback
pub struct PdfLoader;

impl PdfLoader {
    /// Extract text from a PDF file
    pub fn load(&self, path: &Path) -> Result<String> {
        match pdf_extract::extract_text(path) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(
                    "pdf-extract failed for {}, falling back to lopdf: {}",
                    path.display(),
                    e
                );
                self.load_with_lopdf(path).map_err(|fallback_err| {
                    Error::load(
                        path.to_string_lossy(),
                        format!("{} (fallback: {})", e, fallback_err),
                    )
                })
            }
        }
    }

    fn load_with_lopdf(&self, path: &Path) -> Result<String> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::load(path.to_string_lossy(), e.to_string()))?;

        let mut text = String::new();
        for (page_number, _) in doc.get_pages() {
            let page_text = doc
                .extract_text(&[page_number])
                .map_err(|e| Error::load(path.to_string_lossy(), e.to_string()))?;
            text.push_str(&page_text);
            text.push('\n');
        }
        Ok(text)
    }
}

/// Loader for Word documents via docx-rs.
///
/// `.doc` files are routed here too; genuinely legacy binaries fail the
/// docx parse and surface as a load error.
pub struct DocxLoader;

impl DocxLoader {
    /// Extract paragraph text from a DOCX file
    pub fn load(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path)
            .map_err(|e| Error::load(path.to_string_lossy(), e.to_string()))?;

        let docx = docx_rs::read_docx(&data)
            .map_err(|e| Error::load(path.to_string_lossy(), e.to_string()))?;

        let mut paragraphs = Vec::new();
        for child in &docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
                let mut line = String::new();
                for p_child in &paragraph.children {
                    if let docx_rs::ParagraphChild::Run(run) = p_child {
                        for r_child in &run.children {
                            if let docx_rs::RunChild::Text(text) = r_child {
                                line.push_str(&text.text);
                            }
                        }
                    }
                }
                paragraphs.push(line);
            }
        }

        Ok(paragraphs.join("\n"))
    }
}

/// Loader for plain text files
pub struct TxtLoader;

impl TxtLoader {
    /// Read a text file
    pub fn load(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| Error::load(path.to_string_lossy(), e.to_string()))
    }
}

/// Loader for web pages: article-focused extraction first, whole-body text
/// as fallback
pub struct WebLoader {
    client: reqwest::Client,
}

impl WebLoader {
    /// Create a web loader with a browser User-Agent
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(WEB_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Fetch a URL and extract its readable text
    pub async fn load(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::load(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::load(url, format!("HTTP {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::load(url, e.to_string()))?;

        match extract_article(&html) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(
                    "article extraction failed for {}, falling back to body text: {}",
                    url,
                    e
                );
                extract_body(&html).map_err(|fallback_err| {
                    Error::load(url, format!("{} (fallback: {})", e, fallback_err))
                })
            }
        }
    }
}

impl Default for WebLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Content-focused extraction: the first `article` or `main` element, or the
/// page's paragraph elements when neither is present.
fn extract_article(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    for selector in ["article", "main"] {
        let selector = Selector::parse(selector)
            .map_err(|e| Error::load("html", e.to_string()))?;
        if let Some(element) = document.select(&selector).next() {
            let text = collapse_whitespace(element.text());
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }

    let paragraphs = Selector::parse("p").map_err(|e| Error::load("html", e.to_string()))?;
    let text: Vec<String> = document
        .select(&paragraphs)
        .map(|p| collapse_whitespace(p.text()))
        .filter(|t| !t.is_empty())
        .collect();

    if text.is_empty() {
        return Err(Error::load("html", "no article content found"));
    }
    Ok(text.join("\n\n"))
}

/// Generic extraction: all text under `body`, scripts and styles excluded
/// by virtue of selecting text nodes of content elements only.
fn extract_body(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let body = Selector::parse("body").map_err(|e| Error::load("html", e.to_string()))?;
    let skip = Selector::parse("script, style, noscript")
        .map_err(|e| Error::load("html", e.to_string()))?;

    let Some(body) = document.select(&body).next() else {
        return Err(Error::load("html", "document has no body"));
    };

    let skipped: Vec<_> = body.select(&skip).flat_map(|e| e.text()).collect();
    let lines: Vec<String> = body
        .text()
        .filter(|t| !skipped.contains(t))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(Error::load("html", "document body has no text"));
    }
    Ok(lines.join("\n"))
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_txt_loader_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hello from a text file").unwrap();

        let text = TxtLoader.load(file.path()).unwrap();
        assert!(text.contains("hello from a text file"));
    }

    #[test]
    fn test_txt_loader_missing_file_is_load_error() {
        let err = TxtLoader.load(Path::new("/no/such/file.txt")).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_article_extraction_prefers_article_element() {
        let html = r#"
            <html><body>
            <nav>Site navigation links</nav>
            <article><p>The actual story text.</p></article>
            <footer>Copyright</footer>
            </body></html>
        "#;

        let text = extract_article(html).unwrap();
        assert!(text.contains("The actual story text."));
        assert!(!text.contains("navigation"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_article_extraction_falls_back_to_paragraphs() {
        let html = r#"
            <html><body>
            <div><p>First paragraph.</p><p>Second paragraph.</p></div>
            </body></html>
        "#;

        let text = extract_article(html).unwrap();
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
    }

    #[test]
    fn test_body_extraction_skips_scripts() {
        let html = r#"
            <html><body>
            <script>var tracking = true;</script>
            <div>Visible content here</div>
            </body></html>
        "#;

        let text = extract_body(html).unwrap();
        assert!(text.contains("Visible content here"));
        assert!(!text.contains("tracking"));
    }

    #[test]
    fn test_article_extraction_fails_on_empty_page() {
        let html = "<html><body><div>no paragraphs, no article</div></body></html>";
        assert!(extract_article(html).is_err());
    }
}

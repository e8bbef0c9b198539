//! Content extraction
//!
//! Turns a fetched HTML document into an ordered sequence of text blocks plus
//! the links and media references it contains.
//!
//! # Extraction Steps
//!
//! 1. Pick the main content root (`article`, `main`, common content
//!    containers; falls back to `body`)
//! 2. Walk the root iteratively, skipping navigation, chrome and other UI
//!    elements by tag, ARIA role or class/id pattern
//! 3. Emit one block per leaf text container (flat mode) or per heading,
//!    paragraph and list item (structure mode)
//! 4. Collapse whitespace and optionally strip URLs from block text
//!
//! Links are collected from the whole document; media only from the main
//! content root.

use crate::config::ExtractConfig;
use crate::crawler::fetcher::FetchResult;
use crate::crawler::links::extract_links;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Main content containers, most specific first
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".article-content",
    ".post-content",
    ".entry-content",
    "#content",
    ".content",
    "#main",
    ".main",
];

/// Elements never carrying article text
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "iframe", "form", "button",
    "dialog", "template", "svg",
];

const EXCLUDED_ROLES: &[&str] = &["navigation", "banner", "complementary", "contentinfo"];

/// Class/id fragments marking UI chrome
const EXCLUDED_CLASS_ID_PATTERNS: &[&str] = &[
    "sidebar",
    "menu",
    "nav[-_]",
    "breadcrumb",
    "pagination",
    "advertisement",
    "ad[-_]",
    "banner",
    "popup",
    "modal",
    "widget",
    "comment[-_]?(?:s|section)?",
    "related",
    "newsletter",
    "social[-_]",
    "share[-_]",
    "sticky",
    "overlay",
    "toolbar",
];

/// Tags that start a new block of text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "ul",
];

const URL_PROTOCOL: &str = r"(?:https?|ftp)://|www\.";
const URL_CHARS: &str = r"[a-zA-Z0-9\-._~:/?#@!$&'()*+,;=%]+";

/// Structural role of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralRole {
    /// `h1`-`h6`, level 1-6
    Heading(u8),
    Paragraph,
    ListItem,
    /// Flat-mode block
    Other,
}

/// A contiguous unit of extracted text
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub text: String,
    pub role: StructuralRole,
    pub source_url: Url,
    /// Document-order position among this page's blocks
    pub ordinal: usize,
}

impl ContentBlock {
    /// Renders the block for `content.txt`
    ///
    /// Structure mode prefixes headings with `#` per level and list items
    /// with a bullet; flat blocks are written as-is.
    pub fn render(&self) -> String {
        match self.role {
            StructuralRole::Heading(level) => {
                format!("{} {}", "#".repeat(level as usize), self.text)
            }
            StructuralRole::ListItem => format!("• {}", self.text),
            StructuralRole::Paragraph | StructuralRole::Other => self.text.clone(),
        }
    }
}

/// Kind of media reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Name used in configuration and as the storage subdirectory
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
            MediaKind::Audio => "audio",
        }
    }

    pub fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "images" => Some(MediaKind::Image),
            "videos" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// A media asset referenced from the main content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: Url,
}

/// Everything extracted from one page
#[derive(Debug, Clone)]
pub struct Extraction {
    pub title: Option<String>,
    pub blocks: Vec<ContentBlock>,
    pub links: Vec<Url>,
    pub media: Vec<MediaRef>,
}

/// Extraction failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("fetch did not produce a body")]
    MissingBody,

    #[error("document is empty")]
    EmptyDocument,
}

/// Extraction options
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub preserve_structure: bool,
    /// Media kinds to collect (empty in text-only mode)
    pub media_kinds: Vec<MediaKind>,
    pub strip_urls: bool,
}

impl ExtractOptions {
    pub fn from_config(config: &ExtractConfig) -> Self {
        let media_kinds = if config.text_only {
            Vec::new()
        } else {
            config
                .media_types
                .iter()
                .filter_map(|name| MediaKind::from_config_name(name))
                .collect()
        };

        Self {
            preserve_structure: config.preserve_structure,
            media_kinds,
            strip_urls: config.strip_urls,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from_config(&ExtractConfig::default())
    }
}

enum Work<N> {
    Visit(N),
    /// A run of inline siblings rendered as one block
    Inline(Vec<N>),
}

/// HTML content extractor
#[derive(Debug)]
pub struct ContentExtractor {
    options: ExtractOptions,
    content_selectors: Vec<Selector>,
    ui_pattern: Option<Regex>,
    url_rules: Vec<Regex>,
}

impl ContentExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        let content_selectors = CONTENT_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect();

        let ui_pattern =
            Regex::new(&format!("(?i){}", EXCLUDED_CLASS_ID_PATTERNS.join("|"))).ok();

        // Applied in order: URLs in parens, in brackets, bare, then the
        // empty brackets they leave behind.
        let url_rules = [
            format!(r"(?i)\(\s*(?:{}){}\s*\)", URL_PROTOCOL, URL_CHARS),
            format!(r"(?i)\[\s*(?:{}){}\s*\]", URL_PROTOCOL, URL_CHARS),
            format!(r"(?i)(?:{}){}", URL_PROTOCOL, URL_CHARS),
            r"\(\s*\)".to_string(),
            r"\[\s*\]".to_string(),
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();

        Self {
            options,
            content_selectors,
            ui_pattern,
            url_rules,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extracts blocks, links and media from a successful fetch
    ///
    /// Relative references resolve against the post-redirect URL.
    pub fn extract(&self, fetched: &FetchResult) -> Result<Extraction, ExtractError> {
        let body = fetched.body().ok_or(ExtractError::MissingBody)?;
        let html = String::from_utf8_lossy(body);
        self.extract_html(&html, &fetched.final_url)
    }

    /// Extracts from raw HTML
    pub fn extract_html(&self, html: &str, page_url: &Url) -> Result<Extraction, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let document = Html::parse_document(html);
        let root = self.main_content(&document);

        let raw = if self.options.preserve_structure {
            self.structured_blocks(root)
        } else {
            self.flat_blocks(root)
        };

        let blocks = raw
            .into_iter()
            .filter_map(|(role, text)| {
                let text = self.clean_text(&text);
                (!text.is_empty()).then_some((role, text))
            })
            .enumerate()
            .map(|(ordinal, (role, text))| ContentBlock {
                text,
                role,
                source_url: page_url.clone(),
                ordinal,
            })
            .collect();

        let media = if self.options.media_kinds.is_empty() {
            Vec::new()
        } else {
            self.media_refs(root, page_url)
        };

        Ok(Extraction {
            title: extract_title(&document),
            blocks,
            links: extract_links(&document, page_url),
            media,
        })
    }

    fn main_content<'a>(&self, document: &'a Html) -> ElementRef<'a> {
        for selector in &self.content_selectors {
            if let Some(element) = document.select(selector).next() {
                return element;
            }
        }

        Selector::parse("body")
            .ok()
            .and_then(|body| document.select(&body).next())
            .unwrap_or_else(|| document.root_element())
    }

    /// True if an element is UI chrome rather than content
    fn is_excluded(&self, element: &Element) -> bool {
        if EXCLUDED_TAGS.contains(&element.name()) {
            return true;
        }

        if element
            .attr("role")
            .is_some_and(|role| EXCLUDED_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()))
        {
            return true;
        }

        if element.attr("hidden").is_some() || element.attr("aria-hidden") == Some("true") {
            return true;
        }

        let Some(pattern) = &self.ui_pattern else {
            return false;
        };

        let class_and_id = format!(
            "{} {}",
            element.attr("class").unwrap_or_default(),
            element.id().unwrap_or_default()
        );
        !class_and_id.trim().is_empty() && pattern.is_match(&class_and_id)
    }

    /// Flat mode: one block per leaf container or run of inline content
    fn flat_blocks(&self, root: ElementRef<'_>) -> Vec<(StructuralRole, String)> {
        let mut blocks = Vec::new();
        let mut stack = vec![Work::Visit(*root)];

        while let Some(work) = stack.pop() {
            match work {
                Work::Inline(nodes) => {
                    let mut text = String::new();
                    for node in nodes {
                        match node.value() {
                            Node::Text(t) => text.push_str(t),
                            Node::Element(el) if !self.is_excluded(el) => {
                                if let Some(element) = ElementRef::wrap(node) {
                                    self.collect_text(element, &mut text);
                                }
                            }
                            _ => {}
                        }
                    }
                    blocks.push((StructuralRole::Other, text));
                }
                Work::Visit(node) => {
                    let Some(element) = ElementRef::wrap(node) else {
                        continue;
                    };
                    if node.id() != root.id() && self.is_excluded(element.value()) {
                        continue;
                    }

                    if !has_block_descendant(element) {
                        let mut text = String::new();
                        self.collect_text(element, &mut text);
                        blocks.push((StructuralRole::Other, text));
                        continue;
                    }

                    let mut items = Vec::new();
                    let mut run = Vec::new();
                    for child in node.children() {
                        let starts_block = ElementRef::wrap(child).is_some_and(|el| {
                            is_block_tag(el.value().name()) || has_block_descendant(el)
                        });

                        if starts_block {
                            if !run.is_empty() {
                                items.push(Work::Inline(std::mem::take(&mut run)));
                            }
                            items.push(Work::Visit(child));
                        } else {
                            run.push(child);
                        }
                    }
                    if !run.is_empty() {
                        items.push(Work::Inline(run));
                    }

                    stack.extend(items.into_iter().rev());
                }
            }
        }

        blocks
    }

    /// Structure mode: headings, paragraphs and list items
    fn structured_blocks(&self, root: ElementRef<'_>) -> Vec<(StructuralRole, String)> {
        let mut blocks = Vec::new();
        let mut stack = vec![*root];

        while let Some(node) = stack.pop() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            if node.id() != root.id() && self.is_excluded(element.value()) {
                continue;
            }

            if let Some(role) = structural_role(element.value().name()) {
                let mut text = String::new();
                self.collect_text(element, &mut text);
                blocks.push((role, text));
                continue;
            }

            stack.extend(node.children().collect::<Vec<_>>().into_iter().rev());
        }

        blocks
    }

    /// Appends the visible text under `element`, skipping excluded descendants
    fn collect_text(&self, element: ElementRef<'_>, out: &mut String) {
        let mut stack = vec![*element];

        while let Some(node) = stack.pop() {
            match node.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => {
                    if node.id() != element.id() && self.is_excluded(el) {
                        continue;
                    }
                    if el.name() == "br" {
                        out.push(' ');
                    }
                    stack.extend(node.children().collect::<Vec<_>>().into_iter().rev());
                }
                _ => {}
            }
        }
    }

    /// Collapses whitespace and strips URLs when configured
    fn clean_text(&self, text: &str) -> String {
        let mut text = collapse_whitespace(text);

        if self.options.strip_urls {
            for rule in &self.url_rules {
                text = rule.replace_all(&text, "").into_owned();
            }
            text = collapse_whitespace(&text);
        }

        text
    }

    /// Media references under the content root, resolved and de-duplicated
    fn media_refs(&self, root: ElementRef<'_>, page_url: &Url) -> Vec<MediaRef> {
        let wanted: HashSet<MediaKind> = self.options.media_kinds.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut media = Vec::new();

        let mut push = |kind: MediaKind, reference: &str| {
            if !wanted.contains(&kind) {
                return;
            }
            if let Some(url) = resolve_media(reference, page_url) {
                let media_ref = MediaRef { kind, url };
                if seen.insert(media_ref.clone()) {
                    media.push(media_ref);
                }
            }
        };

        if let Ok(selector) = Selector::parse("img") {
            for img in root.select(&selector) {
                let el = img.value();
                if let Some(src) = el.attr("src").or_else(|| el.attr("data-src")) {
                    push(MediaKind::Image, src);
                }
                if let Some(srcset) = el.attr("srcset") {
                    for candidate in srcset_urls(srcset) {
                        push(MediaKind::Image, candidate);
                    }
                }
            }
        }

        if let Ok(selector) = Selector::parse("picture source[srcset]") {
            for source in root.select(&selector) {
                if let Some(first) = source
                    .value()
                    .attr("srcset")
                    .and_then(|s| srcset_urls(s).next())
                {
                    push(MediaKind::Image, first);
                }
            }
        }

        for (tag, kind) in [("video", MediaKind::Video), ("audio", MediaKind::Audio)] {
            if let Ok(selector) = Selector::parse(tag) {
                for element in root.select(&selector) {
                    if let Some(src) = element.value().attr("src") {
                        push(kind, src);
                    }
                }
            }
            if let Ok(selector) = Selector::parse(&format!("{} source[src]", tag)) {
                for source in root.select(&selector) {
                    if let Some(src) = source.value().attr("src") {
                        push(kind, src);
                    }
                }
            }
        }

        media
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

fn has_block_descendant(element: ElementRef<'_>) -> bool {
    element.descendants().skip(1).any(|node| {
        matches!(node.value(), Node::Element(el) if is_block_tag(el.name()))
    })
}

fn structural_role(name: &str) -> Option<StructuralRole> {
    match name {
        "h1" => Some(StructuralRole::Heading(1)),
        "h2" => Some(StructuralRole::Heading(2)),
        "h3" => Some(StructuralRole::Heading(3)),
        "h4" => Some(StructuralRole::Heading(4)),
        "h5" => Some(StructuralRole::Heading(5)),
        "h6" => Some(StructuralRole::Heading(6)),
        "p" => Some(StructuralRole::Paragraph),
        "li" => Some(StructuralRole::ListItem),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// URLs of a `srcset` attribute, descriptors dropped
fn srcset_urls(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
}

fn resolve_media(reference: &str, page_url: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with("data:") {
        return None;
    }

    let url = page_url.join(reference).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/articles/one").unwrap()
    }

    fn flat() -> ContentExtractor {
        ContentExtractor::default()
    }

    fn structured() -> ContentExtractor {
        ContentExtractor::new(ExtractOptions {
            preserve_structure: true,
            ..ExtractOptions::default()
        })
    }

    fn texts(extraction: &Extraction) -> Vec<&str> {
        extraction.blocks.iter().map(|b| b.text.as_str()).collect()
    }

    #[test]
    fn test_prefers_article_over_body() {
        let html = r#"<html><body>
            <div class="promo"><p>Subscribe today</p></div>
            <article><p>The real story.</p></article>
        </body></html>"#;

        let extraction = flat().extract_html(html, &page_url()).unwrap();
        assert_eq!(texts(&extraction), vec!["The real story."]);
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><body><p>First.</p><p>Second.</p></body></html>";
        let extraction = flat().extract_html(html, &page_url()).unwrap();
        assert_eq!(texts(&extraction), vec!["First.", "Second."]);
    }

    #[test]
    fn test_chrome_is_excluded() {
        let html = r#"<html><body>
            <nav><p>Home</p></nav>
            <header><p>Site header</p></header>
            <div class="sidebar"><p>Popular posts</p></div>
            <div role="navigation"><p>Menu text</p></div>
            <div id="comments-section"><p>First!</p></div>
            <script>var x = 1;</script>
            <p>Body paragraph.</p>
            <footer><p>Copyright</p></footer>
        </body></html>"#;

        let extraction = flat().extract_html(html, &page_url()).unwrap();
        assert_eq!(texts(&extraction), vec!["Body paragraph."]);
    }

    #[test]
    fn test_inline_runs_join_into_one_block() {
        let html = r#"<html><body><div>Intro with <a href="/x">a link</a> inside.<p>Para.</p></div></body></html>"#;
        let extraction = flat().extract_html(html, &page_url()).unwrap();
        assert_eq!(texts(&extraction), vec!["Intro with a link inside.", "Para."]);
    }

    #[test]
    fn test_flat_blocks_have_document_order_ordinals() {
        let html = "<html><body><p>a</p><div><p>b</p><p>c</p></div><p>d</p></body></html>";
        let extraction = flat().extract_html(html, &page_url()).unwrap();

        assert_eq!(texts(&extraction), vec!["a", "b", "c", "d"]);
        let ordinals: Vec<usize> = extraction.blocks.iter().map(|b| b.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert!(extraction
            .blocks
            .iter()
            .all(|b| b.role == StructuralRole::Other));
    }

    #[test]
    fn test_structure_mode_roles() {
        let html = r#"<html><body><article>
            <h2>Findings</h2>
            <p>Researchers found a link.</p>
            <ul><li>One</li><li>Two</li></ul>
        </article></body></html>"#;

        let extraction = structured().extract_html(html, &page_url()).unwrap();
        let roles: Vec<StructuralRole> = extraction.blocks.iter().map(|b| b.role).collect();
        assert_eq!(
            roles,
            vec![
                StructuralRole::Heading(2),
                StructuralRole::Paragraph,
                StructuralRole::ListItem,
                StructuralRole::ListItem
            ]
        );

        let rendered: Vec<String> = extraction.blocks.iter().map(|b| b.render()).collect();
        assert_eq!(rendered[0], "## Findings");
        assert_eq!(rendered[2], "• One");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let html = "<html><body><p>  spread\n\n   over\tlines  </p></body></html>";
        let extraction = flat().extract_html(html, &page_url()).unwrap();
        assert_eq!(texts(&extraction), vec!["spread over lines"]);
    }

    #[test]
    fn test_urls_stripped() {
        let html = r#"<html><body><p>See the report (https://example.com/report.pdf) or www.example.org for details.</p></body></html>"#;
        let extraction = flat().extract_html(html, &page_url()).unwrap();
        assert_eq!(texts(&extraction), vec!["See the report or for details."]);
    }

    #[test]
    fn test_urls_kept_when_disabled() {
        let extractor = ContentExtractor::new(ExtractOptions {
            strip_urls: false,
            ..ExtractOptions::default()
        });
        let html = "<html><body><p>Visit https://example.com now</p></body></html>";
        let extraction = extractor.extract_html(html, &page_url()).unwrap();
        assert_eq!(texts(&extraction), vec!["Visit https://example.com now"]);
    }

    #[test]
    fn test_empty_document_is_error() {
        assert_eq!(
            flat().extract_html("   \n", &page_url()).unwrap_err(),
            ExtractError::EmptyDocument
        );
    }

    #[test]
    fn test_media_references() {
        let html = r#"<html><body><article>
            <p>Text.</p>
            <img src="/img/a.png" srcset="/img/a-2x.png 2x, /img/a-3x.png 3x">
            <img data-src="lazy.jpg">
            <picture><source srcset="/img/b.webp 1x, /img/b2.webp 2x"></picture>
            <video src="/media/clip.mp4"></video>
            <audio><source src="/media/talk.mp3"></audio>
            <img src="data:image/png;base64,AAAA">
        </article></body></html>"#;

        let extraction = flat().extract_html(html, &page_url()).unwrap();
        let media: Vec<(MediaKind, String)> = extraction
            .media
            .iter()
            .map(|m| (m.kind, m.url.to_string()))
            .collect();

        assert!(media.contains(&(MediaKind::Image, "https://example.com/img/a.png".into())));
        assert!(media.contains(&(MediaKind::Image, "https://example.com/img/a-3x.png".into())));
        assert!(media.contains(&(
            MediaKind::Image,
            "https://example.com/articles/lazy.jpg".into()
        )));
        assert!(media.contains(&(MediaKind::Image, "https://example.com/img/b.webp".into())));
        assert!(!media.contains(&(MediaKind::Image, "https://example.com/img/b2.webp".into())));
        assert!(media.contains(&(
            MediaKind::Video,
            "https://example.com/media/clip.mp4".into()
        )));
        assert!(media.contains(&(
            MediaKind::Audio,
            "https://example.com/media/talk.mp3".into()
        )));
        assert!(media.iter().all(|(_, url)| !url.starts_with("data:")));
    }

    #[test]
    fn test_text_only_skips_media() {
        let extractor = ContentExtractor::new(ExtractOptions::from_config(&ExtractConfig {
            text_only: true,
            ..ExtractConfig::default()
        }));
        let html = r#"<html><body><p>Text.</p><img src="/a.png"></body></html>"#;
        let extraction = extractor.extract_html(html, &page_url()).unwrap();
        assert!(extraction.media.is_empty());
    }

    #[test]
    fn test_links_and_title() {
        let html = r#"<html><head><title> Page  Title </title></head>
            <body><nav><a href="/nav-target">Nav</a></nav><p><a href="/inline#x">Inline</a></p></body></html>"#;
        let extraction = flat().extract_html(html, &page_url()).unwrap();

        assert_eq!(extraction.title.as_deref(), Some("Page Title"));
        let links: Vec<String> = extraction.links.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/nav-target".to_string(),
                "https://example.com/inline".to_string()
            ]
        );
    }

    #[test]
    fn test_block_source_url() {
        let html = "<html><body><p>Hello.</p></body></html>";
        let extraction = flat().extract_html(html, &page_url()).unwrap();
        assert_eq!(extraction.blocks[0].source_url, page_url());
    }
}

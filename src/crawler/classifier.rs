//! Link classifier for counting internal and external links
//!
//! This module walks a parsed HTML document and sorts every `<a href>` into
//! one of two buckets relative to the page it was found on:
//! - **internal**: same hostname as the page, or a host-relative path
//! - **external**: everything else

use scraper::Html;
use thiserror::Error;
use url::{ParseError, Url};

/// Number of external and internal links found on one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounts {
    pub external: u32,
    pub internal: u32,
}

/// Errors that make a tree impossible to classify
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("tree root is not a document")]
    NotADocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Internal,
    External,
}

/// Host and path facts about one href value
struct Reference {
    host: Option<String>,
    has_path: bool,
}

impl Reference {
    fn parse(page: &Url, href: &str) -> Result<Self, ParseError> {
        match Url::parse(href) {
            Ok(url) => Ok(Self {
                host: url.host_str().filter(|h| !h.is_empty()).map(str::to_owned),
                // Opaque references (mailto:, javascript:) carry no path
                has_path: !url.cannot_be_a_base() && !url.path().is_empty(),
            }),
            Err(ParseError::RelativeUrlWithoutBase) => Self::parse_relative(page, href),
            Err(e) => Err(e),
        }
    }

    /// Reads a reference that has no scheme
    ///
    /// Only `//authority` forms are resolved against the page. A third slash
    /// (`///path`) makes the whole value a path, and an empty authority (`//`,
    /// `//?q`) leaves no host and no path.
    fn parse_relative(page: &Url, href: &str) -> Result<Self, ParseError> {
        match href.strip_prefix("//") {
            Some(rest) if !rest.starts_with('/') => {
                let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
                if authority_end == 0 {
                    return Ok(Self {
                        host: None,
                        has_path: false,
                    });
                }

                let resolved = page.join(href)?;
                Ok(Self {
                    host: resolved.host_str().map(str::to_owned),
                    has_path: !resolved.path().is_empty(),
                })
            }
            _ => {
                let path_end = href.find(['?', '#']).unwrap_or(href.len());
                Ok(Self {
                    host: None,
                    has_path: path_end > 0,
                })
            }
        }
    }

    fn kind(&self, page: &Url) -> LinkKind {
        match &self.host {
            Some(host) if Some(host.as_str()) == page.host_str() => LinkKind::Internal,
            None if self.has_path => LinkKind::Internal,
            _ => LinkKind::External,
        }
    }
}

/// Counts the external and internal links of a parsed HTML document
///
/// Every node reachable from the document root is visited once, depth first.
/// For each anchor element the `href` attribute is classified by these rules,
/// in order:
///
/// 1. Same hostname as `page` (ports are ignored) → internal
/// 2. No hostname but a non-empty path (relative link) → internal
/// 3. Anything else → external
///
/// Anchors without an `href`, or with an empty one, are ignored. An href that
/// fails to parse is logged and skipped without affecting any other anchor.
///
/// # Arguments
///
/// * `page` - The address the document was fetched from
/// * `document` - The parsed document
///
/// # Returns
///
/// * `Ok(LinkCounts)` - Counts for the whole document
/// * `Err(ClassifyError)` - The tree is not a full document
///
/// # Example
///
/// ```
/// use linkscope::crawler::count_links;
/// use scraper::Html;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/").unwrap();
/// let html = Html::parse_document(r#"<a href="/about">About</a><a href="https://other.com">Other</a>"#);
/// let counts = count_links(&page, &html).unwrap();
/// assert_eq!((counts.external, counts.internal), (1, 1));
/// ```
pub fn count_links(page: &Url, document: &Html) -> Result<LinkCounts, ClassifyError> {
    let root = document.tree.root();
    if !root.value().is_document() {
        return Err(ClassifyError::NotADocument);
    }

    let mut counts = LinkCounts::default();

    for node in root.descendants() {
        let Some(element) = node.value().as_element() else {
            continue;
        };
        if element.name() != "a" {
            continue;
        }

        for (name, value) in element.attrs() {
            if name != "href" || value.is_empty() {
                continue;
            }

            let reference = match Reference::parse(page, value) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("Skipping malformed href {:?} on {}: {}", value, page, e);
                    // An anchor carries at most one href
                    break;
                }
            };

            match reference.kind(page) {
                LinkKind::Internal => counts.internal = counts.internal.saturating_add(1),
                LinkKind::External => counts.external = counts.external.saturating_add(1),
            }
        }
    }

    Ok(counts)
}

/// Parses an HTML string and counts its links
///
/// Convenience wrapper around [`count_links`] for callers holding raw markup.
pub fn count_links_in_html(page: &Url, html: &str) -> Result<LinkCounts, ClassifyError> {
    count_links(page, &Html::parse_document(html))
}

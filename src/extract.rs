//! Result-block extraction from a rendered results page.
//!
//! Document order defines rank: the Nth result container encountered is
//! rank N, 1-indexed. Only the single captured page is scanned; there is no
//! pagination follow-through.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use crate::types::{RankHit, TITLE_PLACEHOLDER};

const RESULT_BLOCK_SELECTOR_STR: &str = "div.tF2Cxc";
const LINK_SELECTOR_STR: &str = "a[href]";
const HEADING_SELECTOR_STR: &str = "h3";

static RESULT_BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(RESULT_BLOCK_SELECTOR_STR).expect("result block selector is valid")
});

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(LINK_SELECTOR_STR).expect("link selector is valid"));

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(HEADING_SELECTOR_STR).expect("heading selector is valid"));

/// Scan the page's result blocks for the first link containing
/// `target_domain`. Returns `None` when no block matches — a valid
/// not-found outcome, not a failure.
///
/// A block without a link is skipped and does not consume a rank slot's
/// match; a matching block without a heading gets a placeholder title.
pub fn extract_rank(html: &str, target_domain: &str) -> Option<RankHit> {
    let document = Html::parse_document(html);
    let blocks = document.select(&RESULT_BLOCK_SELECTOR);

    for (index, block) in blocks.enumerate() {
        let rank = (index + 1) as u32;

        let href = match block
            .select(&LINK_SELECTOR)
            .next()
            .and_then(|link| link.value().attr("href"))
        {
            Some(href) => href,
            None => {
                debug!("Result block {} has no link, skipping", rank);
                continue;
            }
        };

        if !href.contains(target_domain) {
            continue;
        }

        let title = block
            .select(&HEADING_SELECTOR)
            .next()
            .map(|h| h.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

        return Some(RankHit {
            rank,
            title,
            url: href.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(href: &str, title: &str) -> String {
        format!(
            r#"<div class="tF2Cxc"><a href="{href}"><h3>{title}</h3></a><span>snippet</span></div>"#
        )
    }

    fn page(blocks: &[String]) -> String {
        format!(
            "<html><body><div id=\"search\">{}</div></body></html>",
            blocks.join("\n")
        )
    }

    #[test]
    fn test_match_at_position_three() {
        let html = page(&[
            block("https://other.example/a", "Other A"),
            block("https://another.example/b", "Another B"),
            block("https://www.web.com/services", "Web Services"),
        ]);

        let hit = extract_rank(&html, "web.com").unwrap();
        assert_eq!(hit.rank, 3);
        assert_eq!(hit.title, "Web Services");
        assert_eq!(hit.url, "https://www.web.com/services");
    }

    #[test]
    fn test_no_matching_block_is_not_found() {
        let html = page(&[
            block("https://other.example/a", "Other A"),
            block("https://another.example/b", "Another B"),
        ]);
        assert!(extract_rank(&html, "web.com").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let html = page(&[
            block("https://web.com/first", "First"),
            block("https://web.com/second", "Second"),
        ]);
        assert_eq!(extract_rank(&html, "web.com").unwrap().rank, 1);
    }

    #[test]
    fn test_missing_heading_gets_placeholder() {
        let html = page(&[
            r#"<div class="tF2Cxc"><a href="https://web.com/x">bare link</a></div>"#.to_string(),
        ]);

        let hit = extract_rank(&html, "web.com").unwrap();
        assert_eq!(hit.title, TITLE_PLACEHOLDER);
    }

    #[test]
    fn test_linkless_block_skipped_but_keeps_rank_slot() {
        // The linkless block still occupies rank 1; the match sits at rank 2.
        let html = page(&[
            r#"<div class="tF2Cxc"><h3>No link here</h3></div>"#.to_string(),
            block("https://web.com/y", "Match"),
        ]);

        let hit = extract_rank(&html, "web.com").unwrap();
        assert_eq!(hit.rank, 2);
    }

    #[test]
    fn test_ignores_non_result_containers() {
        let html = format!(
            "<html><body><div class=\"ad\"><a href=\"https://web.com/ad\">ad</a></div>{}</body></html>",
            block("https://web.com/organic", "Organic")
        );
        assert_eq!(extract_rank(&html, "web.com").unwrap().rank, 1);
    }

    #[test]
    fn test_empty_page() {
        assert!(extract_rank("<html><body></body></html>", "web.com").is_none());
    }
}

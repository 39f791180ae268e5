//! Same-host link discovery

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Discovers candidate links on a parsed page
///
/// Every `a[href]` is resolved against the page URL and kept when its
/// host exactly matches the page's host, it has not been visited, and it
/// has not already been collected in this call. Order is document order.
///
/// Non-HTTP hrefs (`mailto:`, `javascript:`, ...) resolve without a
/// matching host and fall out of the same-host check.
pub fn discover_links(document: &Html, base_url: &Url, visited: &HashSet<String>) -> Vec<String> {
    let mut links = Vec::new();

    let Some(base_host) = base_url.host_str() else {
        return links;
    };

    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for element in document.select(&anchor_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            let Ok(resolved) = base_url.join(href) else {
                continue;
            };

            if resolved.host_str() != Some(base_host) {
                continue;
            }

            let absolute = resolved.to_string();
            if !visited.contains(&absolute) && !links.contains(&absolute) {
                links.push(absolute);
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discover(html: &str, base: &str, visited: &[&str]) -> Vec<String> {
        let document = Html::parse_document(html);
        let base_url = Url::parse(base).unwrap();
        let visited: HashSet<String> = visited.iter().map(|s| s.to_string()).collect();
        discover_links(&document, &base_url, &visited)
    }

    #[test]
    fn test_relative_links_resolved() {
        let links = discover(
            r#"<a href="/about">About</a><a href="news">News</a>"#,
            "https://example.com/blog/",
            &[],
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/about".to_string(),
                "https://example.com/blog/news".to_string()
            ]
        );
    }

    #[test]
    fn test_cross_host_links_excluded() {
        let links = discover(
            r#"<a href="https://other.com/x">other</a><a href="/local">local</a>"#,
            "https://example.com/",
            &[],
        );
        assert_eq!(links, vec!["https://example.com/local".to_string()]);
    }

    #[test]
    fn test_subdomain_is_a_different_host() {
        let links = discover(
            r#"<a href="https://blog.example.com/">blog</a>"#,
            "https://example.com/",
            &[],
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_special_schemes_excluded() {
        let links = discover(
            r#"<a href="mailto:a@example.com">mail</a>
               <a href="javascript:void(0)">js</a>
               <a href="tel:+1234">call</a>
               <a href="/real">real</a>"#,
            "https://example.com/",
            &[],
        );
        assert_eq!(links, vec!["https://example.com/real".to_string()]);
    }

    #[test]
    fn test_deduplicated_within_call() {
        let links = discover(
            r#"<a href="/a">1</a><a href="/a">2</a><a href="/b">3</a>"#,
            "https://example.com/",
            &[],
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string()
            ]
        );
    }

    #[test]
    fn test_visited_urls_excluded() {
        let links = discover(
            r#"<a href="/a">1</a><a href="/b">2</a>"#,
            "https://example.com/",
            &["https://example.com/a"],
        );
        assert_eq!(links, vec!["https://example.com/b".to_string()]);
    }

    #[test]
    fn test_document_order_preserved() {
        let links = discover(
            r#"<a href="/z">z</a><a href="/a">a</a><a href="/m">m</a>"#,
            "https://example.com/",
            &[],
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/z".to_string(),
                "https://example.com/a".to_string(),
                "https://example.com/m".to_string()
            ]
        );
    }
}

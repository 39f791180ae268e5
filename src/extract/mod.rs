//! Extraction strategy engine
//!
//! A strategy turns a parsed document into a map of named fields. Four
//! strategies share the single `extract` entry point: generic page
//! scraping, e-commerce products, news articles, and a caller-supplied
//! selector map (see [`selector`]).
//!
//! Extraction is total: a field that cannot be resolved is `null` in the
//! output, never an error.

mod article;
mod generic;
mod product;
pub mod selector;

pub use article::ArticleStrategy;
pub use generic::GenericStrategy;
pub use product::ProductStrategy;
pub use selector::{RawInstruction, SelectorStrategy};

use crate::ConfigResult;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;

/// Mapping from extraction-field name to extracted value
///
/// Values are scalars (strings), sequences (arrays), row-object lists
/// (arrays of objects), or `null` for absent fields.
pub type FieldMap = serde_json::Map<String, Value>;

/// A configured extraction strategy
///
/// Strategies are stateless policy objects: construction happens once per
/// run, extraction may run against any number of documents.
#[derive(Debug)]
pub enum ExtractionStrategy {
    Generic(GenericStrategy),
    Product(ProductStrategy),
    Article(ArticleStrategy),
    Selector(SelectorStrategy),
}

impl ExtractionStrategy {
    /// Builds a strategy from its job-file name and selector map
    ///
    /// Unknown strategy names and malformed selector instructions are
    /// rejected here, before any fetch occurs.
    pub fn from_spec(
        name: &str,
        selectors: &BTreeMap<String, RawInstruction>,
    ) -> ConfigResult<Self> {
        match name {
            "generic" => Ok(Self::Generic(GenericStrategy::new())),
            "product" => Ok(Self::Product(ProductStrategy::new())),
            "article" => Ok(Self::Article(ArticleStrategy::new())),
            "selector" => Ok(Self::Selector(SelectorStrategy::compile(selectors)?)),
            other => Err(crate::ConfigError::UnknownStrategy(other.to_string())),
        }
    }

    /// Extracts the field map for one parsed document
    pub fn extract(&self, document: &Html, url: &str) -> FieldMap {
        match self {
            Self::Generic(s) => s.extract(document, url),
            Self::Product(s) => s.extract(document, url),
            Self::Article(s) => s.extract(document, url),
            Self::Selector(s) => s.extract(document, url),
        }
    }
}

/// Collects all elements matching a CSS selector string, in document order
///
/// An unparseable selector yields no matches rather than failing; the
/// strategies only call this with fixed selector text.
pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// First element matching a CSS selector string, if any
pub(crate) fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).next(),
        Err(_) => None,
    }
}

/// Visible text of an element: each text fragment trimmed, empties
/// dropped, remainder concatenated
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

/// Named attribute of an element as a JSON value, `null` when missing
pub(crate) fn attr_or_null(element: ElementRef<'_>, name: &str) -> Value {
    match element.value().attr(name) {
        Some(value) => Value::String(value.to_string()),
        None => Value::Null,
    }
}

/// Image source with fallback: `src` unless missing or empty, then
/// `data-src`, else `null`
pub(crate) fn image_source(element: ElementRef<'_>) -> Value {
    let src = element.value().attr("src").filter(|s| !s.is_empty());
    match src.or_else(|| element.value().attr("data-src")) {
        Some(value) => Value::String(value.to_string()),
        None => Value::Null,
    }
}

/// Content of the first `<meta>` tag matching `name=`, then the
/// Open-Graph `property=og:` form
pub(crate) fn meta_content(document: &Html, name: &str) -> Value {
    let by_name = format!("meta[name=\"{}\"]", name);
    let by_property = format!("meta[property=\"og:{}\"]", name);

    select_first(document, &by_name)
        .or_else(|| select_first(document, &by_property))
        .map(|tag| attr_or_null(tag, "content"))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = ExtractionStrategy::from_spec("jsonpath", &BTreeMap::new());
        assert!(matches!(
            result.unwrap_err(),
            crate::ConfigError::UnknownStrategy(name) if name == "jsonpath"
        ));
    }

    #[test]
    fn test_known_strategies_construct() {
        for name in ["generic", "product", "article", "selector"] {
            assert!(ExtractionStrategy::from_spec(name, &BTreeMap::new()).is_ok());
        }
    }

    #[test]
    fn test_element_text_trims_fragments() {
        let html = Html::parse_document("<p>  Hello \n <b> world </b>  </p>");
        let p = select_first(&html, "p").unwrap();
        assert_eq!(element_text(p), "Helloworld");
    }

    #[test]
    fn test_image_source_fallback() {
        let html = Html::parse_document(
            r#"<img src="a.png"><img src="" data-src="b.png"><img alt="none">"#,
        );
        let sources: Vec<Value> = select_all(&html, "img")
            .into_iter()
            .map(image_source)
            .collect();
        assert_eq!(sources[0], Value::String("a.png".to_string()));
        assert_eq!(sources[1], Value::String("b.png".to_string()));
        assert_eq!(sources[2], Value::Null);
    }

    #[test]
    fn test_meta_content_prefers_name_over_og() {
        let html = Html::parse_document(
            r#"<head>
                <meta name="description" content="plain">
                <meta property="og:description" content="graph">
            </head>"#,
        );
        assert_eq!(
            meta_content(&html, "description"),
            Value::String("plain".to_string())
        );
    }

    #[test]
    fn test_meta_content_falls_back_to_og() {
        let html = Html::parse_document(
            r#"<head><meta property="og:keywords" content="a,b"></head>"#,
        );
        assert_eq!(
            meta_content(&html, "keywords"),
            Value::String("a,b".to_string())
        );
    }
}

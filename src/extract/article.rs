//! Article extraction for news and blog pages

use crate::extract::{element_text, select_all, select_first, FieldMap};
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;

/// News article / blog post extraction
#[derive(Debug)]
pub struct ArticleStrategy {
    author_class: Regex,
    container_class: Regex,
}

impl Default for ArticleStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleStrategy {
    pub fn new() -> Self {
        Self {
            author_class: Regex::new(r"(?i)author").expect("valid class pattern"),
            container_class: Regex::new(r"(?i)content|article").expect("valid class pattern"),
        }
    }

    pub fn extract(&self, document: &Html, _url: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("headline".to_string(), headline(document));
        fields.insert("author".to_string(), self.author(document));
        fields.insert("publish_date".to_string(), publish_date(document));
        fields.insert("content".to_string(), self.content(document));
        fields.insert("tags".to_string(), tags(document));
        fields
    }

    /// Author meta tag, falling back to the first author-classed element
    fn author(&self, document: &Html) -> Value {
        if let Some(meta) = select_first(document, "meta[name=\"author\"]") {
            return match meta.value().attr("content") {
                Some(content) => Value::String(content.to_string()),
                None => Value::Null,
            };
        }

        match first_with_class(document, &self.author_class) {
            Some(element) => Value::String(element_text(element)),
            None => Value::Null,
        }
    }

    /// Paragraph texts within the article container, else all paragraphs
    fn content(&self, document: &Html) -> Value {
        let container = select_first(document, "article")
            .or_else(|| first_with_class(document, &self.container_class));

        let paragraphs: Vec<Value> = match container {
            Some(scope) => paragraph_texts_in(scope),
            None => select_all(document, "p")
                .into_iter()
                .map(|p| Value::String(element_text(p)))
                .collect(),
        };

        Value::Array(paragraphs)
    }
}

/// First h1 text, else the document title
fn headline(document: &Html) -> Value {
    if let Some(h1) = select_first(document, "h1") {
        return Value::String(element_text(h1));
    }
    match select_first(document, "title") {
        Some(title) => Value::String(element_text(title)),
        None => Value::Null,
    }
}

/// Machine-readable datetime of the first time element, else its text
fn publish_date(document: &Html) -> Value {
    match select_first(document, "time") {
        Some(time) => match time.value().attr("datetime") {
            Some(datetime) => Value::String(datetime.to_string()),
            None => Value::String(element_text(time)),
        },
        None => Value::Null,
    }
}

/// Every non-empty article:tag meta content, always a sequence
fn tags(document: &Html) -> Value {
    let values: Vec<Value> = select_all(document, "meta[property=\"article:tag\"]")
        .into_iter()
        .filter_map(|tag| tag.value().attr("content"))
        .filter(|content| !content.is_empty())
        .map(|content| Value::String(content.to_string()))
        .collect();
    Value::Array(values)
}

fn first_with_class<'a>(document: &'a Html, pattern: &Regex) -> Option<ElementRef<'a>> {
    select_all(document, "[class]")
        .into_iter()
        .find(|element| element.value().classes().any(|c| pattern.is_match(c)))
}

fn paragraph_texts_in(scope: ElementRef<'_>) -> Vec<Value> {
    match scraper::Selector::parse("p") {
        Ok(selector) => scope
            .select(&selector)
            .map(|p| Value::String(element_text(p)))
            .collect(),
        Err(_) => Vec::new(),
    }
}

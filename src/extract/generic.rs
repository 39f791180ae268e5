//! Generic extraction: the common elements of any page

use crate::extract::{
    element_text, image_source, meta_content, select_all, select_first, FieldMap,
};
use scraper::Html;
use serde_json::Value;

/// Maximum number of paragraphs the generic strategy records
const MAX_PARAGRAPHS: usize = 5;

/// Fixed-field extraction for pages with no known shape
///
/// Collects the title, h1-h3 headings, the first few paragraphs, image
/// sources, and the description/keywords meta tags.
#[derive(Debug, Default)]
pub struct GenericStrategy;

impl GenericStrategy {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, document: &Html, _url: &str) -> FieldMap {
        let mut fields = FieldMap::new();

        let title = select_first(document, "title")
            .map(|t| Value::String(element_text(t)))
            .unwrap_or(Value::Null);
        fields.insert("title".to_string(), title);

        let headings: Vec<Value> = select_all(document, "h1, h2, h3")
            .into_iter()
            .map(|h| Value::String(element_text(h)))
            .collect();
        fields.insert("headings".to_string(), Value::Array(headings));

        let paragraphs: Vec<Value> = select_all(document, "p")
            .into_iter()
            .take(MAX_PARAGRAPHS)
            .map(|p| Value::String(element_text(p)))
            .collect();
        fields.insert("paragraphs".to_string(), Value::Array(paragraphs));

        let images: Vec<Value> = select_all(document, "img")
            .into_iter()
            .map(image_source)
            .collect();
        fields.insert("images".to_string(), Value::Array(images));

        fields.insert(
            "meta_description".to_string(),
            meta_content(document, "description"),
        );
        fields.insert(
            "meta_keywords".to_string(),
            meta_content(document, "keywords"),
        );

        fields
    }
}

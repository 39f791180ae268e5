//! Product extraction for e-commerce pages
//!
//! Each field is resolved by an ordered probe list: microdata `itemprop`
//! attributes first, then a case-insensitive class-name pattern. The
//! first probe that matches an element wins.

use crate::extract::{element_text, image_source, select_all, select_first, FieldMap};
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;

/// One way of locating a field's element
#[derive(Debug)]
enum Probe {
    /// Exact `itemprop` attribute value
    ItemProp(&'static str),
    /// Class token matching a pattern
    ClassPattern(Regex),
}

/// E-commerce product extraction
#[derive(Debug)]
pub struct ProductStrategy {
    name_probes: Vec<Probe>,
    price_probes: Vec<Probe>,
    description_probes: Vec<Probe>,
    availability_probes: Vec<Probe>,
    image_class: Regex,
}

fn class_pattern(pattern: &str) -> Probe {
    Probe::ClassPattern(Regex::new(pattern).expect("valid class pattern"))
}

impl Default for ProductStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStrategy {
    pub fn new() -> Self {
        Self {
            name_probes: vec![
                Probe::ItemProp("name"),
                class_pattern(r"(?i)product.*title"),
            ],
            price_probes: vec![Probe::ItemProp("price"), class_pattern(r"(?i)price")],
            description_probes: vec![
                Probe::ItemProp("description"),
                class_pattern(r"(?i)description"),
            ],
            availability_probes: vec![Probe::ItemProp("availability")],
            image_class: Regex::new(r"(?i)product").expect("valid class pattern"),
        }
    }

    pub fn extract(&self, document: &Html, _url: &str) -> FieldMap {
        let mut fields = FieldMap::new();

        fields.insert(
            "product_name".to_string(),
            first_probe_match(document, &self.name_probes),
        );
        fields.insert(
            "price".to_string(),
            first_probe_match(document, &self.price_probes),
        );
        fields.insert(
            "description".to_string(),
            first_probe_match(document, &self.description_probes),
        );
        fields.insert(
            "availability".to_string(),
            first_probe_match(document, &self.availability_probes),
        );

        let images: Vec<Value> = select_all(document, "img[class]")
            .into_iter()
            .filter(|img| class_matches(*img, &self.image_class))
            .map(image_source)
            .collect();
        fields.insert("images".to_string(), Value::Array(images));

        fields
    }
}

/// Whether any class token of the element matches the pattern
fn class_matches(element: ElementRef<'_>, pattern: &Regex) -> bool {
    element.value().classes().any(|class| pattern.is_match(class))
}

/// Text of the first element located by any probe, in probe order
fn first_probe_match(document: &Html, probes: &[Probe]) -> Value {
    for probe in probes {
        let found = match probe {
            Probe::ItemProp(value) => {
                select_first(document, &format!("[itemprop=\"{}\"]", value))
            }
            Probe::ClassPattern(pattern) => select_all(document, "[class]")
                .into_iter()
                .find(|element| class_matches(*element, pattern)),
        };

        if let Some(element) = found {
            return Value::String(element_text(element));
        }
    }
    Value::Null
}

//! Selector-expression DSL
//!
//! The selector strategy evaluates a caller-supplied field -> instruction
//! map. An instruction is either a bare selector string, optionally
//! suffixed with `@attribute`, or a structured object:
//!
//! ```text
//! "title": "h1.product-title"
//! "link":  "a.product-link@href"
//! "desc":  { "selector": ".desc", "extract": "html" }
//! "rows":  { "selector": "table.data tr", "extract": "table",
//!            "columns": [ { "selector": "td:nth-child(1) a", "extract": "text" },
//!                         "td:nth-child(1) a@href",
//!                         { "selector": "td:nth-child(2)", "name": "amount" } ] }
//! ```
//!
//! The string forms, the `@attribute` suffix, and the structured keys
//! (`selector`, `extract`, `attribute`, `multiple`, `child`,
//! `child_attribute`, `columns`, `name`) are the wire contract of the
//! engine. Instructions are parsed into their compiled form once, at
//! strategy construction; anything malformed is rejected there.

use crate::extract::{attr_or_null, element_text, FieldMap};
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One field instruction as it appears in the job file
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawInstruction {
    /// `"css_selector"` or `"css_selector@attribute"`
    Simple(String),
    /// Structured instruction object
    Structured(RawStructured),
}

/// Structured instruction object, pre-compilation
#[derive(Debug, Clone, Deserialize)]
pub struct RawStructured {
    pub selector: String,

    #[serde(default)]
    pub extract: ExtractMode,

    /// Attribute name, required for `extract = "attr"`
    #[serde(default)]
    pub attribute: Option<String>,

    /// Evaluate every match (true) or only the first (false)
    #[serde(default = "default_multiple")]
    pub multiple: bool,

    /// Descendant refinement applied before extracting from each match
    #[serde(default)]
    pub child: Option<String>,

    /// Attribute taken from the `child` descendant, for `child_attr`
    #[serde(default)]
    pub child_attribute: Option<String>,

    /// Column instructions, required for `extract = "table"`
    #[serde(default)]
    pub columns: Vec<RawColumn>,

    /// Output key when used as a table column
    #[serde(default)]
    pub name: Option<String>,
}

/// A table column: simple string or structured instruction
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawColumn {
    Simple(String),
    Structured(RawStructured),
}

/// What to pull out of each matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    #[default]
    Text,
    Html,
    Attr,
    ChildAttr,
    Table,
}

fn default_multiple() -> bool {
    true
}

/// Compiled form of one field instruction
#[derive(Debug)]
pub(crate) enum Instruction {
    Simple {
        selector: Selector,
        attribute: Option<String>,
    },
    Structured(StructuredInstruction),
    Table {
        selector: Selector,
        columns: Vec<Column>,
    },
}

/// Compiled structured instruction for the non-table modes
#[derive(Debug)]
pub(crate) struct StructuredInstruction {
    selector: Selector,
    mode: ExtractMode,
    attribute: Option<String>,
    multiple: bool,
    child: Option<Selector>,
    child_attribute: Option<String>,
}

/// Compiled table column
#[derive(Debug)]
pub(crate) struct Column {
    name: Option<String>,
    cell: Instruction,
}

/// Evaluation scope: the whole document or one element's subtree
#[derive(Clone, Copy)]
pub(crate) enum Scope<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

impl<'a> Scope<'a> {
    fn select(&self, selector: &Selector) -> Vec<ElementRef<'a>> {
        match self {
            Scope::Document(document) => document.select(selector).collect(),
            Scope::Element(element) => element.select(selector).collect(),
        }
    }
}

/// Normalizes raw multi-match output per the singular/plural collapsing
/// rule: no values is `null`, exactly one is the unwrapped scalar, two or
/// more is a sequence
pub(crate) fn collapse(mut values: Vec<Value>) -> Value {
    match values.len() {
        0 => Value::Null,
        1 => values.remove(0),
        _ => Value::Array(values),
    }
}

fn parse_selector(field: &str, css: &str) -> ConfigResult<Selector> {
    Selector::parse(css).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: css.to_string(),
    })
}

/// Compiles a bare selector string, splitting off an `@attribute` suffix
fn compile_simple(field: &str, text: &str) -> ConfigResult<Instruction> {
    match text.split_once('@') {
        Some((css, attribute)) => Ok(Instruction::Simple {
            selector: parse_selector(field, css.trim())?,
            attribute: Some(attribute.trim().to_string()),
        }),
        None => Ok(Instruction::Simple {
            selector: parse_selector(field, text)?,
            attribute: None,
        }),
    }
}

impl RawInstruction {
    fn compile(&self, field: &str) -> ConfigResult<Instruction> {
        match self {
            RawInstruction::Simple(text) => compile_simple(field, text),
            RawInstruction::Structured(raw) => raw.compile(field),
        }
    }
}

impl RawStructured {
    fn compile(&self, field: &str) -> ConfigResult<Instruction> {
        if self.extract == ExtractMode::Table {
            return self.compile_table(field);
        }

        if self.extract == ExtractMode::Attr && self.attribute.is_none() {
            return Err(ConfigError::InvalidInstruction {
                field: field.to_string(),
                message: "'attr' extraction requires an 'attribute'".to_string(),
            });
        }

        if self.extract == ExtractMode::ChildAttr && self.child_attribute.is_none() {
            return Err(ConfigError::InvalidInstruction {
                field: field.to_string(),
                message: "'child_attr' extraction requires a 'child_attribute'".to_string(),
            });
        }

        let child = match &self.child {
            Some(css) => Some(parse_selector(field, css)?),
            // child_attr falls back to the first descendant of any kind
            None if self.extract == ExtractMode::ChildAttr => Some(parse_selector(field, "*")?),
            None => None,
        };

        Ok(Instruction::Structured(StructuredInstruction {
            selector: parse_selector(field, &self.selector)?,
            mode: self.extract,
            attribute: self.attribute.clone(),
            multiple: self.multiple,
            child,
            child_attribute: self.child_attribute.clone(),
        }))
    }

    fn compile_table(&self, field: &str) -> ConfigResult<Instruction> {
        if self.columns.is_empty() {
            return Err(ConfigError::InvalidInstruction {
                field: field.to_string(),
                message: "'table' extraction requires a non-empty 'columns' list".to_string(),
            });
        }

        let columns = self
            .columns
            .iter()
            .map(|column| column.compile(field))
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Instruction::Table {
            selector: parse_selector(field, &self.selector)?,
            columns,
        })
    }
}

impl RawColumn {
    fn compile(&self, field: &str) -> ConfigResult<Column> {
        match self {
            RawColumn::Simple(text) => Ok(Column {
                name: None,
                cell: compile_simple(field, text)?,
            }),
            RawColumn::Structured(raw) => {
                if raw.extract == ExtractMode::Table {
                    return Err(ConfigError::InvalidInstruction {
                        field: field.to_string(),
                        message: "nested 'table' columns are not supported".to_string(),
                    });
                }

                // A column selector carrying an @attribute suffix behaves
                // as a simple attribute column, whatever else is set.
                let cell = if raw.selector.contains('@') {
                    compile_simple(field, &raw.selector)?
                } else {
                    RawStructured {
                        multiple: false,
                        ..raw.clone()
                    }
                    .compile(field)?
                };

                Ok(Column {
                    name: raw.name.clone(),
                    cell,
                })
            }
        }
    }
}

impl Instruction {
    /// Resolves this instruction against a scope
    pub(crate) fn eval(&self, scope: Scope<'_>) -> Value {
        match self {
            Instruction::Simple {
                selector,
                attribute,
            } => {
                let values: Vec<Value> = scope
                    .select(selector)
                    .into_iter()
                    .map(|element| match attribute {
                        Some(name) => attr_or_null(element, name),
                        None => Value::String(element_text(element)),
                    })
                    .collect();
                collapse(values)
            }

            Instruction::Structured(structured) => structured.eval(scope),

            Instruction::Table { selector, columns } => {
                let rows = scope.select(selector);
                let mut out = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut record = FieldMap::new();
                    for (index, column) in columns.iter().enumerate() {
                        let key = column
                            .name
                            .clone()
                            .unwrap_or_else(|| format!("column_{}", index));
                        record.insert(key, column.eval(row));
                    }
                    out.push(Value::Object(record));
                }
                Value::Array(out)
            }
        }
    }
}

impl StructuredInstruction {
    fn eval(&self, scope: Scope<'_>) -> Value {
        let elements = scope.select(&self.selector);
        if elements.is_empty() {
            return Value::Null;
        }

        let considered: &[ElementRef<'_>] = if self.multiple {
            &elements
        } else {
            &elements[..1]
        };

        // Per-element failures are dropped, not recorded as null.
        let values: Vec<Value> = considered
            .iter()
            .filter_map(|element| self.eval_element(*element))
            .collect();

        collapse(values)
    }

    /// Extracts one value from one matched element, `None` when the
    /// element contributes nothing
    fn eval_element(&self, element: ElementRef<'_>) -> Option<Value> {
        if self.mode == ExtractMode::ChildAttr {
            let child = self.child.as_ref()?;
            let attribute = self.child_attribute.as_deref()?;
            let descendant = element.select(child).next()?;
            return descendant
                .value()
                .attr(attribute)
                .map(|v| Value::String(v.to_string()));
        }

        let target = match &self.child {
            Some(child) => element.select(child).next()?,
            None => element,
        };

        match self.mode {
            ExtractMode::Text => Some(Value::String(element_text(target))),
            ExtractMode::Html => Some(Value::String(target.html())),
            ExtractMode::Attr => {
                let attribute = self.attribute.as_deref()?;
                target
                    .value()
                    .attr(attribute)
                    .map(|v| Value::String(v.to_string()))
            }
            ExtractMode::ChildAttr | ExtractMode::Table => None,
        }
    }
}

impl Column {
    /// Evaluates this column against one row's subtree, first match only
    fn eval(&self, row: ElementRef<'_>) -> Value {
        match &self.cell {
            Instruction::Simple {
                selector,
                attribute,
            } => match row.select(selector).next() {
                Some(element) => match attribute {
                    Some(name) => attr_or_null(element, name),
                    None => Value::String(element_text(element)),
                },
                None => Value::Null,
            },

            Instruction::Structured(structured) => match row.select(&structured.selector).next() {
                Some(element) => structured.eval_element(element).unwrap_or(Value::Null),
                None => Value::Null,
            },

            Instruction::Table { .. } => Value::Null,
        }
    }
}

/// CSS-selector-driven extraction over a caller-supplied field map
#[derive(Debug)]
pub struct SelectorStrategy {
    fields: Vec<(String, Instruction)>,
}

impl SelectorStrategy {
    /// Compiles the raw field -> instruction map
    pub fn compile(selectors: &BTreeMap<String, RawInstruction>) -> ConfigResult<Self> {
        let fields = selectors
            .iter()
            .map(|(name, raw)| Ok((name.clone(), raw.compile(name)?)))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { fields })
    }

    /// Resolves every field independently, one output entry per key
    pub fn extract(&self, document: &Html, _url: &str) -> FieldMap {
        let scope = Scope::Document(document);
        self.fields
            .iter()
            .map(|(name, instruction)| (name.clone(), instruction.eval(scope)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strategy(config: serde_json::Value) -> SelectorStrategy {
        let raw: BTreeMap<String, RawInstruction> = serde_json::from_value(config).unwrap();
        SelectorStrategy::compile(&raw).unwrap()
    }

    fn extract(config: serde_json::Value, html: &str) -> FieldMap {
        let document = Html::parse_document(html);
        strategy(config).extract(&document, "https://example.com/")
    }

    #[test]
    fn test_simple_text_single_match() {
        let fields = extract(json!({"title": "h1"}), "<h1>Hello</h1>");
        assert_eq!(fields["title"], json!("Hello"));
    }

    #[test]
    fn test_simple_text_multiple_matches() {
        let fields = extract(
            json!({"items": "li"}),
            "<ul><li>one</li><li>two</li><li>three</li></ul>",
        );
        assert_eq!(fields["items"], json!(["one", "two", "three"]));
    }

    #[test]
    fn test_simple_text_no_match_is_null() {
        let fields = extract(json!({"missing": ".nope"}), "<p>content</p>");
        assert_eq!(fields["missing"], json!(null));
    }

    #[test]
    fn test_simple_attribute_suffix() {
        let fields = extract(
            json!({"links": "a.x@href"}),
            r#"<a class="x" href="/one">1</a><a class="x" href="/two">2</a>"#,
        );
        assert_eq!(fields["links"], json!(["/one", "/two"]));
    }

    #[test]
    fn test_simple_attribute_single_match_is_scalar() {
        let fields = extract(
            json!({"link": "a@href"}),
            r#"<a href="/only">only</a>"#,
        );
        assert_eq!(fields["link"], json!("/only"));
    }

    #[test]
    fn test_simple_attribute_missing_stays_null_per_element() {
        let fields = extract(
            json!({"links": "a@href"}),
            r#"<a href="/one">1</a><a>2</a>"#,
        );
        assert_eq!(fields["links"], json!(["/one", null]));
    }

    #[test]
    fn test_structured_text_default_mode() {
        let fields = extract(
            json!({"name": {"selector": ".name"}}),
            r#"<span class="name"> Widget </span>"#,
        );
        assert_eq!(fields["name"], json!("Widget"));
    }

    #[test]
    fn test_structured_html_mode() {
        let fields = extract(
            json!({"markup": {"selector": "p", "extract": "html"}}),
            "<div><p>hi</p></div>",
        );
        assert_eq!(fields["markup"], json!("<p>hi</p>"));
    }

    #[test]
    fn test_structured_attr_mode() {
        let fields = extract(
            json!({"target": {"selector": "a", "extract": "attr", "attribute": "href"}}),
            r#"<a href="/go">go</a>"#,
        );
        assert_eq!(fields["target"], json!("/go"));
    }

    #[test]
    fn test_structured_attr_failures_dropped() {
        // Elements without the attribute contribute nothing, so two
        // anchors collapse to one scalar.
        let fields = extract(
            json!({"targets": {"selector": "a", "extract": "attr", "attribute": "href"}}),
            r#"<a>plain</a><a href="/go">go</a>"#,
        );
        assert_eq!(fields["targets"], json!("/go"));
    }

    #[test]
    fn test_structured_multiple_false_takes_first_only() {
        let fields = extract(
            json!({"first": {"selector": "li", "multiple": false}}),
            "<ul><li>one</li><li>two</li></ul>",
        );
        assert_eq!(fields["first"], json!("one"));
    }

    #[test]
    fn test_structured_multiple_true_single_value_unwrapped() {
        let fields = extract(
            json!({"only": {"selector": "li", "multiple": true}}),
            "<ul><li>one</li></ul>",
        );
        assert_eq!(fields["only"], json!("one"));
    }

    #[test]
    fn test_structured_no_match_is_null() {
        let fields = extract(
            json!({"missing": {"selector": ".absent", "multiple": false}}),
            "<p>x</p>",
        );
        assert_eq!(fields["missing"], json!(null));
    }

    #[test]
    fn test_child_refinement() {
        let fields = extract(
            json!({"names": {"selector": "li", "child": "span.name"}}),
            r#"<ul>
                <li><span class="name">a</span></li>
                <li>no span here</li>
                <li><span class="name">b</span></li>
            </ul>"#,
        );
        // The middle element's child lookup fails and contributes no value.
        assert_eq!(fields["names"], json!(["a", "b"]));
    }

    #[test]
    fn test_child_attr_mode() {
        let fields = extract(
            json!({"links": {
                "selector": "li",
                "extract": "child_attr",
                "child": "a",
                "child_attribute": "href"
            }}),
            r#"<ul><li><a href="/a">a</a></li><li><a href="/b">b</a></li></ul>"#,
        );
        assert_eq!(fields["links"], json!(["/a", "/b"]));
    }

    #[test]
    fn test_table_extraction() {
        let fields = extract(
            json!({"rows": {
                "selector": "table tr",
                "extract": "table",
                "columns": [
                    {"selector": "td:nth-child(1)", "name": "label"},
                    "td:nth-child(2) a@href",
                    {"selector": "td:nth-child(2)"}
                ]
            }}),
            r#"<table>
                <tr><td>first</td><td><a href="/1">one</a></td></tr>
                <tr><td>second</td><td>plain</td></tr>
            </table>"#,
        );
        assert_eq!(
            fields["rows"],
            json!([
                {"label": "first", "column_1": "/1", "column_2": "one"},
                {"label": "second", "column_1": null, "column_2": "plain"}
            ])
        );
    }

    #[test]
    fn test_table_row_count_matches_selector_matches() {
        let fields = extract(
            json!({"rows": {
                "selector": "li",
                "extract": "table",
                "columns": ["span"]
            }}),
            "<ul><li><span>a</span></li><li></li><li><span>c</span></li></ul>",
        );
        let rows = fields["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], json!({"column_0": null}));
    }

    #[test]
    fn test_table_without_columns_rejected() {
        let raw: BTreeMap<String, RawInstruction> = serde_json::from_value(json!({
            "rows": {"selector": "tr", "extract": "table"}
        }))
        .unwrap();
        assert!(matches!(
            SelectorStrategy::compile(&raw).unwrap_err(),
            ConfigError::InvalidInstruction { .. }
        ));
    }

    #[test]
    fn test_attr_without_attribute_rejected() {
        let raw: BTreeMap<String, RawInstruction> = serde_json::from_value(json!({
            "bad": {"selector": "a", "extract": "attr"}
        }))
        .unwrap();
        assert!(SelectorStrategy::compile(&raw).is_err());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let raw: BTreeMap<String, RawInstruction> =
            serde_json::from_value(json!({"bad": "p[unclosed"})).unwrap();
        assert!(matches!(
            SelectorStrategy::compile(&raw).unwrap_err(),
            ConfigError::InvalidSelector { .. }
        ));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let document = Html::parse_document(
            r#"<h1>t</h1><ul><li><a href="/a">a</a></li><li><a href="/b">b</a></li></ul>"#,
        );
        let strategy = strategy(json!({
            "title": "h1",
            "links": {"selector": "li", "extract": "child_attr",
                      "child": "a", "child_attribute": "href"}
        }));
        let first = strategy.extract(&document, "https://example.com/");
        let second = strategy.extract(&document, "https://example.com/");
        assert_eq!(first, second);
    }

    #[test]
    fn test_collapse_law() {
        assert_eq!(collapse(vec![]), json!(null));
        assert_eq!(collapse(vec![json!("x")]), json!("x"));
        assert_eq!(collapse(vec![json!("x"), json!("y")]), json!(["x", "y"]));
    }

    #[test]
    fn test_instruction_roundtrip_from_toml() {
        // The same wire contract deserializes from TOML job files.
        let raw: BTreeMap<String, RawInstruction> = toml::from_str(
            r#"
title = "h1"

[rows]
selector = "tr"
extract = "table"
columns = ["td:first-child", "td:last-child a@href"]
"#,
        )
        .unwrap();
        assert!(SelectorStrategy::compile(&raw).is_ok());
    }
}

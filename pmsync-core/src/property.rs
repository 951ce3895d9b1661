//! Typed reads out of a page's raw properties.
//!
//! [`try_read`] distinguishes an absent value (`Ok(None)`) from a property
//! that exists but has the wrong shape (`Err`). [`read`] and the typed
//! helpers collapse the latter into absence after logging a warning.

use serde::Deserialize;

use crate::error::PropertyError;
use crate::model::{FormulaValue, Page, PropertyValue};
use crate::types::PageId;

/// The kinds of property the sync engine knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// First rich-text segment of a title property.
    Title,
    /// Label of the selected option.
    Select,
    /// Result of a formula, only when the formula evaluates to a number.
    FormulaNumber,
    /// Ids of related pages, possibly empty.
    Relation,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Title => "title",
            FieldKind::Select => "select",
            FieldKind::FormulaNumber => "formula",
            FieldKind::Relation => "relation",
        }
    }
}

/// A successfully read value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Ids(Vec<PageId>),
}

/// Read `name` from `page` as `kind`, reporting malformed shapes as errors.
pub fn try_read(
    page: &Page,
    name: &str,
    kind: FieldKind,
) -> Result<Option<FieldValue>, PropertyError> {
    let Some(raw) = page.properties.get(name) else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    let value = PropertyValue::deserialize(raw).map_err(|source| PropertyError::Malformed {
        name: name.to_owned(),
        source,
    })?;

    match (kind, value) {
        (FieldKind::Title, PropertyValue::Title { title }) => Ok(title
            .into_iter()
            .next()
            .map(|segment| segment.plain_text)
            .filter(|text| !text.is_empty())
            .map(FieldValue::Text)),
        (FieldKind::Select, PropertyValue::Select { select }) => Ok(select
            .map(|option| option.name)
            .filter(|label| !label.is_empty())
            .map(FieldValue::Text)),
        (FieldKind::FormulaNumber, PropertyValue::Formula { formula }) => match formula {
            FormulaValue::Number { number } => {
                Ok(number.filter(|n| n.is_finite()).map(FieldValue::Number))
            }
            FormulaValue::Other => Ok(None),
        },
        (FieldKind::Relation, PropertyValue::Relation { relation }) => Ok(Some(FieldValue::Ids(
            relation.into_iter().map(|r| r.id).collect(),
        ))),
        (kind, other) => Err(PropertyError::KindMismatch {
            name: name.to_owned(),
            expected: kind.name(),
            found: other.kind_name(),
        }),
    }
}

/// Read `name` from `page` as `kind`; malformed values are logged and absent.
pub fn read(page: &Page, name: &str, kind: FieldKind) -> Option<FieldValue> {
    match try_read(page, name, kind) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                page = %page.id,
                property = name,
                kind = kind.name(),
                error = %err,
                "unreadable property treated as absent"
            );
            None
        }
    }
}

pub fn title(page: &Page, name: &str) -> Option<String> {
    match read(page, name, FieldKind::Title)? {
        FieldValue::Text(s) => Some(s),
        _ => None,
    }
}

pub fn select(page: &Page, name: &str) -> Option<String> {
    match read(page, name, FieldKind::Select)? {
        FieldValue::Text(s) => Some(s),
        _ => None,
    }
}

pub fn formula_number(page: &Page, name: &str) -> Option<f64> {
    match read(page, name, FieldKind::FormulaNumber)? {
        FieldValue::Number(n) => Some(n),
        _ => None,
    }
}

pub fn relation(page: &Page, name: &str) -> Option<Vec<PageId>> {
    match read(page, name, FieldKind::Relation)? {
        FieldValue::Ids(ids) => Some(ids),
        _ => None,
    }
}

/// First readable title among `names`, in order.
pub fn first_title<'a>(page: &Page, names: impl IntoIterator<Item = &'a str>) -> Option<String> {
    names.into_iter().find_map(|name| title(page, name))
}

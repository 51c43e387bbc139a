// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Client-side compound predicate: case-insensitive substring search over
//! an entity's search fields, ANDed with exact matches over its facet
//! fields. Operates on the serialized row so one engine serves every
//! entity type.

use serde_json::Value;

use crate::collection::Entity;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    text: String,
    facets: Vec<(&'static str, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_facet(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.facets.push((field, value.into()));
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_facet(&mut self, field: &'static str, value: Option<String>) {
        self.facets.retain(|(facet, _)| *facet != field);
        if let Some(value) = value {
            self.facets.push((field, value));
        }
    }

    pub fn facet(&self, field: &'static str) -> Option<&str> {
        self.facets
            .iter()
            .find(|(facet, _)| *facet == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.facets.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.facets.is_empty()
    }

    pub fn matches<E: Entity>(&self, record: &E) -> bool {
        if self.is_empty() {
            return true;
        }
        let Ok(value) = serde_json::to_value(record) else {
            return false;
        };
        let Some(row) = value.as_object() else {
            return false;
        };

        let needle = self.text.trim().to_lowercase();
        if !needle.is_empty() {
            let hit = E::SEARCH.iter().any(|field| {
                row.get(*field)
                    .map(field_text)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            });
            if !hit {
                return false;
            }
        }

        self.facets.iter().all(|(field, expected)| {
            row.get(*field)
                .map(field_text)
                .is_some_and(|text| text == *expected)
        })
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

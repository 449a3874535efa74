use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub path: String,
    pub url: String,
}

/// Field-level form errors, keyed by field name.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend_from_garde(&mut self, errors: &garde::Errors) {
        for (path, error) in errors.flatten() {
            // nested paths never occur in forms, keep the field name only
            let field = path.rsplit('.').next().unwrap_or(path.as_str());
            self.add(field, error.to_string());
        }
    }
}

impl From<garde::Errors> for FormErrors {
    fn from(errors: garde::Errors) -> Self {
        let mut form_errors = FormErrors::default();
        form_errors.extend_from_garde(&errors);
        form_errors
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

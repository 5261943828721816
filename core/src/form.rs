//! Multipart form payloads for the PUT endpoints.
//!
//! # Design
//! The API treats an omitted form field as "leave unchanged", so encoders only
//! emit fields whose value is `Some`. Keys are bracketed by entity
//! (`user[email]`) and nest for sub-objects
//! (`workout[workout_summary][file][url]`).

use chrono::{DateTime, NaiveDate, Utc};

use crate::time_format;

/// Ordered `(name, value)` pairs of a form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: Vec<(String, String)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start writing fields under a top-level entity key.
    pub fn scope(&mut self, entity: &str) -> FormScope<'_> {
        FormScope {
            prefix: entity.to_string(),
            fields: &mut self.fields,
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn content_type(boundary: &str) -> String {
        format!("multipart/form-data; boundary={boundary}")
    }

    /// Render a `multipart/form-data` body delimited by `boundary`.
    pub fn to_multipart(&self, boundary: &str) -> String {
        let mut body = String::new();
        for (name, value) in &self.fields {
            body.push_str("--");
            body.push_str(boundary);
            body.push_str("\r\n");
            body.push_str("Content-Disposition: form-data; name=\"");
            body.push_str(&name.replace('"', "%22"));
            body.push_str("\"\r\n\r\n");
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str("--");
        body.push_str(boundary);
        body.push_str("--\r\n");
        body
    }
}

/// Writes `<prefix>[<name>]` keys, skipping absent values.
pub struct FormScope<'a> {
    prefix: String,
    fields: &'a mut Vec<(String, String)>,
}

impl FormScope<'_> {
    fn push(&mut self, name: &str, value: String) {
        self.fields.push((format!("{}[{name}]", self.prefix), value));
    }

    /// Scope for a nested object, e.g. `workout[workout_summary]`.
    pub fn nested(&mut self, name: &str) -> FormScope<'_> {
        FormScope {
            prefix: format!("{}[{name}]", self.prefix),
            fields: &mut *self.fields,
        }
    }

    pub fn text(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(name, value.to_string());
        }
    }

    pub fn integer(&mut self, name: &str, value: Option<i64>) {
        if let Some(value) = value {
            self.push(name, value.to_string());
        }
    }

    pub fn float(&mut self, name: &str, value: Option<f64>) {
        if let Some(value) = value {
            self.push(name, format!("{value:.6}"));
        }
    }

    pub fn date(&mut self, name: &str, value: Option<NaiveDate>) {
        if let Some(value) = value {
            self.push(name, time_format::format_date(value));
        }
    }

    pub fn datetime(&mut self, name: &str, value: Option<DateTime<Utc>>) {
        if let Some(value) = value {
            self.push(name, time_format::format_datetime(value));
        }
    }
}

/// An entity that can be sent as a PUT form body.
pub trait FormEncode {
    /// Top-level key, e.g. `user` or `heart_rate_zone`.
    const ENTITY: &'static str;

    fn write_fields(&self, form: &mut FormScope<'_>);

    fn to_form_fields(&self) -> FormFields {
        let mut form = FormFields::new();
        self.write_fields(&mut form.scope(Self::ENTITY));
        form
    }
}

//! Fixed body skeletons with `${name}` placeholders.
//!
//! Action endpoints often take a constant JSON document with one or two
//! variable fields, e.g. `{"os-getConsoleOutput": {"length": ${length}}}`.
//! The `${...}` syntax leaves JSON braces alone.

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Part {
    Text(String),
    Placeholder(String),
}

/// A parsed literal body template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralBody {
    raw: String,
    parts: Vec<Part>,
    content_type: String,
}

impl LiteralBody {
    /// Parse a template sent with the given content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] for an unterminated or empty
    /// `${...}` placeholder.
    pub fn parse(template: &str, content_type: impl Into<String>) -> Result<Self> {
        let mut parts = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            let (text, tail) = rest.split_at(start);
            if !text.is_empty() {
                parts.push(Part::Text(text.to_string()));
            }
            let tail = tail.get(2..).unwrap_or_default();
            let end = tail.find('}').ok_or_else(|| {
                Error::invalid_descriptor(format!("unterminated placeholder in body '{template}'"))
            })?;
            let (name, after) = tail.split_at(end);
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::invalid_descriptor(format!(
                    "empty placeholder in body '{template}'"
                )));
            }
            parts.push(Part::Placeholder(name.to_string()));
            rest = after.get(1..).unwrap_or_default();
        }
        if !rest.is_empty() {
            parts.push(Part::Text(rest.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            parts,
            content_type: content_type.into(),
        })
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Content type sent with the rendered body.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Placeholder(name) => Some(name.as_str()),
            Part::Text(_) => None,
        })
    }

    /// Render the template, asking `resolve` for each placeholder.
    pub fn render<F>(&self, mut resolve: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let mut out = String::with_capacity(self.raw.len());
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Placeholder(name) => out.push_str(&resolve(name)?),
            }
        }
        Ok(out)
    }
}

//! Parsed path templates such as `/stacks/{name}/{id}`.

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A path with named `{placeholder}`s, parsed once when a descriptor is built.
///
/// The raw template is kept so that middleware and logs can show the pattern
/// (`/stacks/{name}/{id}`) rather than the resolved path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] for unbalanced braces, empty or
    /// nested placeholders, or a template that does not start with `/`.
    pub fn parse(template: &str) -> Result<Self> {
        if !template.starts_with('/') {
            return Err(Error::invalid_descriptor(format!(
                "path template '{template}' must start with '/'"
            )));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' | '/' => {
                                return Err(Error::invalid_descriptor(format!(
                                    "nested or unterminated placeholder in '{template}'"
                                )));
                            }
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(Error::invalid_descriptor(format!(
                            "unterminated placeholder in '{template}'"
                        )));
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(Error::invalid_descriptor(format!(
                            "empty placeholder in '{template}'"
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                '}' => {
                    return Err(Error::invalid_descriptor(format!(
                        "unbalanced '}}' in '{template}'"
                    )));
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// Get the template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns `true` if the template contains the placeholder.
    #[must_use]
    pub fn references(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Render the template, asking `resolve` for each placeholder value.
    ///
    /// Values are inserted verbatim: encoding is the caller's job.
    pub fn render<F>(&self, mut resolve: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let mut path = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => path.push_str(&resolve(name)?),
            }
        }
        Ok(path)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_list_placeholders() {
        let template = PathTemplate::parse("/stacks/{name}/{id}/resources").expect("valid");
        assert_eq!(template.as_str(), "/stacks/{name}/{id}/resources");
        assert_eq!(template.placeholders().collect::<Vec<_>>(), ["name", "id"]);
        assert!(template.references("id"));
        assert!(!template.references("resource"));
    }

    #[test]
    fn render_substitutes_in_order() {
        let template = PathTemplate::parse("/stacks/{name}/{id}").expect("valid");
        let path = template
            .render(|name| Ok(format!("<{name}>")))
            .expect("render");
        assert_eq!(path, "/stacks/<name>/<id>");
    }

    #[test]
    fn render_propagates_resolver_errors() {
        let template = PathTemplate::parse("/volumes/{id}").expect("valid");
        let err = template
            .render(|name| Err(Error::missing_path_parameter(name)))
            .expect_err("should fail");
        assert!(matches!(err, Error::MissingPathParameter { name } if name == "id"));
    }

    #[test]
    fn placeholder_inside_a_segment() {
        let template = PathTemplate::parse("/images/{id}.json").expect("valid");
        let path = template.render(|_| Ok("abc".to_string())).expect("render");
        assert_eq!(path, "/images/abc.json");
    }

    #[test]
    fn rejects_malformed_templates() {
        for bad in [
            "stacks/{id}",
            "/stacks/{id",
            "/stacks/id}",
            "/stacks/{}",
            "/stacks/{a{b}}",
            "/stacks/{a/b}",
        ] {
            let err = PathTemplate::parse(bad).expect_err(bad);
            assert!(err.is_configuration_error(), "{bad}: {err}");
        }
    }
}

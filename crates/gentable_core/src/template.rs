//! Pre-compiled `${col}` template segments (spec §9 "Template references").
//!
//! Templates are compiled once, at table-load time, into an ordered list of
//! literal/reference segments rather than re-scanned at every row.

use serde::{Deserialize, Serialize};

/// One segment of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// A literal span of text, copied verbatim.
    Literal(String),
    /// A `${col}` reference to another column's rendered value.
    Reference(String),
}

/// A template pre-compiled into an ordered sequence of segments.
///
/// # Examples
///
/// ```
/// use gentable_core::Template;
///
/// let tmpl = Template::compile("Summarize: ${body} (tone: ${tone})");
/// assert_eq!(tmpl.references(), vec!["body".to_string(), "tone".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Compile a raw template string containing `${col}` placeholders.
    pub fn compile(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let bytes = raw.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
                if let Some(end) = raw[i + 2..].find('}') {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let name = raw[i + 2..i + 2 + end].to_string();
                    segments.push(Segment::Reference(name));
                    i = i + 2 + end + 1;
                    continue;
                }
            }
            literal.push(raw[i..].chars().next().unwrap());
            i += raw[i..].chars().next().unwrap().len_utf8();
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Self { segments }
    }

    /// The column names referenced by this template, in first-occurrence order,
    /// deduplicated.
    pub fn references(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for seg in &self.segments {
            if let Segment::Reference(name) = seg {
                if seen.insert(name.clone()) {
                    out.push(name.clone());
                }
            }
        }
        out
    }

    /// Render the template by substituting each reference with the string
    /// returned by `resolve`.
    pub fn render(&self, mut resolve: impl FnMut(&str) -> String) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Reference(name) => out.push_str(&resolve(name)),
            }
        }
        out
    }

    /// The compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_literal_only() {
        let t = Template::compile("hello world");
        assert!(t.references().is_empty());
        assert_eq!(t.render(|_| unreachable!()), "hello world");
    }

    #[test]
    fn compiles_mixed_segments() {
        let t = Template::compile("Hi ${name}, your score is ${score}.");
        assert_eq!(t.references(), vec!["name".to_string(), "score".to_string()]);
        let rendered = t.render(|col| match col {
            "name" => "Ada".to_string(),
            "score" => "97".to_string(),
            _ => unreachable!(),
        });
        assert_eq!(rendered, "Hi Ada, your score is 97.");
    }

    #[test]
    fn dedupes_repeated_references() {
        let t = Template::compile("${x} + ${x} = ${y}");
        assert_eq!(t.references(), vec!["x".to_string(), "y".to_string()]);
    }
}

//! Prompt templates stored as data files with `{{placeholder}}` markers

use std::collections::BTreeMap;

use crate::{CityScienceError, Result};

pub static CITIZEN_BULLETIN: PromptTemplate = PromptTemplate::new(
    "citizen_bulletin",
    include_str!("../../templates/citizen_bulletin.txt"),
);

pub static BUILD_REPORT: PromptTemplate = PromptTemplate::new(
    "build_report",
    include_str!("../../templates/build_report.txt"),
);

pub static MANAGEMENT_BULLETIN: PromptTemplate = PromptTemplate::new(
    "management_bulletin",
    include_str!("../../templates/management_bulletin.txt"),
);

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A named prompt body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    name: &'static str,
    body: &'static str,
}

impl PromptTemplate {
    #[must_use]
    pub const fn new(name: &'static str, body: &'static str) -> Self {
        Self { name, body }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn body(&self) -> &'static str {
        self.body
    }

    /// Distinct placeholder names, in order of first appearance
    #[must_use]
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for segment in segments(self.body) {
            if let Segment::Placeholder(name) = segment
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        names
    }

    /// Substitute every placeholder in one pass.
    ///
    /// Substituted values are never scanned again, so user text containing
    /// `{{...}}` is inserted literally. A placeholder without a value fails.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> Result<String> {
        let mut output = String::with_capacity(self.body.len() + 1024);
        for segment in segments(self.body) {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values.get(name).ok_or_else(|| {
                        CityScienceError::general(format!(
                            "Template '{}' has no value for placeholder '{}'",
                            self.name, name
                        ))
                    })?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Split a body into literal text and placeholders. Anything between
/// braces that is not a lowercase identifier stays literal text.
fn segments(body: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };
        let name = &after_open[..end];
        if is_placeholder_name(name) {
            if start > 0 {
                segments.push(Segment::Text(&rest[..start]));
            }
            segments.push(Segment::Placeholder(name));
        } else {
            segments.push(Segment::Text(&rest[..start + OPEN.len()]));
            rest = after_open;
            continue;
        }
        rest = &after_open[end + CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// Metadata that can be specified at the top of a document.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// Extra stylesheets, relative to the document.
    #[serde(default)]
    css: Option<Stylesheets>,
}

/// The `css` key accepts either a single path or a list of paths.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum Stylesheets {
    One(String),
    Many(Vec<String>),
}

impl DocumentMetadata {
    /// The user stylesheet paths, in the order they were listed.
    pub fn css_paths(&self) -> Vec<&str> {
        match &self.css {
            None => Vec::new(),
            Some(Stylesheets::One(path)) => vec![path.as_str()],
            Some(Stylesheets::Many(paths)) => paths.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Clone, Copy)]
enum Format {
    /// Delimited by `---`.
    Yaml,
    /// Delimited by `+++`.
    Toml,
}

impl Format {
    fn delimiter(self) -> &'static str {
        match self {
            Format::Yaml => "---",
            Format::Toml => "+++",
        }
    }

    /// Parse a frontmatter block. A block that is not a mapping carries no
    /// metadata.
    fn parse(self, block: &str) -> Fallible<DocumentMetadata> {
        // An empty block is an empty mapping.
        if block.trim().is_empty() {
            return Ok(DocumentMetadata::default());
        }
        match self {
            Format::Yaml => {
                let value: serde_yaml::Value = serde_yaml::from_str(block).map_err(|e| {
                    ErrorReport::new(format!("Failed to parse YAML frontmatter: {e}"))
                })?;
                if !value.is_mapping() {
                    return Ok(DocumentMetadata::default());
                }
                serde_yaml::from_value(value).map_err(|e| {
                    ErrorReport::new(format!("Invalid YAML frontmatter: {e}"))
                })
            }
            Format::Toml => {
                // A TOML document is always a table.
                let table: toml::Table = toml::from_str(block).map_err(|e| {
                    ErrorReport::new(format!("Failed to parse TOML frontmatter: {e}"))
                })?;
                toml::Value::Table(table).try_into::<DocumentMetadata>().map_err(|e| {
                    ErrorReport::new(format!("Invalid TOML frontmatter: {e}"))
                })
            }
        }
    }
}

/// Split a document into its frontmatter metadata and its markdown body.
///
/// The body is a slice of the original text. An opening delimiter without a
/// closing one is not frontmatter, and the whole text is the body.
pub fn extract_frontmatter(text: &str) -> Fallible<(DocumentMetadata, &str)> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((DocumentMetadata::default(), text));
    };
    let format = match first.trim() {
        "---" => Format::Yaml,
        "+++" => Format::Toml,
        _ => return Ok((DocumentMetadata::default(), text)),
    };
    let delimiter = format.delimiter();
    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim() == delimiter {
            let metadata = format.parse(&text[start..offset])?;
            let body = &text[offset + line.len()..];
            return Ok((metadata, body));
        }
        offset += line.len();
    }
    Ok((DocumentMetadata::default(), text))
}

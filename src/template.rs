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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use maud::Markup;
use maud::html;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::frontmatter::DocumentMetadata;
use crate::hash::integer_hash;
use crate::types::model::CardTemplate;
use crate::types::model::Model;
use crate::types::model::ModelKind;
use crate::types::model::TEMPLATE_NAME;

pub const BASE_CSS: &str = include_str!("styles/markdown.css");
pub const HIGHLIGHT_LIGHT_CSS: &str = include_str!("styles/highlight.css");
pub const HIGHLIGHT_DARK_CSS: &str = include_str!("styles/highlight-dark.css");

/// The placeholder Anki substitutes with the question field.
fn question_placeholder(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Standard => "{{Question}}",
        ModelKind::Cloze => "{{cloze:Question}}",
    }
}

fn front_layout(kind: ModelKind) -> Markup {
    html! {
        div.card {
            div.question { (question_placeholder(kind)) }
        }
    }
}

fn back_layout(kind: ModelKind) -> Markup {
    html! {
        div.card {
            div.question { (question_placeholder(kind)) }
            hr;
            div.answer { "{{Answer}}" }
        }
    }
}

pub fn card_template(kind: ModelKind) -> CardTemplate {
    CardTemplate {
        name: TEMPLATE_NAME.to_string(),
        qfmt: front_layout(kind).into_string(),
        afmt: back_layout(kind).into_string(),
    }
}

/// Build the model of the given kind for a deck title.
///
/// The model name doubles as the input to the id hash, so both are stable.
pub fn build_model(deck_title: &str, kind: ModelKind, css: String) -> Model {
    let name = match kind {
        ModelKind::Standard => format!("{deck_title} model"),
        ModelKind::Cloze => format!("{deck_title} cloze model"),
    };
    Model {
        id: integer_hash(&name),
        name,
        kind,
        template: card_template(kind),
        css,
    }
}

/// Concatenate the bundled stylesheets and the user stylesheets, in that
/// order.
pub fn merge_stylesheets(user: &[String]) -> String {
    format!(
        "{BASE_CSS}\n{HIGHLIGHT_LIGHT_CSS}\n{HIGHLIGHT_DARK_CSS}\n{}",
        user.join("\n")
    )
}

/// Read the user stylesheets named in the frontmatter, relative to the
/// document's directory, and merge them with the bundled ones.
pub fn read_stylesheets(document_dir: &Path, metadata: &DocumentMetadata) -> Fallible<String> {
    let user: Vec<String> = metadata
        .css_paths()
        .into_iter()
        .map(|path| {
            let path: PathBuf = document_dir.join(path);
            read_to_string(&path).map_err(|e| {
                ErrorReport::new(format!(
                    "Failed to read stylesheet '{}': {e}",
                    path.display()
                ))
            })
        })
        .collect::<Fallible<Vec<_>>>()?;
    Ok(merge_stylesheets(&user))
}

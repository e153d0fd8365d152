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

/// The fields of every model, in order.
pub const FIELDS: [&str; 3] = ["Question", "Answer", "Guid"];

/// Name of the single template in each model.
pub const TEMPLATE_NAME: &str = "Card 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Front/back cards.
    Standard,
    /// Cloze deletion cards.
    Cloze,
}

impl ModelKind {
    /// The model type number Anki stores.
    pub fn anki_type(self) -> i64 {
        match self {
            ModelKind::Standard => 0,
            ModelKind::Cloze => 1,
        }
    }
}

/// A question layout and an answer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CardTemplate {
    pub name: String,
    pub qfmt: String,
    pub afmt: String,
}

/// A note type: fields, one card template, and a stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub kind: ModelKind,
    pub template: CardTemplate,
    pub css: String,
}

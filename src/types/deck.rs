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

use std::collections::HashSet;

use crate::hash::integer_hash;
use crate::types::model::Model;
use crate::types::note::Note;

#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub models: Vec<Model>,
    pub notes: Vec<Note>,
}

impl Deck {
    /// An empty deck. The id is derived from the name.
    pub fn new(name: String) -> Self {
        Self {
            id: integer_hash(&name),
            name,
            models: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn add_model(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn guids(&self) -> HashSet<&str> {
        self.notes.iter().map(|n| n.guid.as_str()).collect()
    }
}

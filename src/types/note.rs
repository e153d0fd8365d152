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

use crate::types::model::ModelKind;

/// One question/answer unit.
///
/// The guid is stored twice: as the note's identity, and as the value of the
/// `Guid` field so that it can be read back through AnkiConnect.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub model_id: i64,
    pub kind: ModelKind,
    pub question: String,
    pub answer: String,
    pub guid: String,
}

impl Note {
    /// Field values, in the order of [`crate::types::model::FIELDS`].
    pub fn fields(&self) -> [&str; 3] {
        [&self.question, &self.answer, &self.guid]
    }
}

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

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// `{{c<N>::...}}`, non-greedy, body may span lines.
static CLOZE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c(\d+)::[\s\S]+?\}\}").expect("valid cloze regex"));

/// Whether the text contains at least one cloze deletion.
pub fn has_clozes(text: &str) -> bool {
    CLOZE_REGEX.is_match(text)
}

/// The distinct cloze numbers in the text, in ascending order.
pub fn cloze_ordinals(text: &str) -> BTreeSet<u32> {
    CLOZE_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|n| n.as_str().parse::<u32>().ok())
        .collect()
}

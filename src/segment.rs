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

use crate::dom::Handle;
use crate::dom::Node;

/// Attribute that turns any root-level element into a question.
pub const QUESTION_ATTRIBUTE: &str = "data-question";

/// The role a root-level node plays in segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An `<h2>` element.
    Heading,
    /// Any other element carrying the question attribute.
    MarkedQuestion,
    /// Everything else, including text nodes.
    Other,
}

impl NodeKind {
    pub fn is_question(self) -> bool {
        matches!(self, NodeKind::Heading | NodeKind::MarkedQuestion)
    }
}

pub fn classify(node: &Node) -> NodeKind {
    if node.is_element("h2") {
        NodeKind::Heading
    } else if node.has_attr(QUESTION_ATTRIBUTE) {
        NodeKind::MarkedQuestion
    } else {
        NodeKind::Other
    }
}

/// One question marker and the siblings that make up its answer.
pub struct Segment<'a> {
    pub question: &'a Handle,
    pub answer: &'a [Handle],
}

impl Segment<'_> {
    pub fn question_html(&self) -> String {
        self.question.to_html()
    }

    /// Question text without markup.
    pub fn question_text(&self) -> String {
        self.question.text_content()
    }

    /// The answer siblings, in order, inside a `<section>`. An empty answer
    /// renders as an empty section.
    pub fn answer_html(&self) -> String {
        let mut html = String::from("<section>");
        for node in self.answer {
            html.push_str(&node.to_html());
        }
        html.push_str("</section>");
        html
    }
}

/// Partition root-level nodes into segments.
///
/// Only the given nodes are classified; their descendants are never examined,
/// so a heading nested inside an answer stays part of that answer. Nodes
/// before the first question marker belong to no segment.
pub fn segment(nodes: &[Handle]) -> Vec<Segment<'_>> {
    let markers: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| classify(node).is_question())
        .map(|(index, _)| index)
        .collect();
    markers
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = markers.get(k + 1).copied().unwrap_or(nodes.len());
            Segment {
                question: &nodes[start],
                answer: &nodes[start + 1..end],
            }
        })
        .collect()
}

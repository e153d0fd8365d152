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

//! A minimal HTML tree built by html5ever.
//!
//! Comment nodes are never attached to the tree, so a parsed [`Document`] is
//! comment-free. After parsing the tree is only read.

use std::borrow::Cow;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::rc::Weak;

use html5ever::Attribute;
use html5ever::ParseOpts;
use html5ever::QualName;
use html5ever::parse_document;
use html5ever::serialize::Serialize;
use html5ever::serialize::SerializeOpts;
use html5ever::serialize::Serializer;
use html5ever::serialize::TraversalScope;
use html5ever::serialize::serialize;
use html5ever::tendril::StrTendril;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::ElementFlags;
use html5ever::tree_builder::NodeOrText;
use html5ever::tree_builder::QuirksMode;
use html5ever::tree_builder::TreeSink;

pub type Handle = Rc<Node>;

pub struct Node {
    pub data: NodeData,
    parent: RefCell<Option<Weak<Node>>>,
    children: RefCell<Vec<Handle>>,
}

pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
    },
    Text {
        contents: RefCell<String>,
    },
    /// Comments and processing instructions. Created by the parser but never
    /// attached.
    Comment,
}

impl Node {
    fn new(data: NodeData) -> Handle {
        Rc::new(Node {
            data,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    /// The local tag name, if this is an element.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    pub fn is_element(&self, tag: &str) -> bool {
        self.tag_name() == Some(tag)
    }

    /// The value of an attribute, if this is an element that carries it.
    pub fn attr(&self, attr_name: &str) -> Option<String> {
        match &self.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| &*a.name.local == attr_name)
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    pub fn has_attr(&self, attr_name: &str) -> bool {
        self.attr(attr_name).is_some()
    }

    pub fn children(&self) -> Vec<Handle> {
        self.children.borrow().clone()
    }

    fn parent(&self) -> Option<Handle> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Concatenated text of this node and all its descendants, without
    /// markup.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    /// Each text node of the subtree, separately, in document order.
    pub fn text_nodes(&self) -> Vec<String> {
        let mut texts = Vec::new();
        self.collect_text_nodes(&mut texts);
        texts
    }

    fn collect_text_nodes(&self, texts: &mut Vec<String>) {
        match &self.data {
            NodeData::Text { contents } => texts.push(contents.borrow().clone()),
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text_nodes(texts);
                }
            }
        }
    }

    fn collect_text(&self, text: &mut String) {
        match &self.data {
            NodeData::Text { contents } => text.push_str(&contents.borrow()),
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text(text);
                }
            }
        }
    }

    /// Serialize this node and its subtree to HTML.
    pub fn to_html(&self) -> String {
        let mut bytes: Vec<u8> = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::IncludeNode,
            ..Default::default()
        };
        // Serializing into memory only fails if the writer does.
        serialize(&mut bytes, self, opts).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Depth-first, document-order search for elements with the given tag.
    fn collect_elements(self: &Rc<Self>, tag: &str, out: &mut Vec<Handle>, first_only: bool) {
        if self.is_element(tag) {
            out.push(self.clone());
            if first_only {
                return;
            }
        }
        for child in self.children.borrow().iter() {
            if first_only && !out.is_empty() {
                return;
            }
            child.collect_elements(tag, out, first_only);
        }
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match &self.data {
            NodeData::Element { name, attrs } => {
                let include = matches!(traversal_scope, TraversalScope::IncludeNode);
                if include {
                    let attrs = attrs.borrow();
                    serializer
                        .start_elem(name.clone(), attrs.iter().map(|a| (&a.name, &*a.value)))?;
                }
                for child in self.children.borrow().iter() {
                    child.serialize(serializer, TraversalScope::IncludeNode)?;
                }
                if include {
                    serializer.end_elem(name.clone())?;
                }
                Ok(())
            }
            NodeData::Document => {
                for child in self.children.borrow().iter() {
                    child.serialize(serializer, TraversalScope::IncludeNode)?;
                }
                Ok(())
            }
            NodeData::Text { contents } => serializer.write_text(&contents.borrow()),
            NodeData::Comment => Ok(()),
        }
    }
}

/// A parsed HTML document.
pub struct Document {
    root: Handle,
}

impl Document {
    /// Parse an HTML string. Fragments are wrapped into a full document with
    /// `<html>`, `<head>` and `<body>` as browsers do.
    pub fn parse(html: &str) -> Self {
        parse_document(DomSink::default(), ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
    }

    /// The first element with this tag, in document order.
    pub fn find_first(&self, tag: &str) -> Option<Handle> {
        let mut found = Vec::new();
        self.root.collect_elements(tag, &mut found, true);
        found.into_iter().next()
    }

    /// All elements with this tag, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<Handle> {
        let mut found = Vec::new();
        self.root.collect_elements(tag, &mut found, false);
        found
    }

    /// The direct children of `<body>`.
    pub fn root_nodes(&self) -> Vec<Handle> {
        self.find_first("body")
            .map(|body| body.children())
            .unwrap_or_default()
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }

    pub fn text_nodes(&self) -> Vec<String> {
        self.root.text_nodes()
    }
}

/// Builds a [`Document`] from html5ever's tree construction callbacks.
///
/// html5ever's TreeSink takes `&self`, so mutation goes through the
/// `RefCell`s inside each node.
struct DomSink {
    document: Handle,
}

impl Default for DomSink {
    fn default() -> Self {
        Self {
            document: Node::new(NodeData::Document),
        }
    }
}

fn append_child(parent: &Handle, child: Handle) {
    detach(&child);
    *child.parent.borrow_mut() = Some(Rc::downgrade(parent));
    parent.children.borrow_mut().push(child);
}

fn detach(node: &Handle) {
    if let Some(parent) = node.parent() {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    *node.parent.borrow_mut() = None;
}

/// Append text to a node, merging it into a trailing text child if any.
fn append_text(parent: &Handle, text: &str) {
    if let Some(last) = parent.children.borrow().last() {
        if let NodeData::Text { contents } = &last.data {
            contents.borrow_mut().push_str(text);
            return;
        }
    }
    append_child(
        parent,
        Node::new(NodeData::Text {
            contents: RefCell::new(text.to_string()),
        }),
    );
}

impl TreeSink for DomSink {
    type Handle = Handle;
    type Output = Document;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        Document {
            root: self.document,
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // Lenient, like browsers.
    }

    fn get_document(&self) -> Self::Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };
        match &target.data {
            NodeData::Element { name, .. } => name,
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        Node::new(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => {
                if !matches!(node.data, NodeData::Comment) {
                    append_child(parent, node);
                }
            }
            NodeOrText::AppendText(text) => append_text(parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let Some(parent) = sibling.parent() else {
            return;
        };
        let node = match new_node {
            NodeOrText::AppendNode(node) => {
                if matches!(node.data, NodeData::Comment) {
                    return;
                }
                detach(&node);
                node
            }
            NodeOrText::AppendText(text) => {
                // Merge into a preceding text sibling if there is one.
                let siblings = parent.children.borrow();
                if let Some(index) = siblings.iter().position(|c| Rc::ptr_eq(c, sibling)) {
                    if index > 0 {
                        if let NodeData::Text { contents } = &siblings[index - 1].data {
                            contents.borrow_mut().push_str(&text);
                            return;
                        }
                    }
                }
                Node::new(NodeData::Text {
                    contents: RefCell::new(text.to_string()),
                })
            }
        };
        *node.parent.borrow_mut() = Some(Rc::downgrade(&parent));
        let mut siblings = parent.children.borrow_mut();
        let index = siblings
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        if let NodeData::Element {
            attrs: existing, ..
        } = &target.data
        {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children: Vec<Handle> = node.children.borrow_mut().drain(..).collect();
        for child in children {
            *child.parent.borrow_mut() = Some(Rc::downgrade(new_parent));
            new_parent.children.borrow_mut().push(child);
        }
    }
}

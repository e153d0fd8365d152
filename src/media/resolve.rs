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
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::dom::Document;
use crate::media::MediaKind;
use crate::media::scan::MediaPool;

/// `[sound:<path>]`, as Anki writes audio references.
static SOUND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[sound:(.*?)\]").expect("valid sound regex"));

/// The media a document references, split by whether it could be found.
#[derive(Debug, Default, PartialEq)]
pub struct ReferencedMedia {
    /// Canonical paths of referenced images, in first-reference order.
    pub images: Vec<PathBuf>,
    /// Canonical paths of referenced sounds, in first-reference order.
    pub sounds: Vec<PathBuf>,
    /// References that are neither external nor in the pool.
    pub missing: Vec<PathBuf>,
}

impl ReferencedMedia {
    /// Images then sounds.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.images.iter().chain(self.sounds.iter())
    }
}

/// Resolves media references in a document against the pool of media files
/// under the document's directory.
pub struct MediaResolver<'a> {
    /// Directory containing the document.
    directory: &'a Path,
    pool: &'a MediaPool,
}

/// Decode percent-encoded characters in a URL path (e.g., %20 to space).
fn percent_decode(s: &str) -> Option<String> {
    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// A reference with a host (`https://example.com/a.png`, `//cdn/a.png`)
/// points off the machine.
fn is_external(reference: &str) -> bool {
    if reference.starts_with("//") {
        return true;
    }
    match Url::parse(reference) {
        Ok(url) => url.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}

fn image_references(document: &Document) -> Vec<String> {
    document
        .find_all("img")
        .iter()
        .filter_map(|img| img.attr("src"))
        .collect()
}

fn sound_references(document: &Document) -> Vec<String> {
    document
        .text_nodes()
        .iter()
        .flat_map(|text| {
            SOUND_REGEX
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

impl<'a> MediaResolver<'a> {
    pub fn new(directory: &'a Path, pool: &'a MediaPool) -> Self {
        Self { directory, pool }
    }

    /// Collect the images and sounds the document references.
    pub fn resolve_document(&self, document: &Document) -> ReferencedMedia {
        let mut media = ReferencedMedia::default();
        self.resolve_all(MediaKind::Image, image_references(document), &mut media);
        self.resolve_all(MediaKind::Sound, sound_references(document), &mut media);
        media
    }

    fn resolve_all(&self, kind: MediaKind, references: Vec<String>, media: &mut ReferencedMedia) {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for reference in references {
            if reference.trim().is_empty() {
                continue;
            }
            if is_external(&reference) {
                log::debug!("Skipping external media reference: {reference}");
                continue;
            }
            match self.resolve(&reference) {
                Some(path) if self.pool.contains(kind, &path) => {
                    if seen.insert(path.clone()) {
                        match kind {
                            MediaKind::Image => media.images.push(path),
                            MediaKind::Sound => media.sounds.push(path),
                        }
                    }
                }
                Some(path) => media.missing.push(path),
                None => media.missing.push(self.directory.join(reference.trim())),
            }
        }
    }

    /// Resolve a reference to a canonical path relative to the document
    /// directory.
    ///
    /// If the path is not found, the resolver will attempt to decode
    /// percent-encoded characters (e.g., %20 to space) and try again.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        self.resolve_inner(reference).or_else(|| {
            percent_decode(reference)
                .filter(|decoded| decoded != reference)
                .and_then(|decoded| self.resolve_inner(&decoded))
        })
    }

    fn resolve_inner(&self, reference: &str) -> Option<PathBuf> {
        let reference: &str = reference.trim();
        if reference.is_empty() {
            return None;
        }
        self.directory.join(reference).canonicalize().ok()
    }
}

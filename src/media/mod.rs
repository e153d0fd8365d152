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

pub mod resolve;
pub mod scan;

/// The two kinds of media a deck can bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Sound,
}

impl MediaKind {
    /// File extensions of this kind. Matching is exact and case-sensitive.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => &["gif", "jpeg", "jpg", "png"],
            MediaKind::Sound => &["avi", "mp3", "ogg", "wav"],
        }
    }

    pub fn matches_extension(self, extension: &str) -> bool {
        self.extensions().contains(&extension)
    }
}

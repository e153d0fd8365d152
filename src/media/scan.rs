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

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::error::Fallible;
use crate::error::fail;
use crate::media::MediaKind;

/// Every media file under a directory, by kind. Paths are canonical.
#[derive(Debug, Default)]
pub struct MediaPool {
    images: HashSet<PathBuf>,
    sounds: HashSet<PathBuf>,
}

impl MediaPool {
    /// Walk `directory` recursively and collect the files whose extension
    /// belongs to one of the media kinds.
    pub fn scan(directory: &Path) -> Fallible<Self> {
        let mut pool = Self::default();
        for entry in WalkDir::new(directory) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path: &Path = entry.path();
            let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            for kind in [MediaKind::Image, MediaKind::Sound] {
                if kind.matches_extension(extension) {
                    let path: PathBuf = path.canonicalize()?;
                    pool.files_mut(kind).insert(path);
                }
            }
        }
        log::debug!(
            "Found {} images and {} sounds under {}.",
            pool.images.len(),
            pool.sounds.len(),
            directory.display()
        );
        Ok(pool)
    }

    pub fn contains(&self, kind: MediaKind, path: &Path) -> bool {
        self.files(kind).contains(path)
    }

    fn files(&self, kind: MediaKind) -> &HashSet<PathBuf> {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Sound => &self.sounds,
        }
    }

    fn files_mut(&mut self, kind: MediaKind) -> &mut HashSet<PathBuf> {
        match kind {
            MediaKind::Image => &mut self.images,
            MediaKind::Sound => &mut self.sounds,
        }
    }
}

/// Pools keyed by directory, so documents in the same directory share one
/// scan.
#[derive(Default)]
pub struct MediaPools {
    pools: HashMap<PathBuf, MediaPool>,
}

impl MediaPools {
    pub fn get(&mut self, directory: &Path) -> Fallible<&MediaPool> {
        if !self.pools.contains_key(directory) {
            let pool = MediaPool::scan(directory)?;
            self.pools.insert(directory.to_path_buf(), pool);
        }
        match self.pools.get(directory) {
            Some(pool) => Ok(pool),
            None => fail(format!("No media pool for {}.", directory.display())),
        }
    }
}

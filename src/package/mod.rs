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

//! Writes decks as `.apkg` packages.

pub mod collection;

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use chrono::Utc;
use serde_json::Map;
use serde_json::Value;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::media::resolve::ReferencedMedia;
use crate::package::collection::build_collection;
use crate::types::deck::Deck;

const COLLECTION_ENTRY: &str = "collection.anki2";
const MEDIA_ENTRY: &str = "media";

/// The package path for a document: `<output_dir>/<stem>.apkg`.
pub fn package_path(output_dir: &Path, document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{stem}.apkg"))
}

/// Write the deck and its media to a package at `path`.
pub fn write_package(deck: &Deck, media: &ReferencedMedia, path: &Path) -> Fallible<()> {
    let collection: Vec<u8> = build_collection(deck, Utc::now())?;
    let file = File::create(path).map_err(|e| {
        ErrorReport::new(format!("Failed to create '{}': {e}", path.display()))
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_ENTRY, options)?;
    zip.write_all(&collection)?;

    let mut names: Map<String, Value> = Map::new();
    for (index, source) in media.files().enumerate() {
        let name: String = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes: Vec<u8> = std::fs::read(source).map_err(|e| {
            ErrorReport::new(format!("Failed to read media '{}': {e}", source.display()))
        })?;
        zip.start_file(index.to_string(), options)?;
        zip.write_all(&bytes)?;
        names.insert(index.to_string(), Value::String(name));
    }

    zip.start_file(MEDIA_ENTRY, options)?;
    zip.write_all(serde_json::to_string(&Value::Object(names))?.as_bytes())?;
    zip.finish()?;
    log::debug!(
        "Wrote {} notes and {} media files to {}.",
        deck.notes.len(),
        media.files().count(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;
    use crate::helper::create_tmp_directory;
    use crate::helper::read_package_guids;
    use crate::helper::write_file;
    use crate::template::build_model;
    use crate::types::model::ModelKind;
    use crate::types::note::Note;

    #[test]
    fn test_package_path() {
        assert_eq!(
            package_path(Path::new("out"), Path::new("notes/bio.md")),
            PathBuf::from("out/bio.apkg")
        );
    }

    #[test]
    fn test_package_contents() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        write_file(&dir.join("a.png"), "image bytes")?;
        write_file(&dir.join("hi.mp3"), "sound bytes")?;

        let mut deck = Deck::new("Pkg".to_string());
        let model = build_model(&deck.name, ModelKind::Standard, String::new());
        let model_id = model.id;
        deck.add_model(model);
        deck.add_note(Note {
            model_id,
            kind: ModelKind::Standard,
            question: "<h2>Q</h2>".to_string(),
            answer: "<section></section>".to_string(),
            guid: "guid-1".to_string(),
        });
        let media = ReferencedMedia {
            images: vec![dir.join("a.png")],
            sounds: vec![dir.join("hi.mp3")],
            missing: vec![],
        };
        let path = dir.join("pkg.apkg");
        write_package(&deck, &media, &path)?;

        let mut archive = ZipArchive::new(File::open(&path)?)?;
        let mut index = String::new();
        archive.by_name(MEDIA_ENTRY)?.read_to_string(&mut index)?;
        let index: Value = serde_json::from_str(&index)?;
        assert_eq!(index["0"], "a.png");
        assert_eq!(index["1"], "hi.mp3");
        let mut bytes = String::new();
        archive.by_name("1")?.read_to_string(&mut bytes)?;
        assert_eq!(bytes, "sound bytes");
        assert!(archive.by_name(COLLECTION_ENTRY).is_ok());

        assert_eq!(read_package_guids(&path)?, vec!["guid-1".to_string()]);
        Ok(())
    }

    #[test]
    fn test_empty_deck() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let mut deck = Deck::new("Empty".to_string());
        deck.add_model(build_model(&deck.name, ModelKind::Standard, String::new()));
        let path = dir.join("empty.apkg");
        write_package(&deck, &ReferencedMedia::default(), &path)?;
        assert!(read_package_guids(&path)?.is_empty());
        Ok(())
    }
}

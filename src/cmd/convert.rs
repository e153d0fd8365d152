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

use std::fs::create_dir_all;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::assemble::AssembleConfig;
use crate::assemble::assemble;
use crate::error::Fallible;
use crate::media::scan::MediaPools;
use crate::package::package_path;
use crate::package::write_package;
use crate::sync::client::AnkiConnect;
use crate::sync::sync_deck;
use crate::sync::sync_model;

pub struct SyncConfig {
    /// AnkiConnect endpoint.
    pub url: String,
    /// Delete notes that no longer appear in their document.
    pub delete: bool,
}

pub struct ConvertConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub assemble: AssembleConfig,
    /// `None` when sync is off.
    pub sync: Option<SyncConfig>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ConvertSummary {
    pub converted: usize,
    pub failed: usize,
}

/// Markdown files under `directory`, recursively, in sorted order.
fn markdown_files(directory: &Path) -> Fallible<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(".md") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// The sync client, if sync is on and the endpoint answers.
fn connect(config: &SyncConfig) -> Option<AnkiConnect> {
    let client = AnkiConnect::new(config.url.clone());
    if client.is_live() {
        Some(client)
    } else {
        log::warn!(
            "Unable to reach AnkiConnect at {}. Make sure Anki is running and the AnkiConnect add-on is installed. Skipping sync.",
            client.url()
        );
        None
    }
}

/// Convert every markdown document under the input directory. A document that
/// fails is logged and skipped.
pub fn convert(config: &ConvertConfig) -> Fallible<ConvertSummary> {
    let files: Vec<PathBuf> = markdown_files(&config.input_dir)?;
    create_dir_all(&config.output_dir)?;
    let client: Option<AnkiConnect> = config.sync.as_ref().and_then(connect);
    let delete: bool = config.sync.as_ref().is_some_and(|sync| sync.delete);

    let mut pools = MediaPools::default();
    let mut summary = ConvertSummary::default();
    for file in &files {
        match convert_document(file, config, &mut pools, client.as_ref(), delete) {
            Ok(()) => summary.converted += 1,
            Err(e) => {
                log::error!("Failed to convert {}: {e}", file.display());
                summary.failed += 1;
            }
        }
    }
    log::debug!(
        "Converted {} documents, {} failed.",
        summary.converted,
        summary.failed
    );
    Ok(summary)
}

fn convert_document(
    file: &Path,
    config: &ConvertConfig,
    pools: &mut MediaPools,
    client: Option<&AnkiConnect>,
    delete: bool,
) -> Fallible<()> {
    let assembled = assemble(file, &config.assemble, pools)?;
    let package: PathBuf = package_path(&config.output_dir, file);
    write_package(&assembled.deck, &assembled.media, &package)?;
    println!(
        "Created deck {} with {} notes at {}",
        assembled.deck.name,
        assembled.deck.notes.len(),
        package.display()
    );
    if let Some(client) = client {
        sync_deck(client, &assembled.deck, &package, delete);
        for model in &assembled.deck.models {
            sync_model(client, model);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use portpicker::pick_unused_port;

    use super::*;
    use crate::helper::create_tmp_directory;
    use crate::helper::read_package_guids;
    use crate::helper::write_file;

    fn config(input_dir: PathBuf, output_dir: PathBuf) -> ConvertConfig {
        ConvertConfig {
            input_dir,
            output_dir,
            assemble: AssembleConfig::default(),
            sync: None,
        }
    }

    #[test]
    fn test_markdown_files_are_sorted() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        write_file(&dir.join("b.md"), "")?;
        write_file(&dir.join("a.md"), "")?;
        write_file(&dir.join("sub/c.md"), "")?;
        write_file(&dir.join("notes.txt"), "")?;
        write_file(&dir.join("image.png"), "")?;
        let files = markdown_files(&dir)?;
        assert_eq!(
            files,
            vec![dir.join("a.md"), dir.join("b.md"), dir.join("sub/c.md")]
        );
        Ok(())
    }

    #[test]
    fn test_convert_directory() -> Fallible<()> {
        let input = create_tmp_directory()?;
        let output = create_tmp_directory()?;
        write_file(&input.join("one.md"), "# One\n\n## Q1\n\nA1\n\n## Q2\n\nA2\n")?;
        write_file(&input.join("nested/two.md"), "# Two\n\n## Q\n\nA\n")?;
        let summary = convert(&config(input, output.clone()))?;
        assert_eq!(
            summary,
            ConvertSummary {
                converted: 2,
                failed: 0
            }
        );
        assert_eq!(read_package_guids(&output.join("one.apkg"))?.len(), 2);
        assert_eq!(read_package_guids(&output.join("two.apkg"))?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_failed_document_is_skipped() -> Fallible<()> {
        let input = create_tmp_directory()?;
        let output = create_tmp_directory()?;
        write_file(&input.join("a.md"), "---\ncss: missing.css\n---\n## Q\n")?;
        write_file(&input.join("b.md"), "## Q\n\nA\n")?;
        let summary = convert(&config(input, output.clone()))?;
        assert_eq!(
            summary,
            ConvertSummary {
                converted: 1,
                failed: 1
            }
        );
        assert!(!output.join("a.apkg").exists());
        assert!(output.join("b.apkg").exists());
        Ok(())
    }

    #[test]
    fn test_missing_input_directory() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        assert!(convert(&config(dir.join("nope"), dir.join("out"))).is_err());
        Ok(())
    }

    #[test]
    fn test_unreachable_sync_still_writes_packages() -> Fallible<()> {
        let input = create_tmp_directory()?;
        let output = create_tmp_directory()?;
        write_file(&input.join("deck.md"), "# D\n\n## Q\n\nA\n")?;
        let port = pick_unused_port().unwrap();
        let config = ConvertConfig {
            sync: Some(SyncConfig {
                url: format!("http://127.0.0.1:{port}"),
                delete: true,
            }),
            ..config(input, output.clone())
        };
        let summary = convert(&config)?;
        assert_eq!(summary.converted, 1);
        assert!(output.join("deck.apkg").exists());
        Ok(())
    }
}

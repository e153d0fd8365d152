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

//! Turns one markdown document into a deck.

use std::fs::read_to_string;
use std::path::Path;

use crate::cloze::has_clozes;
use crate::dom::Document;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::frontmatter::extract_frontmatter;
use crate::hash::guid_for;
use crate::markdown::markdown_to_html;
use crate::media::resolve::MediaResolver;
use crate::media::resolve::ReferencedMedia;
use crate::media::scan::MediaPools;
use crate::segment::segment;
use crate::template::build_model;
use crate::template::read_stylesheets;
use crate::types::deck::Deck;
use crate::types::model::ModelKind;
use crate::types::note::Note;

/// Options that change what a document assembles into.
#[derive(Debug, Clone, Default)]
pub struct AssembleConfig {
    /// Prepended to every deck title.
    pub prefix: String,
    /// Whether to route cloze questions to a cloze model.
    pub cloze: bool,
}

pub struct AssembledDeck {
    pub deck: Deck,
    pub media: ReferencedMedia,
}

/// The directory a document lives in. A bare file name lives in `.`.
pub fn document_directory(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// The title of the first `<h1>` if it has any text, otherwise the file stem.
fn deck_title(document: &Document, path: &Path) -> String {
    let heading: Option<String> = document
        .find_first("h1")
        .map(|h1| h1.text_content())
        .filter(|text| !text.is_empty());
    match heading {
        Some(text) => text,
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

pub fn assemble(
    path: &Path,
    config: &AssembleConfig,
    pools: &mut MediaPools,
) -> Fallible<AssembledDeck> {
    let text: String = read_to_string(path).map_err(|e| {
        ErrorReport::new(format!("Failed to read '{}': {e}", path.display()))
    })?;
    let directory: &Path = document_directory(path);
    let (metadata, body) = extract_frontmatter(&text)?;
    let html: String = markdown_to_html(body);
    let document = Document::parse(&html);

    let title: String = format!("{}{}", config.prefix, deck_title(&document, path));
    log::debug!("Assembling deck '{title}' from {}.", path.display());

    let css: String = read_stylesheets(directory, &metadata)?;
    let mut deck = Deck::new(title);
    let plain = build_model(&deck.name, ModelKind::Standard, css.clone());
    let plain_id: i64 = plain.id;
    deck.add_model(plain);
    let cloze_id: Option<i64> = if config.cloze {
        let cloze = build_model(&deck.name, ModelKind::Cloze, css);
        let id = cloze.id;
        deck.add_model(cloze);
        Some(id)
    } else {
        None
    };

    let nodes = document.root_nodes();
    for segment in segment(&nodes) {
        let question: String = segment.question_html();
        let guid: String = guid_for(&question, deck.id);
        let (model_id, kind) = match cloze_id {
            Some(id) if has_clozes(&segment.question_text()) => (id, ModelKind::Cloze),
            _ => (plain_id, ModelKind::Standard),
        };
        deck.add_note(Note {
            model_id,
            kind,
            question,
            answer: segment.answer_html(),
            guid,
        });
    }
    log::debug!("Deck '{}' has {} notes.", deck.name, deck.notes.len());

    let pool = pools.get(directory)?;
    let media = MediaResolver::new(directory, pool).resolve_document(&document);
    if !media.missing.is_empty() {
        let paths: Vec<String> = media
            .missing
            .iter()
            .map(|p| format!("  - {}", p.display()))
            .collect();
        log::warn!(
            "{}: referenced media not found:\n{}",
            path.display(),
            paths.join("\n")
        );
    }

    Ok(AssembledDeck { deck, media })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::hash::integer_hash;
    use crate::helper::create_tmp_directory;
    use crate::helper::write_file;

    fn assemble_text(name: &str, text: &str, config: &AssembleConfig) -> Fallible<AssembledDeck> {
        let dir = create_tmp_directory()?;
        let path = dir.join(name);
        write_file(&path, text)?;
        assemble(&path, config, &mut MediaPools::default())
    }

    fn plain() -> AssembleConfig {
        AssembleConfig::default()
    }

    fn cloze() -> AssembleConfig {
        AssembleConfig {
            prefix: String::new(),
            cloze: true,
        }
    }

    #[test]
    fn test_document_directory() {
        assert_eq!(document_directory(Path::new("deck.md")), Path::new("."));
        assert_eq!(document_directory(Path::new("a/b/deck.md")), Path::new("a/b"));
    }

    #[test]
    fn test_basic_deck() -> Fallible<()> {
        let text = "# Geography\n\nIntro text.\n\n## Capital of France?\n\nParis.\n\n## Capital of Peru?\n\nLima.\n";
        let assembled = assemble_text("geo.md", text, &plain())?;
        let deck = &assembled.deck;
        assert_eq!(deck.name, "Geography");
        assert_eq!(deck.id, integer_hash("Geography"));
        assert_eq!(deck.models.len(), 1);
        assert_eq!(deck.models[0].name, "Geography model");
        assert_eq!(deck.notes.len(), 2);
        assert_eq!(deck.notes[0].question, "<h2>Capital of France?</h2>");
        assert_eq!(deck.notes[0].answer, "<section>\n<p>Paris.</p>\n</section>");
        assert_eq!(deck.notes[1].question, "<h2>Capital of Peru?</h2>");
        assert_eq!(deck.notes[1].answer, "<section>\n<p>Lima.</p>\n</section>");
        assert_eq!(
            deck.notes[0].guid,
            guid_for("<h2>Capital of France?</h2>", deck.id)
        );
        Ok(())
    }

    #[test]
    fn test_title_falls_back_to_stem() -> Fallible<()> {
        let assembled = assemble_text("my-notes.md", "## Q\n\nA\n", &plain())?;
        assert_eq!(assembled.deck.name, "my-notes");
        let assembled = assemble_text("empty-title.md", "# \n\n## Q\n\nA\n", &plain())?;
        assert_eq!(assembled.deck.name, "empty-title");
        Ok(())
    }

    #[test]
    fn test_prefix() -> Fallible<()> {
        let config = AssembleConfig {
            prefix: "School::".to_string(),
            cloze: false,
        };
        let assembled = assemble_text("bio.md", "# Biology\n\n## Q\n\nA\n", &config)?;
        let deck = &assembled.deck;
        assert_eq!(deck.name, "School::Biology");
        assert_eq!(deck.id, integer_hash("School::Biology"));
        assert_eq!(deck.models[0].name, "School::Biology model");
        Ok(())
    }

    #[test]
    fn test_determinism() -> Fallible<()> {
        let text = "# T\n\n## Q1\n\nA1\n\n<p data-question>Q2</p>\n\nA2\n";
        let dir = create_tmp_directory()?;
        let path = dir.join("t.md");
        write_file(&path, text)?;
        let first = assemble(&path, &cloze(), &mut MediaPools::default())?;
        let second = assemble(&path, &cloze(), &mut MediaPools::default())?;
        assert_eq!(first.deck, second.deck);
        assert_eq!(first.media, second.media);
        Ok(())
    }

    #[test]
    fn test_guid_depends_on_question_only() -> Fallible<()> {
        let before = assemble_text("t.md", "# T\n\n## Question\n\nOld answer.\n", &plain())?;
        let edited_answer =
            assemble_text("t.md", "# T\n\n## Question\n\nNew answer.\n", &plain())?;
        let edited_question =
            assemble_text("t.md", "# T\n\n## Question, reworded\n\nOld answer.\n", &plain())?;
        assert_eq!(before.deck.notes[0].guid, edited_answer.deck.notes[0].guid);
        assert_ne!(before.deck.notes[0].guid, edited_question.deck.notes[0].guid);
        Ok(())
    }

    #[test]
    fn test_guid_depends_on_deck() -> Fallible<()> {
        let a = assemble_text("t.md", "# Deck A\n\n## Q\n\nA\n", &plain())?;
        let b = assemble_text("t.md", "# Deck B\n\n## Q\n\nA\n", &plain())?;
        assert_ne!(a.deck.notes[0].guid, b.deck.notes[0].guid);
        Ok(())
    }

    #[test]
    fn test_every_marker_is_a_card() -> Fallible<()> {
        let text = "# T\n\n## One\n\n## Two\n\ntext\n\n<div data-question>Three</div>\n\n## Four\n";
        let assembled = assemble_text("t.md", text, &plain())?;
        let questions: Vec<&str> = assembled
            .deck
            .notes
            .iter()
            .map(|n| n.question.as_str())
            .collect();
        assert_eq!(
            questions,
            vec![
                "<h2>One</h2>",
                "<h2>Two</h2>",
                r#"<div data-question="">Three</div>"#,
                "<h2>Four</h2>",
            ]
        );
        // Only the newline between the two headings.
        assert_eq!(assembled.deck.notes[0].answer, "<section>\n</section>");
        assert_eq!(assembled.deck.notes[2].answer, "<section>\n</section>");
        Ok(())
    }

    #[test]
    fn test_no_markers_no_cards() -> Fallible<()> {
        let assembled = assemble_text("t.md", "# T\n\nJust prose.\n\n### Not a question\n", &plain())?;
        assert!(assembled.deck.notes.is_empty());
        assert_eq!(assembled.deck.models.len(), 1);
        Ok(())
    }

    #[test]
    fn test_cloze_routing() -> Fallible<()> {
        let text = "# T\n\n## The capital of France is {{c1::Paris}}\n\n## Plain question\n\nAnswer\n";
        let assembled = assemble_text("t.md", text, &cloze())?;
        let deck = &assembled.deck;
        assert_eq!(deck.models.len(), 2);
        assert_eq!(deck.models[1].name, "T cloze model");
        assert_eq!(deck.notes[0].kind, ModelKind::Cloze);
        assert_eq!(deck.notes[0].model_id, integer_hash("T cloze model"));
        assert_eq!(deck.notes[1].kind, ModelKind::Standard);
        assert_eq!(deck.notes[1].model_id, integer_hash("T model"));
        Ok(())
    }

    #[test]
    fn test_cloze_mode_off() -> Fallible<()> {
        let text = "# T\n\n## The capital of France is {{c1::Paris}}\n";
        let assembled = assemble_text("t.md", text, &plain())?;
        let deck = &assembled.deck;
        assert_eq!(deck.models.len(), 1);
        assert_eq!(deck.notes[0].kind, ModelKind::Standard);
        assert_eq!(deck.notes[0].model_id, integer_hash("T model"));
        Ok(())
    }

    #[test]
    fn test_media_in_intro_is_bundled() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        write_file(&dir.join("a.png"), "a")?;
        write_file(&dir.join("b.png"), "b")?;
        let path = dir.join("t.md");
        write_file(
            &path,
            "# T\n\n![cover](a.png)\n\n## Q\n\n![missing](c.png)\n\n![remote](https://example.com/b.png)\n",
        )?;
        let assembled = assemble(&path, &plain(), &mut MediaPools::default())?;
        let expected: Vec<PathBuf> = vec![dir.join("a.png")];
        assert_eq!(assembled.media.images, expected);
        assert_eq!(assembled.media.missing, vec![dir.join("c.png")]);
        Ok(())
    }

    #[test]
    fn test_user_stylesheet_reaches_models() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        write_file(&dir.join("custom.css"), ".custom {}")?;
        let path = dir.join("t.md");
        write_file(&path, "---\ncss: custom.css\n---\n# T\n\n## Q\n")?;
        let assembled = assemble(&path, &cloze(), &mut MediaPools::default())?;
        for model in &assembled.deck.models {
            assert!(model.css.ends_with("\n.custom {}"));
        }
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let result = assemble(&dir.join("nope.md"), &plain(), &mut MediaPools::default());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_leading_rule_is_not_frontmatter() -> Fallible<()> {
        let assembled = assemble_text("t.md", "---\n\n## Q\n\nA\n", &plain())?;
        assert_eq!(assembled.deck.notes.len(), 1);
        assert_eq!(assembled.deck.notes[0].question, "<h2>Q</h2>");
        Ok(())
    }

    #[test]
    fn test_non_mapping_frontmatter_is_ignored() -> Fallible<()> {
        let assembled =
            assemble_text("t.md", "---\nIntro paragraph.\n---\n## Q\n\nA\n", &plain())?;
        assert_eq!(assembled.deck.notes.len(), 1);
        assert_eq!(assembled.deck.name, "t");
        Ok(())
    }

    #[test]
    fn test_malformed_frontmatter_is_an_error() -> Fallible<()> {
        let result = assemble_text("t.md", "---\ncss: 123\n---\n## Q\n", &plain());
        assert!(result.is_err());
        Ok(())
    }
}

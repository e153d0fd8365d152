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

//! Pushes packages and model changes into a running Anki.
//!
//! Every step handles its own failure: it is logged and the following steps
//! still run.

pub mod client;

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::error::Fallible;
use crate::sync::client::AnkiConnect;
use crate::types::deck::Deck;
use crate::types::model::Model;

#[derive(Deserialize)]
struct NoteInfo {
    #[serde(rename = "noteId")]
    note_id: i64,
    fields: HashMap<String, FieldInfo>,
}

#[derive(Deserialize)]
struct FieldInfo {
    value: String,
}

/// Import the package and, if `delete` is set, remove notes that are no
/// longer in the deck.
pub fn sync_deck(client: &AnkiConnect, deck: &Deck, package: &Path, delete: bool) {
    let package: PathBuf = package
        .canonicalize()
        .unwrap_or_else(|_| package.to_path_buf());
    match import_package(client, &package) {
        Ok(()) => println!("Imported deck {}", deck.name),
        Err(e) => log::error!("Unable to import deck {} to Anki: {e}", deck.name),
    }
    if delete {
        match delete_removed_notes(client, deck) {
            Ok(0) => {}
            Ok(count) => println!("Deleted {count} removed notes from {}", deck.name),
            Err(e) => log::error!("Unable to sync removed notes from {}: {e}", deck.name),
        }
    }
}

/// Push the model's template and stylesheet, which an import does not
/// overwrite.
pub fn sync_model(client: &AnkiConnect, model: &Model) {
    match update_templates(client, model) {
        Ok(()) => println!("Updated model {} template", model.name),
        Err(e) => log::error!("Unable to update model {} template: {e}", model.name),
    }
    match update_styling(client, model) {
        Ok(()) => println!("Updated model {} styling", model.name),
        Err(e) => log::error!("Unable to update model {} styling: {e}", model.name),
    }
}

fn import_package(client: &AnkiConnect, package: &Path) -> Fallible<()> {
    let _: Value = client.invoke(
        "importPackage",
        json!({ "path": package.display().to_string() }),
    )?;
    Ok(())
}

/// Delete the remote notes whose guid is not in the deck. Returns how many
/// were deleted.
fn delete_removed_notes(client: &AnkiConnect, deck: &Deck) -> Fallible<usize> {
    let query = format!("\"deck:{}\"", deck.name);
    let cards: Vec<i64> = client.invoke("findCards", json!({ "query": query }))?;
    let notes: Vec<i64> = client.invoke("cardsToNotes", json!({ "cards": cards }))?;
    let infos: Vec<NoteInfo> = client.invoke("notesInfo", json!({ "notes": notes }))?;

    let mut remote: HashMap<String, i64> = HashMap::new();
    for info in infos {
        match info.fields.get("Guid") {
            Some(field) => {
                remote.insert(field.value.clone(), info.note_id);
            }
            None => log::debug!("Note {} has no Guid field.", info.note_id),
        }
    }
    let local: HashSet<&str> = deck.guids();
    let mut stale: Vec<i64> = remote
        .iter()
        .filter(|(guid, _)| !local.contains(guid.as_str()))
        .map(|(_, id)| *id)
        .collect();
    if stale.is_empty() {
        return Ok(0);
    }
    stale.sort_unstable();
    let _: Value = client.invoke("deleteNotes", json!({ "notes": stale }))?;
    Ok(stale.len())
}

fn update_templates(client: &AnkiConnect, model: &Model) -> Fallible<()> {
    let template = &model.template;
    let mut templates = serde_json::Map::new();
    templates.insert(
        template.name.clone(),
        json!({ "Front": template.qfmt, "Back": template.afmt }),
    );
    let _: Value = client.invoke(
        "updateModelTemplates",
        json!({ "model": { "name": model.name, "templates": templates } }),
    )?;
    Ok(())
}

fn update_styling(client: &AnkiConnect, model: &Model) -> Fallible<()> {
    let _: Value = client.invoke(
        "updateModelStyling",
        json!({ "model": { "name": model.name, "css": model.css } }),
    )?;
    Ok(())
}

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

//! The SQLite collection inside a package.

use std::collections::BTreeSet;
use std::fs::read;

use chrono::DateTime;
use chrono::Utc;
use rusqlite::Connection;
use rusqlite::params;
use serde_json::Value;
use serde_json::json;
use sha1_smol::Sha1;
use tempfile::NamedTempFile;

use crate::cloze::cloze_ordinals;
use crate::dom::Document;
use crate::error::Fallible;
use crate::types::deck::Deck;
use crate::types::model::FIELDS;
use crate::types::model::Model;
use crate::types::model::ModelKind;
use crate::types::note::Note;

const SCHEMA: &str = include_str!("schema.sql");

/// Legacy collection schema version.
const SCHEMA_VERSION: i64 = 11;

/// Separates field values in the `flds` column.
const FIELD_SEPARATOR: &str = "\x1f";

/// Id of the built-in default deck and deck options group.
const DEFAULT_ID: i64 = 1;

/// Hands out unique row ids, starting at the creation time in milliseconds.
struct IdSequence {
    next: i64,
}

impl IdSequence {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            next: now.timestamp_millis(),
        }
    }

    fn take(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// First eight hex digits of the SHA-1 of the field's text, as Anki uses to
/// detect duplicates.
pub fn field_checksum(field: &str) -> i64 {
    let text: String = Document::parse(field).text_content();
    let hex: String = Sha1::from(text.as_bytes()).hexdigest();
    i64::from_str_radix(&hex[..8], 16).unwrap_or_default()
}

/// Zero-based template ordinals of the cards a note generates.
pub fn card_ordinals(note: &Note) -> Vec<i64> {
    match note.kind {
        ModelKind::Standard => vec![0],
        ModelKind::Cloze => {
            let ordinals: BTreeSet<u32> = cloze_ordinals(&note.question);
            if ordinals.is_empty() {
                vec![0]
            } else {
                ordinals
                    .into_iter()
                    .map(|n| i64::from(n.saturating_sub(1)))
                    .collect()
            }
        }
    }
}

fn model_json(model: &Model, deck_id: i64, modified: i64) -> Value {
    let fields: Vec<Value> = FIELDS
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "name": name,
                "ord": ord,
                "font": "Liberation Sans",
                "media": [],
                "rtl": false,
                "size": 20,
                "sticky": false,
            })
        })
        .collect();
    json!({
        "id": model.id,
        "name": model.name,
        "type": model.kind.anki_type(),
        "mod": modified,
        "usn": -1,
        "sortf": 0,
        "did": deck_id,
        "tags": [],
        "vers": [],
        "flds": fields,
        "tmpls": [{
            "name": model.template.name,
            "ord": 0,
            "qfmt": model.template.qfmt,
            "afmt": model.template.afmt,
            "bqfmt": "",
            "bafmt": "",
            "did": null,
        }],
        "css": model.css,
        "req": [[0, "any", [0]]],
        "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
        "latexPost": "\\end{document}",
    })
}

fn deck_json(id: i64, name: &str, modified: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": "",
        "mod": modified,
        "usn": -1,
        "conf": DEFAULT_ID,
        "dyn": 0,
        "collapsed": false,
        "extendNew": 10,
        "extendRev": 50,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0],
    })
}

fn deck_options_json(modified: i64) -> Value {
    json!({
        "id": DEFAULT_ID,
        "name": "Default",
        "mod": modified,
        "usn": 0,
        "maxTaken": 60,
        "autoplay": true,
        "timer": 0,
        "replayq": true,
        "dyn": false,
        "new": {
            "bury": true,
            "delays": [1, 10],
            "initialFactor": 2500,
            "ints": [1, 4, 7],
            "order": 1,
            "perDay": 20,
            "separate": true,
        },
        "rev": {
            "bury": true,
            "ease4": 1.3,
            "fuzz": 0.05,
            "ivlFct": 1,
            "maxIvl": 36500,
            "minSpace": 1,
            "perDay": 100,
        },
        "lapse": {
            "delays": [10],
            "leechAction": 0,
            "leechFails": 8,
            "minInt": 1,
            "mult": 0,
        },
    })
}

fn collection_config(deck_id: i64) -> Value {
    json!({
        "activeDecks": [deck_id],
        "curDeck": deck_id,
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "curModel": null,
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true,
    })
}

fn insert_collection_row(conn: &Connection, deck: &Deck, now: DateTime<Utc>) -> Fallible<()> {
    let seconds: i64 = now.timestamp();
    let models: serde_json::Map<String, Value> = deck
        .models
        .iter()
        .map(|model| (model.id.to_string(), model_json(model, deck.id, seconds)))
        .collect();
    let decks = json!({
        DEFAULT_ID.to_string(): deck_json(DEFAULT_ID, "Default", seconds),
        deck.id.to_string(): deck_json(deck.id, &deck.name, seconds),
    });
    let dconf = json!({ DEFAULT_ID.to_string(): deck_options_json(seconds) });
    conn.execute(
        "insert into col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
         values (1, ?1, ?2, ?2, ?3, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')",
        params![
            seconds,
            now.timestamp_millis(),
            SCHEMA_VERSION,
            serde_json::to_string(&collection_config(deck.id))?,
            serde_json::to_string(&Value::Object(models))?,
            serde_json::to_string(&decks)?,
            serde_json::to_string(&dconf)?,
        ],
    )?;
    Ok(())
}

fn insert_note(
    conn: &Connection,
    deck: &Deck,
    note: &Note,
    due: i64,
    ids: &mut IdSequence,
    now: DateTime<Utc>,
) -> Fallible<()> {
    let note_id: i64 = ids.take();
    let fields: String = note.fields().join(FIELD_SEPARATOR);
    conn.execute(
        "insert into notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
         values (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
        params![
            note_id,
            note.guid,
            note.model_id,
            now.timestamp(),
            fields,
            note.question,
            field_checksum(&note.question),
        ],
    )?;
    for ord in card_ordinals(note) {
        conn.execute(
            "insert into cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor,
                                reps, lapses, left, odue, odid, flags, data)
             values (?1, ?2, ?3, ?4, ?5, -1, 0, 0, ?6, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            params![ids.take(), note_id, deck.id, ord, now.timestamp(), due],
        )?;
    }
    Ok(())
}

/// Build the collection database for a deck and return its bytes.
pub fn build_collection(deck: &Deck, now: DateTime<Utc>) -> Fallible<Vec<u8>> {
    let file = NamedTempFile::new()?;
    {
        let mut conn = Connection::open(file.path())?;
        conn.execute_batch(SCHEMA)?;
        let tx = conn.transaction()?;
        insert_collection_row(&tx, deck, now)?;
        let mut ids = IdSequence::new(now);
        for (index, note) in deck.notes.iter().enumerate() {
            let due = index as i64 + 1;
            insert_note(&tx, deck, note, due, &mut ids, now)?;
        }
        tx.commit()?;
    }
    Ok(read(file.path())?)
}

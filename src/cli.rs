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

use std::path::PathBuf;

use clap::Parser;

use crate::assemble::AssembleConfig;
use crate::cmd::convert::ConvertConfig;
use crate::cmd::convert::SyncConfig;
use crate::cmd::convert::convert;
use crate::error::Fallible;
use crate::error::fail;
use crate::sync::client::DEFAULT_URL;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Convert a directory of markdown documents into Anki packages.
    Convert {
        /// Directory to search for markdown files, recursively.
        input_dir: PathBuf,
        /// Directory to write the `.apkg` files to.
        output_dir: PathBuf,
        /// Prefix prepended to every deck name.
        #[arg(long, default_value = "")]
        prefix: String,
        /// Route questions containing cloze deletions to a cloze model.
        #[arg(long)]
        cloze: bool,
        /// Import the packages into a running Anki through AnkiConnect.
        #[arg(long)]
        sync: bool,
        /// When syncing, delete notes that no longer appear in their document.
        #[arg(long)]
        delete: bool,
        /// The AnkiConnect endpoint.
        #[arg(long, default_value = DEFAULT_URL)]
        anki_connect_url: String,
    },
}

impl Command {
    fn into_config(self) -> ConvertConfig {
        match self {
            Command::Convert {
                input_dir,
                output_dir,
                prefix,
                cloze,
                sync,
                delete,
                anki_connect_url,
            } => {
                if delete && !sync {
                    log::warn!("--delete has no effect without --sync.");
                }
                ConvertConfig {
                    input_dir,
                    output_dir,
                    assemble: AssembleConfig { prefix, cloze },
                    sync: sync.then(|| SyncConfig {
                        url: anki_connect_url,
                        delete,
                    }),
                }
            }
        }
    }
}

pub fn entrypoint() -> Fallible<()> {
    let config: ConvertConfig = Command::parse().into_config();
    let summary = convert(&config)?;
    if summary.failed > 0 {
        return fail(format!(
            "{} of {} documents failed to convert.",
            summary.failed,
            summary.failed + summary.converted
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ConvertConfig {
        Command::try_parse_from(args).unwrap().into_config()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["mdecks", "convert", "notes", "out"]);
        assert_eq!(config.input_dir, PathBuf::from("notes"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.assemble.prefix, "");
        assert!(!config.assemble.cloze);
        assert!(config.sync.is_none());
    }

    #[test]
    fn test_all_flags() {
        let config = parse(&[
            "mdecks",
            "convert",
            "notes",
            "out",
            "--prefix",
            "School::",
            "--cloze",
            "--sync",
            "--delete",
            "--anki-connect-url",
            "http://127.0.0.1:9999",
        ]);
        assert_eq!(config.assemble.prefix, "School::");
        assert!(config.assemble.cloze);
        let sync = config.sync.unwrap();
        assert_eq!(sync.url, "http://127.0.0.1:9999");
        assert!(sync.delete);
    }

    #[test]
    fn test_sync_default_url() {
        let config = parse(&["mdecks", "convert", "notes", "out", "--sync"]);
        let sync = config.sync.unwrap();
        assert_eq!(sync.url, "http://localhost:8765");
        assert!(!sync.delete);
    }

    #[test]
    fn test_missing_arguments() {
        assert!(Command::try_parse_from(["mdecks", "convert", "notes"]).is_err());
    }
}

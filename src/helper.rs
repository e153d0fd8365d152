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

//! Test helpers.

use std::fs::File;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use rusqlite::Connection;
use tempfile::NamedTempFile;
use tempfile::tempdir;
use zip::ZipArchive;

use crate::error::Fallible;

/// Create a fresh temporary directory that outlives the test, and return its
/// canonical path.
pub fn create_tmp_directory() -> Fallible<PathBuf> {
    let dir: PathBuf = tempdir()?.keep();
    Ok(dir.canonicalize()?)
}

/// Write a file, creating its parent directories.
pub fn write_file(path: &Path, contents: &str) -> Fallible<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Block until something is listening on the given address.
pub fn wait_for_server(host: &str, port: u16) {
    loop {
        if let Ok(stream) = TcpStream::connect((host, port)) {
            drop(stream);
            break;
        }
        sleep(Duration::from_millis(1));
    }
}

/// The note guids stored in a package, in row order.
pub fn read_package_guids(package: &Path) -> Fallible<Vec<String>> {
    let mut archive = ZipArchive::new(File::open(package)?)?;
    let mut bytes: Vec<u8> = Vec::new();
    archive.by_name("collection.anki2")?.read_to_end(&mut bytes)?;
    let file = NamedTempFile::new()?;
    std::fs::write(file.path(), bytes)?;
    let conn = Connection::open(file.path())?;
    let mut stmt = conn.prepare("select guid from notes order by id")?;
    let guids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(guids)
}

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

use sha2::Digest;
use sha2::Sha256;

/// Alphabet of the base-91 encoding Anki uses for note guids.
const BASE91_TABLE: &[u8; 91] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Map a string to an integer in `[0, 2^31)`.
///
/// This is SHA-256 of the string, read as a big-endian integer, modulo
/// `2^31`. Because `2^31` divides `2^256`, only the low 31 bits of the digest
/// matter. Deck and model ids are derived with this function, so it must
/// never change.
pub fn integer_hash(s: &str) -> i64 {
    let digest = Sha256::digest(s.as_bytes());
    let tail: [u8; 4] = [digest[28], digest[29], digest[30], digest[31]];
    (u32::from_be_bytes(tail) & 0x7FFF_FFFF) as i64
}

/// The guid of a note, derived from its question HTML and its deck id.
pub fn guid_for(question: &str, deck_id: i64) -> String {
    let digest = Sha256::digest(format!("{question}__{deck_id}").as_bytes());
    let mut head: [u8; 8] = [0; 8];
    head.copy_from_slice(&digest[..8]);
    base91(u64::from_be_bytes(head))
}

fn base91(mut n: u64) -> String {
    let mut digits: Vec<u8> = Vec::new();
    while n > 0 {
        digits.push(BASE91_TABLE[(n % 91) as usize]);
        n /= 91;
    }
    digits.reverse();
    // The table is ASCII.
    digits.into_iter().map(char::from).collect()
}

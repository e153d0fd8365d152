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

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Fallible;
use crate::error::fail;

pub const DEFAULT_URL: &str = "http://localhost:8765";

/// AnkiConnect protocol version.
const VERSION: u32 = 6;

#[derive(Serialize)]
struct Request<'a> {
    action: &'a str,
    params: Value,
    version: u32,
}

/// A client for the AnkiConnect JSON API.
pub struct AnkiConnect {
    url: String,
    client: Client,
}

impl AnkiConnect {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the endpoint answers a plain GET with 200.
    pub fn is_live(&self) -> bool {
        match self.client.get(&self.url).send() {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                log::debug!("Liveness probe of {} failed: {e}", self.url);
                false
            }
        }
    }

    /// Perform an action and return its result.
    ///
    /// The response must be an object with exactly the fields `error` and
    /// `result`, and `error` must be null.
    pub fn invoke<T: DeserializeOwned>(&self, action: &str, params: Value) -> Fallible<T> {
        let request = Request {
            action,
            params,
            version: VERSION,
        };
        log::debug!("AnkiConnect: {action}");
        let response: Value = self.client.post(&self.url).json(&request).send()?.json()?;
        let result: Value = unpack_response(response)?;
        Ok(serde_json::from_value(result)?)
    }
}

fn unpack_response(response: Value) -> Fallible<Value> {
    let Value::Object(mut fields) = response else {
        return fail("response is not a JSON object");
    };
    if fields.len() != 2 {
        return fail("response has an unexpected number of fields");
    }
    let Some(error) = fields.remove("error") else {
        return fail("response is missing required error field");
    };
    let Some(result) = fields.remove("result") else {
        return fail("response is missing required result field");
    };
    match error {
        Value::Null => Ok(result),
        Value::String(message) => fail(message),
        other => fail(other.to_string()),
    }
}

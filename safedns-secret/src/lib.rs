// Copyright 2025 safedns-webhook contributors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use snafu::Snafu;
use std::collections::HashMap;

/// Category name for secret store logging
pub static LOG_CATEGORY: &str = "secret_store";

/// Errors that can occur during secret store operations
#[derive(Debug, Snafu)]
pub enum Error {
    /// Transport-level failure talking to the store
    #[snafu(display("secret store request error: {source}"))]
    Request { source: reqwest::Error },

    /// The store answered with a non-success status
    #[snafu(display("secret store API error: {status} - {body}"))]
    Api { status: u16, body: String },

    /// The requested secret does not exist
    #[snafu(display("secret '{namespace}/{name}' not found"))]
    NotFound { namespace: String, name: String },

    /// The store client could not be constructed
    #[snafu(display("invalid secret store configuration: {message}"))]
    InvalidConf { message: String },

    /// A secret value was not valid base64
    #[snafu(display("secret value decode error: {source}"))]
    Base64Decode { source: base64::DecodeError },
}

/// Convenience type alias for Results with our Error type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A fetched secret: a mapping of key to raw bytes.
#[derive(Debug, Clone, Default)]
pub struct Secret {
    pub data: HashMap<String, Vec<u8>>,
}

/// Fetch-by-namespace-and-name secret lookup.
///
/// The webhook resolves one key per challenge through this trait;
/// implementations must be safe for concurrent use.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret by namespace and name
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret>;
}

mod kubernetes;
mod memory;

pub use kubernetes::{KubernetesSecretStore, StoreConf};
pub use memory::MemorySecretStore;

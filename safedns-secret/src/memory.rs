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

use super::{Error, Result, Secret, SecretStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory secret store for tests and local runs.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, Secret>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one key into the secret at `namespace/name`, creating
    /// the secret if it does not exist yet.
    pub fn insert(&self, namespace: &str, name: &str, key: &str, value: &[u8]) {
        let mut secrets = self.secrets.lock().unwrap();
        let secret = secrets.entry(format!("{namespace}/{name}")).or_default();
        secret.data.insert(key.to_string(), value.to_vec());
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret> {
        let secrets = self.secrets.lock().unwrap();
        secrets
            .get(&format!("{namespace}/{name}"))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

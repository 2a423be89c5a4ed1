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

use super::{Error, Result};
use serde::Deserialize;

/// Reference to one key of a named secret in the challenge namespace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
}

/// Per-issuer solver configuration decoded from the challenge blob.
///
/// The secret reference is optional so that "no config" is a
/// first-class state; the lookup step reports its absence instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(default)]
    pub api_key_secret_ref: Option<SecretKeySelector>,
}

/// Decodes the per-challenge configuration blob.
///
/// A missing blob is valid and yields the default configuration; a
/// present but malformed blob is a config error.
pub fn load_config(value: Option<&serde_json::Value>) -> Result<SolverConfig> {
    let Some(value) = value else {
        return Ok(SolverConfig::default());
    };
    serde_json::from_value(value.clone()).map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_config_absent() {
        let config = load_config(None).unwrap();
        assert_eq!(SolverConfig::default(), config);
        assert_eq!(None, config.api_key_secret_ref);
    }

    #[test]
    fn test_load_config_valid() {
        let value = serde_json::json!({
            "apiKeySecretRef": {
                "name": "cred",
                "key": "apiKey"
            }
        });
        let config = load_config(Some(&value)).unwrap();
        assert_eq!(
            Some(SecretKeySelector {
                name: "cred".to_string(),
                key: "apiKey".to_string(),
            }),
            config.api_key_secret_ref
        );
    }

    #[test]
    fn test_load_config_empty_object() {
        let value = serde_json::json!({});
        let config = load_config(Some(&value)).unwrap();
        assert_eq!(None, config.api_key_secret_ref);
    }

    #[test]
    fn test_load_config_malformed() {
        let value = serde_json::json!({
            "apiKeySecretRef": "not-an-object"
        });
        let err = load_config(Some(&value)).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().starts_with("error decoding solver config"));
    }
}

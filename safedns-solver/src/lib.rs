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
use safedns_secret::StoreConf;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Category name for challenge solver logging
pub static LOG_CATEGORY: &str = "solver";

/// Registration identifier the framework uses to route challenges here
pub static SOLVER_NAME: &str = "safedns";

/// Errors that can occur while solving a challenge
#[derive(Debug, Snafu)]
pub enum Error {
    /// The per-challenge configuration blob was present but malformed
    #[snafu(display("error decoding solver config: {message}"))]
    Config { message: String },

    /// The referenced secret could not be resolved
    #[snafu(display("secret lookup failed: {message}"))]
    SecretLookup { message: String },

    /// The secret exists but lacks the configured key
    #[snafu(display("key '{key}' not found in secret '{namespace}/{secret}'"))]
    MissingKey {
        key: String,
        namespace: String,
        secret: String,
    },

    /// No record matched the cleanup query
    #[snafu(display("no existing records found for '{record}' in zone '{zone}'"))]
    NotFound { record: String, zone: String },

    /// A remote SafeDNS API call failed
    #[snafu(display("SafeDNS API call failed: {source}"))]
    Remote { source: safedns_client::Error },

    /// The secret store client could not be constructed or is missing
    #[snafu(display("secret store connection failed: {message}"))]
    Connection { message: String },
}

/// Convenience type alias for Results with our Error type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One DNS-01 challenge as delivered by the framework.
///
/// Names arrive in trailing-dot form; the config blob is an opaque
/// per-issuer JSON value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// DNS zone the record must be created in, e.g. `example.com.`
    pub resolved_zone: String,
    /// Record name requiring validation, e.g. `_acme-challenge.example.com.`
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,
    /// Proof key to publish as TXT content
    pub key: String,
    /// Namespace the referenced secret lives in
    pub resource_namespace: String,
    /// Per-issuer solver configuration, decoded by [`load_config`]
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// Strips the trailing dot from a DNS name.
///
/// Challenge names arrive fully qualified (`example.com.`) while the
/// SafeDNS API expects the bare form. Exactly one dot is stripped.
pub fn sanitize_dns_name(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_string()
}

/// Wraps a challenge key in literal quotes, the TXT content convention
/// SafeDNS expects. Cleanup must search with the same quoting.
pub fn txt_record_content(key: &str) -> String {
    format!("\"{key}\"")
}

/// Contract between the challenge framework and a DNS solver.
#[async_trait]
pub trait DnsSolver: Send + Sync {
    /// Registration identifier for this solver
    fn name(&self) -> &'static str;

    /// One-time setup of the secret store client; must run before
    /// `present`/`clean_up`
    async fn initialize(&self, conf: &StoreConf) -> Result<()>;

    /// Publish the challenge TXT record
    async fn present(&self, challenge: &ChallengeRequest) -> Result<()>;

    /// Remove the challenge TXT record created by `present`
    async fn clean_up(&self, challenge: &ChallengeRequest) -> Result<()>;
}

mod config;
mod safedns;

pub use config::{load_config, SecretKeySelector, SolverConfig};
pub use safedns::SafeDnsSolver;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_dns_name() {
        assert_eq!("example.com", sanitize_dns_name("example.com."));
        assert_eq!("example.com", sanitize_dns_name("example.com"));
        // only the single trailing dot is stripped
        assert_eq!("example.com.", sanitize_dns_name("example.com.."));
        assert_eq!(
            "_acme-challenge.example.com",
            sanitize_dns_name("_acme-challenge.example.com.")
        );
    }

    #[test]
    fn test_txt_record_content() {
        assert_eq!("\"abc123\"", txt_record_content("abc123"));
        assert_eq!("\"\"", txt_record_content(""));
    }

    #[test]
    fn test_challenge_request_deserialize() {
        let data = r###"{
            "resolvedZone": "example.com.",
            "resolvedFQDN": "_acme-challenge.example.com.",
            "key": "tok1",
            "resourceNamespace": "ns1",
            "config": {"apiKeySecretRef": {"name": "cred", "key": "apiKey"}}
        }"###;
        let challenge: ChallengeRequest = serde_json::from_str(data).unwrap();
        assert_eq!("example.com.", challenge.resolved_zone);
        assert_eq!("_acme-challenge.example.com.", challenge.resolved_fqdn);
        assert_eq!("tok1", challenge.key);
        assert_eq!("ns1", challenge.resource_namespace);
        assert!(challenge.config.is_some());
    }
}

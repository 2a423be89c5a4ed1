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

use super::{Error, Result, Secret, SecretStore, LOG_CATEGORY};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

static SERVICE_ACCOUNT_TOKEN_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/token";
static SERVICE_ACCOUNT_CA_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

static API_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection configuration for the Kubernetes secret store.
#[derive(Debug, Clone, Default)]
pub struct StoreConf {
    /// API server base URL, e.g. `https://10.0.0.1:443`
    pub api_server: String,
    /// Bearer token used to authenticate requests
    pub token: String,
    /// PEM-encoded CA certificate of the API server, if not publicly trusted
    pub ca_cert: Option<Vec<u8>>,
}

impl StoreConf {
    /// Builds the configuration from the conventional in-cluster
    /// environment: service host/port variables plus the mounted
    /// service account token and CA certificate.
    pub fn from_cluster_env() -> Result<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            Error::InvalidConf {
                message: "KUBERNETES_SERVICE_HOST is not set".to_string(),
            }
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT")
            .unwrap_or_else(|_| "443".to_string());
        let token = std::fs::read_to_string(SERVICE_ACCOUNT_TOKEN_PATH)
            .map_err(|e| Error::InvalidConf {
                message: format!(
                    "read {SERVICE_ACCOUNT_TOKEN_PATH} fail: {e}"
                ),
            })?;
        let ca_cert = std::fs::read(SERVICE_ACCOUNT_CA_PATH).ok();

        Ok(Self {
            api_server: format!("https://{host}:{port}"),
            token: token.trim().to_string(),
            ca_cert,
        })
    }
}

/// Secret JSON object as served by the API; values are base64-encoded.
#[derive(Deserialize, Debug)]
struct SecretObject {
    #[serde(default)]
    data: HashMap<String, String>,
}

fn decode_secret_object(object: SecretObject) -> Result<Secret> {
    let mut data = HashMap::with_capacity(object.data.len());
    for (key, value) in object.data {
        let decoded = STANDARD
            .decode(value)
            .map_err(|e| Error::Base64Decode { source: e })?;
        data.insert(key, decoded);
    }
    Ok(Secret { data })
}

/// Secret store backed by the Kubernetes API server.
///
/// Read-only after construction; one lookup per challenge.
#[derive(Debug)]
pub struct KubernetesSecretStore {
    api_server: String,
    token: String,
    client: reqwest::Client,
}

impl KubernetesSecretStore {
    /// Creates a store client from the given connection configuration.
    pub fn new(conf: &StoreConf) -> Result<Self> {
        if conf.api_server.is_empty() {
            return Err(Error::InvalidConf {
                message: "api server is required".to_string(),
            });
        }
        let mut builder = reqwest::Client::builder().timeout(API_TIMEOUT);
        if let Some(ca_cert) = &conf.ca_cert {
            let cert = reqwest::Certificate::from_pem(ca_cert)
                .map_err(|e| Error::Request { source: e })?;
            builder = builder.add_root_certificate(cert);
        }
        let client =
            builder.build().map_err(|e| Error::Request { source: e })?;

        Ok(Self {
            api_server: conf.api_server.clone(),
            token: conf.token.clone(),
            client,
        })
    }
}

#[async_trait]
impl SecretStore for KubernetesSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret> {
        let url = format!(
            "{}/api/v1/namespaces/{namespace}/secrets/{name}",
            self.api_server
        );
        debug!(category = LOG_CATEGORY, namespace, name, "get secret");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Request { source: e })?;

        if response.status().as_u16() == 404 {
            return Err(Error::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| Error::Request { source: e })?;
            return Err(Error::Api { status, body });
        }

        let object: SecretObject = response
            .json()
            .await
            .map_err(|e| Error::Request { source: e })?;
        decode_secret_object(object)
    }
}

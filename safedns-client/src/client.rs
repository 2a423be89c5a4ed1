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

use super::{
    CreateRecordRequest, Error, RecordFilter, Result, ZoneRecord,
    ZoneRecordService, LOG_CATEGORY,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

static API_TIMEOUT: Duration = Duration::from_secs(30);

/// SafeDNS wraps every response body in a data envelope
#[derive(Deserialize, Debug)]
struct ApiResponse<T> {
    data: T,
}

fn new_request_error(err: reqwest::Error) -> Error {
    Error::Request { source: err }
}

/// Client for the SafeDNS zone record API, scoped to one API key.
///
/// Constructed fresh for every challenge; it holds no state beyond the
/// endpoint and credential.
pub struct SafeDnsClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl SafeDnsClient {
    /// Creates a client for the given endpoint and API key.
    ///
    /// Fails if the endpoint is not a valid absolute URL.
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        let info = Url::parse(endpoint).map_err(|e| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .map_err(new_request_error)?;
        Ok(Self {
            endpoint: info.origin().ascii_serialization(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn records_url(&self, zone: &str) -> String {
        format!("{}/safedns/v1/zones/{zone}/records", self.endpoint)
    }
}

#[async_trait]
impl ZoneRecordService for SafeDnsClient {
    async fn create_zone_record(
        &self,
        zone: &str,
        req: CreateRecordRequest,
    ) -> Result<ZoneRecord> {
        let url = self.records_url(zone);
        debug!(
            category = LOG_CATEGORY,
            zone,
            name = req.name,
            "create zone record"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(new_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(new_request_error)?;
            return Err(Error::Api { status, body });
        }

        let api_response: ApiResponse<ZoneRecord> =
            response.json().await.map_err(new_request_error)?;
        Ok(api_response.data)
    }

    async fn get_zone_records(
        &self,
        zone: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<ZoneRecord>> {
        let url = self.records_url(zone);
        debug!(category = LOG_CATEGORY, zone, "get zone records");

        let response = self
            .client
            .get(url)
            .query(&filter.to_query())
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(new_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(new_request_error)?;
            return Err(Error::Api { status, body });
        }

        let api_response: ApiResponse<Vec<ZoneRecord>> =
            response.json().await.map_err(new_request_error)?;
        Ok(api_response.data)
    }

    async fn delete_zone_record(
        &self,
        zone: &str,
        record_id: u64,
    ) -> Result<()> {
        let url = format!("{}/{record_id}", self.records_url(zone));
        debug!(
            category = LOG_CATEGORY,
            zone, record_id, "delete zone record"
        );

        let response = self
            .client
            .delete(url)
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(new_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(new_request_error)?;
            return Err(Error::Api { status, body });
        }

        Ok(())
    }
}

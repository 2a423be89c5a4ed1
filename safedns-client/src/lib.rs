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
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Category name for SafeDNS client logging
pub static LOG_CATEGORY: &str = "safedns_client";

/// Record type used for ACME DNS-01 challenges
pub static RECORD_TYPE_TXT: &str = "TXT";

/// Errors that can occur while talking to the SafeDNS API
#[derive(Debug, Snafu)]
pub enum Error {
    /// Transport-level failure (connect, timeout, body read)
    #[snafu(display("SafeDNS request error: {source}"))]
    Request { source: reqwest::Error },

    /// The API answered with a non-success status
    #[snafu(display("SafeDNS API error: {status} - {body}"))]
    Api { status: u16, body: String },

    /// The endpoint URL could not be parsed
    #[snafu(display("invalid SafeDNS endpoint '{endpoint}': {message}"))]
    InvalidEndpoint { endpoint: String, message: String },
}

/// Convenience type alias for Results with our Error type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A DNS record as returned by the zone records endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ZoneRecord {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub ttl: Option<u32>,
}

/// Payload for creating a record in a zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRecordRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
}

/// Equality filters accepted by the zone record listing endpoint.
///
/// SafeDNS expresses filters as `property:operator=value` query
/// parameters; only the equality operator is needed here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub name: Option<String>,
    pub record_type: Option<String>,
    pub content: Option<String>,
}

impl RecordFilter {
    /// Serializes the filter into `property:eq=value` query pairs.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(3);
        if let Some(name) = &self.name {
            query.push(("name:eq".to_string(), name.clone()));
        }
        if let Some(record_type) = &self.record_type {
            query.push(("type:eq".to_string(), record_type.clone()));
        }
        if let Some(content) = &self.content {
            query.push(("content:eq".to_string(), content.clone()));
        }
        query
    }
}

/// The three remote operations the challenge solver needs.
///
/// `SafeDnsClient` is the production implementation; tests substitute
/// an in-memory fake.
#[async_trait]
pub trait ZoneRecordService: Send + Sync {
    /// Create a record in the zone
    async fn create_zone_record(
        &self,
        zone: &str,
        req: CreateRecordRequest,
    ) -> Result<ZoneRecord>;

    /// List records in the zone matching the filter
    async fn get_zone_records(
        &self,
        zone: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<ZoneRecord>>;

    /// Delete a record from the zone by its identifier
    async fn delete_zone_record(&self, zone: &str, record_id: u64)
        -> Result<()>;
}

mod client;

pub use client::SafeDnsClient;

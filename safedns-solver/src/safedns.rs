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
    load_config, sanitize_dns_name, txt_record_content, ChallengeRequest,
    DnsSolver, Error, Result, LOG_CATEGORY, SOLVER_NAME,
};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use safedns_client::{
    CreateRecordRequest, RecordFilter, SafeDnsClient, ZoneRecordService,
    RECORD_TYPE_TXT,
};
use safedns_secret::{KubernetesSecretStore, SecretStore, StoreConf};
use std::sync::Arc;
use tracing::info;

type ServiceFactory = Box<
    dyn Fn(&str) -> safedns_client::Result<Arc<dyn ZoneRecordService>>
        + Send
        + Sync,
>;

/// DNS-01 challenge solver for SafeDNS.
///
/// Holds no state across calls except the secret store client set once
/// by `initialize`; a fresh API client scoped to the resolved credential
/// is built for every challenge.
pub struct SafeDnsSolver {
    store: OnceCell<Arc<dyn SecretStore>>,
    service_factory: ServiceFactory,
}

impl SafeDnsSolver {
    /// Creates a solver that talks to the SafeDNS API at `api_endpoint`.
    pub fn new(api_endpoint: &str) -> Self {
        let endpoint = api_endpoint.to_string();
        Self {
            store: OnceCell::new(),
            service_factory: Box::new(move |api_key| {
                let client = SafeDnsClient::new(&endpoint, api_key)?;
                Ok(Arc::new(client) as Arc<dyn ZoneRecordService>)
            }),
        }
    }

    #[cfg(test)]
    fn new_for_test(
        store: Arc<dyn SecretStore>,
        service: Arc<dyn ZoneRecordService>,
    ) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(store);
        Self {
            store: cell,
            service_factory: Box::new(move |_| Ok(service.clone())),
        }
    }

    /// Resolves the challenge's credential into a record service.
    ///
    /// Decodes the config blob, fetches the referenced secret from the
    /// store, reads the configured key and builds a client scoped to
    /// that single credential value.
    async fn zone_record_service(
        &self,
        challenge: &ChallengeRequest,
    ) -> Result<Arc<dyn ZoneRecordService>> {
        let config = load_config(challenge.config.as_ref())?;
        let Some(secret_ref) = config.api_key_secret_ref else {
            return Err(Error::SecretLookup {
                message: format!(
                    "no secret reference configured for challenge in namespace '{}'",
                    challenge.resource_namespace
                ),
            });
        };
        let store = self.store.get().ok_or_else(|| Error::Connection {
            message: "secret store client is not initialized".to_string(),
        })?;

        let secret = store
            .get_secret(&challenge.resource_namespace, &secret_ref.name)
            .await
            .map_err(|e| Error::SecretLookup {
                message: e.to_string(),
            })?;
        let Some(api_key) = secret.data.get(&secret_ref.key) else {
            return Err(Error::MissingKey {
                key: secret_ref.key,
                namespace: challenge.resource_namespace.clone(),
                secret: secret_ref.name,
            });
        };

        let api_key = String::from_utf8_lossy(api_key);
        (self.service_factory)(&api_key)
            .map_err(|e| Error::Remote { source: e })
    }
}

#[async_trait]
impl DnsSolver for SafeDnsSolver {
    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    async fn initialize(&self, conf: &StoreConf) -> Result<()> {
        let store = KubernetesSecretStore::new(conf).map_err(|e| {
            Error::Connection {
                message: e.to_string(),
            }
        })?;
        let _ = self.store.set(Arc::new(store));
        Ok(())
    }

    async fn present(&self, challenge: &ChallengeRequest) -> Result<()> {
        let service = self.zone_record_service(challenge).await?;

        let zone = sanitize_dns_name(&challenge.resolved_zone);
        let record_name = sanitize_dns_name(&challenge.resolved_fqdn);

        info!(
            category = LOG_CATEGORY,
            zone,
            record = record_name,
            "creating TXT record"
        );
        let req = CreateRecordRequest {
            name: record_name,
            record_type: RECORD_TYPE_TXT.to_string(),
            content: txt_record_content(&challenge.key),
        };
        service
            .create_zone_record(&zone, req)
            .await
            .map_err(|e| Error::Remote { source: e })?;
        Ok(())
    }

    /// Removes the TXT record created by `present`.
    ///
    /// The zone is queried with equality filters on name, type and
    /// content; if several records match, the first one the API returns
    /// is deleted. SafeDNS does not document the ordering of that list.
    async fn clean_up(&self, challenge: &ChallengeRequest) -> Result<()> {
        let service = self.zone_record_service(challenge).await?;

        let zone = sanitize_dns_name(&challenge.resolved_zone);
        let record_name = sanitize_dns_name(&challenge.resolved_fqdn);

        let filter = RecordFilter {
            name: Some(record_name.clone()),
            record_type: Some(RECORD_TYPE_TXT.to_string()),
            content: Some(txt_record_content(&challenge.key)),
        };
        info!(
            category = LOG_CATEGORY,
            zone,
            record = record_name,
            "retrieving TXT record"
        );
        let records = service
            .get_zone_records(&zone, &filter)
            .await
            .map_err(|e| Error::Remote { source: e })?;

        let Some(record) = records.first() else {
            return Err(Error::NotFound {
                record: record_name,
                zone,
            });
        };

        info!(
            category = LOG_CATEGORY,
            zone,
            record_id = record.id,
            "deleting zone record"
        );
        service
            .delete_zone_record(&zone, record.id)
            .await
            .map_err(|e| Error::Remote { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use safedns_client::ZoneRecord;
    use safedns_secret::MemorySecretStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeZoneRecordService {
        records: Mutex<Vec<ZoneRecord>>,
        created: Mutex<Vec<(String, CreateRecordRequest)>>,
        listed: Mutex<Vec<(String, RecordFilter)>>,
        deleted: Mutex<Vec<(String, u64)>>,
    }

    #[async_trait]
    impl ZoneRecordService for FakeZoneRecordService {
        async fn create_zone_record(
            &self,
            zone: &str,
            req: CreateRecordRequest,
        ) -> safedns_client::Result<ZoneRecord> {
            let record = ZoneRecord {
                id: 1,
                name: req.name.clone(),
                record_type: req.record_type.clone(),
                content: req.content.clone(),
                ttl: None,
            };
            self.created.lock().unwrap().push((zone.to_string(), req));
            Ok(record)
        }

        async fn get_zone_records(
            &self,
            zone: &str,
            filter: &RecordFilter,
        ) -> safedns_client::Result<Vec<ZoneRecord>> {
            self.listed
                .lock()
                .unwrap()
                .push((zone.to_string(), filter.clone()));
            Ok(self.records.lock().unwrap().clone())
        }

        async fn delete_zone_record(
            &self,
            zone: &str,
            record_id: u64,
        ) -> safedns_client::Result<()> {
            self.deleted
                .lock()
                .unwrap()
                .push((zone.to_string(), record_id));
            Ok(())
        }
    }

    fn new_challenge() -> ChallengeRequest {
        ChallengeRequest {
            resolved_zone: "example.com.".to_string(),
            resolved_fqdn: "_acme-challenge.example.com.".to_string(),
            key: "tok1".to_string(),
            resource_namespace: "ns1".to_string(),
            config: Some(serde_json::json!({
                "apiKeySecretRef": {"name": "cred", "key": "apiKey"}
            })),
        }
    }

    fn new_store() -> Arc<MemorySecretStore> {
        let store = MemorySecretStore::new();
        store.insert("ns1", "cred", "apiKey", b"XYZ");
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_present_creates_txt_record() {
        let service = Arc::new(FakeZoneRecordService::default());
        let solver = SafeDnsSolver::new_for_test(new_store(), service.clone());

        solver.present(&new_challenge()).await.unwrap();

        let created = service.created.lock().unwrap();
        assert_eq!(1, created.len());
        let (zone, req) = &created[0];
        assert_eq!("example.com", zone);
        assert_eq!(
            &CreateRecordRequest {
                name: "_acme-challenge.example.com".to_string(),
                record_type: "TXT".to_string(),
                content: "\"tok1\"".to_string(),
            },
            req
        );
    }

    #[tokio::test]
    async fn test_present_missing_config_fails_at_secret_lookup() {
        let service = Arc::new(FakeZoneRecordService::default());
        let solver = SafeDnsSolver::new_for_test(new_store(), service.clone());

        let mut challenge = new_challenge();
        challenge.config = None;

        let err = solver.present(&challenge).await.unwrap_err();
        assert!(matches!(err, Error::SecretLookup { .. }));
        assert_eq!(
            "secret lookup failed: no secret reference configured for challenge in namespace 'ns1'",
            err.to_string()
        );
        assert_eq!(0, service.created.lock().unwrap().len());
    }

    #[tokio::test]
    async fn test_present_before_initialize() {
        let solver = SafeDnsSolver::new("https://api.ukfast.io");
        let err = solver.present(&new_challenge()).await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test]
    async fn test_missing_secret_key() {
        let store = MemorySecretStore::new();
        store.insert("ns1", "cred", "otherKey", b"XYZ");
        let service = Arc::new(FakeZoneRecordService::default());
        let solver =
            SafeDnsSolver::new_for_test(Arc::new(store), service.clone());

        let err = solver.present(&new_challenge()).await.unwrap_err();
        assert_eq!(
            "key 'apiKey' not found in secret 'ns1/cred'",
            err.to_string()
        );
    }

    #[tokio::test]
    async fn test_clean_up_no_records() {
        let service = Arc::new(FakeZoneRecordService::default());
        let solver = SafeDnsSolver::new_for_test(new_store(), service.clone());

        let err = solver.clean_up(&new_challenge()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(
            "no existing records found for '_acme-challenge.example.com' in zone 'example.com'",
            err.to_string()
        );
        assert_eq!(0, service.deleted.lock().unwrap().len());
    }

    #[tokio::test]
    async fn test_clean_up_deletes_first_record() {
        let service = Arc::new(FakeZoneRecordService::default());
        for id in [11, 22, 33] {
            service.records.lock().unwrap().push(ZoneRecord {
                id,
                name: "_acme-challenge.example.com".to_string(),
                record_type: "TXT".to_string(),
                content: "\"tok1\"".to_string(),
                ttl: None,
            });
        }
        let solver = SafeDnsSolver::new_for_test(new_store(), service.clone());

        solver.clean_up(&new_challenge()).await.unwrap();

        // the query carries the same quoting present used
        let listed = service.listed.lock().unwrap();
        assert_eq!(
            RecordFilter {
                name: Some("_acme-challenge.example.com".to_string()),
                record_type: Some("TXT".to_string()),
                content: Some("\"tok1\"".to_string()),
            },
            listed[0].1
        );

        let deleted = service.deleted.lock().unwrap();
        assert_eq!(vec![("example.com".to_string(), 11)], *deleted);
    }

    #[tokio::test]
    async fn test_initialize() {
        let solver = SafeDnsSolver::new("https://api.ukfast.io");
        assert_eq!("safedns", solver.name());

        let conf = StoreConf {
            api_server: "https://10.0.0.1:443".to_string(),
            token: "token".to_string(),
            ca_cert: None,
        };
        solver.initialize(&conf).await.unwrap();

        let err = solver
            .initialize(&StoreConf::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }
}

//! Secure-credential backend
//!
//! The platform credential store is reached through the narrow
//! [`CredentialApi`] capability mirroring its raw primitives, so the
//! upsert protocol stays testable against an in-memory fake. The adapter
//! implements the two-phase write the underlying API demands: an existence
//! probe, then add or update. The probe-then-write sequence is not atomic;
//! concurrent external mutation between the two calls is visible to the
//! caller exactly as the platform reports it.

use std::collections::BTreeMap;

use keyring::Entry;
use tracing::debug;

use crate::error::{BackingStoreError, Result, StorageError};

/// Record class for every entry this crate manages
pub const CLASS_GENERIC_PASSWORD: &str = "generic-password";

/// Accessibility level requested for stored records
pub const ACCESSIBLE_WHEN_UNLOCKED: &str = "when-unlocked";

/// Service name used for platform keychain entries
const SERVICE_NAME: &str = "polystore";

/// Lookup request against the credential store, limited to one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialQuery {
    /// Account the record is filed under
    pub account: String,
    /// Whether the secret payload should be returned
    pub return_data: bool,
    /// Whether the record's attributes should be returned
    pub return_attributes: bool,
}

impl CredentialQuery {
    /// Existence probe: found/not-found signal only, no payload
    pub fn probe(account: &str) -> Self {
        Self {
            account: account.to_string(),
            return_data: false,
            return_attributes: false,
        }
    }

    /// Attribute lookup: the record's attributes without its secret
    pub fn attributes(account: &str) -> Self {
        Self {
            account: account.to_string(),
            return_data: false,
            return_attributes: true,
        }
    }

    /// Payload lookup: the record's secret bytes
    pub fn data(account: &str) -> Self {
        Self {
            account: account.to_string(),
            return_data: true,
            return_attributes: false,
        }
    }
}

/// A matched record, populated according to the query's return flags
#[derive(Debug, Clone, Default)]
pub struct CredentialMatch {
    /// Secret payload, when requested and stored as bytes
    pub data: Option<Vec<u8>>,
    /// Record attributes, when requested
    pub attributes: Option<BTreeMap<String, String>>,
}

/// Search predicate for an update, built from the existing record's
/// attributes merged with the fixed record class
#[derive(Debug, Clone)]
pub struct CredentialSearch {
    pub attributes: BTreeMap<String, String>,
}

/// Attributes written by an add or update
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub account: String,
    pub data: Vec<u8>,
    pub accessibility: String,
}

impl CredentialRecord {
    fn new(account: &str, data: &[u8]) -> Self {
        Self {
            account: account.to_string(),
            data: data.to_vec(),
            accessibility: ACCESSIBLE_WHEN_UNLOCKED.to_string(),
        }
    }
}

/// Failure reported by a raw credential-store call
///
/// The adapter interprets nothing beyond not-found and success; every
/// other status travels through as an opaque platform failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("no matching credential record")]
    NotFound,

    #[error(transparent)]
    Platform(#[from] BackingStoreError),
}

impl From<CredentialError> for StorageError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::NotFound => {
                StorageError::BackingStore(BackingStoreError::new("no matching credential record"))
            }
            CredentialError::Platform(inner) => StorageError::BackingStore(inner),
        }
    }
}

/// Raw primitives of the platform credential store
///
/// Production: the system keychain via the `keyring` crate. Testing: an
/// in-memory fake.
pub trait CredentialApi {
    /// Look up the record for an account, honoring the query's return flags
    fn find(&self, query: &CredentialQuery) -> std::result::Result<CredentialMatch, CredentialError>;

    /// Create a record; the caller has established none exists
    fn add(&mut self, record: &CredentialRecord) -> std::result::Result<(), CredentialError>;

    /// Rewrite the record matched by the search predicate in place
    fn update(
        &mut self,
        search: &CredentialSearch,
        record: &CredentialRecord,
    ) -> std::result::Result<(), CredentialError>;

    /// Delete the record for an account
    fn delete(&mut self, account: &str) -> std::result::Result<(), CredentialError>;
}

/// Secure-credential adapter: probe → add-or-update over a [`CredentialApi`]
pub struct KeychainStore {
    api: Box<dyn CredentialApi>,
}

impl KeychainStore {
    /// Adapter over the platform keychain
    pub fn system() -> Self {
        Self::new(Box::new(SystemCredentials::new()))
    }

    /// Adapter over an explicit credential API (fakes, alternate bindings)
    pub fn new(api: Box<dyn CredentialApi>) -> Self {
        Self { api }
    }

    /// Upsert the payload for an account
    ///
    /// Probes for an existing record first. Absent: one add call. Present:
    /// re-query for the record's attributes, merge in the record class to
    /// form the update predicate, then update in place — platform-managed
    /// metadata on the existing record survives instead of being
    /// recreated.
    pub fn set(&mut self, account: &str, data: &[u8]) -> Result<()> {
        let record = CredentialRecord::new(account, data);

        match self.api.find(&CredentialQuery::probe(account)) {
            Err(CredentialError::NotFound) => {
                self.api.add(&record).map_err(StorageError::from)?;
                debug!("Added credential record for account: {}", account);
            }
            Ok(_) => {
                let existing = self
                    .api
                    .find(&CredentialQuery::attributes(account))
                    .map_err(StorageError::from)?;

                let mut attributes = existing.attributes.unwrap_or_default();
                attributes.insert("class".to_string(), CLASS_GENERIC_PASSWORD.to_string());

                self.api
                    .update(&CredentialSearch { attributes }, &record)
                    .map_err(StorageError::from)?;
                debug!("Updated credential record for account: {}", account);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    /// Read the payload for an account
    ///
    /// A record carrying no byte payload is an unexpected-type failure;
    /// not-found surfaces as the translated store error.
    pub fn get(&self, account: &str) -> Result<Vec<u8>> {
        let matched = self
            .api
            .find(&CredentialQuery::data(account))
            .map_err(StorageError::from)?;

        matched.data.ok_or_else(|| {
            StorageError::UnexpectedValueType(
                "credential record holds no byte payload".to_string(),
            )
        })
    }

    /// Delete the record for an account; absent records are a no-op
    pub fn remove(&mut self, account: &str) -> Result<()> {
        match self.api.find(&CredentialQuery::probe(account)) {
            Err(CredentialError::NotFound) => Ok(()),
            Ok(_) => {
                self.api.delete(account).map_err(StorageError::from)?;
                debug!("Deleted credential record for account: {}", account);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Existence probe; requests no payload, only a found signal
    pub fn contains(&self, account: &str) -> bool {
        self.api.find(&CredentialQuery::probe(account)).is_ok()
    }
}

/// Platform keychain binding
///
/// Secrets travel as base64 strings through the keyring entry API. The
/// binding exposes no record attributes, so attribute lookups report an
/// empty set and both protocol branches write through the same entry call.
pub struct SystemCredentials {
    service: String,
}

impl SystemCredentials {
    /// Binding under the default service name
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Binding under an explicit service name
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, account: &str) -> std::result::Result<Entry, CredentialError> {
        Entry::new(&self.service, account).map_err(map_keyring_error)
    }

    fn write(&self, record: &CredentialRecord) -> std::result::Result<(), CredentialError> {
        let entry = self.entry(&record.account)?;
        entry
            .set_password(&base64_encode(&record.data))
            .map_err(map_keyring_error)
    }
}

impl Default for SystemCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialApi for SystemCredentials {
    fn find(&self, query: &CredentialQuery) -> std::result::Result<CredentialMatch, CredentialError> {
        let entry = self.entry(&query.account)?;
        let encoded = entry.get_password().map_err(map_keyring_error)?;

        let data = if query.return_data {
            Some(base64_decode(&encoded)?)
        } else {
            None
        };
        let attributes = query.return_attributes.then(BTreeMap::new);

        Ok(CredentialMatch { data, attributes })
    }

    fn add(&mut self, record: &CredentialRecord) -> std::result::Result<(), CredentialError> {
        self.write(record)
    }

    fn update(
        &mut self,
        _search: &CredentialSearch,
        record: &CredentialRecord,
    ) -> std::result::Result<(), CredentialError> {
        self.write(record)
    }

    fn delete(&mut self, account: &str) -> std::result::Result<(), CredentialError> {
        let entry = self.entry(account)?;
        entry.delete_password().map_err(map_keyring_error)
    }
}

fn map_keyring_error(e: keyring::Error) -> CredentialError {
    match e {
        keyring::Error::NoEntry => CredentialError::NotFound,
        other => CredentialError::Platform(BackingStoreError::new(other.to_string())),
    }
}

/// Base64 encode bytes
fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Base64 decode string
fn base64_decode(encoded: &str) -> std::result::Result<Vec<u8>, CredentialError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| {
            CredentialError::Platform(BackingStoreError::new(format!(
                "stored secret is not valid base64: {}",
                e
            )))
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// In-memory stand-in for the platform credential store
    ///
    /// Shared with the adapter through `Rc<RefCell<..>>` so tests can
    /// inspect call counts and stored attributes after the fact.
    #[derive(Default)]
    pub(crate) struct MemoryCredentials {
        records: BTreeMap<String, FakeRecord>,
        pub adds: u32,
        pub updates: u32,
        pub last_query: Option<CredentialQuery>,
    }

    struct FakeRecord {
        data: Vec<u8>,
        attributes: BTreeMap<String, String>,
    }

    impl MemoryCredentials {
        pub fn shared() -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self::default()))
        }

        pub fn record_count(&self) -> usize {
            self.records.len()
        }

        pub fn attributes_of(&self, account: &str) -> Option<&BTreeMap<String, String>> {
            self.records.get(account).map(|r| &r.attributes)
        }
    }

    impl CredentialApi for Rc<RefCell<MemoryCredentials>> {
        fn find(
            &self,
            query: &CredentialQuery,
        ) -> std::result::Result<CredentialMatch, CredentialError> {
            let mut inner = self.borrow_mut();
            inner.last_query = Some(query.clone());

            let record = inner
                .records
                .get(&query.account)
                .ok_or(CredentialError::NotFound)?;

            Ok(CredentialMatch {
                data: query.return_data.then(|| record.data.clone()),
                attributes: query.return_attributes.then(|| record.attributes.clone()),
            })
        }

        fn add(&mut self, record: &CredentialRecord) -> std::result::Result<(), CredentialError> {
            let mut inner = self.borrow_mut();
            inner.adds += 1;

            let mut attributes = BTreeMap::new();
            attributes.insert("class".to_string(), CLASS_GENERIC_PASSWORD.to_string());
            attributes.insert("accessible".to_string(), record.accessibility.clone());
            attributes.insert("created-at-add".to_string(), format!("add-{}", inner.adds));

            inner.records.insert(
                record.account.clone(),
                FakeRecord {
                    data: record.data.clone(),
                    attributes,
                },
            );
            Ok(())
        }

        fn update(
            &mut self,
            search: &CredentialSearch,
            record: &CredentialRecord,
        ) -> std::result::Result<(), CredentialError> {
            assert_eq!(
                search.attributes.get("class").map(String::as_str),
                Some(CLASS_GENERIC_PASSWORD),
                "update predicate must carry the record class"
            );

            let mut inner = self.borrow_mut();
            inner.updates += 1;
            let existing = inner
                .records
                .get_mut(&record.account)
                .ok_or(CredentialError::NotFound)?;
            // In-place rewrite: the payload changes, the attributes survive
            existing.data = record.data.clone();
            Ok(())
        }

        fn delete(&mut self, account: &str) -> std::result::Result<(), CredentialError> {
            self.borrow_mut()
                .records
                .remove(account)
                .map(|_| ())
                .ok_or(CredentialError::NotFound)
        }
    }

    /// Credential API whose every call fails with a platform status
    pub(crate) struct FailingCredentials;

    impl FailingCredentials {
        fn failure() -> CredentialError {
            CredentialError::Platform(BackingStoreError::with_code(-128, "user canceled"))
        }
    }

    impl CredentialApi for FailingCredentials {
        fn find(
            &self,
            _query: &CredentialQuery,
        ) -> std::result::Result<CredentialMatch, CredentialError> {
            Err(Self::failure())
        }

        fn add(&mut self, _record: &CredentialRecord) -> std::result::Result<(), CredentialError> {
            Err(Self::failure())
        }

        fn update(
            &mut self,
            _search: &CredentialSearch,
            _record: &CredentialRecord,
        ) -> std::result::Result<(), CredentialError> {
            Err(Self::failure())
        }

        fn delete(&mut self, _account: &str) -> std::result::Result<(), CredentialError> {
            Err(Self::failure())
        }
    }

    fn store_with_fake() -> (KeychainStore, Rc<RefCell<MemoryCredentials>>) {
        let fake = MemoryCredentials::shared();
        (KeychainStore::new(Box::new(fake.clone())), fake)
    }

    #[test]
    fn test_first_set_adds_exactly_one_record() {
        let (mut store, fake) = store_with_fake();
        store.set("token", b"v1").unwrap();

        let fake = fake.borrow();
        assert_eq!(fake.adds, 1);
        assert_eq!(fake.updates, 0);
        assert_eq!(fake.record_count(), 1);
    }

    #[test]
    fn test_second_set_updates_in_place() {
        let (mut store, fake) = store_with_fake();
        store.set("token", b"v1").unwrap();
        store.set("token", b"v2").unwrap();

        assert_eq!(store.get("token").unwrap(), b"v2");

        let fake = fake.borrow();
        assert_eq!(fake.adds, 1);
        assert_eq!(fake.updates, 1);
        assert_eq!(fake.record_count(), 1);
    }

    #[test]
    fn test_update_preserves_platform_metadata() {
        let (mut store, fake) = store_with_fake();
        store.set("secret", b"a").unwrap();
        store.set("secret", b"b").unwrap();

        let fake = fake.borrow();
        let attributes = fake.attributes_of("secret").unwrap();
        assert_eq!(
            attributes.get("created-at-add").map(String::as_str),
            Some("add-1")
        );
    }

    #[test]
    fn test_get_missing_surfaces_store_error() {
        let (store, _) = store_with_fake();
        let err = store.get("missing").unwrap_err();
        assert!(matches!(err, StorageError::BackingStore(_)));
    }

    #[test]
    fn test_remove_absent_is_a_no_op() {
        let (mut store, _) = store_with_fake();
        store.remove("missing").unwrap();
        store.remove("missing").unwrap();
    }

    #[test]
    fn test_remove_deletes_the_record() {
        let (mut store, fake) = store_with_fake();
        store.set("token", b"v1").unwrap();
        store.remove("token").unwrap();

        assert!(!store.contains("token"));
        assert_eq!(fake.borrow().record_count(), 0);
    }

    #[test]
    fn test_contains_probe_requests_no_payload() {
        let (mut store, fake) = store_with_fake();
        store.set("token", b"v1").unwrap();

        assert!(store.contains("token"));
        let last = fake.borrow().last_query.clone().unwrap();
        assert!(!last.return_data);
        assert!(!last.return_attributes);
    }

    #[test]
    fn test_contains_reads_failure_as_absent() {
        let store = KeychainStore::new(Box::new(FailingCredentials));
        assert!(!store.contains("anything"));
    }

    #[test]
    fn test_set_propagates_probe_failure() {
        let mut store = KeychainStore::new(Box::new(FailingCredentials));
        let err = store.set("token", b"v1").unwrap_err();
        match err {
            StorageError::BackingStore(e) => {
                assert_eq!(e.code, Some(-128));
                assert_eq!(e.message, "user canceled");
            }
            other => panic!("expected backing store error, got {other:?}"),
        }
    }
}

//! The user store: lifecycle operations and flat-file persistence.

use crate::code;
use crate::error::StoreError;
use crate::phone::normalize_number;
use crate::types::{PendingRegistration, UserRecord};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Identity store backed by a single JSON file.
///
/// The file maps lowercase usernames to records and is rewritten in full
/// after every mutation; it is the sole source of truth across restarts.
pub struct UserStore {
    path: PathBuf,
    default_region: String,
    records: BTreeMap<String, UserRecord>,
}

impl UserStore {
    /// Load the store from `path`, treating a missing or malformed file
    /// as an empty store (which is immediately written back).
    pub async fn load_or_init(
        path: impl Into<PathBuf>,
        default_region: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let mut store = Self {
            path,
            default_region: default_region.into(),
            records: BTreeMap::new(),
        };

        let contents = fs::read(&store.path).await;
        match contents {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(records) => {
                    store.records = records;
                    info!(
                        "Loaded {} user records from {:?}",
                        store.records.len(),
                        store.path
                    );
                }
                Err(e) => {
                    warn!(
                        "User file {:?} is malformed ({e}), starting with an empty store",
                        store.path
                    );
                    store.persist().await?;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("User file {:?} not found, initializing it", store.path);
                store.persist().await?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(store)
    }

    /// Rewrite the whole file. Temp file + rename so a crash mid-write
    /// never leaves a truncated store behind.
    async fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json.as_bytes()).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Persisted {} user records to {:?}", self.records.len(), self.path);
        Ok(())
    }

    /// Register `username` against `raw_phone`, creating a pending record
    /// with a fresh validation code.
    ///
    /// The caller is responsible for texting the returned code to the
    /// returned (normalized) number.
    #[instrument(skip(self))]
    pub async fn register(
        &mut self,
        username: &str,
        raw_phone: &str,
    ) -> Result<PendingRegistration, StoreError> {
        let username = canonical_username(username);
        if username.is_empty() || raw_phone.trim().is_empty() {
            return Err(StoreError::Validation("username or number is missing".into()));
        }

        let number = normalize_number(raw_phone, &self.default_region)?;

        if self.records.contains_key(&username) {
            return Err(StoreError::Validation("username already exists".into()));
        }
        // Pending records are allowed to collide on the number; only an
        // active binding blocks registration.
        if self
            .records
            .values()
            .any(|r| r.is_active() && r.number == number)
        {
            return Err(StoreError::Validation(
                "username with that number already exists".into(),
            ));
        }

        let auth_code = code::generate();
        self.records
            .insert(username.clone(), UserRecord::pending(number.clone(), auth_code.clone()));
        self.persist().await?;

        info!(%username, "Registered pending identity");
        Ok(PendingRegistration {
            username,
            number,
            auth_code,
        })
    }

    /// Confirm a pending registration. Returns `Ok(true)` and activates
    /// the identity only on an exact code match against a still-pending
    /// record; `Ok(false)` in every other case.
    ///
    /// There is no attempt limit or code expiry.
    #[instrument(skip(self, code))]
    pub async fn validate(&mut self, username: &str, code: &str) -> Result<bool, StoreError> {
        let username = canonical_username(username);
        let code = code.trim();

        let matched = self
            .records
            .get(&username)
            .is_some_and(|r| r.auth_code.as_deref() == Some(code));
        if !matched {
            return Ok(false);
        }

        if let Some(record) = self.records.get_mut(&username) {
            record.auth_code = None;
        }
        self.persist().await?;

        info!(%username, "Identity validated");
        Ok(true)
    }

    /// Remove an identity, pending or active.
    #[instrument(skip(self))]
    pub async fn deregister(&mut self, username: &str) -> Result<(), StoreError> {
        let username = canonical_username(username);
        if self.records.remove(&username).is_none() {
            return Err(StoreError::NotFound(username));
        }
        self.persist().await?;

        info!(%username, "Identity deregistered");
        Ok(())
    }

    /// Resolve a phone number to the username of an *active* identity.
    ///
    /// Pending records are invisible here. More than one active match is
    /// a data-integrity violation: it is logged, and the oldest
    /// registration wins so the result stays deterministic.
    pub fn username_for_number(&self, raw_phone: &str) -> Option<String> {
        let number = match normalize_number(raw_phone, &self.default_region) {
            Ok(n) => n,
            Err(e) => {
                debug!("Unresolvable sender number {raw_phone:?}: {e}");
                return None;
            }
        };

        let mut matches: Vec<(&String, &UserRecord)> = self
            .records
            .iter()
            .filter(|(_, r)| r.is_active() && r.number == number)
            .collect();
        if matches.len() > 1 {
            warn!(
                %number,
                usernames = ?matches.iter().map(|(u, _)| u.as_str()).collect::<Vec<_>>(),
                "Multiple active identities share one number"
            );
        }
        matches.sort_by(|(a_name, a), (b_name, b)| {
            (a.registered_at, a_name).cmp(&(b.registered_at, b_name))
        });
        matches.first().map(|(username, _)| (*username).clone())
    }

    /// The bound number of an *active* identity.
    pub fn number_for_username(&self, username: &str) -> Option<String> {
        let username = canonical_username(username);
        self.records
            .get(&username)
            .filter(|r| r.is_active())
            .map(|r| r.number.clone())
    }

    /// Set the quiet flag. Unknown usernames are a silent no-op by
    /// design; the return value says whether the flag was applied.
    pub async fn set_quiet(&mut self, username: &str, quiet: bool) -> Result<bool, StoreError> {
        let username = canonical_username(username);
        let Some(record) = self.records.get_mut(&username) else {
            return Ok(false);
        };
        record.quiet = quiet;
        self.persist().await?;
        Ok(true)
    }

    /// Read the quiet flag; `None` for unknown usernames.
    pub fn quiet(&self, username: &str) -> Option<bool> {
        let username = canonical_username(username);
        self.records.get(&username).map(|r| r.quiet)
    }

    /// Number of records, pending and active.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Usernames compare case-insensitively and ignore surrounding space.
fn canonical_username(username: &str) -> String {
    username.trim().to_lowercase()
}

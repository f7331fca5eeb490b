//! Completion service credential, persisted in SQLite.

use crate::db::Database;
use crate::messaging::NoticeSender;
use std::cell::RefCell;
use thiserror::Error;

/// Name of the row holding the completion API key.
pub const CREDENTIAL_NAME: &str = "completion";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Snapshot of the credential. `is_stored` is true iff a non-empty key is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeyState {
    pub key: String,
    pub is_stored: bool,
}

impl ApiKeyState {
    fn from_stored(stored: Option<String>) -> Self {
        match stored {
            Some(key) if !key.is_empty() => Self {
                key,
                is_stored: true,
            },
            _ => Self::default(),
        }
    }
}

/// Holds the single completion API key.
///
/// Constructed once at startup with [`CredentialStore::open`] and passed to
/// whoever needs it. Every read goes back to the database so a key saved or
/// removed elsewhere is seen immediately; the in-memory copy only serves as a
/// fallback if the database cannot be read.
pub struct CredentialStore<'a> {
    db: &'a Database,
    notices: NoticeSender,
    mirror: RefCell<ApiKeyState>,
}

impl<'a> CredentialStore<'a> {
    /// Load the persisted key into memory.
    pub fn open(db: &'a Database, notices: NoticeSender) -> Result<Self, CredentialError> {
        let state = ApiKeyState::from_stored(db.get_api_key(CREDENTIAL_NAME)?);
        tracing::debug!(is_stored = state.is_stored, "Credential store opened");
        Ok(Self {
            db,
            notices,
            mirror: RefCell::new(state),
        })
    }

    /// Re-read the persisted key and update the mirror.
    fn refresh(&self) -> ApiKeyState {
        match self.db.get_api_key(CREDENTIAL_NAME) {
            Ok(stored) => {
                let state = ApiKeyState::from_stored(stored);
                *self.mirror.borrow_mut() = state.clone();
                state
            }
            Err(e) => {
                tracing::warn!("Failed to read API key, using cached value: {}", e);
                self.mirror.borrow().clone()
            }
        }
    }

    /// True iff a non-empty key is currently persisted.
    pub fn exists(&self) -> bool {
        self.refresh().is_stored
    }

    /// Current state of the credential.
    pub fn state(&self) -> ApiKeyState {
        self.refresh()
    }

    /// The stored key, if any.
    pub fn api_key(&self) -> Option<String> {
        let state = self.refresh();
        state.is_stored.then_some(state.key)
    }

    /// Persist `candidate` verbatim. Blank input is refused with a warning and
    /// leaves the store untouched.
    pub fn save(&self, candidate: &str) -> Result<bool, CredentialError> {
        if candidate.trim().is_empty() {
            self.notices.warning("Please enter a valid API key");
            return Ok(false);
        }

        if let Err(e) = self.db.save_api_key(CREDENTIAL_NAME, candidate) {
            self.notices.error(format!("Failed to save API key: {}", e));
            return Err(e.into());
        }
        *self.mirror.borrow_mut() = ApiKeyState {
            key: candidate.to_string(),
            is_stored: true,
        };

        tracing::info!("API key saved");
        self.notices.success("API key saved");
        Ok(true)
    }

    /// Remove the persisted key. Clearing an empty store is fine.
    pub fn clear(&self) -> Result<(), CredentialError> {
        if let Err(e) = self.db.delete_api_key(CREDENTIAL_NAME) {
            self.notices.error(format!("Failed to remove API key: {}", e));
            return Err(e.into());
        }
        *self.mirror.borrow_mut() = ApiKeyState::default();

        tracing::info!("API key removed");
        self.notices.info("API key removed");
        Ok(())
    }

    /// Key with the middle hidden, for display.
    pub fn masked(&self) -> Option<String> {
        self.api_key().map(|key| mask_key(&key))
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "•".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    //! Unit tests for the credential store.
    //!
    //! Coverage:
    //! - save/exists/clear contract
    //! - blank input refusal
    //! - notices emitted per operation
    //! - persistence across store instances

    use super::*;
    use crate::messaging::{NoticeBus, NoticeLevel};
    use tempfile::TempDir;

    fn setup_test_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_at(temp_dir.path().join("test.db")).unwrap();
        db.migrate().unwrap();
        (temp_dir, db)
    }

    #[test]
    fn test_fresh_store_has_no_key() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();

        assert!(!store.exists());
        assert_eq!(store.api_key(), None);
        assert_eq!(store.state(), ApiKeyState::default());
    }

    #[test]
    fn test_blank_save_is_refused() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let mut notices = bus.subscribe();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();

        assert!(!store.save("").unwrap());
        assert!(!store.save("   ").unwrap());
        assert!(!store.exists());

        let levels: Vec<NoticeLevel> = notices.drain().into_iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Warning, NoticeLevel::Warning]);
    }

    #[test]
    fn test_blank_save_keeps_existing_key() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();

        store.save("sk-abc").unwrap();
        assert!(!store.save(" ").unwrap());
        assert_eq!(store.api_key(), Some("sk-abc".to_string()));
    }

    #[test]
    fn test_save_then_clear() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let mut notices = bus.subscribe();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();

        assert!(store.save("sk-abc").unwrap());
        assert!(store.exists());
        assert_eq!(
            store.state(),
            ApiKeyState {
                key: "sk-abc".to_string(),
                is_stored: true
            }
        );

        store.clear().unwrap();
        assert!(!store.exists());

        let levels: Vec<NoticeLevel> = notices.drain().into_iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Success, NoticeLevel::Info]);
    }

    #[test]
    fn test_save_stores_verbatim() {
        let (_tmp, db) = setup_test_db();
        let store = CredentialStore::open(&db, NoticeBus::new().sender()).unwrap();

        store.save("  sk-padded ").unwrap();
        assert_eq!(db.get_api_key(CREDENTIAL_NAME).unwrap(), Some("  sk-padded ".to_string()));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_tmp, db) = setup_test_db();
        let store = CredentialStore::open(&db, NoticeBus::new().sender()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn test_open_loads_persisted_key() {
        let (_tmp, db) = setup_test_db();
        db.save_api_key(CREDENTIAL_NAME, "sk-persisted").unwrap();

        let store = CredentialStore::open(&db, NoticeBus::new().sender()).unwrap();
        assert!(store.exists());
        assert_eq!(store.api_key(), Some("sk-persisted".to_string()));
    }

    #[test]
    fn test_sees_writes_made_behind_its_back() {
        let (_tmp, db) = setup_test_db();
        let store = CredentialStore::open(&db, NoticeBus::new().sender()).unwrap();

        db.save_api_key(CREDENTIAL_NAME, "sk-elsewhere").unwrap();
        assert!(store.exists());

        db.delete_api_key(CREDENTIAL_NAME).unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn test_empty_persisted_value_is_not_stored() {
        let (_tmp, db) = setup_test_db();
        db.save_api_key(CREDENTIAL_NAME, "").unwrap();

        let store = CredentialStore::open(&db, NoticeBus::new().sender()).unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn test_masked_hides_middle() {
        assert_eq!(mask_key("gsk_1234567890abcd"), "gsk_…abcd");
        assert_eq!(mask_key("short"), "•••••");
    }
}

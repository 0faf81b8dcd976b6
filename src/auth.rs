// Auth Gate - one shared password, stored on disk as a salted SHA-256
// digest. The credential file is the single source of truth and is re-read
// on every verify, so an external reset takes effect immediately.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::{AuthState, Session};

/// Password written when no credential store exists yet. A deployment must
/// change this before going live - the CLI prints a warning when it fires.
pub const DEFAULT_PASSWORD: &str = "admin";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum AuthError {
    /// Login attempt with a password that does not match the stored hash
    WrongPassword,
    /// Password change rejected: current password does not match
    WrongCurrentPassword,
    /// Password change rejected: new password and confirmation differ
    ConfirmationMismatch,
    /// Password change rejected: new password is empty
    EmptyPassword,
    /// Password change attempted without being logged in
    NotLoggedIn,
    /// Credential file unreadable/unwritable - fatal to the auth flow,
    /// never a silent grant
    Store(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::WrongPassword => write!(f, "Incorrect password"),
            AuthError::WrongCurrentPassword => write!(f, "Current password is incorrect"),
            AuthError::ConfirmationMismatch => {
                write!(f, "New password and confirmation do not match")
            }
            AuthError::EmptyPassword => write!(f, "New password cannot be empty"),
            AuthError::NotLoggedIn => write!(f, "Must be logged in to change the password"),
            AuthError::Store(msg) => write!(f, "Credential store failure: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// ============================================================================
// HASHING
// ============================================================================

/// Hex SHA-256 of salt + password.
fn hash_password(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fresh 16-byte random salt, hex encoded.
fn new_salt_hex() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credential {
    salt_hex: String,
    digest_hex: String,
}

impl Credential {
    fn from_password(password: &str) -> Self {
        let salt_hex = new_salt_hex();
        let digest_hex = hash_password(&salt_hex, password);
        Self {
            salt_hex,
            digest_hex,
        }
    }

    fn matches(&self, password: &str) -> bool {
        hash_password(&self.salt_hex, password) == self.digest_hex
    }

    fn to_line(&self) -> String {
        format!("{}${}", self.salt_hex, self.digest_hex)
    }

    /// `salt$digest`; a bare digest (pre-salt stores) is accepted with an
    /// empty salt so existing installs keep working.
    fn from_line(line: &str) -> Self {
        match line.trim().split_once('$') {
            Some((salt, digest)) => Self {
                salt_hex: salt.to_string(),
                digest_hex: digest.to_string(),
            },
            None => Self {
                salt_hex: String::new(),
                digest_hex: line.trim().to_string(),
            },
        }
    }
}

// ============================================================================
// CREDENTIAL STORE
// ============================================================================

/// One text file holding the salted hash. Replaced wholesale through a
/// temp-file rename so a crash mid-write cannot truncate it.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Open the store, initializing it with the default password if the
    /// file does not exist yet. Returns true when that default fired.
    pub fn open(path: &Path) -> Result<(Self, bool), AuthError> {
        let store = Self {
            path: path.to_path_buf(),
        };

        if store.path.exists() {
            // Fail loudly now rather than at the first login
            store.read()?;
            Ok((store, false))
        } else {
            store.write(&Credential::from_password(DEFAULT_PASSWORD))?;
            Ok((store, true))
        }
    }

    fn read(&self) -> Result<Credential, AuthError> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Store(format!("{}: {}", self.path.display(), e)))?;

        let line = contents.trim();
        if line.is_empty() {
            return Err(AuthError::Store(format!(
                "{}: credential file is empty",
                self.path.display()
            )));
        }

        Ok(Credential::from_line(line))
    }

    fn write(&self, credential: &Credential) -> Result<(), AuthError> {
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, credential.to_line())
            .map_err(|e| AuthError::Store(format!("{}: {}", tmp_path.display(), e)))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| AuthError::Store(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }

    /// Re-reads the file on every call.
    pub fn verify(&self, password: &str) -> Result<bool, AuthError> {
        Ok(self.read()?.matches(password))
    }

    /// Persist a new password under a fresh salt.
    pub fn set_password(&self, password: &str) -> Result<(), AuthError> {
        self.write(&Credential::from_password(password))
    }
}

// ============================================================================
// AUTH GATE
// ============================================================================

/// The two-state login machine over a credential store. State lives in the
/// caller's Session, not in the gate.
#[derive(Debug)]
pub struct AuthGate {
    store: CredentialStore,
}

impl AuthGate {
    /// Returns the gate plus whether the default password was just written.
    pub fn open(path: &Path) -> Result<(Self, bool), AuthError> {
        let (store, initialized_default) = CredentialStore::open(path)?;
        Ok((Self { store }, initialized_default))
    }

    pub fn login(&self, session: &mut Session, password: &str) -> Result<(), AuthError> {
        if self.store.verify(password)? {
            session.set_auth(AuthState::LoggedIn);
            Ok(())
        } else {
            session.set_auth(AuthState::LoggedOut);
            Err(AuthError::WrongPassword)
        }
    }

    pub fn logout(&self, session: &mut Session) {
        session.set_auth(AuthState::LoggedOut);
    }

    /// Change the shared password. Every precondition gets its own error
    /// and leaves the stored hash untouched. Success forces a re-login.
    pub fn change_password(
        &self,
        session: &mut Session,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        if !session.is_logged_in() {
            return Err(AuthError::NotLoggedIn);
        }
        if !self.store.verify(current)? {
            return Err(AuthError::WrongCurrentPassword);
        }
        if new != confirm {
            return Err(AuthError::ConfirmationMismatch);
        }
        if new.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        self.store.set_password(new)?;
        session.set_auth(AuthState::LoggedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_cred_path() -> PathBuf {
        env::temp_dir().join(format!("shopbook-cred-{}.txt", uuid::Uuid::new_v4()))
    }

    fn logged_in_gate(path: &Path) -> (AuthGate, Session) {
        let (gate, _) = AuthGate::open(path).unwrap();
        let mut session = Session::new();
        gate.login(&mut session, DEFAULT_PASSWORD).unwrap();
        (gate, session)
    }

    #[test]
    fn test_missing_store_initializes_default() {
        let path = temp_cred_path();
        let (gate, initialized) = AuthGate::open(&path).unwrap();
        assert!(initialized);

        let mut session = Session::new();
        gate.login(&mut session, DEFAULT_PASSWORD).unwrap();
        assert!(session.is_logged_in());

        // Second open finds the file and does not re-initialize
        let (_, initialized_again) = AuthGate::open(&path).unwrap();
        assert!(!initialized_again);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_wrong_password_stays_logged_out() {
        let path = temp_cred_path();
        let (gate, _) = AuthGate::open(&path).unwrap();
        let mut session = Session::new();

        let err = gate.login(&mut session, "wrong").unwrap_err();
        assert!(matches!(err, AuthError::WrongPassword));
        assert!(!session.is_logged_in());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_stored_value_is_never_plaintext() {
        let path = temp_cred_path();
        let _ = AuthGate::open(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains(DEFAULT_PASSWORD));

        // salt$digest, both hex
        let (salt, digest) = contents.trim().split_once('$').unwrap();
        assert_eq!(salt.len(), 32);
        assert_eq!(digest.len(), 64);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_change_password_success_forces_relogin() {
        let path = temp_cred_path();
        let (gate, mut session) = logged_in_gate(&path);

        gate.change_password(&mut session, DEFAULT_PASSWORD, "secret9", "secret9")
            .unwrap();

        // Changing the password invalidates the session
        assert!(!session.is_logged_in());

        // Old password is dead, new one works
        assert!(gate.login(&mut session, DEFAULT_PASSWORD).is_err());
        gate.login(&mut session, "secret9").unwrap();
        assert!(session.is_logged_in());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_change_password_wrong_current() {
        let path = temp_cred_path();
        let (gate, mut session) = logged_in_gate(&path);

        let err = gate
            .change_password(&mut session, "nope", "secret9", "secret9")
            .unwrap_err();
        assert!(matches!(err, AuthError::WrongCurrentPassword));

        // Stored hash unchanged, session still alive
        assert!(session.is_logged_in());
        assert!(gate.store.verify(DEFAULT_PASSWORD).unwrap());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_change_password_mismatch() {
        let path = temp_cred_path();
        let (gate, mut session) = logged_in_gate(&path);

        let err = gate
            .change_password(&mut session, DEFAULT_PASSWORD, "secret9", "different")
            .unwrap_err();
        assert!(matches!(err, AuthError::ConfirmationMismatch));
        assert!(gate.store.verify(DEFAULT_PASSWORD).unwrap());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_change_password_empty() {
        let path = temp_cred_path();
        let (gate, mut session) = logged_in_gate(&path);

        let err = gate
            .change_password(&mut session, DEFAULT_PASSWORD, "", "")
            .unwrap_err();
        assert!(matches!(err, AuthError::EmptyPassword));
        assert!(gate.store.verify(DEFAULT_PASSWORD).unwrap());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_change_password_requires_login() {
        let path = temp_cred_path();
        let (gate, _) = AuthGate::open(&path).unwrap();
        let mut session = Session::new();

        let err = gate
            .change_password(&mut session, DEFAULT_PASSWORD, "secret9", "secret9")
            .unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_set_then_verify_round_trip() {
        let path = temp_cred_path();
        let (store, _) = CredentialStore::open(&path).unwrap();

        for password in ["a", "secret9", "pässword with spaces"] {
            store.set_password(password).unwrap();
            assert!(store.verify(password).unwrap());
            assert!(!store.verify("something else").unwrap());
        }

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_legacy_unsalted_digest_still_verifies() {
        let path = temp_cred_path();
        // A pre-salt store held just hex(sha256(password))
        fs::write(&path, hash_password("", "oldpass")).unwrap();

        let (store, initialized) = CredentialStore::open(&path).unwrap();
        assert!(!initialized);
        assert!(store.verify("oldpass").unwrap());
        assert!(!store.verify("newpass").unwrap());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unwritable_store_is_fatal_not_a_grant() {
        let path = Path::new("/nonexistent-shopbook-dir/cred.txt");
        let err = AuthGate::open(path).unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }
}

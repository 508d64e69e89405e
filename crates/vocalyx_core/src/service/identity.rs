//! Identity provider seam.
//!
//! # Responsibility
//! - Define the account operations the auth gateway needs from an identity provider.
//! - Ship an in-process provider that keeps Argon2id password hashes in memory.
//!
//! # Invariants
//! - Emails are compared case-insensitively after trimming.
//! - Plaintext passwords are never stored or logged.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Account as seen by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    EmailInUse,
    InvalidEmail,
    WeakPassword,
    InvalidCredentials,
    UserNotFound,
    /// Provider could not be reached or failed internally.
    Unavailable(String),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailInUse => write!(f, "email address is already in use"),
            Self::InvalidEmail => write!(f, "email address is invalid"),
            Self::WeakPassword => write!(f, "password is too weak"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::UserNotFound => write!(f, "no account for this user"),
            Self::Unavailable(message) => write!(f, "identity provider unavailable: {message}"),
        }
    }
}

impl Error for IdentityError {}

/// Account operations backing signup, login and password management.
pub trait IdentityProvider {
    fn create_account(&self, email: &str, password: &str) -> IdentityResult<AuthUser>;
    fn update_profile(&self, uid: &str, display_name: &str) -> IdentityResult<()>;
    fn sign_in(&self, email: &str, password: &str) -> IdentityResult<AuthUser>;
    fn sign_out(&self, uid: &str) -> IdentityResult<()>;
    /// Sends a reset link; unknown emails report `UserNotFound`.
    fn send_password_reset(&self, email: &str) -> IdentityResult<()>;
    fn update_password(&self, uid: &str, new_password: &str) -> IdentityResult<()>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn create_account(&self, email: &str, password: &str) -> IdentityResult<AuthUser> {
        (**self).create_account(email, password)
    }

    fn update_profile(&self, uid: &str, display_name: &str) -> IdentityResult<()> {
        (**self).update_profile(uid, display_name)
    }

    fn sign_in(&self, email: &str, password: &str) -> IdentityResult<AuthUser> {
        (**self).sign_in(email, password)
    }

    fn sign_out(&self, uid: &str) -> IdentityResult<()> {
        (**self).sign_out(uid)
    }

    fn send_password_reset(&self, email: &str) -> IdentityResult<()> {
        (**self).send_password_reset(email)
    }

    fn update_password(&self, uid: &str, new_password: &str) -> IdentityResult<()> {
        (**self).update_password(uid, new_password)
    }
}

struct Account {
    user: AuthUser,
    password_hash: String,
    signed_in: bool,
}

#[derive(Default)]
struct Accounts {
    by_uid: HashMap<String, Account>,
    uid_by_email: HashMap<String, String>,
    reset_requests: Vec<String>,
}

/// In-memory identity provider with Argon2id password hashes.
#[derive(Default)]
pub struct LocalIdentityProvider {
    accounts: Mutex<Accounts>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails that password resets were requested for, oldest first.
    pub fn reset_requests(&self) -> Vec<String> {
        self.lock().reset_requests.clone()
    }

    pub fn is_signed_in(&self, uid: &str) -> bool {
        self.lock()
            .by_uid
            .get(uid)
            .map(|account| account.signed_in)
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        match self.accounts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn create_account(&self, email: &str, password: &str) -> IdentityResult<AuthUser> {
        let email = normalize_email(email).ok_or(IdentityError::InvalidEmail)?;
        if password.is_empty() {
            return Err(IdentityError::WeakPassword);
        }
        let password_hash = hash_password(password)?;

        let mut accounts = self.lock();
        if accounts.uid_by_email.contains_key(&email) {
            return Err(IdentityError::EmailInUse);
        }
        let user = AuthUser {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            display_name: None,
        };
        accounts.uid_by_email.insert(email, user.uid.clone());
        accounts.by_uid.insert(
            user.uid.clone(),
            Account {
                user: user.clone(),
                password_hash,
                signed_in: true,
            },
        );
        Ok(user)
    }

    fn update_profile(&self, uid: &str, display_name: &str) -> IdentityResult<()> {
        let mut accounts = self.lock();
        let account = accounts.by_uid.get_mut(uid).ok_or(IdentityError::UserNotFound)?;
        account.user.display_name = Some(display_name.to_string());
        Ok(())
    }

    fn sign_in(&self, email: &str, password: &str) -> IdentityResult<AuthUser> {
        let email = normalize_email(email).ok_or(IdentityError::InvalidEmail)?;
        let mut accounts = self.lock();
        let uid = accounts
            .uid_by_email
            .get(&email)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        let account = accounts
            .by_uid
            .get_mut(&uid)
            .ok_or(IdentityError::InvalidCredentials)?;
        if !verify_password(password, &account.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }
        account.signed_in = true;
        Ok(account.user.clone())
    }

    fn sign_out(&self, uid: &str) -> IdentityResult<()> {
        if let Some(account) = self.lock().by_uid.get_mut(uid) {
            account.signed_in = false;
        }
        Ok(())
    }

    fn send_password_reset(&self, email: &str) -> IdentityResult<()> {
        let email = normalize_email(email).ok_or(IdentityError::InvalidEmail)?;
        let mut accounts = self.lock();
        if !accounts.uid_by_email.contains_key(&email) {
            return Err(IdentityError::UserNotFound);
        }
        accounts.reset_requests.push(email);
        Ok(())
    }

    fn update_password(&self, uid: &str, new_password: &str) -> IdentityResult<()> {
        if new_password.is_empty() {
            return Err(IdentityError::WeakPassword);
        }
        let password_hash = hash_password(new_password)?;
        let mut accounts = self.lock();
        let account = accounts.by_uid.get_mut(uid).ok_or(IdentityError::UserNotFound)?;
        account.password_hash = password_hash;
        Ok(())
    }
}

fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return None;
    }
    Some(email)
}

fn hash_password(password: &str) -> IdentityResult<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(hash_error)?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(hash_error)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> IdentityResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(hash_error)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(hash_error(err)),
    }
}

fn hash_error(err: argon2::password_hash::Error) -> IdentityError {
    IdentityError::Unavailable(format!("password hashing failed: {err}"))
}

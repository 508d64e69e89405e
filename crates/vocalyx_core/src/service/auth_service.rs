//! Auth gateway.
//!
//! # Responsibility
//! - Signup, login, logout and password management over an [`IdentityProvider`].
//! - Co-manage the patient record lifecycle: signup seeds the patient record,
//!   the default AAC board and the default visual schedule.
//! - Publish auth-state changes to subscribers.
//!
//! # Invariants
//! - Form validation failures never reach the provider.
//! - A [`Session`] exists only between a successful signup/login and `logout`.
//! - Provider and store failures leave this module as `GatewayError`.
//! - A signup whose seeding fails keeps its identity account and is logged
//!   at warn level with `stage=seed`.

use super::gateway::{ErrorKind, GatewayError, GatewayResult};
use super::identity::{IdentityError, IdentityProvider};
use super::patient_data_service::PatientDataService;
use crate::config::CoreConfig;
use crate::logging::sanitize_for_log;
use crate::model::board::{AacBoard, VisualSchedule};
use crate::model::now_epoch_ms;
use crate::model::patient::{PatientProfile, PatientRecord};
use crate::store::DocumentStore;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Data submitted by the signup form.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub profile: PatientProfile,
}

/// Inline form error; reported to the user, never sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupValidationError {
    MissingFirstName,
    MissingLastName,
    InvalidEmail,
    PasswordTooShort { min: usize },
    PasswordMismatch,
}

impl Display for SignupValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFirstName => write!(f, "first name is required"),
            Self::MissingLastName => write!(f, "last name is required"),
            Self::InvalidEmail => write!(f, "a valid email address is required"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordMismatch => write!(f, "passwords do not match"),
        }
    }
}

impl Error for SignupValidationError {}

impl SignupForm {
    /// Checks fields in form order and returns the first problem.
    pub fn validate(&self, min_password_length: usize) -> Result<(), SignupValidationError> {
        if self.profile.first_name.trim().is_empty() {
            return Err(SignupValidationError::MissingFirstName);
        }
        if self.profile.last_name.trim().is_empty() {
            return Err(SignupValidationError::MissingLastName);
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(SignupValidationError::InvalidEmail);
        }
        if self.password.chars().count() < min_password_length {
            return Err(SignupValidationError::PasswordTooShort {
                min: min_password_length,
            });
        }
        if self.password != self.confirm_password {
            return Err(SignupValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupError {
    Validation(SignupValidationError),
    Gateway(GatewayError),
}

impl Display for SignupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Gateway(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SignupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Gateway(err) => Some(err),
        }
    }
}

impl From<SignupValidationError> for SignupError {
    fn from(value: SignupValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GatewayError> for SignupError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

impl From<IdentityError> for GatewayError {
    fn from(value: IdentityError) -> Self {
        let kind = match value {
            IdentityError::UserNotFound => ErrorKind::NotFound,
            IdentityError::Unavailable(_) => ErrorKind::Unknown,
            IdentityError::EmailInUse
            | IdentityError::InvalidEmail
            | IdentityError::WeakPassword
            | IdentityError::InvalidCredentials => ErrorKind::Auth,
        };
        GatewayError::new(kind, value.to_string())
    }
}

/// Signed-in patient context, passed explicitly to whatever needs the patient id.
///
/// Not `Clone`: `logout` consumes the only handle.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    patient_id: String,
    email: String,
    signed_in_at: i64,
}

impl Session {
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn signed_in_at(&self) -> i64 {
        self.signed_in_at
    }
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub session: Session,
    /// `None` when the account has no patient record.
    pub patient: Option<PatientRecord>,
}

/// Auth-state change delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { patient_id: String },
    SignedOut { patient_id: String },
}

/// Handle returned by [`AuthService::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&AuthEvent) + Send>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

/// Auth gateway over an identity provider and the patient data gateway.
pub struct AuthService<P: IdentityProvider, S: DocumentStore> {
    identity: P,
    patients: PatientDataService<S>,
    min_password_length: usize,
    listeners: Mutex<Listeners>,
}

impl<P: IdentityProvider, S: DocumentStore> AuthService<P, S> {
    pub fn new(identity: P, patients: PatientDataService<S>, config: &CoreConfig) -> Self {
        Self {
            identity,
            patients,
            min_password_length: config.min_password_length,
            listeners: Mutex::new(Listeners::default()),
        }
    }

    pub fn patients(&self) -> &PatientDataService<S> {
        &self.patients
    }

    /// Creates the account and seeds the patient's documents.
    pub fn signup(&self, form: &SignupForm) -> Result<Session, SignupError> {
        form.validate(self.min_password_length)?;

        let user = self
            .identity
            .create_account(form.email.trim(), &form.password)
            .map_err(|err| auth_failure("signup", err.into()))?;
        self.identity
            .update_profile(&user.uid, &form.profile.display_name())
            .map_err(|err| auth_failure("signup", err.into()))?;

        let now = now_epoch_ms();
        if let Err(err) = self.seed_patient(&user.uid, &user.email, &form.profile, now) {
            // The identity account already exists; leave a trace for cleanup.
            warn!(
                "event=signup module=auth status=error stage=seed patient_id={} error_kind={} error={}",
                sanitize_for_log(&user.uid),
                err.kind.as_str(),
                sanitize_for_log(&err.message)
            );
            return Err(err.into());
        }

        info!("event=signup module=auth status=ok");
        Ok(self.open_session(user.uid, user.email, now))
    }

    fn seed_patient(&self, uid: &str, email: &str, profile: &PatientProfile, now: i64) -> GatewayResult<()> {
        self.patients.put_patient(&PatientRecord::from_signup(uid, email, profile, now))?;
        self.patients.save_aac_board(uid, &AacBoard::default_for(uid, now), None)?;
        self.patients.save_visual_schedule(uid, &VisualSchedule::default_for(uid, now), None)?;
        Ok(())
    }

    /// Signs in and stamps `lastLoginAt` on the patient record.
    pub fn login(&self, email: &str, password: &str) -> GatewayResult<LoginOutcome> {
        let user = self
            .identity
            .sign_in(email, password)
            .map_err(|err| auth_failure("login", err.into()))?;

        let now = now_epoch_ms();
        let patient = match self.patients.touch_last_login(&user.uid, now) {
            Ok(()) => Some(self.patients.get_patient(&user.uid)?),
            Err(err) if err.kind == ErrorKind::NotFound => {
                warn!("event=login module=auth status=no_patient_record");
                None
            }
            Err(err) => return Err(err),
        };

        info!("event=login module=auth status=ok");
        Ok(LoginOutcome {
            session: self.open_session(user.uid, user.email, now),
            patient,
        })
    }

    /// Ends the session. The session is consumed even if the provider fails.
    pub fn logout(&self, session: Session) -> GatewayResult<()> {
        let Session { patient_id, .. } = session;
        self.identity
            .sign_out(&patient_id)
            .map_err(|err| auth_failure("logout", err.into()))?;
        info!("event=logout module=auth status=ok");
        self.notify(&AuthEvent::SignedOut { patient_id });
        Ok(())
    }

    pub fn reset_password(&self, email: &str) -> GatewayResult<()> {
        self.identity
            .send_password_reset(email.trim())
            .map_err(|err| auth_failure("reset_password", err.into()))?;
        info!("event=reset_password module=auth status=ok");
        Ok(())
    }

    pub fn change_password(&self, session: &Session, new_password: &str) -> GatewayResult<()> {
        if new_password.chars().count() < self.min_password_length {
            return Err(GatewayError::auth(
                SignupValidationError::PasswordTooShort {
                    min: self.min_password_length,
                }
                .to_string(),
            ));
        }
        self.identity
            .update_password(session.patient_id(), new_password)
            .map_err(|err| auth_failure("change_password", err.into()))?;
        info!("event=change_password module=auth status=ok");
        Ok(())
    }

    /// Registers `listener` for auth-state changes.
    ///
    /// Listeners run synchronously and must not call `subscribe`/`unsubscribe`.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&AuthEvent) + Send + 'static,
    {
        let mut listeners = self.lock_listeners();
        listeners.next_id += 1;
        let id = SubscriptionId(listeners.next_id);
        listeners.entries.push((id, Box::new(listener)));
        id
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry_id, _)| *entry_id != id);
        listeners.entries.len() != before
    }

    fn open_session(&self, patient_id: String, email: String, now: i64) -> Session {
        self.notify(&AuthEvent::SignedIn {
            patient_id: patient_id.clone(),
        });
        Session {
            patient_id,
            email,
            signed_in_at: now,
        }
    }

    fn notify(&self, event: &AuthEvent) {
        for (_, listener) in &self.lock_listeners().entries {
            listener(event);
        }
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Listeners> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn auth_failure(operation: &str, err: GatewayError) -> GatewayError {
    warn!(
        "event={} module=auth status=error error_kind={} error={}",
        operation,
        err.kind.as_str(),
        sanitize_for_log(&err.message)
    );
    err
}

#[cfg(test)]
mod tests {
    use super::{SignupForm, SignupValidationError};
    use crate::model::patient::PatientProfile;

    fn form() -> SignupForm {
        SignupForm {
            email: "asha@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            profile: PatientProfile {
                first_name: "Asha".to_string(),
                last_name: "Rao".to_string(),
                ..PatientProfile::default()
            },
        }
    }

    #[test]
    fn complete_form_validates() {
        assert_eq!(form().validate(6), Ok(()));
    }

    #[test]
    fn validation_reports_first_problem_in_form_order() {
        let mut bad = form();
        bad.profile.first_name = "  ".to_string();
        bad.email = "not-an-email".to_string();
        assert_eq!(bad.validate(6), Err(SignupValidationError::MissingFirstName));
    }

    #[test]
    fn short_and_mismatched_passwords_are_rejected() {
        let mut short = form();
        short.password = "abc".to_string();
        short.confirm_password = "abc".to_string();
        assert_eq!(
            short.validate(6),
            Err(SignupValidationError::PasswordTooShort { min: 6 })
        );

        let mut mismatch = form();
        mismatch.confirm_password = "secret2".to_string();
        assert_eq!(mismatch.validate(6), Err(SignupValidationError::PasswordMismatch));
    }

    #[test]
    fn email_needs_a_domain_with_a_dot() {
        let mut bad = form();
        bad.email = "asha@example".to_string();
        assert_eq!(bad.validate(6), Err(SignupValidationError::InvalidEmail));
    }
}

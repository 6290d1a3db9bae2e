//! OTP based password reset.
//!
//! Per email the flow moves `NoRequest -> OtpPending -> ResetPending ->
//! Consumed`. Both pending states can expire. All state lives in the TTL
//! store:
//!
//! * `otp:{email}` holds an [`OtpRecord`] for [`OTP_TTL_SECONDS`].
//! * `otp_attempts:{email}` counts wrong guesses against the current code.
//! * `reset_token:{token}` holds a [`ResetTokenRecord`] for
//!   [`RESET_TOKEN_TTL_SECONDS`].
//!
//! Each record also carries an absolute `expiresAt`, checked on every read,
//! so a store without native expiry still behaves.

use chrono::{Duration, Utc};
use rand::{Rng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::db::ttl_store::TtlStore;
use crate::error::AppError;
use crate::models::password_reset::{OtpRecord, ResetTokenRecord};
use crate::repositories::UserRepository;
use crate::utils::email::{Mailer, OutgoingEmail};
use crate::utils::password::hash_password_blocking;
use crate::validation::rules::validate_password_length;

pub const OTP_TTL_SECONDS: u64 = 600;
pub const RESET_TOKEN_TTL_SECONDS: u64 = 900;
const RESET_TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("User not found or account is deactivated")]
    UserNotFound,
    #[error("OTP not found or expired")]
    OtpNotFound,
    #[error("OTP has expired")]
    OtpExpired,
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("Too many invalid attempts. Please request a new OTP.")]
    TooManyAttempts,
    #[error("Invalid or expired reset token")]
    ResetTokenNotFound,
    #[error("Reset token has expired")]
    ResetTokenExpired,
    #[error("Failed to send OTP. Please try again.")]
    Delivery(#[source] anyhow::Error),
    #[error("{message}")]
    Storage {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ResetError {
    fn storage(message: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| ResetError::Storage { message, source }
    }
}

impl From<ResetError> for AppError {
    fn from(err: ResetError) -> Self {
        let message = err.to_string();
        match err {
            ResetError::Validation(_) | ResetError::InvalidOtp | ResetError::TooManyAttempts => {
                AppError::Validation(message)
            }
            ResetError::UserNotFound
            | ResetError::OtpNotFound
            | ResetError::ResetTokenNotFound => AppError::NotFound(message),
            ResetError::OtpExpired | ResetError::ResetTokenExpired => AppError::Expired(message),
            ResetError::Delivery(source) => {
                tracing::warn!(error = ?source, "OTP email delivery failed");
                AppError::Delivery(message)
            }
            ResetError::Storage { source, .. } => {
                tracing::error!(error = ?source, "password reset storage failure");
                AppError::Persistence(message)
            }
        }
    }
}

pub fn otp_key(email: &str) -> String {
    format!("otp:{}", email)
}

pub fn otp_attempts_key(email: &str) -> String {
    format!("otp_attempts:{}", email)
}

pub fn reset_token_key(token: &str) -> String {
    format!("reset_token:{}", token)
}

/// Uniform over 1000..=9999.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

/// 32 random bytes, hex encoded.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn TtlStore>,
    mailer: Arc<dyn Mailer>,
    /// Zero disables the limit.
    max_attempts: u32,
}

impl PasswordResetService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn TtlStore>,
        mailer: Arc<dyn Mailer>,
        max_attempts: u32,
    ) -> Self {
        Self {
            users,
            store,
            mailer,
            max_attempts,
        }
    }

    /// Issues a fresh code for `email`, replacing any earlier one, and mails
    /// it. A delivery failure leaves the stored code in place.
    pub async fn request_otp(&self, email: &str) -> Result<(), ResetError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ResetError::Validation("Email is required"));
        }

        let user = self
            .users
            .find_active_by_email(email)
            .await
            .map_err(ResetError::storage("Failed to look up user. Please try again."))?
            .ok_or(ResetError::UserNotFound)?;

        let otp = generate_otp();
        let record = OtpRecord {
            otp: otp.clone(),
            expires_at: Utc::now() + Duration::seconds(OTP_TTL_SECONDS as i64),
            user_id: user.user_id,
        };
        self.put_json(&otp_key(email), &record, OTP_TTL_SECONDS)
            .await
            .map_err(ResetError::storage("Failed to store OTP. Please try again."))?;
        self.discard(&otp_attempts_key(email)).await;
        tracing::info!(user_id = %user.user_id, "password reset OTP issued");

        let message = OutgoingEmail::password_reset_otp(
            email,
            &user.name,
            &otp,
            (OTP_TTL_SECONDS / 60) as i64,
        );
        self.mailer
            .send(message)
            .await
            .map_err(ResetError::Delivery)?;

        Ok(())
    }

    /// Exchanges a matching code for a single-use reset token.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String, ResetError> {
        let email = email.trim();
        let otp = otp.trim();
        if email.is_empty() || otp.is_empty() {
            return Err(ResetError::Validation("Email and OTP are required"));
        }

        let key = otp_key(email);
        let record: OtpRecord = self
            .get_json(&key)
            .await
            .map_err(ResetError::storage("Failed to read OTP. Please try again."))?
            .ok_or(ResetError::OtpNotFound)?;

        let now = Utc::now();
        if record.is_expired_at(now) {
            self.discard(&key).await;
            self.discard(&otp_attempts_key(email)).await;
            return Err(ResetError::OtpExpired);
        }

        if !bool::from(record.otp.as_bytes().ct_eq(otp.as_bytes())) {
            return Err(self.record_wrong_guess(email).await);
        }

        // Only the caller whose delete removed the key may continue.
        let removed = self
            .store
            .delete(&key)
            .await
            .map_err(ResetError::storage("Failed to verify OTP. Please try again."))?;
        if !removed {
            return Err(ResetError::OtpNotFound);
        }
        self.discard(&otp_attempts_key(email)).await;

        let token = generate_reset_token();
        let reset = ResetTokenRecord {
            email: email.to_string(),
            user_id: record.user_id,
            expires_at: now + Duration::seconds(RESET_TOKEN_TTL_SECONDS as i64),
        };
        self.put_json(&reset_token_key(&token), &reset, RESET_TOKEN_TTL_SECONDS)
            .await
            .map_err(ResetError::storage(
                "Failed to create reset token. Please request a new OTP.",
            ))?;
        tracing::info!(user_id = %record.user_id, "password reset OTP verified");

        Ok(token)
    }

    /// Consumes `token` and stores the new password. A failed update puts the
    /// token back so the caller can retry.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        let token = token.trim();
        if token.is_empty() || new_password.is_empty() {
            return Err(ResetError::Validation(
                "Reset token and new password are required",
            ));
        }
        if validate_password_length(new_password).is_err() {
            return Err(ResetError::Validation(
                "Password must be at least 6 characters long",
            ));
        }

        let key = reset_token_key(token);
        let record: ResetTokenRecord = self
            .get_json(&key)
            .await
            .map_err(ResetError::storage(
                "Failed to read reset token. Please try again.",
            ))?
            .ok_or(ResetError::ResetTokenNotFound)?;

        if record.is_expired_at(Utc::now()) {
            self.discard(&key).await;
            return Err(ResetError::ResetTokenExpired);
        }

        // Claim the token before the slow hash so a concurrent reset with the
        // same token loses here.
        let claimed = self
            .store
            .delete(&key)
            .await
            .map_err(ResetError::storage(
                "Failed to reset password. Please try again.",
            ))?;
        if !claimed {
            return Err(ResetError::ResetTokenNotFound);
        }

        if let Err(err) = self.store_new_password(&record, new_password).await {
            self.restore_reset_token(&key, &record).await;
            return Err(err);
        }
        tracing::info!(user_id = %record.user_id, "password reset completed");

        Ok(())
    }

    async fn store_new_password(
        &self,
        record: &ResetTokenRecord,
        new_password: &str,
    ) -> Result<(), ResetError> {
        let password_hash = hash_password_blocking(new_password.to_string())
            .await
            .map_err(ResetError::storage("Failed to update password"))?;
        let updated = self
            .users
            .update_password(record.user_id, &password_hash)
            .await
            .map_err(ResetError::storage("Failed to update password"))?;
        if !updated {
            return Err(ResetError::Storage {
                message: "Failed to update password",
                source: anyhow::anyhow!("no user row for {}", record.user_id),
            });
        }
        Ok(())
    }

    /// Puts a claimed token back for whatever is left of its window.
    async fn restore_reset_token(&self, key: &str, record: &ResetTokenRecord) {
        let remaining = (record.expires_at - Utc::now()).num_seconds();
        if remaining <= 0 {
            return;
        }
        if let Err(err) = self.put_json(key, record, remaining as u64).await {
            tracing::error!(
                error = ?err,
                user_id = %record.user_id,
                "password update failed and reset token could not be restored"
            );
        }
    }

    async fn record_wrong_guess(&self, email: &str) -> ResetError {
        if self.max_attempts == 0 {
            return ResetError::InvalidOtp;
        }

        let attempts = match self
            .store
            .increment(&otp_attempts_key(email), OTP_TTL_SECONDS)
            .await
        {
            Ok(attempts) => attempts,
            Err(source) => {
                return ResetError::Storage {
                    message: "Failed to verify OTP. Please try again.",
                    source,
                }
            }
        };

        if attempts >= u64::from(self.max_attempts) {
            tracing::warn!(attempts, "OTP attempt limit reached, discarding code");
            self.discard(&otp_key(email)).await;
            self.discard(&otp_attempts_key(email)).await;
            return ResetError::TooManyAttempts;
        }

        ResetError::InvalidOtp
    }

    async fn discard(&self, key: &str) {
        if let Err(err) = self.store.delete(key).await {
            tracing::warn!(error = ?err, "failed to delete TTL store key");
        }
    }

    async fn put_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set_with_expiry(key, &raw, ttl_seconds).await
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

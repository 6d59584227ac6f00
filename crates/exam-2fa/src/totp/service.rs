//! High-level facade for a login endpoint: enrolment and verification with
//! the configured issuer and QR format.
//!
//! The service holds only immutable configuration. Share it behind an `Arc`
//! or clone it freely; no locking is involved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::totp::config::{QrFormat, TotpServiceConfig};
use crate::totp::core;
use crate::totp::qr;
use crate::totp::types::*;
use crate::totp::uri;

/// A freshly generated key with everything needed to show it to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Persist this on the account record.
    pub key: EncodedKey,
    pub provisioning: Provisioning,
}

#[derive(Debug, Clone)]
pub struct TotpService {
    config: TotpServiceConfig,
}

impl TotpService {
    /// Create a service, validating the configuration.
    pub fn new(config: TotpServiceConfig) -> Result<Self, TotpError> {
        config.validate()?;
        tracing::debug!(
            issuer = %config.issuer,
            qr_format = ?config.qr_format,
            "TOTP service configured"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &TotpServiceConfig {
        &self.config
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Enrolment
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Generate a new key for `label` and its provisioning material.
    pub fn enroll(&self, label: &str) -> Result<Enrollment, TotpError> {
        let key = core::gen_key();
        let provisioning = self.provision(key.as_str(), label)?;
        tracing::info!(issuer = %self.config.issuer, "TOTP key generated");
        Ok(Enrollment { key, provisioning })
    }

    /// Provisioning URI and QR code for an existing key, e.g. to show the
    /// enrolment screen again before the first successful check.
    pub fn provision(&self, key: &str, label: &str) -> Result<Provisioning, TotpError> {
        let url = uri::build_url(key, &self.config.issuer, label)?;
        let qr = match self.config.qr_format {
            QrFormat::Svg => qr::render_svg(url.as_str()),
            QrFormat::PngDataUri => qr::render_png_data_uri(url.as_str(), self.config.qr_module_px),
        }
        .map_err(|e| {
            tracing::warn!(error = %e, "QR rendering failed");
            e
        })?;
        Ok(Provisioning { url, qr })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Verification
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// [`core::check`] with the outcome logged. Neither the key nor the
    /// candidate code is written to the log.
    ///
    /// # Panics
    ///
    /// Same as [`core::check`].
    #[track_caller]
    pub fn verify<S: AsRef<str>>(
        &self,
        key: &str,
        code: &str,
        spent: &[S],
    ) -> Result<(), TotpRejection> {
        self.verify_at(key, code, spent, Utc::now())
    }

    /// [`verify`](Self::verify) anchored to an explicit instant.
    #[track_caller]
    pub fn verify_at<S: AsRef<str>>(
        &self,
        key: &str,
        code: &str,
        spent: &[S],
        at: DateTime<Utc>,
    ) -> Result<(), TotpRejection> {
        let result = core::check_at(key, code, spent, at);
        match result {
            Ok(()) => tracing::info!("TOTP accepted"),
            Err(TotpRejection::MalformedKey) => {
                tracing::error!(reason = TotpRejection::MalformedKey.as_str(), "Stored TOTP key is corrupt")
            }
            Err(TotpRejection::SpentTotp) => {
                tracing::warn!(reason = TotpRejection::SpentTotp.as_str(), "TOTP replay refused")
            }
            Err(reason) => tracing::info!(reason = reason.as_str(), "TOTP rejected"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tracing_test::traced_test;

    const KEY: &str = "JBSWY3DPEHPK3PXP";

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn service() -> TotpService {
        TotpService::new(TotpServiceConfig::new("Exams")).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = TotpService::new(TotpServiceConfig::new("")).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidConfig);
    }

    #[test]
    fn service_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TotpService>();
    }

    // ── Enrolment ────────────────────────────────────────────────

    #[test]
    fn enroll_svg() {
        let e = service().enroll("alice@example.com").unwrap();
        assert_eq!(e.key.as_str().len(), 32);
        assert!(e.provisioning.qr.contains("<svg"));

        let parsed = uri::parse_otpauth_uri(e.provisioning.url.as_str()).unwrap();
        assert_eq!(parsed.secret, e.key);
        assert_eq!(parsed.issuer.as_deref(), Some("Exams"));
        assert_eq!(parsed.label, "alice@example.com");
    }

    #[test]
    fn enroll_png() {
        let svc = TotpService::new(
            TotpServiceConfig::new("Exams")
                .with_qr_format(QrFormat::PngDataUri)
                .with_qr_module_px(2),
        )
        .unwrap();
        let e = svc.enroll("bob").unwrap();
        assert!(e.provisioning.qr.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn enroll_generates_distinct_keys() {
        let svc = service();
        assert_ne!(svc.enroll("a").unwrap().key, svc.enroll("a").unwrap().key);
    }

    #[test]
    fn provision_existing_key() {
        let p = service().provision(KEY, "carol").unwrap();
        assert!(p.url.as_str().contains("secret=JBSWY3DPEHPK3PXP"));
        assert!(p.url.as_str().contains("issuer=Exams"));
    }

    // ── Verification ─────────────────────────────────────────────

    #[test]
    #[traced_test]
    fn verify_accepts_and_logs() {
        let r = service().verify_at(KEY, "355393", &["000000", "111111"], at(1763052571132));
        assert_eq!(r, Ok(()));
        assert!(logs_contain("TOTP accepted"));
        assert!(!logs_contain("355393"));
        assert!(!logs_contain(KEY));
    }

    #[test]
    #[traced_test]
    fn verify_logs_reason() {
        let r = service().verify_at(KEY, "123456", &["000000", "111111"], at(1763052571132));
        assert_eq!(r, Err(TotpRejection::WrongTotp));
        assert!(logs_contain("WRONG_TOTP"));
        assert!(!logs_contain("123456"));
    }

    #[test]
    #[traced_test]
    fn verify_logs_replay() {
        let r = service().verify_at(KEY, "355393", &["355393", "111111"], at(1763052571132));
        assert_eq!(r, Err(TotpRejection::SpentTotp));
        assert!(logs_contain("TOTP replay refused"));
    }

    #[test]
    fn verify_now() {
        let svc = service();
        let e = svc.enroll("dave").unwrap();
        let code = core::generate(&e.key.decode().unwrap(), 0);
        assert_eq!(svc.verify(e.key.as_str(), &code, &["000000", "111111"]), Ok(()));
    }

    #[test]
    #[should_panic(expected = "most recently used codes")]
    fn verify_requires_spent_history() {
        let _ = service().verify(KEY, "355393", &["000000"]);
    }
}

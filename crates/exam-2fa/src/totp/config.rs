//! Configuration for [`TotpService`](crate::totp::TotpService).
//!
//! Only presentation is configurable. The code parameters (algorithm,
//! digits, period, key size) are compile-time constants in
//! [`types`](crate::totp::types).

use serde::{Deserialize, Serialize};

use crate::totp::qr::DEFAULT_MODULE_PX;
use crate::totp::types::*;

/// Largest accepted PNG module size in pixels.
pub const MAX_MODULE_PX: u32 = 64;

/// Image format of the QR code returned with a provisioning URI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrFormat {
    /// SVG markup, no quiet zone.
    #[default]
    Svg,
    /// `data:image/png;base64,` URI.
    PngDataUri,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotpServiceConfig {
    /// Issuer shown by authenticator apps next to the account label.
    pub issuer: String,
    pub qr_format: QrFormat,
    /// Pixels per QR module, PNG output only.
    pub qr_module_px: u32,
}

impl Default for TotpServiceConfig {
    fn default() -> Self {
        Self {
            issuer: "Exam Services".to_string(),
            qr_format: QrFormat::Svg,
            qr_module_px: DEFAULT_MODULE_PX,
        }
    }
}

impl TotpServiceConfig {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    pub fn with_qr_format(mut self, format: QrFormat) -> Self {
        self.qr_format = format;
        self
    }

    pub fn with_qr_module_px(mut self, px: u32) -> Self {
        self.qr_module_px = px;
        self
    }

    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, TotpError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidConfig, "Invalid TOTP service config JSON")
                .with_detail(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TotpError> {
        if self.issuer.trim().is_empty() {
            return Err(TotpError::new(TotpErrorKind::InvalidConfig, "issuer is required"));
        }
        if !(1..=MAX_MODULE_PX).contains(&self.qr_module_px) {
            return Err(TotpError::new(
                TotpErrorKind::InvalidConfig,
                format!(
                    "qr_module_px must be between 1 and {}, got {}",
                    MAX_MODULE_PX, self.qr_module_px
                ),
            ));
        }
        Ok(())
    }
}

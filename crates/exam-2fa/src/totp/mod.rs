//! TOTP crate: sub-modules.

pub mod types;
pub mod base32;
pub mod core;
pub mod uri;
pub mod qr;
pub mod config;
pub mod service;

// Re-export top-level items for convenience.
pub use types::*;
pub use self::core::{check, check_at, gen_key, generate, generate_at};
pub use config::{QrFormat, TotpServiceConfig};
pub use service::{Enrollment, TotpService};
pub use uri::{get_url, parse_otpauth_uri, OtpAuthUri};

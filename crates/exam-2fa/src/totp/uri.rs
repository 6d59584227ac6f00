//! `otpauth://` provisioning URIs in the Google Authenticator key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/LABEL?secret=BASE32&issuer=ISSUER&algorithm=sha1&digits=6&period=30`

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::totp::qr;
use crate::totp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build the provisioning URI for a key and render it as an SVG QR code.
///
/// The URI only ever carries the engine's fixed parameters. Authenticator
/// apps disagree on how they treat non-default values, and a key provisioned
/// with anything else would produce codes [`check`](crate::totp::check)
/// never accepts.
pub fn get_url(key: &str, issuer: &str, label: &str) -> Result<Provisioning, TotpError> {
    let url = build_url(key, issuer, label)?;
    let qr = qr::render_svg(url.as_str())?;
    Ok(Provisioning { url, qr })
}

/// The `otpauth://totp/` URI alone, without rendering a QR code.
pub fn build_url(key: &str, issuer: &str, label: &str) -> Result<Url, TotpError> {
    let mut url = Url::parse("otpauth://totp").map_err(|e| {
        TotpError::new(TotpErrorKind::InvalidUri, "Cannot build otpauth URI").with_detail(e.to_string())
    })?;

    if label.starts_with('/') {
        url.set_path(label);
    } else {
        url.set_path(&format!("/{}", label));
    }

    url.query_pairs_mut()
        .append_pair("secret", key)
        .append_pair("issuer", issuer)
        .append_pair("algorithm", ALGORITHM)
        .append_pair("digits", &DIGITS.to_string())
        .append_pair("period", &PERIOD_SECS.to_string());

    Ok(url)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The parts of a provisioning URI this engine can honour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpAuthUri {
    pub label: String,
    pub issuer: Option<String>,
    pub secret: EncodedKey,
}

/// Parse an `otpauth://totp/` URI.
///
/// Rejects HOTP URIs, secrets that are not strict base32, and any
/// `algorithm`, `digits` or `period` other than the fixed ones. When the
/// label carries an `ISSUER:` prefix and no `issuer` parameter is present,
/// the prefix is used as the issuer; the label itself is kept verbatim.
pub fn parse_otpauth_uri(uri: &str) -> Result<OtpAuthUri, TotpError> {
    let url = Url::parse(uri).map_err(|e| {
        TotpError::new(TotpErrorKind::InvalidUri, format!("Invalid URI: {}", e))
    })?;

    if url.scheme() != "otpauth" {
        return Err(TotpError::new(
            TotpErrorKind::InvalidUri,
            format!("Expected scheme 'otpauth', got '{}'", url.scheme()),
        ));
    }

    match url.host_str() {
        Some("totp") => {}
        Some("hotp") => {
            return Err(TotpError::new(
                TotpErrorKind::UnsupportedParameter,
                "Counter-based (hotp) URIs are not supported",
            ))
        }
        other => {
            return Err(TotpError::new(
                TotpErrorKind::InvalidUri,
                format!("Unknown OTP type: {:?}", other),
            ))
        }
    }

    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let label = percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidUri, "Label is not valid UTF-8")
                .with_detail(e.to_string())
        })?
        .into_owned();

    let mut secret = None;
    let mut issuer = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.into_owned()),
            "issuer" => issuer = Some(value.into_owned()),
            "algorithm" => {
                if !value.eq_ignore_ascii_case(ALGORITHM) {
                    return Err(unsupported("algorithm", &value));
                }
            }
            "digits" => {
                if value.parse::<usize>().ok() != Some(DIGITS) {
                    return Err(unsupported("digits", &value));
                }
            }
            "period" => {
                if value.parse::<i64>().ok() != Some(PERIOD_SECS) {
                    return Err(unsupported("period", &value));
                }
            }
            _ => {} // ignore unknown params
        }
    }

    let secret = secret.ok_or_else(|| {
        TotpError::new(TotpErrorKind::InvalidUri, "Missing 'secret' parameter")
    })?;
    let secret = EncodedKey::parse(secret)?;

    let issuer = issuer.or_else(|| {
        label
            .split_once(':')
            .map(|(prefix, _)| prefix.trim().to_string())
            .filter(|prefix| !prefix.is_empty())
    });

    Ok(OtpAuthUri {
        label,
        issuer,
        secret,
    })
}

fn unsupported(param: &str, value: &str) -> TotpError {
    TotpError::new(
        TotpErrorKind::UnsupportedParameter,
        format!("Unsupported {} '{}'", param, value),
    )
}

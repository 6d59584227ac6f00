//! # Exam Toolkit – Two-Factor Authentication
//!
//! Time-based one-time password core shared by the exam services:
//!
//! - **RFC 6238 / 4226** – TOTP generation with the fixed SHA-1, 6-digit,
//!   30-second parameter set that every mainstream authenticator app accepts
//! - **Replay-aware verification** – current and previous period only, with a
//!   mandatory spent-code history supplied by the caller
//! - **RFC 4648 base32** – unpadded codec for the shared secrets
//! - **otpauth:// URIs** – provisioning links per the Google Authenticator
//!   key-URI convention
//! - **QR Codes** – SVG markup or PNG data URIs for enrolment screens

pub mod totp;

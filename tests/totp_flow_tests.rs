use std::sync::Arc;
use std::thread;

use chrono::{DateTime, TimeZone, Utc};

use exam_toolkit::twofa::base32::{to_base32, to_buffer};
use exam_toolkit::twofa::{
    check_at, gen_key, generate_at, get_url, parse_otpauth_uri, CheckOutcome, QrFormat,
    SecretKey, TotpRejection, TotpService, TotpServiceConfig,
};

const KEY: &str = "JBSWY3DPEHPK3PXP";

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

#[test]
fn known_answer_scenario() {
    let key = SecretKey::from_base32(KEY).unwrap();
    assert_eq!(generate_at(&key, 0, at(1763052571132)), "355393");
    assert_eq!(generate_at(&key, 0, at(1763052601528)), "122654");

    let spent = ["000000", "111111"];
    assert_eq!(check_at(KEY, "122654", &spent, at(1763052601528)), Ok(()));
    assert_eq!(
        check_at(KEY, "355393", &spent, at(1763052691498)),
        Err(TotpRejection::WrongTotp)
    );
}

#[test]
fn check_results_map_to_wire_shape() {
    let spent = vec!["000000".to_string(), "111111".to_string()];

    let ok = CheckOutcome::from(check_at(KEY, "355393", &spent, at(1763052571132)));
    assert_eq!(serde_json::to_value(ok).unwrap(), serde_json::json!({ "ok": true }));

    let cases = [
        ("not-base32!", "355393", "MALFORMED_KEY"),
        (KEY, "35539", "MALFORMED_TOTP"),
        (KEY, "000000", "SPENT_TOTP"),
        (KEY, "122654", "WRONG_TOTP"),
    ];
    for (key, code, reason) in cases {
        let outcome = CheckOutcome::from(check_at(key, code, &spent, at(1763052571132)));
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            serde_json::json!({ "ok": false, "reason": reason })
        );
    }
}

#[test]
fn enrolment_to_first_login() {
    let service = TotpService::new(TotpServiceConfig::new("Exam Services")).unwrap();
    let enrollment = service.enroll("candidate-42@example.org").unwrap();

    // The authenticator app scans the URI and derives the same key.
    let scanned = parse_otpauth_uri(enrollment.provisioning.url.as_str()).unwrap();
    assert_eq!(scanned.secret, enrollment.key);
    assert_eq!(scanned.issuer.as_deref(), Some("Exam Services"));

    let now = at(1763052571132);
    let app_key = scanned.secret.decode().unwrap();
    let code = generate_at(&app_key, 0, now);

    let mut spent = vec!["------".to_string(), "------".to_string()];
    assert_eq!(service.verify_at(enrollment.key.as_str(), &code, &spent, now), Ok(()));

    // The caller records the code; a replay within the window is refused.
    spent.insert(0, code.clone());
    assert_eq!(
        service.verify_at(enrollment.key.as_str(), &code, &spent, now),
        Err(TotpRejection::SpentTotp)
    );
}

#[test]
fn get_url_uses_fixed_parameters() {
    let p = get_url(KEY, "Exams", "alice").unwrap();
    assert_eq!(
        p.url.as_str(),
        "otpauth://totp/alice?secret=JBSWY3DPEHPK3PXP&issuer=Exams&algorithm=sha1&digits=6&period=30"
    );
    assert!(p.qr.contains("<svg"));
}

#[test]
fn png_provisioning_from_json_config() {
    let config = TotpServiceConfig::from_json(
        r#"{ "issuer": "Proctoring", "qr_format": "png_data_uri", "qr_module_px": 3 }"#,
    )
    .unwrap();
    assert_eq!(config.qr_format, QrFormat::PngDataUri);

    let service = TotpService::new(config).unwrap();
    let p = service.provision(KEY, "bob").unwrap();
    assert!(p.qr.starts_with("data:image/png;base64,"));
}

#[test]
fn generated_keys_round_trip_through_base32() {
    for _ in 0..16 {
        let key = gen_key();
        let bytes = to_buffer(key.as_str()).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(to_base32(&bytes), key.as_str());
    }
}

#[test]
fn service_is_shareable_across_threads() {
    let service = Arc::new(TotpService::new(TotpServiceConfig::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let e = service.enroll(&format!("user{}", i)).unwrap();
                let key = e.key.decode().unwrap();
                let t = at(1763052571132);
                let code = generate_at(&key, 0, t);
                service.verify_at(e.key.as_str(), &code, &["000000", "111111"], t)
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), Ok(()));
    }
}

//! End-to-end resolution scenarios exercised through the public pipeline.

use s3nest_cfn::{resolve, Resolution};
use s3nest_core::{DeployContext, RawParameters, ResolveError, Schema};

fn run(extra: &[(&str, &str)]) -> Result<Resolution, ResolveError> {
    let mut raw = RawParameters::new();
    raw.insert("ProjectName".into(), "my-project".into());
    raw.insert("Environment".into(), "devl".into());
    raw.insert("S3BucketBaseName".into(), "data-bucket".into());
    for (k, v) in extra {
        raw.insert((*k).into(), (*v).into());
    }
    resolve(&Schema::builtin(), &raw, &DeployContext::default())
}

#[test]
fn minimal_scenario() {
    let r = run(&[]).unwrap();
    let b = &r.document.bucket;
    assert_eq!(b.bucket_name, "my-project-data-bucket-devl-us-east-1");
    assert!(b.encryption.is_none());
    assert!(b.lifecycle.is_none());
    assert!(b.notification.is_none());
    let sids: Vec<&str> = r.document.policy.statement.iter().map(|s| s.sid.as_str()).collect();
    assert_eq!(sids, vec!["DenyInsecureTransport", "DenyCrossAccountAccess"]);
    assert!(r.warnings.is_empty());
}

#[test]
fn full_encryption_scenario() {
    let key = "arn:aws:kms:us-east-1:123456789012:key/abc";
    let r = run(&[("KmsMasterKeyArn", key)]).unwrap();
    let enc = r.document.bucket.encryption.as_ref().unwrap();
    assert_eq!(enc.rules[0].by_default.kms_master_key_id, key);
    assert_eq!(
        r.document.policy.statement[0].sid,
        "DenyIncorrectEncryptionKey"
    );
}

#[test]
fn lifecycle_scenario() {
    let r = run(&[
        ("S3LifecycleConfigurationEnabled", "true"),
        ("TransitionToStandardIAEnabled", "true"),
        ("TransitionToStandardIADays", "30"),
        ("TransitionToGlacierEnabled", "true"),
        ("TransitionToGlacierDays", "180"),
    ])
    .unwrap();
    let rules = &r.document.bucket.lifecycle.as_ref().unwrap().rules;
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].id, "transition-standard-ia");
    assert_eq!(rules[0].transitions.as_ref().unwrap()[0].transition_in_days, 30);
    assert_eq!(rules[1].id, "transition-glacier");
    assert_eq!(rules[1].transitions.as_ref().unwrap()[0].transition_in_days, 180);
}

#[test]
fn master_toggle_off_suppresses_all_rules() {
    let r = run(&[
        ("TransitionToStandardIAEnabled", "true"),
        ("TransitionToGlacierEnabled", "true"),
        ("TransitionToDeepArchiveEnabled", "true"),
        ("EnableExpiration", "true"),
    ])
    .unwrap();
    assert!(r.document.bucket.lifecycle.is_none());
}

#[test]
fn empty_kms_arn_disables_encryption_everywhere() {
    let r = run(&[("KmsMasterKeyArn", "")]).unwrap();
    assert!(r.document.bucket.encryption.is_none());
    assert!(r
        .document
        .policy
        .statement
        .iter()
        .all(|s| s.sid != "DenyIncorrectEncryptionKey"));
}

#[test]
fn invalid_environment_scenario_produces_no_document() {
    let err = run(&[("Environment", "staging")]).unwrap_err();
    match err {
        ResolveError::Validation(errs) => {
            assert!(errs.iter().any(|e| e.parameter == "Environment"));
        }
        other => panic!("expected validation failure, got {other}"),
    }
}

#[test]
fn transition_day_bounds_at_the_edges() {
    for (param, enable, min, max) in [
        (
            "TransitionToStandardIADays",
            "TransitionToStandardIAEnabled",
            30,
            185,
        ),
        (
            "TransitionToDeepArchiveDays",
            "TransitionToDeepArchiveEnabled",
            365,
            500,
        ),
    ] {
        for (value, ok) in [(min, true), (max, true), (min - 1, false), (max + 1, false)] {
            let value = value.to_string();
            let outcome = run(&[
                ("S3LifecycleConfigurationEnabled", "true"),
                (enable, "true"),
                (param, value.as_str()),
            ]);
            assert_eq!(outcome.is_ok(), ok, "{param} = {value}");
        }
    }
}

#[test]
fn resolution_is_deterministic_across_calls() {
    let extra = [
        ("KmsMasterKeyArn", "arn:aws:kms:us-east-1:123456789012:key/abc"),
        ("S3LifecycleConfigurationEnabled", "true"),
        ("TransitionToGlacierEnabled", "true"),
        ("CiBuild", "build-9"),
    ];
    let a = run(&extra).unwrap();
    let b = run(&extra).unwrap();
    assert_eq!(
        serde_json::to_string(&a.document).unwrap(),
        serde_json::to_string(&b.document).unwrap()
    );
}

#[test]
fn parallel_resolutions_do_not_interfere() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let lifecycle = if i % 2 == 0 { "true" } else { "false" };
                let r = run(&[
                    ("S3LifecycleConfigurationEnabled", lifecycle),
                    ("TransitionToStandardIAEnabled", "true"),
                ])
                .unwrap();
                r.document.bucket.lifecycle.is_some()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap(), i % 2 == 0);
    }
}

//! Built-in named scenarios: a fixed set of parameter maps with shape
//! assertions on the resolved document, ported from the template's original
//! validation suite.

use s3nest_cfn::{resolve, Resolution};
use s3nest_core::{DeployContext, RawParameters, ResolveError, Schema};

pub struct Scenario {
    pub name: &'static str,
    pub params: &'static [(&'static str, &'static str)],
    pub expect: Expect,
}

pub enum Expect {
    /// Resolution must succeed; the checker returns failure descriptions.
    Document(fn(&Resolution) -> Vec<String>),
    /// Validation must fail naming this parameter.
    ValidationFailure(&'static str),
}

const BASE: &[(&str, &str)] = &[
    ("ProjectName", "my-project"),
    ("Environment", "devl"),
    ("S3BucketBaseName", "data-bucket"),
];

fn fail(out: &mut Vec<String>, ok: bool, what: &str) {
    if !ok {
        out.push(what.to_string());
    }
}

fn check_minimal(r: &Resolution) -> Vec<String> {
    let mut f = Vec::new();
    let b = &r.document.bucket;
    fail(
        &mut f,
        b.bucket_name == "my-project-data-bucket-devl-us-east-1",
        "bucket name does not follow the naming convention",
    );
    fail(&mut f, b.encryption.is_none(), "encryption block should be absent");
    fail(&mut f, b.lifecycle.is_none(), "lifecycle rules should be absent");
    fail(&mut f, b.notification.is_none(), "notification block should be absent");
    let sids: Vec<&str> = r.document.policy.statement.iter().map(|s| s.sid.as_str()).collect();
    fail(
        &mut f,
        sids == ["DenyInsecureTransport", "DenyCrossAccountAccess"],
        "policy should hold exactly the two always-present statements",
    );
    f
}

fn check_kms(r: &Resolution) -> Vec<String> {
    let mut f = Vec::new();
    match &r.document.bucket.encryption {
        None => f.push("encryption block missing".to_string()),
        Some(enc) => fail(
            &mut f,
            enc.rules[0].by_default.kms_master_key_id
                == "arn:aws:kms:us-east-1:123456789012:key/abc",
            "encryption block does not reference the supplied key",
        ),
    }
    fail(
        &mut f,
        r.document.policy.statement.first().map(|s| s.sid.as_str())
            == Some("DenyIncorrectEncryptionKey"),
        "KMS enforcement statement should be first",
    );
    f
}

fn check_lifecycle(r: &Resolution) -> Vec<String> {
    let mut f = Vec::new();
    match &r.document.bucket.lifecycle {
        None => f.push("lifecycle configuration missing".to_string()),
        Some(lc) => {
            let ids: Vec<&str> = lc.rules.iter().map(|x| x.id.as_str()).collect();
            fail(
                &mut f,
                ids == ["transition-standard-ia", "transition-glacier"],
                "rules should be Standard-IA then Glacier",
            );
            let days: Vec<u32> = lc
                .rules
                .iter()
                .filter_map(|x| x.transitions.as_ref())
                .map(|t| t[0].transition_in_days)
                .collect();
            fail(&mut f, days == [30, 180], "transition day values are wrong");
        }
    }
    f
}

fn check_notifications(r: &Resolution) -> Vec<String> {
    let mut f = Vec::new();
    match &r.document.bucket.notification {
        None => f.push("notification block missing".to_string()),
        Some(n) => {
            fail(
                &mut f,
                n.lambda_configurations.len() == 2,
                "one lambda configuration per event expected",
            );
            let filter_rules = n.lambda_configurations[0]
                .filter
                .as_ref()
                .map(|x| x.s3_key.rules.len())
                .unwrap_or(0);
            fail(&mut f, filter_rules == 2, "prefix and suffix filter expected");
        }
    }
    f
}

fn check_security(r: &Resolution) -> Vec<String> {
    let mut f = Vec::new();
    let sids: Vec<&str> = r.document.policy.statement.iter().map(|s| s.sid.as_str()).collect();
    fail(
        &mut f,
        sids == [
            "DenyInsecureTransport",
            "RestrictToVpcEndpoint",
            "DenyCrossAccountAccess",
            "AllowIamRoleAccess",
        ],
        "security statement order is wrong",
    );
    let deny = &r.document.policy.statement[2];
    let carved = deny
        .condition
        .as_ref()
        .and_then(|c| c.get("StringNotLike"))
        .is_some();
    fail(&mut f, carved, "whitelist carve-out missing from cross-account deny");
    f
}

fn check_ci_build(r: &Resolution) -> Vec<String> {
    let mut f = Vec::new();
    fail(
        &mut f,
        r.document.bucket.bucket_name == "my-project-data-bucket-devl-us-east-1-build-123",
        "CI build suffix missing from bucket name",
    );
    fail(
        &mut f,
        r.document.bucket.tags.iter().any(|t| t.key == "CiBuild"),
        "CiBuild tag missing",
    );
    f
}

fn check_comprehensive(r: &Resolution) -> Vec<String> {
    let mut f = Vec::new();
    let b = &r.document.bucket;
    fail(&mut f, b.encryption.is_some(), "encryption block missing");
    fail(&mut f, b.versioning.is_some(), "versioning missing");
    fail(&mut f, b.lifecycle.is_some(), "lifecycle missing");
    fail(&mut f, b.notification.is_some(), "notifications missing");
    fail(
        &mut f,
        r.document.policy.statement.len() == 5,
        "all five policy statements expected",
    );
    f
}

pub fn suite() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "minimal",
            params: &[],
            expect: Expect::Document(check_minimal),
        },
        Scenario {
            name: "kms-encryption",
            params: &[(
                "KmsMasterKeyArn",
                "arn:aws:kms:us-east-1:123456789012:key/abc",
            )],
            expect: Expect::Document(check_kms),
        },
        Scenario {
            name: "lifecycle",
            params: &[
                ("S3LifecycleConfigurationEnabled", "true"),
                ("TransitionToStandardIAEnabled", "true"),
                ("TransitionToStandardIADays", "30"),
                ("TransitionToGlacierEnabled", "true"),
                ("TransitionToGlacierDays", "180"),
            ],
            expect: Expect::Document(check_lifecycle),
        },
        Scenario {
            name: "notifications",
            params: &[
                (
                    "LambdaFunctionArn",
                    "arn:aws:lambda:us-east-1:123456789012:function:processor",
                ),
                ("NotificationEvents", "s3:ObjectCreated:*,s3:ObjectRemoved:*"),
                ("NotificationPrefix", "uploads/"),
                ("NotificationSuffix", ".jpg"),
            ],
            expect: Expect::Document(check_notifications),
        },
        Scenario {
            name: "security",
            params: &[
                ("S3VpcEndpointId", "vpce-12345678"),
                ("IAMRoleBaseName", "S3AccessRole"),
                ("WhitelistedUserId", "AIDACKCEVSQ6C2EXAMPLE"),
                ("WhitelistedRoleId", "AROACKCEVSQ6C2EXAMPLE"),
            ],
            expect: Expect::Document(check_security),
        },
        Scenario {
            name: "ci-build",
            params: &[("CiBuild", "build-123")],
            expect: Expect::Document(check_ci_build),
        },
        Scenario {
            name: "comprehensive",
            params: &[
                (
                    "KmsMasterKeyArn",
                    "arn:aws:kms:us-east-1:123456789012:key/abc",
                ),
                ("BucketVersioningEnabled", "true"),
                ("S3LifecycleConfigurationEnabled", "true"),
                ("TransitionToStandardIAEnabled", "true"),
                ("EnableExpiration", "true"),
                ("ExpirationDays", "2555"),
                (
                    "LambdaFunctionArn",
                    "arn:aws:lambda:us-east-1:123456789012:function:processor",
                ),
                ("S3VpcEndpointId", "vpce-87654321"),
                ("IAMRoleBaseName", "ComprehensiveRole"),
            ],
            expect: Expect::Document(check_comprehensive),
        },
        Scenario {
            name: "invalid-environment",
            params: &[("Environment", "staging")],
            expect: Expect::ValidationFailure("Environment"),
        },
    ]
}

/// Run every scenario; returns (name, failures) per scenario.
pub fn run_suite(schema: &Schema, ctx: &DeployContext) -> Vec<(&'static str, Vec<String>)> {
    suite()
        .into_iter()
        .map(|s| {
            let mut raw = RawParameters::new();
            for (k, v) in BASE.iter().chain(s.params) {
                raw.insert((*k).to_string(), (*v).to_string());
            }
            let outcome = resolve(schema, &raw, ctx);
            let failures = match (&s.expect, outcome) {
                (Expect::Document(check), Ok(resolution)) => check(&resolution),
                (Expect::Document(_), Err(e)) => {
                    vec![format!("expected a document, resolution failed: {e}")]
                }
                (Expect::ValidationFailure(param), Err(ResolveError::Validation(errs))) => {
                    if errs.iter().any(|e| e.parameter == *param) {
                        Vec::new()
                    } else {
                        vec![format!("validation failed but not for parameter {param}")]
                    }
                }
                (Expect::ValidationFailure(_), Err(e)) => {
                    vec![format!("expected a validation failure, got: {e}")]
                }
                (Expect::ValidationFailure(param), Ok(_)) => {
                    vec![format!("expected validation to reject parameter {param}")]
                }
            };
            (s.name, failures)
        })
        .collect()
}

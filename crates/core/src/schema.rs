//! Parameter and condition schema for the S3 nested-stack component.
//!
//! The tables here are the Rust rendering of the template's `Parameters` and
//! `Conditions` sections: every constraint is a per-parameter domain constant
//! carried over verbatim, not derived from a general rule.

use crate::conditions::ConditionDef;

/// Semantic type of a parameter together with its constraint.
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// Full-string anchored pattern match. `None` means unconstrained.
    Str { pattern: Option<&'static str> },
    /// Inclusive numeric range.
    Number { min: i64, max: i64 },
    /// Fixed allowed-value set, exact case-sensitive membership.
    Enum { allowed: &'static [&'static str] },
    /// Comma-delimited list; every member must match the pattern.
    CommaList { member_pattern: &'static str },
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub kind: ParamKind,
    /// `None` marks a required parameter.
    pub default: Option<&'static str>,
    /// Human-readable constraint-violation message.
    pub message: &'static str,
}

const TRUE_FALSE: &[&str] = &["true", "false"];

// ARN-like optionals accept "" as the feature-disabled sentinel, so their
// patterns are written "empty OR shape".
const KMS_KEY_ARN: &str = r"|arn:aws[a-z-]*:kms:[a-z0-9-]+:[0-9]{12}:key/[a-zA-Z0-9-]+";
const LAMBDA_FUNCTION_ARN: &str =
    r"|arn:aws[a-z-]*:lambda:[a-z0-9-]+:[0-9]{12}:function:[a-zA-Z0-9_-]+(:(\$LATEST|[a-zA-Z0-9_-]+))?";
const VPC_ENDPOINT_ID: &str = r"|vpce-[a-z0-9]{8,17}";
const PRINCIPAL_ID: &str = r"|[A-Z0-9]{21}";
const IAM_ROLE_BASE_NAME: &str = r"|[a-zA-Z0-9+=,.@_-]{1,64}";
const GITHUB_ORG: &str = r"|[a-zA-Z0-9-]{1,50}";
const GITHUB_REPO: &str = r"|[a-zA-Z0-9._-]{1,100}";
const CI_BUILD: &str = r"|[a-z0-9-]{1,20}";
const S3_EVENT: &str = r"s3:[A-Za-z]+:(\*|[A-Za-z*]+)";

/// The static schema: parameter definitions plus the named condition graph.
#[derive(Debug, Clone)]
pub struct Schema {
    pub parameters: Vec<ParamDef>,
    pub conditions: Vec<ConditionDef>,
}

impl Schema {
    /// The built-in S3 nested-stack schema.
    pub fn builtin() -> Self {
        Self {
            parameters: builtin_parameters(),
            conditions: crate::conditions::builtin_conditions(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamDef> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

fn builtin_parameters() -> Vec<ParamDef> {
    let s = |pattern| ParamKind::Str { pattern: Some(pattern) };
    let free = ParamKind::Str { pattern: None };
    let toggle = ParamKind::Enum { allowed: TRUE_FALSE };

    vec![
        ParamDef {
            name: "ProjectName",
            kind: s(r"[a-z][a-z0-9-]{4,29}"),
            default: None,
            message: "5-30 characters, lowercase letters, digits and hyphens, starting with a letter",
        },
        ParamDef {
            name: "Environment",
            kind: ParamKind::Enum { allowed: &["devl", "test", "prod"] },
            default: Some("devl"),
            message: "one of devl, test, prod",
        },
        ParamDef {
            name: "S3BucketBaseName",
            kind: s(r"[a-z0-9][a-z0-9.-]{1,18}[a-z0-9]"),
            default: None,
            message: "3-20 characters, lowercase letters, digits, dots and hyphens, starting and ending alphanumeric",
        },
        ParamDef {
            name: "KmsMasterKeyArn",
            kind: s(KMS_KEY_ARN),
            default: Some(""),
            message: "empty, or a KMS key ARN (arn:<partition>:kms:<region>:<account>:key/<id>)",
        },
        ParamDef {
            name: "BucketVersioningEnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "BlockPublicAcls",
            kind: toggle.clone(),
            default: Some("true"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "BlockPublicPolicy",
            kind: toggle.clone(),
            default: Some("true"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "IgnorePublicAcls",
            kind: toggle.clone(),
            default: Some("true"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "RestrictPublicBuckets",
            kind: toggle.clone(),
            default: Some("true"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "S3LifecycleConfigurationEnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "TransitionPrefix",
            kind: free.clone(),
            default: Some(""),
            message: "object key prefix filter for lifecycle rules",
        },
        ParamDef {
            name: "TransitionToStandardIAEnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "TransitionToStandardIADays",
            kind: ParamKind::Number { min: 30, max: 185 },
            default: Some("30"),
            message: "between 30 and 185 days",
        },
        ParamDef {
            name: "TransitionToIntelligentTieringEnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "TransitionToIntelligentTieringDays",
            kind: ParamKind::Number { min: 1, max: 365 },
            default: Some("60"),
            message: "between 1 and 365 days",
        },
        ParamDef {
            name: "TransitionToOneZoneIAEnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "TransitionToOneZoneIADays",
            kind: ParamKind::Number { min: 30, max: 365 },
            default: Some("90"),
            message: "between 30 and 365 days",
        },
        ParamDef {
            name: "TransitionToGlacierIREnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "TransitionToGlacierIRDays",
            kind: ParamKind::Number { min: 90, max: 270 },
            default: Some("120"),
            message: "between 90 and 270 days",
        },
        ParamDef {
            name: "TransitionToGlacierEnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "TransitionToGlacierDays",
            kind: ParamKind::Number { min: 90, max: 365 },
            default: Some("180"),
            message: "between 90 and 365 days",
        },
        ParamDef {
            name: "TransitionToDeepArchiveEnabled",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "TransitionToDeepArchiveDays",
            kind: ParamKind::Number { min: 365, max: 500 },
            default: Some("365"),
            message: "between 365 and 500 days",
        },
        ParamDef {
            name: "EnableExpiration",
            kind: toggle.clone(),
            default: Some("false"),
            message: "'true' or 'false'",
        },
        ParamDef {
            name: "ExpirationDays",
            kind: ParamKind::Number { min: 1, max: 3650 },
            default: Some("365"),
            message: "between 1 and 3650 days",
        },
        ParamDef {
            name: "LambdaFunctionArn",
            kind: s(LAMBDA_FUNCTION_ARN),
            default: Some(""),
            message: "empty, or a Lambda function ARN with an optional version or alias qualifier",
        },
        ParamDef {
            name: "NotificationEvents",
            kind: ParamKind::CommaList { member_pattern: S3_EVENT },
            default: Some("s3:ObjectCreated:*"),
            message: "comma-delimited S3 event types, e.g. s3:ObjectCreated:*",
        },
        ParamDef {
            name: "NotificationPrefix",
            kind: free.clone(),
            default: Some(""),
            message: "object key prefix filter for notifications",
        },
        ParamDef {
            name: "NotificationSuffix",
            kind: free,
            default: Some(""),
            message: "object key suffix filter for notifications",
        },
        ParamDef {
            name: "S3VpcEndpointId",
            kind: s(VPC_ENDPOINT_ID),
            default: Some(""),
            message: "empty, or a VPC endpoint id (vpce- followed by 8-17 lowercase hex/digit characters)",
        },
        ParamDef {
            name: "WhitelistedUserId",
            kind: s(PRINCIPAL_ID),
            default: Some(""),
            message: "empty, or a 21-character uppercase alphanumeric IAM user id",
        },
        ParamDef {
            name: "WhitelistedRoleId",
            kind: s(PRINCIPAL_ID),
            default: Some(""),
            message: "empty, or a 21-character uppercase alphanumeric IAM role id",
        },
        ParamDef {
            name: "IAMRoleBaseName",
            kind: s(IAM_ROLE_BASE_NAME),
            default: Some(""),
            message: "empty, or an IAM role base name (1-64 characters)",
        },
        ParamDef {
            name: "GitHubOrg",
            kind: s(GITHUB_ORG),
            default: Some(""),
            message: "empty, or a GitHub organization name (1-50 characters, alphanumeric and hyphens)",
        },
        ParamDef {
            name: "GitHubRepo",
            kind: s(GITHUB_REPO),
            default: Some(""),
            message: "empty, or a GitHub repository name (1-100 characters)",
        },
        ParamDef {
            name: "CiBuild",
            kind: s(CI_BUILD),
            default: Some(""),
            message: "empty, or a CI build identifier (1-20 characters, lowercase)",
        },
    ]
}

/// Condition names referenced by the builder. Kept next to the table that
/// defines them so the two cannot drift silently.
pub mod cond {
    pub const ENABLE_KMS_ENCRYPTION: &str = "EnableKMSEncryption";
    pub const BUCKET_VERSIONING_ENABLED: &str = "BucketVersioningEnabled";
    pub const LIFECYCLE_ENABLED: &str = "S3LifecycleConfigurationEnabled";
    pub const TRANSITION_STANDARD_IA: &str = "TransitionToStandardIAEnabled";
    pub const TRANSITION_INTELLIGENT_TIERING: &str = "TransitionToIntelligentTieringEnabled";
    pub const TRANSITION_ONE_ZONE_IA: &str = "TransitionToOneZoneIAEnabled";
    pub const TRANSITION_GLACIER_IR: &str = "TransitionToGlacierIREnabled";
    pub const TRANSITION_GLACIER: &str = "TransitionToGlacierEnabled";
    pub const TRANSITION_DEEP_ARCHIVE: &str = "TransitionToDeepArchiveEnabled";
    pub const EXPIRATION_ENABLED: &str = "ExpirationEnabled";
    pub const LAMBDA_NOTIFY_ENABLED: &str = "LambdaEventNotifyConfigEnabled";
    pub const HAS_NOTIFICATION_PREFIX: &str = "HasNotificationPrefix";
    pub const HAS_NOTIFICATION_SUFFIX: &str = "HasNotificationSuffix";
    pub const HAS_NOTIFICATION_FILTERS: &str = "HasNotificationFilters";
    pub const HAS_VPC_ENDPOINT_RESTRICTION: &str = "HasVpcEndpointRestriction";
    pub const HAS_WHITELISTED_USER_ID: &str = "HasWhitelistedUserId";
    pub const HAS_WHITELISTED_ROLE_ID: &str = "HasWhitelistedRoleId";
    pub const HAS_IAM_ROLE_ACCESS: &str = "HasIAMRoleAccess";
    pub const HAS_CI_BUILD: &str = "HasCiBuild";
    pub const HAS_GITHUB_METADATA: &str = "HasGitHubMetadata";
}

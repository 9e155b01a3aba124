//! Core of the S3 nested-stack resolver: parameter schema and validation,
//! condition evaluation, and the shared error taxonomy.

pub mod conditions;
pub mod error;
pub mod schema;
pub mod validate;

pub use conditions::{ConditionDef, ConditionMap, Expr};
pub use error::{ConsistencyError, ResolutionWarning, ResolveError, ValidationError};
pub use schema::{cond, ParamDef, ParamKind, Schema};
pub use validate::{RawParameters, ValidatedParameters};

use serde::{Deserialize, Serialize};

/// Deployment-time context the template would receive as pseudo-parameters
/// (`AWS::Region`, `AWS::AccountId`, `AWS::Partition`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployContext {
    pub region: String,
    pub account_id: String,
    pub partition: String,
}

impl Default for DeployContext {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: "123456789012".to_string(),
            partition: "aws".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every pattern in the builtin schema has to compile as an anchored
    // regex, otherwise validation would misreport the defect as user error.
    #[test]
    fn builtin_patterns_compile() {
        for def in Schema::builtin().parameters {
            let pattern = match &def.kind {
                ParamKind::Str { pattern: Some(p) } => p,
                ParamKind::CommaList { member_pattern } => member_pattern,
                _ => continue,
            };
            assert!(
                regex::Regex::new(&format!("^(?:{pattern})$")).is_ok(),
                "pattern for {} does not compile",
                def.name
            );
        }
    }

    #[test]
    fn every_builder_condition_is_defined() {
        let schema = Schema::builtin();
        let defined: Vec<&str> = schema.conditions.iter().map(|c| c.name).collect();
        for name in [
            cond::ENABLE_KMS_ENCRYPTION,
            cond::BUCKET_VERSIONING_ENABLED,
            cond::LIFECYCLE_ENABLED,
            cond::TRANSITION_STANDARD_IA,
            cond::TRANSITION_INTELLIGENT_TIERING,
            cond::TRANSITION_ONE_ZONE_IA,
            cond::TRANSITION_GLACIER_IR,
            cond::TRANSITION_GLACIER,
            cond::TRANSITION_DEEP_ARCHIVE,
            cond::EXPIRATION_ENABLED,
            cond::LAMBDA_NOTIFY_ENABLED,
            cond::HAS_NOTIFICATION_PREFIX,
            cond::HAS_NOTIFICATION_SUFFIX,
            cond::HAS_NOTIFICATION_FILTERS,
            cond::HAS_VPC_ENDPOINT_RESTRICTION,
            cond::HAS_WHITELISTED_USER_ID,
            cond::HAS_WHITELISTED_ROLE_ID,
            cond::HAS_IAM_ROLE_ACCESS,
            cond::HAS_CI_BUILD,
            cond::HAS_GITHUB_METADATA,
        ] {
            assert!(defined.contains(&name), "missing condition {name}");
        }
    }
}

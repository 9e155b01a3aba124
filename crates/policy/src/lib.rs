//! Bucket policy statement builder.
//!
//! Statements are emitted in a fixed order so that two resolutions of the
//! same input diff cleanly; the policy engine itself evaluates them
//! independently. Conditionally included statements are omitted from the
//! list entirely, never emitted empty.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tracing::debug;

use s3nest_core::{cond, ConditionMap, ConsistencyError, DeployContext, ValidatedParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// One IAM policy statement. Principal and Condition keep the free-form JSON
/// shape IAM uses; everything else is typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Sid")]
    pub sid: String,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Principal")]
    pub principal: Json,
    #[serde(rename = "Action")]
    pub action: Vec<String>,
    #[serde(rename = "Resource")]
    pub resource: Vec<String>,
    #[serde(rename = "Condition", skip_serializing_if = "Option::is_none")]
    pub condition: Option<Json>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<PolicyStatement>,
}

const POLICY_VERSION: &str = "2012-10-17";

/// Build the bucket policy for an already-validated parameter set.
///
/// Statement order: deny-wrong-KMS-key (conditional), deny-insecure-transport,
/// restrict-to-VPC-endpoint (conditional), deny-cross-account,
/// allow-specific-IAM-role (conditional).
pub fn build_policy(
    params: &ValidatedParameters,
    conds: &ConditionMap,
    ctx: &DeployContext,
    bucket_name: &str,
) -> Result<PolicyDocument, ConsistencyError> {
    let bucket_arn = format!("arn:{}:s3:::{}", ctx.partition, bucket_name);
    let objects_arn = format!("{bucket_arn}/*");
    let both = vec![bucket_arn.clone(), objects_arn.clone()];

    let mut statements = Vec::new();

    if conds.require(cond::ENABLE_KMS_ENCRYPTION)? {
        let key_arn = params.get("KmsMasterKeyArn")?;
        statements.push(PolicyStatement {
            sid: "DenyIncorrectEncryptionKey".to_string(),
            effect: Effect::Deny,
            principal: json!("*"),
            action: vec!["s3:PutObject".to_string()],
            resource: vec![objects_arn.clone()],
            condition: Some(json!({
                "StringNotEquals": {
                    "s3:x-amz-server-side-encryption": "aws:kms",
                    "s3:x-amz-server-side-encryption-aws-kms-key-id": key_arn,
                }
            })),
        });
    }

    statements.push(PolicyStatement {
        sid: "DenyInsecureTransport".to_string(),
        effect: Effect::Deny,
        principal: json!("*"),
        action: vec!["s3:*".to_string()],
        resource: both.clone(),
        condition: Some(json!({
            "Bool": { "aws:SecureTransport": "false" }
        })),
    });

    if conds.require(cond::HAS_VPC_ENDPOINT_RESTRICTION)? {
        statements.push(PolicyStatement {
            sid: "RestrictToVpcEndpoint".to_string(),
            effect: Effect::Deny,
            principal: json!("*"),
            action: vec!["s3:*".to_string()],
            resource: both.clone(),
            condition: Some(json!({
                "StringNotEquals": { "aws:sourceVpce": params.get("S3VpcEndpointId")? }
            })),
        });
    }

    statements.push(deny_cross_account(params, conds, ctx, both.clone())?);

    if conds.require(cond::HAS_IAM_ROLE_ACCESS)? {
        let role_arn = format!(
            "arn:{}:iam::{}:role/{}-{}",
            ctx.partition,
            ctx.account_id,
            params.get("IAMRoleBaseName")?,
            params.get("Environment")?,
        );
        statements.push(PolicyStatement {
            sid: "AllowIamRoleAccess".to_string(),
            effect: Effect::Allow,
            principal: json!({ "AWS": [role_arn] }),
            action: vec![
                "s3:GetObject".to_string(),
                "s3:PutObject".to_string(),
                "s3:DeleteObject".to_string(),
                "s3:ListBucket".to_string(),
            ],
            resource: both,
            condition: None,
        });
    }

    debug!(statements = statements.len(), bucket = bucket_name, "bucket policy assembled");
    Ok(PolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: statements,
    })
}

// The cross-account deny always applies; whitelisted user/role ids are carved
// out of the deny itself (a deny beats any allow, so listing them in the
// allow statement alone would not unblock them). Role ids match any session
// via the ':*' suffix.
fn deny_cross_account(
    params: &ValidatedParameters,
    conds: &ConditionMap,
    ctx: &DeployContext,
    resource: Vec<String>,
) -> Result<PolicyStatement, ConsistencyError> {
    let mut condition = json!({
        "StringNotEquals": { "aws:PrincipalAccount": ctx.account_id }
    });

    let mut exempt: Vec<String> = Vec::new();
    if conds.require(cond::HAS_WHITELISTED_USER_ID)? {
        exempt.push(params.get("WhitelistedUserId")?.to_string());
    }
    if conds.require(cond::HAS_WHITELISTED_ROLE_ID)? {
        exempt.push(format!("{}:*", params.get("WhitelistedRoleId")?));
    }
    if !exempt.is_empty() {
        condition["StringNotLike"] = json!({ "aws:userId": exempt });
    }

    Ok(PolicyStatement {
        sid: "DenyCrossAccountAccess".to_string(),
        effect: Effect::Deny,
        principal: json!("*"),
        action: vec!["s3:*".to_string()],
        resource,
        condition: Some(condition),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3nest_core::{RawParameters, Schema};

    fn resolve(extra: &[(&str, &str)]) -> (ValidatedParameters, ConditionMap) {
        let mut raw = RawParameters::new();
        raw.insert("ProjectName".into(), "my-project".into());
        raw.insert("Environment".into(), "devl".into());
        raw.insert("S3BucketBaseName".into(), "data-bucket".into());
        for (k, v) in extra {
            raw.insert((*k).into(), (*v).into());
        }
        let schema = Schema::builtin();
        let params = schema.validate(&raw).unwrap();
        let conds = schema.evaluate(&params).unwrap();
        (params, conds)
    }

    fn policy(extra: &[(&str, &str)]) -> PolicyDocument {
        let (params, conds) = resolve(extra);
        build_policy(&params, &conds, &DeployContext::default(), "bkt").unwrap()
    }

    fn sids(doc: &PolicyDocument) -> Vec<&str> {
        doc.statement.iter().map(|s| s.sid.as_str()).collect()
    }

    #[test]
    fn minimal_policy_has_exactly_the_two_always_present_statements() {
        let doc = policy(&[]);
        assert_eq!(
            sids(&doc),
            vec!["DenyInsecureTransport", "DenyCrossAccountAccess"]
        );
    }

    #[test]
    fn kms_statement_is_first_when_encryption_is_enabled() {
        let doc = policy(&[(
            "KmsMasterKeyArn",
            "arn:aws:kms:us-east-1:123456789012:key/abc",
        )]);
        assert_eq!(
            sids(&doc),
            vec![
                "DenyIncorrectEncryptionKey",
                "DenyInsecureTransport",
                "DenyCrossAccountAccess"
            ]
        );
        let cond = doc.statement[0].condition.as_ref().unwrap();
        assert_eq!(
            cond["StringNotEquals"]["s3:x-amz-server-side-encryption-aws-kms-key-id"],
            "arn:aws:kms:us-east-1:123456789012:key/abc"
        );
    }

    #[test]
    fn full_statement_order_is_fixed() {
        let doc = policy(&[
            (
                "KmsMasterKeyArn",
                "arn:aws:kms:us-east-1:123456789012:key/abc",
            ),
            ("S3VpcEndpointId", "vpce-12345678"),
            ("IAMRoleBaseName", "S3AccessRole"),
        ]);
        assert_eq!(
            sids(&doc),
            vec![
                "DenyIncorrectEncryptionKey",
                "DenyInsecureTransport",
                "RestrictToVpcEndpoint",
                "DenyCrossAccountAccess",
                "AllowIamRoleAccess"
            ]
        );
    }

    #[test]
    fn insecure_transport_deny_covers_bucket_and_objects() {
        let doc = policy(&[]);
        let stmt = &doc.statement[0];
        assert_eq!(stmt.resource, vec!["arn:aws:s3:::bkt", "arn:aws:s3:::bkt/*"]);
        assert_eq!(
            stmt.condition.as_ref().unwrap()["Bool"]["aws:SecureTransport"],
            "false"
        );
    }

    #[test]
    fn whitelisted_ids_are_carved_out_of_the_cross_account_deny() {
        let doc = policy(&[
            ("WhitelistedUserId", "AIDACKCEVSQ6C2EXAMPLE"),
            ("WhitelistedRoleId", "AROACKCEVSQ6C2EXAMPLE"),
        ]);
        let deny = doc
            .statement
            .iter()
            .find(|s| s.sid == "DenyCrossAccountAccess")
            .unwrap();
        let cond = deny.condition.as_ref().unwrap();
        assert_eq!(cond["StringNotEquals"]["aws:PrincipalAccount"], "123456789012");
        assert_eq!(
            cond["StringNotLike"]["aws:userId"],
            json!(["AIDACKCEVSQ6C2EXAMPLE", "AROACKCEVSQ6C2EXAMPLE:*"])
        );
    }

    #[test]
    fn cross_account_deny_has_no_carve_out_without_whitelists() {
        let doc = policy(&[]);
        let deny = doc
            .statement
            .iter()
            .find(|s| s.sid == "DenyCrossAccountAccess")
            .unwrap();
        assert!(deny.condition.as_ref().unwrap().get("StringNotLike").is_none());
    }

    #[test]
    fn iam_role_allow_names_the_environment_scoped_role() {
        let doc = policy(&[("IAMRoleBaseName", "S3AccessRole")]);
        let allow = doc.statement.last().unwrap();
        assert_eq!(allow.effect, Effect::Allow);
        assert_eq!(
            allow.principal["AWS"][0],
            "arn:aws:iam::123456789012:role/S3AccessRole-devl"
        );
    }

    #[test]
    fn missing_condition_key_is_a_consistency_error() {
        let (params, _) = resolve(&[]);
        let empty = ConditionMap::default();
        let err =
            build_policy(&params, &empty, &DeployContext::default(), "bkt").unwrap_err();
        assert!(matches!(err, ConsistencyError::UndefinedCondition(_)));
    }
}

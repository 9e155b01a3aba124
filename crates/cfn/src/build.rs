//! Bucket configuration builder.

use tracing::debug;

use s3nest_core::{
    cond, ConditionMap, ConsistencyError, DeployContext, ResolutionWarning, ValidatedParameters,
};

use crate::types::*;

/// Canonical lifecycle order: transitions in tier order, then expiration.
/// Each tuple: (condition, days parameter, storage class, rule id).
const TRANSITIONS: &[(&str, &str, &str, &str)] = &[
    (
        cond::TRANSITION_STANDARD_IA,
        "TransitionToStandardIADays",
        "STANDARD_IA",
        "transition-standard-ia",
    ),
    (
        cond::TRANSITION_INTELLIGENT_TIERING,
        "TransitionToIntelligentTieringDays",
        "INTELLIGENT_TIERING",
        "transition-intelligent-tiering",
    ),
    (
        cond::TRANSITION_ONE_ZONE_IA,
        "TransitionToOneZoneIADays",
        "ONEZONE_IA",
        "transition-onezone-ia",
    ),
    (
        cond::TRANSITION_GLACIER_IR,
        "TransitionToGlacierIRDays",
        "GLACIER_IR",
        "transition-glacier-ir",
    ),
    (
        cond::TRANSITION_GLACIER,
        "TransitionToGlacierDays",
        "GLACIER",
        "transition-glacier",
    ),
    (
        cond::TRANSITION_DEEP_ARCHIVE,
        "TransitionToDeepArchiveDays",
        "DEEP_ARCHIVE",
        "transition-deep-archive",
    ),
];

/// Assemble the bucket name:
/// `{ProjectName}-{S3BucketBaseName}-{Environment}-{Region}` with the CI
/// build id appended behind its own separator when supplied.
pub fn bucket_name(
    params: &ValidatedParameters,
    conds: &ConditionMap,
    ctx: &DeployContext,
) -> Result<String, ConsistencyError> {
    let mut name = format!(
        "{}-{}-{}-{}",
        params.get("ProjectName")?,
        params.get("S3BucketBaseName")?,
        params.get("Environment")?,
        ctx.region,
    );
    if conds.require(cond::HAS_CI_BUILD)? {
        name.push('-');
        name.push_str(params.get("CiBuild")?);
    }
    Ok(name)
}

pub fn build_bucket(
    params: &ValidatedParameters,
    conds: &ConditionMap,
    ctx: &DeployContext,
    warnings: &mut Vec<ResolutionWarning>,
) -> Result<BucketConfig, ConsistencyError> {
    let name = bucket_name(params, conds, ctx)?;

    let versioning = if conds.require(cond::BUCKET_VERSIONING_ENABLED)? {
        Some(VersioningConfiguration {
            status: "Enabled".to_string(),
        })
    } else {
        // Absent, not "Suspended": suspending versioning on a bucket that
        // never had it enabled is a different deployed state.
        None
    };

    let encryption = if conds.require(cond::ENABLE_KMS_ENCRYPTION)? {
        Some(BucketEncryption {
            rules: vec![ServerSideEncryptionRule {
                by_default: ServerSideEncryptionByDefault {
                    sse_algorithm: "aws:kms".to_string(),
                    kms_master_key_id: params.get("KmsMasterKeyArn")?.to_string(),
                },
                bucket_key_enabled: true,
            }],
        })
    } else {
        None
    };

    let lifecycle = build_lifecycle(params, conds, warnings)?;
    let notification = build_notification(params, conds)?;

    Ok(BucketConfig {
        bucket_name: name.clone(),
        public_access_block: PublicAccessBlock {
            block_public_acls: params.get("BlockPublicAcls")? == "true",
            block_public_policy: params.get("BlockPublicPolicy")? == "true",
            ignore_public_acls: params.get("IgnorePublicAcls")? == "true",
            restrict_public_buckets: params.get("RestrictPublicBuckets")? == "true",
        },
        versioning,
        encryption,
        lifecycle,
        notification,
        tags: build_tags(params, conds, &name)?,
    })
}

// The master toggle gates every child rule: no rule list at all when it is
// off, regardless of the individual transition toggles.
fn build_lifecycle(
    params: &ValidatedParameters,
    conds: &ConditionMap,
    warnings: &mut Vec<ResolutionWarning>,
) -> Result<Option<LifecycleConfiguration>, ConsistencyError> {
    let prefix = params.get("TransitionPrefix")?.to_string();
    let expiration_enabled = conds.require(cond::EXPIRATION_ENABLED)?;
    let expiration_days = params.get_days("ExpirationDays")?;

    let mut rules = Vec::new();
    for (condition, days_param, storage_class, rule_id) in TRANSITIONS {
        if !conds.require(condition)? {
            continue;
        }
        let days = params.get_days(days_param)?;
        if expiration_enabled && expiration_days <= days {
            warnings.push(ResolutionWarning::ExpirationBeforeTransition {
                storage_class: (*storage_class).to_string(),
                transition_days: days,
                expiration_days,
            });
        }
        rules.push(LifecycleRule {
            id: (*rule_id).to_string(),
            status: "Enabled".to_string(),
            prefix: prefix.clone(),
            transitions: Some(vec![Transition {
                storage_class: (*storage_class).to_string(),
                transition_in_days: days,
            }]),
            expiration_in_days: None,
        });
    }

    if expiration_enabled {
        rules.push(LifecycleRule {
            id: "expiration".to_string(),
            status: "Enabled".to_string(),
            prefix,
            transitions: None,
            expiration_in_days: Some(expiration_days),
        });
    }

    debug!(rules = rules.len(), "lifecycle rules assembled");
    Ok(if rules.is_empty() {
        None
    } else {
        Some(LifecycleConfiguration { rules })
    })
}

fn build_notification(
    params: &ValidatedParameters,
    conds: &ConditionMap,
) -> Result<Option<NotificationConfiguration>, ConsistencyError> {
    if !conds.require(cond::LAMBDA_NOTIFY_ENABLED)? {
        return Ok(None);
    }

    let filter = if conds.require(cond::HAS_NOTIFICATION_FILTERS)? {
        let mut rules = Vec::new();
        if conds.require(cond::HAS_NOTIFICATION_PREFIX)? {
            rules.push(FilterRule {
                name: "prefix".to_string(),
                value: params.get("NotificationPrefix")?.to_string(),
            });
        }
        if conds.require(cond::HAS_NOTIFICATION_SUFFIX)? {
            rules.push(FilterRule {
                name: "suffix".to_string(),
                value: params.get("NotificationSuffix")?.to_string(),
            });
        }
        Some(NotificationFilter {
            s3_key: S3KeyFilter { rules },
        })
    } else {
        None
    };

    let function = params.get("LambdaFunctionArn")?.to_string();
    let configurations = params
        .get_list("NotificationEvents")?
        .into_iter()
        .map(|event| LambdaConfiguration {
            event: event.to_string(),
            function: function.clone(),
            filter: filter.clone(),
        })
        .collect();

    Ok(Some(NotificationConfiguration {
        lambda_configurations: configurations,
    }))
}

fn build_tags(
    params: &ValidatedParameters,
    conds: &ConditionMap,
    bucket_name: &str,
) -> Result<Vec<Tag>, ConsistencyError> {
    let tag = |key: &str, value: &str| Tag {
        key: key.to_string(),
        value: value.to_string(),
    };

    let mut tags = vec![
        tag("Name", bucket_name),
        tag("Project", params.get("ProjectName")?),
        tag("Environment", params.get("Environment")?),
        tag("ManagedBy", "s3nest"),
    ];
    if conds.require(cond::HAS_GITHUB_METADATA)? {
        let org = params.get("GitHubOrg")?;
        if !org.is_empty() {
            tags.push(tag("GitHubOrg", org));
        }
        let repo = params.get("GitHubRepo")?;
        if !repo.is_empty() {
            tags.push(tag("GitHubRepo", repo));
        }
    }
    if conds.require(cond::HAS_CI_BUILD)? {
        tags.push(tag("CiBuild", params.get("CiBuild")?));
    }
    Ok(tags)
}

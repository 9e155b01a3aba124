//! Resolution pipeline for the S3 nested-stack component.
//!
//! `resolve` is the single entrypoint: raw parameters go through validation,
//! condition evaluation and configuration building in one synchronous pass.
//! No state survives the call, so concurrent resolutions cannot interfere.

pub mod build;
pub mod types;

pub use build::{bucket_name, build_bucket};
pub use s3nest_policy::{Effect, PolicyDocument, PolicyStatement};
pub use types::*;

use tracing::debug;

use s3nest_core::{
    DeployContext, RawParameters, ResolutionWarning, ResolveError, Schema,
};
use s3nest_policy::build_policy;

/// A resolved configuration document plus any non-fatal warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub document: ResourceConfigurationDocument,
    pub warnings: Vec<ResolutionWarning>,
}

/// Run the full validate → evaluate → build pass.
///
/// Validation failures come back in aggregate; consistency failures abort
/// immediately. The evaluator and builder never see an unvalidated set.
pub fn resolve(
    schema: &Schema,
    raw: &RawParameters,
    ctx: &DeployContext,
) -> Result<Resolution, ResolveError> {
    let params = schema.validate(raw).map_err(ResolveError::Validation)?;
    let conds = schema.evaluate(&params)?;

    let mut warnings = Vec::new();
    let bucket = build_bucket(&params, &conds, ctx, &mut warnings)?;
    let policy = build_policy(&params, &conds, ctx, &bucket.bucket_name)?;

    debug!(
        bucket = %bucket.bucket_name,
        warnings = warnings.len(),
        "resolution complete"
    );
    Ok(Resolution {
        document: ResourceConfigurationDocument { bucket, policy },
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(extra: &[(&str, &str)]) -> RawParameters {
        let mut m = RawParameters::new();
        m.insert("ProjectName".into(), "my-project".into());
        m.insert("Environment".into(), "devl".into());
        m.insert("S3BucketBaseName".into(), "data-bucket".into());
        for (k, v) in extra {
            m.insert((*k).into(), (*v).into());
        }
        m
    }

    #[test]
    fn resolution_is_idempotent_down_to_the_serialized_bytes() {
        let schema = Schema::builtin();
        let input = raw(&[
            ("KmsMasterKeyArn", "arn:aws:kms:us-east-1:123456789012:key/abc"),
            ("S3LifecycleConfigurationEnabled", "true"),
            ("TransitionToStandardIAEnabled", "true"),
            ("S3VpcEndpointId", "vpce-12345678"),
        ]);
        let ctx = DeployContext::default();
        let a = resolve(&schema, &input, &ctx).unwrap();
        let b = resolve(&schema, &input, &ctx).unwrap();
        assert_eq!(
            serde_json::to_vec(&a.document).unwrap(),
            serde_json::to_vec(&b.document).unwrap()
        );
    }

    #[test]
    fn validation_failure_produces_no_document() {
        let schema = Schema::builtin();
        let err = resolve(
            &schema,
            &raw(&[("Environment", "staging")]),
            &DeployContext::default(),
        )
        .unwrap_err();
        match err {
            ResolveError::Validation(errs) => {
                assert_eq!(errs.len(), 1);
                assert_eq!(errs[0].parameter, "Environment");
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn disabled_features_are_omitted_from_serialization() {
        let schema = Schema::builtin();
        let resolution =
            resolve(&schema, &raw(&[]), &DeployContext::default()).unwrap();
        let json = serde_json::to_value(&resolution.document).unwrap();
        let bucket = &json["Bucket"];
        assert!(bucket.get("BucketEncryption").is_none());
        assert!(bucket.get("VersioningConfiguration").is_none());
        assert!(bucket.get("LifecycleConfiguration").is_none());
        assert!(bucket.get("NotificationConfiguration").is_none());
    }
}

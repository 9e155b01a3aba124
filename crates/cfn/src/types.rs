//! Resource configuration document types.
//!
//! Field names follow the CloudFormation `AWS::S3::Bucket` property names via
//! serde renames. Optional blocks use `Option` + `skip_serializing_if`: a
//! disabled feature is absent from the serialized document, never null or an
//! empty placeholder.

use serde::{Deserialize, Serialize};

use s3nest_policy::PolicyDocument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfigurationDocument {
    #[serde(rename = "Bucket")]
    pub bucket: BucketConfig,
    #[serde(rename = "BucketPolicy")]
    pub policy: PolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    #[serde(rename = "BucketName")]
    pub bucket_name: String,
    #[serde(rename = "PublicAccessBlockConfiguration")]
    pub public_access_block: PublicAccessBlock,
    #[serde(rename = "VersioningConfiguration", skip_serializing_if = "Option::is_none")]
    pub versioning: Option<VersioningConfiguration>,
    #[serde(rename = "BucketEncryption", skip_serializing_if = "Option::is_none")]
    pub encryption: Option<BucketEncryption>,
    #[serde(rename = "LifecycleConfiguration", skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<LifecycleConfiguration>,
    #[serde(rename = "NotificationConfiguration", skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationConfiguration>,
    #[serde(rename = "Tags")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccessBlock {
    #[serde(rename = "BlockPublicAcls")]
    pub block_public_acls: bool,
    #[serde(rename = "BlockPublicPolicy")]
    pub block_public_policy: bool,
    #[serde(rename = "IgnorePublicAcls")]
    pub ignore_public_acls: bool,
    #[serde(rename = "RestrictPublicBuckets")]
    pub restrict_public_buckets: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfiguration {
    #[serde(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEncryption {
    #[serde(rename = "ServerSideEncryptionConfiguration")]
    pub rules: Vec<ServerSideEncryptionRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSideEncryptionRule {
    #[serde(rename = "ServerSideEncryptionByDefault")]
    pub by_default: ServerSideEncryptionByDefault,
    #[serde(rename = "BucketKeyEnabled")]
    pub bucket_key_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSideEncryptionByDefault {
    #[serde(rename = "SSEAlgorithm")]
    pub sse_algorithm: String,
    #[serde(rename = "KMSMasterKeyID")]
    pub kms_master_key_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfiguration {
    #[serde(rename = "Rules")]
    pub rules: Vec<LifecycleRule>,
}

/// One lifecycle rule: either a storage-class transition or an expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRule {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Prefix")]
    pub prefix: String,
    #[serde(rename = "Transitions", skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<Transition>>,
    #[serde(rename = "ExpirationInDays", skip_serializing_if = "Option::is_none")]
    pub expiration_in_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "StorageClass")]
    pub storage_class: String,
    #[serde(rename = "TransitionInDays")]
    pub transition_in_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfiguration {
    #[serde(rename = "LambdaConfigurations")]
    pub lambda_configurations: Vec<LambdaConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaConfiguration {
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "Function")]
    pub function: String,
    #[serde(rename = "Filter", skip_serializing_if = "Option::is_none")]
    pub filter: Option<NotificationFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFilter {
    #[serde(rename = "S3Key")]
    pub s3_key: S3KeyFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3KeyFilter {
    #[serde(rename = "Rules")]
    pub rules: Vec<FilterRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

//! S3 buckets.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::validation::{Validate, Validator};

static BUCKET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("static regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateS3BucketOpts {
    pub id: Id,
    pub bucket_name: String,
    /// Block all public access.
    #[serde(default)]
    pub private: bool,
}

impl Validate for CreateS3BucketOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_match(
            "BucketName",
            &self.bucket_name,
            &BUCKET_NAME,
            "must be a valid bucket name",
        );
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteS3BucketOpts {
    pub id: Id,
    pub bucket_name: String,
}

impl Validate for DeleteS3BucketOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required("BucketName", &self.bucket_name);
        v.finish()
    }
}

impl Keyed for DeleteS3BucketOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::s3_bucket(&self.id.cluster_name, &self.bucket_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Bucket {
    pub id: Id,
    pub name: String,
    pub private: bool,
    pub arn: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
}

impl Resource for S3Bucket {
    const KIND: &'static str = "s3 bucket";
    type Create = CreateS3BucketOpts;
    type Delete = DeleteS3BucketOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

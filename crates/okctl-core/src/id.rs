//! The composite identity every resource is scoped by.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::validation::{Validate, Validator};

/// AWS regions okctl can provision into.
pub const SUPPORTED_REGIONS: &[&str] = &[
    "eu-west-1",
    "eu-north-1",
    "eu-central-1",
    "us-east-1",
    "us-west-2",
];

static ACCOUNT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("static regex"));

static ENVIRONMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("static regex"));

static CLUSTER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*$").expect("static regex"));

/// Identity of a cluster and everything provisioned for it.
///
/// Not unique within a kind on its own: many secrets or policies share one
/// identity and are told apart by their business key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Id {
    pub region: String,
    #[serde(rename = "accountID")]
    pub account_id: String,
    pub environment: String,
    pub repository: String,
    pub cluster_name: String,
}

impl Id {
    pub fn new(
        region: impl Into<String>,
        account_id: impl Into<String>,
        environment: impl Into<String>,
        repository: impl Into<String>,
        cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            account_id: account_id.into(),
            environment: environment.into(),
            repository: repository.into(),
            cluster_name: cluster_name.into(),
        }
    }

    /// Record identity violations into a validator shared with the
    /// enclosing options, so all fields are reported side by side.
    pub fn check(&self, v: &mut Validator) {
        v.required_match(
            "AccountID",
            &self.account_id,
            &ACCOUNT_ID,
            "must be exactly 12 digits",
        );
        v.required_len("ClusterName", &self.cluster_name, 1, 100);
        if !self.cluster_name.is_empty() {
            v.check(
                "ClusterName",
                CLUSTER_NAME.is_match(&self.cluster_name),
                "must start with an alphanumeric character and contain only alphanumerics and dashes",
            );
        }
        v.required_len("Environment", &self.environment, 3, 64);
        if !self.environment.is_empty() {
            v.check(
                "Environment",
                ENVIRONMENT.is_match(&self.environment),
                "must contain only lowercase alphanumerics and dashes",
            );
        }
        if self.region.trim().is_empty() {
            v.fail("Region", "cannot be blank");
        } else {
            v.check(
                "Region",
                SUPPORTED_REGIONS.contains(&self.region.as_str()),
                "must be a supported region",
            );
        }
        v.required_max("Repository", &self.repository, 100);
    }

    /// Permissions boundary every okctl-created role is bound by.
    pub fn permissions_boundary_arn(&self) -> String {
        permissions_boundary_arn(&self.account_id)
    }

    /// Tags applied to every stack created for this identity.
    pub fn tags(&self) -> Vec<(String, String)> {
        vec![
            ("alpha.okctl.io/cluster-name".to_string(), self.cluster_name.clone()),
            ("alpha.okctl.io/environment".to_string(), self.environment.clone()),
            ("alpha.okctl.io/repository".to_string(), self.repository.clone()),
            ("alpha.okctl.io/managed".to_string(), "true".to_string()),
        ]
    }
}

impl Validate for Id {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.check(&mut v);
        v.finish()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.region, self.account_id, self.repository, self.environment, self.cluster_name
        )
    }
}

/// Deterministic permissions boundary ARN for an account.
pub fn permissions_boundary_arn(account_id: &str) -> String {
    format!("arn:aws:iam::{account_id}:policy/okctl/okctl-permissions-boundary")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    fn valid() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    #[test]
    fn valid_identity_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn blank_identity_lists_every_field() {
        let err = Id::default().validate().unwrap_err();
        assert_eq!(err.kind(), Kind::Invalid);
        assert_eq!(
            err.message(),
            "AccountID: cannot be blank; ClusterName: cannot be blank; \
             Environment: cannot be blank; Region: cannot be blank; Repository: cannot be blank"
        );
    }

    #[test]
    fn account_id_must_be_twelve_digits() {
        let mut id = valid();
        id.account_id = "12345".to_string();
        let err = id.validate().unwrap_err();
        assert!(err.message().contains("AccountID: must be exactly 12 digits"));

        id.account_id = "12345678901a".to_string();
        assert!(id.validate().is_err());
    }

    #[test]
    fn cluster_name_rejects_path_separators() {
        let mut id = valid();
        id.cluster_name = "../etc".to_string();
        let err = id.validate().unwrap_err();
        assert!(err.message().starts_with("ClusterName:"));
    }

    #[test]
    fn unsupported_region_is_rejected() {
        let mut id = valid();
        id.region = "ap-south-1".to_string();
        let err = id.validate().unwrap_err();
        assert_eq!(err.message(), "Region: must be a supported region");
    }

    #[test]
    fn permissions_boundary_is_derived_from_account() {
        assert_eq!(
            valid().permissions_boundary_arn(),
            "arn:aws:iam::123456789012:policy/okctl/okctl-permissions-boundary"
        );
    }
}

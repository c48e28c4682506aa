//! SecureString parameters in SSM Parameter Store.
//!
//! Only the location and version of a secret are recorded locally; the
//! value itself never reaches the state store.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::validation::{Validate, Validator};

/// Longest secret name parameter store accepts below the cluster prefix.
pub const MAX_SECRET_NAME_LEN: usize = 128;

/// Path a named secret is stored under for a cluster.
pub fn secret_path(cluster_name: &str, name: &str) -> String {
    format!("/okctl/{cluster_name}/{name}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretOpts {
    pub id: Id,
    pub name: String,
    pub secret: String,
}

impl Validate for CreateSecretOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_max("Name", &self.name, MAX_SECRET_NAME_LEN)
            .check("Name", !self.name.starts_with('/'), "must be relative")
            .required("Secret", &self.secret);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSecretOpts {
    pub id: Id,
    pub name: String,
}

impl Validate for DeleteSecretOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_max("Name", &self.name, MAX_SECRET_NAME_LEN);
        v.finish()
    }
}

impl Keyed for DeleteSecretOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Reference to a stored secret, embeddable in other resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
    pub path: String,
    pub version: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretParameter {
    pub id: Id,
    pub name: String,
    pub path: String,
    pub version: i64,
}

impl SecretParameter {
    pub fn reference(&self) -> SecretRef {
        SecretRef {
            name: self.name.clone(),
            path: self.path.clone(),
            version: self.version,
        }
    }
}

impl Resource for SecretParameter {
    const KIND: &'static str = "secret parameter";
    type Create = CreateSecretOpts;
    type Delete = DeleteSecretOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

//! Cognito user pools and their app clients.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::types::certificate::Certificate;
use crate::validation::{Validate, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdentityPoolOpts {
    pub id: Id,
    /// Domain the hosted login UI is served from, e.g. `auth.okctl.example.com`.
    pub auth_domain: String,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
}

impl Validate for CreateIdentityPoolOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("AuthDomain", &self.auth_domain)
            .required("HostedZoneID", &self.hosted_zone_id);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIdentityPoolOpts {
    pub id: Id,
    pub auth_domain: String,
}

impl Validate for DeleteIdentityPoolOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("AuthDomain", &self.auth_domain);
        v.finish()
    }
}

impl Keyed for DeleteIdentityPoolOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::identity_pool(&self.id.cluster_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPool {
    pub id: Id,
    #[serde(rename = "userPoolID")]
    pub user_pool_id: String,
    pub auth_domain: String,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
    /// Certificate serving the auth domain; created before the pool.
    pub certificate: Certificate,
    /// CloudFront distribution the auth domain aliases to.
    pub record_set_alias_target: String,
}

impl Resource for IdentityPool {
    const KIND: &'static str = "identity pool";
    type Create = CreateIdentityPoolOpts;
    type Delete = DeleteIdentityPoolOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdentityPoolClientOpts {
    pub id: Id,
    #[serde(rename = "userPoolID")]
    pub user_pool_id: String,
    /// What the client is for, e.g. `grafana`.
    pub purpose: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
}

impl CreateIdentityPoolClientOpts {
    pub fn stack_name(&self) -> String {
        stack::identity_pool_client(&self.id.cluster_name, &self.purpose)
    }
}

impl Validate for CreateIdentityPoolClientOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required("UserPoolID", &self.user_pool_id)
            .k8s_name("Purpose", &self.purpose)
            .check(
                "CallbackURL",
                self.callback_url.starts_with("https://"),
                "must be an https:// URL",
            )
            .stack_name("StackName", &self.stack_name());
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIdentityPoolClientOpts {
    pub id: Id,
    pub purpose: String,
}

impl Validate for DeleteIdentityPoolClientOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("Purpose", &self.purpose);
        v.finish()
    }
}

impl Keyed for DeleteIdentityPoolClientOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::identity_pool_client(&self.id.cluster_name, &self.purpose)
    }
}

/// A public (PKCE) app client; no client secret is issued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPoolClient {
    pub id: Id,
    #[serde(rename = "userPoolID")]
    pub user_pool_id: String,
    pub purpose: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
}

impl Resource for IdentityPoolClient {
    const KIND: &'static str = "identity pool client";
    type Create = CreateIdentityPoolClientOpts;
    type Delete = DeleteIdentityPoolClientOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

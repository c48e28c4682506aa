//! GitHub OAuth applications and the infrastructure repository.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::types::parameter::{MAX_SECRET_NAME_LEN, SecretRef};
use crate::validation::{Validate, Validator};

/// Longest app name whose client secret name still fits in parameter store.
pub const MAX_OAUTH_APP_NAME_LEN: usize =
    MAX_SECRET_NAME_LEN - "github/oauthapp//client_secret".len();

/// A read-only deploy key registered on the infrastructure repository.
/// The private half lives in parameter store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployKey {
    pub title: String,
    pub public_key: String,
    pub private_key_secret: SecretRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubRepository {
    pub organisation: String,
    pub repository: String,
    #[serde(rename = "gitURL")]
    pub git_url: String,
    pub deploy_key: DeployKey,
}

impl Validate for GithubRepository {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        v.required("Organisation", &self.organisation)
            .required("Repository", &self.repository)
            .check(
                "GitURL",
                self.git_url.starts_with("git@") || self.git_url.starts_with("https://"),
                "must be an ssh or https git URL",
            )
            .required("DeployKey.PrivateKeySecret.Path", &self.deploy_key.private_key_secret.path);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOAuthAppOpts {
    pub id: Id,
    pub organisation: String,
    pub name: String,
    #[serde(rename = "siteURL")]
    pub site_url: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
}

impl Validate for CreateOAuthAppOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required("Organisation", &self.organisation)
            .required_max("Name", &self.name, MAX_OAUTH_APP_NAME_LEN)
            .check("SiteURL", self.site_url.starts_with("https://"), "must be an https:// URL")
            .check(
                "CallbackURL",
                self.callback_url.starts_with(&self.site_url) && !self.site_url.is_empty(),
                "must be below SiteURL",
            );
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOAuthAppOpts {
    pub id: Id,
    pub organisation: String,
    pub name: String,
}

impl Validate for DeleteOAuthAppOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required("Organisation", &self.organisation)
            .required_max("Name", &self.name, MAX_OAUTH_APP_NAME_LEN);
        v.finish()
    }
}

impl Keyed for DeleteOAuthAppOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Name of the secret parameter holding an OAuth app's client secret.
pub fn oauth_client_secret_name(app_name: &str) -> String {
    format!("github/oauthapp/{app_name}/client_secret")
}

/// A GitHub OAuth application. The client secret is kept in parameter
/// store and only referenced here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthApp {
    pub id: Id,
    pub organisation: String,
    pub name: String,
    #[serde(rename = "siteURL")]
    pub site_url: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: SecretRef,
}

impl Resource for OAuthApp {
    const KIND: &'static str = "github oauth app";
    type Create = CreateOAuthAppOpts;
    type Delete = DeleteOAuthAppOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// What the GitHub collaborator hands back when it registers an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthAppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

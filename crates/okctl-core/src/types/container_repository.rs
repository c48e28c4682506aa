//! ECR container repositories.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::validation::{Validate, Validator};

static IMAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+([._-][a-z0-9]+)*(/[a-z0-9]+([._-][a-z0-9]+)*)*$").expect("static regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContainerRepositoryOpts {
    pub id: Id,
    pub image_name: String,
}

impl Validate for CreateContainerRepositoryOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_match(
            "ImageName",
            &self.image_name,
            &IMAGE_NAME,
            "must be a valid repository name",
        );
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContainerRepositoryOpts {
    pub id: Id,
    pub image_name: String,
}

impl Validate for DeleteContainerRepositoryOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required("ImageName", &self.image_name);
        v.finish()
    }
}

impl Keyed for DeleteContainerRepositoryOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::container_repository(&self.id.cluster_name, &self.image_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRepository {
    pub id: Id,
    pub image_name: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
    #[serde(rename = "repositoryURI")]
    pub repository_uri: String,
}

impl Resource for ContainerRepository {
    const KIND: &'static str = "container repository";
    type Create = CreateContainerRepositoryOpts;
    type Delete = DeleteContainerRepositoryOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

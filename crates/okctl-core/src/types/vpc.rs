//! VPC provisioned through CloudFormation.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::validation::{Validate, Validator};

/// A subnet inside the cluster VPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcSubnet {
    pub id: String,
    pub cidr: String,
    pub availability_zone: String,
}

impl Validate for VpcSubnet {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        v.required("ID", &self.id)
            .cidr("Cidr", &self.cidr)
            .required("AvailabilityZone", &self.availability_zone);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVpcOpts {
    pub id: Id,
    pub cidr: String,
    /// Single NAT gateway and no database subnets.
    #[serde(default)]
    pub minimal: bool,
}

impl Validate for CreateVpcOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.cidr("Cidr", &self.cidr);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVpcOpts {
    pub id: Id,
}

impl Validate for DeleteVpcOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

impl Keyed for DeleteVpcOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::vpc(&self.id.cluster_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    pub id: Id,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
    pub vpc_id: String,
    pub cidr: String,
    pub public_subnets: Vec<VpcSubnet>,
    pub private_subnets: Vec<VpcSubnet>,
    pub database_subnets: Vec<VpcSubnet>,
    pub database_subnets_group_name: String,
}

impl Resource for Vpc {
    const KIND: &'static str = "vpc";
    type Create = CreateVpcOpts;
    type Delete = DeleteVpcOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

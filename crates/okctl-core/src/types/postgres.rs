//! RDS Postgres databases for applications running in the cluster.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::validation::{Validate, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostgresDatabaseOpts {
    pub id: Id,
    pub application_name: String,
    pub user_name: String,
    #[serde(rename = "vpcID")]
    pub vpc_id: String,
    pub db_subnet_group_name: String,
    #[serde(rename = "dbSubnetIDs")]
    pub db_subnet_ids: Vec<String>,
    #[serde(rename = "dbSubnetCIDRs")]
    pub db_subnet_cidrs: Vec<String>,
}

impl Validate for CreatePostgresDatabaseOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("ApplicationName", &self.application_name)
            .required_max("UserName", &self.user_name, 16)
            .check(
                "UserName",
                self.user_name != "admin" && self.user_name != "postgres",
                "is reserved",
            )
            .required("VpcID", &self.vpc_id)
            .required("DBSubnetGroupName", &self.db_subnet_group_name)
            .check("DBSubnetIDs", !self.db_subnet_ids.is_empty(), "cannot be blank")
            .check("DBSubnetCIDRs", !self.db_subnet_cidrs.is_empty(), "cannot be blank");
        for (i, cidr) in self.db_subnet_cidrs.iter().enumerate() {
            v.cidr(&format!("DBSubnetCIDRs[{i}]"), cidr);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostgresDatabaseOpts {
    pub id: Id,
    pub application_name: String,
}

impl Validate for DeletePostgresDatabaseOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.k8s_name("ApplicationName", &self.application_name);
        v.finish()
    }
}

impl Keyed for DeletePostgresDatabaseOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::postgres(&self.id.cluster_name, &self.application_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresDatabase {
    pub id: Id,
    pub application_name: String,
    pub user_name: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
    pub endpoint_address: String,
    pub endpoint_port: u16,
    #[serde(rename = "adminSecretARN")]
    pub admin_secret_arn: String,
    #[serde(rename = "securityGroupID")]
    pub security_group_id: String,
}

impl Resource for PostgresDatabase {
    const KIND: &'static str = "postgres database";
    type Create = CreatePostgresDatabaseOpts;
    type Delete = DeletePostgresDatabaseOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

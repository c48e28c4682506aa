//! EC2 security groups provisioned as CloudFormation stacks.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::validation::{Validate, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRule {
    pub description: String,
    pub from_port: u16,
    pub to_port: u16,
    /// `tcp`, `udp` or `-1` for all.
    pub protocol: String,
    #[serde(default, rename = "cidrIP", skip_serializing_if = "String::is_empty")]
    pub cidr_ip: String,
    #[serde(
        default,
        rename = "sourceSecurityGroupID",
        skip_serializing_if = "String::is_empty"
    )]
    pub source_security_group_id: String,
}

impl Validate for SecurityGroupRule {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        v.required("Description", &self.description)
            .check(
                "Protocol",
                matches!(self.protocol.as_str(), "tcp" | "udp" | "-1"),
                "must be one of tcp, udp, -1",
            )
            .check("ToPort", self.to_port >= self.from_port, "must be no less than FromPort")
            .check(
                "Source",
                self.cidr_ip.is_empty() != self.source_security_group_id.is_empty(),
                "exactly one of CidrIP and SourceSecurityGroupID must be set",
            );
        if !self.cidr_ip.is_empty() {
            v.cidr("CidrIP", &self.cidr_ip);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecurityGroupOpts {
    pub id: Id,
    pub name: String,
    #[serde(rename = "vpcID")]
    pub vpc_id: String,
    pub description: String,
    #[serde(default)]
    pub inbound_rules: Vec<SecurityGroupRule>,
    #[serde(default)]
    pub outbound_rules: Vec<SecurityGroupRule>,
}

impl Validate for CreateSecurityGroupOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_max("Name", &self.name, 255)
            .required("VpcID", &self.vpc_id)
            .required_max("Description", &self.description, 255);
        for (i, rule) in self.inbound_rules.iter().enumerate() {
            v.nested(&format!("InboundRules[{i}]"), rule);
        }
        for (i, rule) in self.outbound_rules.iter().enumerate() {
            v.nested(&format!("OutboundRules[{i}]"), rule);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSecurityGroupOpts {
    pub id: Id,
    pub name: String,
}

impl Validate for DeleteSecurityGroupOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_max("Name", &self.name, 255);
        v.finish()
    }
}

impl Keyed for DeleteSecurityGroupOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::security_group(&self.id.cluster_name, &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    pub id: Id,
    pub name: String,
    #[serde(rename = "vpcID")]
    pub vpc_id: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
    #[serde(rename = "groupID")]
    pub group_id: String,
    pub inbound_rules: Vec<SecurityGroupRule>,
    pub outbound_rules: Vec<SecurityGroupRule>,
}

impl Resource for SecurityGroup {
    const KIND: &'static str = "security group";
    type Create = CreateSecurityGroupOpts;
    type Delete = DeleteSecurityGroupOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

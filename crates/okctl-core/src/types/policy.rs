//! IAM managed policies provisioned as CloudFormation stacks.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::validation::{Validate, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyOpts {
    pub id: Id,
    /// Short policy name, e.g. `ExternalDNS`.
    pub name: String,
    /// Name of the stack output carrying the policy ARN.
    pub policy_output_name: String,
    pub template: Vec<u8>,
}

impl CreatePolicyOpts {
    pub fn stack_name(&self) -> String {
        stack::policy(&self.id.cluster_name, &self.name)
    }
}

impl Validate for CreatePolicyOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_max("Name", &self.name, 64)
            .required("PolicyOutputName", &self.policy_output_name)
            .check("Template", !self.template.is_empty(), "cannot be blank")
            .stack_name("StackName", &self.stack_name());
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePolicyOpts {
    pub id: Id,
    pub name: String,
}

impl Validate for DeletePolicyOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required_max("Name", &self.name, 64);
        v.finish()
    }
}

impl Keyed for DeletePolicyOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        stack::policy(&self.id.cluster_name, &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPolicy {
    pub id: Id,
    pub name: String,
    pub stack_name: String,
    #[serde(rename = "policyARN")]
    pub policy_arn: String,
    #[serde(default)]
    pub template: Vec<u8>,
}

impl Resource for ManagedPolicy {
    const KIND: &'static str = "managed policy";
    type Create = CreatePolicyOpts;
    type Delete = DeletePolicyOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.stack_name.clone()
    }
}

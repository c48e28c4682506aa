//! Cluster controllers installed as Policy → ServiceAccount → Helm bundles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::charts;
use crate::error::Error;
use crate::id::Id;
use crate::policies;
use crate::stack;
use crate::types::helm::{Chart, HelmRelease};
use crate::types::policy::{CreatePolicyOpts, ManagedPolicy};
use crate::types::service_account::ServiceAccount;
use crate::validation::{Validate, Validator};

/// Namespace every controller is installed into.
pub const CONTROLLER_NAMESPACE: &str = "kube-system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Controller {
    Autoscaler,
    Blockstorage,
    AwsLoadBalancerController,
    ExternalDns,
    ExternalSecrets,
}

impl Controller {
    pub const ALL: [Controller; 5] = [
        Controller::Autoscaler,
        Controller::Blockstorage,
        Controller::AwsLoadBalancerController,
        Controller::ExternalDns,
        Controller::ExternalSecrets,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Controller::Autoscaler => "autoscaler",
            Controller::Blockstorage => "blockstorage",
            Controller::AwsLoadBalancerController => "aws load balancer controller",
            Controller::ExternalDns => "external dns",
            Controller::ExternalSecrets => "external secrets",
        }
    }

    /// Short policy name, part of the policy stack name.
    pub fn policy_name(self) -> &'static str {
        match self {
            Controller::Autoscaler => "AutoscalerPolicy",
            Controller::Blockstorage => "BlockstoragePolicy",
            Controller::AwsLoadBalancerController => "AWSLoadBalancerControllerPolicy",
            Controller::ExternalDns => "ExternalDNSPolicy",
            Controller::ExternalSecrets => "ExternalSecretsPolicy",
        }
    }

    pub fn policy_output_name(self) -> &'static str {
        match self {
            Controller::Autoscaler => "AutoscalerPolicyArn",
            Controller::Blockstorage => "BlockstoragePolicyArn",
            Controller::AwsLoadBalancerController => "AWSLoadBalancerControllerPolicyArn",
            Controller::ExternalDns => "ExternalDNSPolicyArn",
            Controller::ExternalSecrets => "ExternalSecretsPolicyArn",
        }
    }

    pub fn service_account(self) -> &'static str {
        match self {
            Controller::Autoscaler => "cluster-autoscaler",
            Controller::Blockstorage => "ebs-csi-controller-sa",
            Controller::AwsLoadBalancerController => "aws-load-balancer-controller",
            Controller::ExternalDns => "external-dns",
            Controller::ExternalSecrets => "external-secrets",
        }
    }

    pub fn namespace(self) -> &'static str {
        CONTROLLER_NAMESPACE
    }

    /// Helm release name the chart is installed under.
    pub fn release_name(self) -> &'static str {
        match self {
            Controller::Autoscaler => "cluster-autoscaler",
            Controller::Blockstorage => "aws-ebs-csi-driver",
            Controller::AwsLoadBalancerController => "aws-load-balancer-controller",
            Controller::ExternalDns => "external-dns",
            Controller::ExternalSecrets => "external-secrets",
        }
    }

    /// Stack name of the controller's managed policy.
    pub fn policy_stack_name(self, id: &Id) -> String {
        stack::policy(&id.cluster_name, self.policy_name())
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutoscalerOpts {
    pub id: Id,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockstorageOpts {
    pub id: Id,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAwsLoadBalancerControllerOpts {
    pub id: Id,
    #[serde(rename = "vpcID")]
    pub vpc_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExternalDnsOpts {
    pub id: Id,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExternalSecretsOpts {
    pub id: Id,
}

impl Validate for CreateAutoscalerOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

impl Validate for CreateBlockstorageOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

impl Validate for CreateAwsLoadBalancerControllerOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required("VpcID", &self.vpc_id);
        v.finish()
    }
}

impl Validate for CreateExternalDnsOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.required("HostedZoneID", &self.hosted_zone_id)
            .dns_name("Domain", &self.domain);
        v.finish()
    }
}

impl Validate for CreateExternalSecretsOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteControllerOpts {
    pub id: Id,
}

impl Validate for DeleteControllerOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

/// Everything needed to install one controller, resolved from its options.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSpec {
    pub controller: Controller,
    pub id: Id,
    pub statements: serde_json::Value,
    pub chart: Chart,
}

impl ControllerSpec {
    pub fn policy_opts(&self) -> CreatePolicyOpts {
        let c = self.controller;
        CreatePolicyOpts {
            id: self.id.clone(),
            name: c.policy_name().to_string(),
            policy_output_name: c.policy_output_name().to_string(),
            template: policies::template(
                &self.id,
                c.policy_name(),
                c.policy_output_name(),
                self.statements.clone(),
            ),
        }
    }
}

impl From<&CreateAutoscalerOpts> for ControllerSpec {
    fn from(opts: &CreateAutoscalerOpts) -> Self {
        let c = Controller::Autoscaler;
        Self {
            controller: c,
            id: opts.id.clone(),
            statements: policies::autoscaler(&opts.id),
            chart: charts::autoscaler(&opts.id, c.service_account(), c.namespace()),
        }
    }
}

impl From<&CreateBlockstorageOpts> for ControllerSpec {
    fn from(opts: &CreateBlockstorageOpts) -> Self {
        let c = Controller::Blockstorage;
        Self {
            controller: c,
            id: opts.id.clone(),
            statements: policies::blockstorage(&opts.id),
            chart: charts::blockstorage(&opts.id, c.service_account(), c.namespace()),
        }
    }
}

impl From<&CreateAwsLoadBalancerControllerOpts> for ControllerSpec {
    fn from(opts: &CreateAwsLoadBalancerControllerOpts) -> Self {
        let c = Controller::AwsLoadBalancerController;
        Self {
            controller: c,
            id: opts.id.clone(),
            statements: policies::aws_load_balancer_controller(&opts.id),
            chart: charts::aws_load_balancer_controller(
                &opts.id,
                c.service_account(),
                c.namespace(),
                &opts.vpc_id,
            ),
        }
    }
}

impl From<&CreateExternalDnsOpts> for ControllerSpec {
    fn from(opts: &CreateExternalDnsOpts) -> Self {
        let c = Controller::ExternalDns;
        Self {
            controller: c,
            id: opts.id.clone(),
            statements: policies::external_dns(&opts.id, &opts.hosted_zone_id),
            chart: charts::external_dns(
                &opts.id,
                c.service_account(),
                c.namespace(),
                &opts.domain,
                &opts.hosted_zone_id,
            ),
        }
    }
}

impl From<&CreateExternalSecretsOpts> for ControllerSpec {
    fn from(opts: &CreateExternalSecretsOpts) -> Self {
        let c = Controller::ExternalSecrets;
        Self {
            controller: c,
            id: opts.id.clone(),
            statements: policies::external_secrets(&opts.id),
            chart: charts::external_secrets(&opts.id, c.service_account(), c.namespace()),
        }
    }
}

/// The three children of an installed controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerInstallation {
    pub id: Id,
    pub controller: Controller,
    pub policy: ManagedPolicy,
    pub service_account: ServiceAccount,
    pub helm: HelmRelease,
}

//! Applies a cluster declaration through the capability traits.
//!
//! The applier only sees [`ClusterApi`], [`VpcApi`], [`DomainApi`] and
//! [`ControllerApi`], so the same declaration applies in-process or against
//! a daemon. Nothing is rolled back on failure: re-applying after fixing
//! the cause continues from the stored state.

use okctl_core::types::*;
use okctl_core::{Error, ErrorContext, Id, Result, Validate, Validator};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ClusterApi, ControllerApi, DomainApi, VpcApi};

/// Controllers to install on the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Integrations {
    pub autoscaler: bool,
    pub blockstorage: bool,
    pub aws_load_balancer_controller: bool,
    #[serde(rename = "externalDNS")]
    pub external_dns: bool,
    pub external_secrets: bool,
}

impl Default for Integrations {
    fn default() -> Self {
        Self {
            autoscaler: true,
            blockstorage: true,
            aws_load_balancer_controller: true,
            external_dns: true,
            external_secrets: true,
        }
    }
}

impl Integrations {
    pub fn none() -> Self {
        Self {
            autoscaler: false,
            blockstorage: false,
            aws_load_balancer_controller: false,
            external_dns: false,
            external_secrets: false,
        }
    }

    /// Enabled controllers in install order.
    pub fn enabled(&self) -> Vec<Controller> {
        Controller::ALL
            .into_iter()
            .filter(|c| match c {
                Controller::Autoscaler => self.autoscaler,
                Controller::Blockstorage => self.blockstorage,
                Controller::AwsLoadBalancerController => self.aws_load_balancer_controller,
                Controller::ExternalDns => self.external_dns,
                Controller::ExternalSecrets => self.external_secrets,
            })
            .collect()
    }
}

/// Desired state of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeclaration {
    pub id: Id,
    pub cidr: String,
    /// Primary domain of the cluster; empty skips the hosted zone.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub minimal_vpc: bool,
    #[serde(default)]
    pub integrations: Integrations,
}

impl ClusterDeclaration {
    fn fqdn(&self) -> String {
        format!("{}.", self.domain.trim_end_matches('.'))
    }
}

impl Validate for ClusterDeclaration {
    fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.cidr("Cidr", &self.cidr);
        if self.domain.is_empty() {
            v.check(
                "Domain",
                !self.integrations.external_dns,
                "cannot be blank when external dns is enabled",
            );
        } else {
            v.dns_name("Domain", &self.domain);
        }
        v.finish()
    }
}

/// What one apply produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCluster {
    pub vpc: Vpc,
    pub cluster: Cluster,
    pub hosted_zone: Option<HostedZone>,
    pub controllers: Vec<ControllerInstallation>,
}

pub struct Applier<C> {
    api: C,
}

impl<C> Applier<C>
where
    C: ClusterApi + VpcApi + DomainApi + ControllerApi,
{
    pub fn new(api: C) -> Self {
        Self { api }
    }

    /// VPC, then cluster, then hosted zone, then the enabled controllers.
    pub async fn apply(&self, decl: &ClusterDeclaration) -> Result<AppliedCluster> {
        decl.validate().stage("validating declaration")?;
        let id = &decl.id;
        info!(cluster = %id.cluster_name, "applying cluster");

        let vpc = self
            .api
            .create_vpc(CreateVpcOpts {
                id: id.clone(),
                cidr: decl.cidr.clone(),
                minimal: decl.minimal_vpc,
            })
            .await
            .stage("applying vpc")?;

        let cluster = self
            .api
            .create_cluster(CreateClusterOpts {
                id: id.clone(),
                cidr: decl.cidr.clone(),
                version: String::new(),
                vpc_id: vpc.vpc_id.clone(),
                vpc_private_subnets: vpc.private_subnets.clone(),
                vpc_public_subnets: vpc.public_subnets.clone(),
            })
            .await
            .stage("applying cluster")?;

        let hosted_zone = if decl.domain.is_empty() {
            None
        } else {
            let zone = self
                .api
                .create_hosted_zone(CreateHostedZoneOpts {
                    id: id.clone(),
                    domain: decl.domain.clone(),
                    fqdn: decl.fqdn(),
                    ns_ttl: 0,
                })
                .await
                .stage("applying hosted zone")?;
            Some(zone)
        };

        let mut controllers = Vec::new();
        for controller in decl.integrations.enabled() {
            let installation = self
                .install(controller, id, &vpc, hosted_zone.as_ref())
                .await
                .with_stage(|| format!("applying {controller}"))?;
            controllers.push(installation);
        }

        info!(cluster = %id.cluster_name, controllers = controllers.len(), "cluster applied");
        Ok(AppliedCluster {
            vpc,
            cluster,
            hosted_zone,
            controllers,
        })
    }

    async fn install(
        &self,
        controller: Controller,
        id: &Id,
        vpc: &Vpc,
        zone: Option<&HostedZone>,
    ) -> Result<ControllerInstallation> {
        let id = id.clone();
        match controller {
            Controller::Autoscaler => self.api.create_autoscaler(CreateAutoscalerOpts { id }).await,
            Controller::Blockstorage => {
                self.api.create_blockstorage(CreateBlockstorageOpts { id }).await
            }
            Controller::AwsLoadBalancerController => {
                self.api
                    .create_aws_load_balancer_controller(CreateAwsLoadBalancerControllerOpts {
                        id,
                        vpc_id: vpc.vpc_id.clone(),
                    })
                    .await
            }
            Controller::ExternalDns => {
                let zone = zone.ok_or_else(|| Error::invalid("external dns needs a hosted zone"))?;
                self.api
                    .create_external_dns(CreateExternalDnsOpts {
                        id,
                        hosted_zone_id: zone.hosted_zone_id.clone(),
                        domain: zone.domain.clone(),
                    })
                    .await
            }
            Controller::ExternalSecrets => {
                self.api.create_external_secrets(CreateExternalSecretsOpts { id }).await
            }
        }
    }

    /// Undo [`Applier::apply`] in reverse order. Parts that are already
    /// gone are skipped by the services.
    pub async fn teardown(&self, decl: &ClusterDeclaration) -> Result<()> {
        decl.id.validate().stage("validating declaration")?;
        let id = &decl.id;
        info!(cluster = %id.cluster_name, "tearing down cluster");

        for controller in decl.integrations.enabled().into_iter().rev() {
            self.uninstall(controller, id)
                .await
                .with_stage(|| format!("removing {controller}"))?;
        }

        if !decl.domain.is_empty() {
            self.api
                .delete_hosted_zone(DeleteHostedZoneOpts {
                    id: id.clone(),
                    domain: decl.domain.clone(),
                })
                .await
                .stage("removing hosted zone")?;
        }
        self.api
            .delete_cluster(DeleteClusterOpts { id: id.clone() })
            .await
            .stage("removing cluster")?;
        self.api
            .delete_vpc(DeleteVpcOpts { id: id.clone() })
            .await
            .stage("removing vpc")?;

        info!(cluster = %id.cluster_name, "cluster removed");
        Ok(())
    }

    async fn uninstall(&self, controller: Controller, id: &Id) -> Result<()> {
        let opts = DeleteControllerOpts { id: id.clone() };
        match controller {
            Controller::Autoscaler => self.api.delete_autoscaler(opts).await,
            Controller::Blockstorage => self.api.delete_blockstorage(opts).await,
            Controller::AwsLoadBalancerController => {
                self.api.delete_aws_load_balancer_controller(opts).await
            }
            Controller::ExternalDns => self.api.delete_external_dns(opts).await,
            Controller::ExternalSecrets => self.api.delete_external_secrets(opts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use okctl_core::Kind;
    use okctl_provider::testing::SpySet;
    use okctl_service::Services;
    use okctl_state::StateStore;

    use super::*;
    use crate::client::Client;

    fn id() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    fn declaration() -> ClusterDeclaration {
        ClusterDeclaration {
            id: id(),
            cidr: "192.168.0.0/20".to_string(),
            domain: "okctl-staging.oslo.systems".to_string(),
            minimal_vpc: false,
            integrations: Integrations::default(),
        }
    }

    fn applier(spies: &SpySet) -> Applier<Client> {
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());
        Applier::new(Client::direct(Arc::new(services)))
    }

    #[tokio::test]
    async fn apply_builds_network_before_cluster_and_controllers_last() {
        let spies = SpySet::new();
        let applied = applier(&spies).apply(&declaration()).await.unwrap();

        let log = spies.log.entries();
        assert_eq!(&log[..3], ["create vpc", "create cluster", "create hosted zone"]);
        assert_eq!(applied.controllers.len(), 5);
        assert_eq!(spies.helm.creates(), 5);
        assert_eq!(applied.cluster.config.vpc.id, applied.vpc.vpc_id);

        let dns = spies.log.position("create hosted zone").unwrap();
        let first_policy = spies.log.position("create managed policy").unwrap();
        assert!(dns < first_policy);

        let zone = applied.hosted_zone.unwrap();
        assert_eq!(zone.fqdn, "okctl-staging.oslo.systems.");
        let external_dns = &applied.controllers[3];
        assert_eq!(external_dns.controller, Controller::ExternalDns);
    }

    #[tokio::test]
    async fn external_dns_without_domain_is_rejected_up_front() {
        let spies = SpySet::new();
        let decl = ClusterDeclaration {
            domain: String::new(),
            ..declaration()
        };

        let err = applier(&spies).apply(&decl).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Invalid);
        assert!(spies.log.entries().is_empty());
    }

    #[tokio::test]
    async fn apply_without_domain_skips_the_zone() {
        let spies = SpySet::new();
        let decl = ClusterDeclaration {
            domain: String::new(),
            integrations: Integrations::none(),
            ..declaration()
        };

        let applied = applier(&spies).apply(&decl).await.unwrap();
        assert!(applied.hosted_zone.is_none());
        assert!(applied.controllers.is_empty());
        assert_eq!(spies.log.entries(), ["create vpc", "create cluster"]);
    }

    #[tokio::test]
    async fn teardown_runs_in_reverse() {
        let spies = SpySet::new();
        let applier = applier(&spies);
        let decl = declaration();
        applier.apply(&decl).await.unwrap();
        spies.log.clear();

        applier.teardown(&decl).await.unwrap();
        let log = spies.log.entries();
        assert_eq!(log.first().map(String::as_str), Some("delete helm release"));
        assert_eq!(&log[log.len() - 3..], ["delete hosted zone", "delete cluster", "delete vpc"]);
        assert_eq!(spies.policy.deletes(), 5);
    }

    #[tokio::test]
    async fn failed_step_stops_the_apply() {
        let spies = SpySet::new();
        spies.cluster.fail_create(|| {
            okctl_provider::ProviderError::Api("exceeded max wait time".to_string())
        });

        let err = applier(&spies).apply(&declaration()).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Timeout);
        assert_eq!(err.stages()[0], "applying cluster");
        assert_eq!(spies.hosted_zone.creates(), 0);
        assert_eq!(spies.vpc.creates(), 1);
    }
}

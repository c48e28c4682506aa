//! Controller installs: ManagedPolicy → ServiceAccount → HelmRelease.
//!
//! All five controllers share this pipeline. What differs (policy
//! statements, chart values) is resolved into a [`ControllerSpec`] from
//! the controller's options before anything is called.

use okctl_core::types::service_account::POLICY_ARN_NOT_APPLICABLE;
use okctl_core::types::*;
use okctl_core::{Ctx, ErrorContext, Id, Result, Validate, Validator};
use tracing::info;

use crate::argocd::present;
use crate::resource::ResourceService;

#[derive(Clone)]
pub struct ControllerService {
    policies: ResourceService<ManagedPolicy>,
    service_accounts: ResourceService<ServiceAccount>,
    helm: ResourceService<HelmRelease>,
}

impl ControllerService {
    pub fn new(
        policies: ResourceService<ManagedPolicy>,
        service_accounts: ResourceService<ServiceAccount>,
        helm: ResourceService<HelmRelease>,
    ) -> Self {
        Self {
            policies,
            service_accounts,
            helm,
        }
    }

    pub async fn install<O>(&self, ctx: &Ctx, opts: &O) -> Result<ControllerInstallation>
    where
        O: Validate + Sync,
        for<'a> ControllerSpec: From<&'a O>,
    {
        opts.validate().stage("validating inputs")?;
        let spec = ControllerSpec::from(opts);
        let controller = spec.controller;
        let id = &spec.id;
        let (name, namespace) = (controller.service_account(), controller.namespace());

        let policy_opts = spec.policy_opts();
        let helm_opts = CreateHelmReleaseOpts {
            id: id.clone(),
            chart: spec.chart,
        };
        let mut v = Validator::new();
        v.nested("Policy", &policy_opts).nested("HelmRelease", &helm_opts);
        // the policy ARN is only known after the policy exists
        let account =
            ServiceAccountConfig::for_identity(id, name, namespace, POLICY_ARN_NOT_APPLICABLE);
        if let Err(e) = account {
            v.fail("ServiceAccount", format!("({})", e.message()));
        }
        v.finish().stage("validating derived options")?;

        let policy = self
            .policies
            .create(ctx, &policy_opts)
            .await
            .with_stage(|| format!("creating {controller} policy"))?;

        let config = ServiceAccountConfig::for_identity(id, name, namespace, &policy.policy_arn)
            .with_stage(|| format!("building {controller} service account config"))?;
        let service_account = self
            .service_accounts
            .create(
                ctx,
                &CreateServiceAccountOpts {
                    id: id.clone(),
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                    policy_arn: policy.policy_arn.clone(),
                    config,
                },
            )
            .await
            .with_stage(|| format!("creating {controller} service account"))?;

        let helm = self
            .helm
            .create(ctx, &helm_opts)
            .await
            .with_stage(|| format!("installing {controller} chart"))?;

        info!(%controller, cluster = %id.cluster_name, "controller installed");
        Ok(ControllerInstallation {
            id: id.clone(),
            controller,
            policy,
            service_account,
            helm,
        })
    }

    /// Helm release, then service account, then policy.
    pub async fn uninstall(
        &self,
        ctx: &Ctx,
        controller: Controller,
        opts: &DeleteControllerOpts,
    ) -> Result<()> {
        opts.validate().stage("validating inputs")?;
        let id = &opts.id;
        let (name, namespace) = (controller.service_account(), controller.namespace());

        self.helm
            .delete(
                ctx,
                &DeleteHelmReleaseOpts {
                    id: id.clone(),
                    release_name: controller.release_name().to_string(),
                    namespace: namespace.to_string(),
                },
            )
            .await
            .with_stage(|| format!("uninstalling {controller} chart"))?;

        let config =
            ServiceAccountConfig::for_identity(id, name, namespace, POLICY_ARN_NOT_APPLICABLE)
                .with_stage(|| format!("building {controller} service account config"))?;
        self.service_accounts
            .delete(
                ctx,
                &DeleteServiceAccountOpts {
                    id: id.clone(),
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                    config,
                },
            )
            .await
            .with_stage(|| format!("deleting {controller} service account"))?;

        self.policies
            .delete(
                ctx,
                &DeletePolicyOpts {
                    id: id.clone(),
                    name: controller.policy_name().to_string(),
                },
            )
            .await
            .with_stage(|| format!("deleting {controller} policy"))?;

        info!(%controller, cluster = %id.cluster_name, "controller removed");
        Ok(())
    }

    pub fn status(&self, id: &Id, controller: Controller) -> Result<CompositeStatus> {
        let account = format!("{}/{}", controller.namespace(), controller.service_account());
        Ok(CompositeStatus::new(
            controller.name(),
            vec![
                present(&self.policies, id, &controller.policy_stack_name(id))?,
                present(&self.service_accounts, id, &account)?,
                present(&self.helm, id, controller.release_name())?,
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use okctl_core::Kind;
    use okctl_provider::ProviderError;
    use okctl_provider::testing::SpySet;
    use okctl_state::StateStore;

    use super::*;
    use crate::Services;
    use crate::resource::tests::id;

    fn external_dns() -> CreateExternalDnsOpts {
        CreateExternalDnsOpts {
            id: id(),
            hosted_zone_id: "Z0123".to_string(),
            domain: "okctl.io".to_string(),
        }
    }

    #[tokio::test]
    async fn install_binds_the_service_account_to_the_policy() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());

        let installed = services
            .controllers
            .install(&Ctx::background(), &external_dns())
            .await
            .unwrap();

        assert_eq!(
            spies.log.entries(),
            ["create managed policy", "create service account", "create helm release"]
        );
        assert_eq!(installed.controller, Controller::ExternalDns);
        assert_eq!(installed.service_account.policy_arn, installed.policy.policy_arn);
        let attached = &installed.service_account.config.iam.service_accounts[0].attach_policy_arns;
        assert_eq!(attached, &[installed.policy.policy_arn.clone()]);
        assert_eq!(installed.helm.release_name, "external-dns");
        assert!(services.controllers.status(&id(), Controller::ExternalDns).unwrap().complete);
    }

    #[tokio::test]
    async fn uninstall_reverses_the_install() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());
        services
            .controllers
            .install(&Ctx::background(), &CreateAutoscalerOpts { id: id() })
            .await
            .unwrap();
        spies.log.clear();

        services
            .controllers
            .uninstall(
                &Ctx::background(),
                Controller::Autoscaler,
                &DeleteControllerOpts { id: id() },
            )
            .await
            .unwrap();

        assert_eq!(
            spies.log.entries(),
            ["delete helm release", "delete service account", "delete managed policy"]
        );
        let deleted = spies.service_account.last_delete().unwrap();
        assert_eq!(
            deleted.config.iam.service_accounts[0].attach_policy_arns,
            [POLICY_ARN_NOT_APPLICABLE]
        );
        let status = services.controllers.status(&id(), Controller::Autoscaler).unwrap();
        assert_eq!(status.missing().count(), 3);
    }

    #[tokio::test]
    async fn invalid_options_reach_no_provider() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());

        let err = services
            .controllers
            .install(
                &Ctx::background(),
                &CreateAwsLoadBalancerControllerOpts {
                    id: id(),
                    vpc_id: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Invalid);
        assert!(spies.log.entries().is_empty());
    }

    #[tokio::test]
    async fn long_cluster_name_is_rejected_before_any_call() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());
        let mut long = id();
        long.cluster_name = format!("okctl-{}", "a".repeat(94));
        let opts = CreateAutoscalerOpts { id: long };
        assert!(opts.validate().is_ok());

        let err = services
            .controllers
            .install(&Ctx::background(), &opts)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Invalid);
        assert_eq!(err.stages(), ["validating derived options"]);
        assert!(err.detail().contains_key("Policy"));
        assert!(spies.log.entries().is_empty());
    }

    #[tokio::test]
    async fn service_account_failure_keeps_the_policy() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());
        spies
            .service_account
            .fail_create(|| ProviderError::Api("eksctl exited with status 1".to_string()));

        let err = services
            .controllers
            .install(&Ctx::background(), &CreateExternalSecretsOpts { id: id() })
            .await
            .unwrap_err();

        assert_eq!(err.stages()[0], "creating external secrets service account");
        assert_eq!(spies.helm.creates(), 0);
        let status = services.controllers.status(&id(), Controller::ExternalSecrets).unwrap();
        let present: Vec<_> = status
            .children
            .iter()
            .filter(|c| c.present)
            .map(|c| c.kind.as_str())
            .collect();
        assert_eq!(present, ["managed policy"]);
    }
}

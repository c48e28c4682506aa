//! Monitoring stack: Grafana behind the identity pool, with Prometheus,
//! Loki and Promtail.

use okctl_core::types::monitoring::*;
use okctl_core::types::*;
use okctl_core::{Ctx, ErrorContext, Result, Validate, Validator, charts, stack};
use tracing::info;

use crate::argocd::present;
use crate::generate;
use crate::resource::ResourceService;

const ADMIN_USER: &str = "admin";

#[derive(Clone)]
pub struct MonitoringService {
    namespaces: ResourceService<Namespace>,
    certificates: ResourceService<Certificate>,
    pool_clients: ResourceService<IdentityPoolClient>,
    secrets: ResourceService<SecretParameter>,
    manifests: ResourceService<Manifest>,
    helm: ResourceService<HelmRelease>,
}

impl MonitoringService {
    pub fn new(
        namespaces: ResourceService<Namespace>,
        certificates: ResourceService<Certificate>,
        pool_clients: ResourceService<IdentityPoolClient>,
        secrets: ResourceService<SecretParameter>,
        manifests: ResourceService<Manifest>,
        helm: ResourceService<HelmRelease>,
    ) -> Self {
        Self {
            namespaces,
            certificates,
            pool_clients,
            secrets,
            manifests,
            helm,
        }
    }

    pub async fn create(&self, ctx: &Ctx, opts: &CreateMonitoringOpts) -> Result<Monitoring> {
        opts.validate().stage("validating inputs")?;
        let id = &opts.id;
        let domain = grafana_domain(&opts.domain);
        let url = grafana_url(&opts.domain);

        let namespace_opts = CreateNamespaceOpts {
            id: id.clone(),
            namespace: MONITORING_NAMESPACE.to_string(),
            ..Default::default()
        };
        let certificate_opts = CreateCertificateOpts {
            id: id.clone(),
            fqdn: format!("{domain}."),
            domain: domain.clone(),
            hosted_zone_id: opts.hosted_zone_id.clone(),
        };
        let pool_client_opts = CreateIdentityPoolClientOpts {
            id: id.clone(),
            user_pool_id: opts.user_pool_id.clone(),
            purpose: GRAFANA_PURPOSE.to_string(),
            callback_url: format!("{url}/login/generic_oauth"),
        };
        let secret_opts: Vec<CreateSecretOpts> = GRAFANA_SECRETS
            .iter()
            .map(|(name, _)| CreateSecretOpts {
                id: id.clone(),
                name: name.to_string(),
                secret: if name.ends_with("admin_user") {
                    ADMIN_USER.to_string()
                } else {
                    generate::secret(generate::SECRET_LENGTH)
                },
            })
            .collect();
        let mut v = Validator::new();
        v.nested("Namespace", &namespace_opts)
            .nested("Certificate", &certificate_opts)
            .nested("PoolClient", &pool_client_opts);
        for secret in &secret_opts {
            v.nested(&format!("Secret.{}", secret.name), secret);
        }
        v.finish().stage("validating derived options")?;

        self.namespaces
            .create(ctx, &namespace_opts)
            .await
            .stage("creating monitoring namespace")?;

        let certificate = self
            .certificates
            .create(ctx, &certificate_opts)
            .await
            .stage("creating grafana certificate")?;

        let pool_client = self
            .pool_clients
            .create(ctx, &pool_client_opts)
            .await
            .stage("creating grafana identity pool client")?;

        let mut secrets = Vec::with_capacity(secret_opts.len());
        for secret in &secret_opts {
            let created = self
                .secrets
                .create(ctx, secret)
                .await
                .with_stage(|| format!("creating {}", secret.name))?;
            secrets.push(created);
        }

        let data: Vec<(&str, &str)> = GRAFANA_SECRETS
            .iter()
            .zip(&secrets)
            .map(|((_, key), secret)| (*key, secret.path.as_str()))
            .collect();
        let manifest = self
            .manifests
            .create(
                ctx,
                &CreateManifestOpts {
                    id: id.clone(),
                    name: GRAFANA_SECRET.to_string(),
                    namespace: MONITORING_NAMESPACE.to_string(),
                    content: kube::external_secret(GRAFANA_SECRET, MONITORING_NAMESPACE, &data),
                },
            )
            .await
            .stage("creating grafana secret manifest")?;

        let planned = [
            charts::kube_prometheus_stack(
                &domain,
                &certificate.arn,
                &opts.auth_domain,
                &pool_client.client_id,
                GRAFANA_SECRET,
                MONITORING_NAMESPACE,
            ),
            charts::loki(MONITORING_NAMESPACE),
            charts::promtail(MONITORING_NAMESPACE),
        ];
        let mut releases = Vec::with_capacity(planned.len());
        for chart in planned {
            let release_name = chart.release_name.clone();
            let release = self
                .helm
                .create(ctx, &CreateHelmReleaseOpts { id: id.clone(), chart })
                .await
                .with_stage(|| format!("installing {release_name} chart"))?;
            releases.push(release);
        }

        info!(%domain, cluster = %id.cluster_name, "monitoring installed");
        Ok(Monitoring {
            id: id.clone(),
            grafana_domain: domain,
            grafana_url: url,
            certificate,
            pool_client,
            secrets,
            manifests: vec![manifest],
            releases,
        })
    }

    pub async fn delete(&self, ctx: &Ctx, opts: &DeleteMonitoringOpts) -> Result<()> {
        opts.validate().stage("validating inputs")?;
        let id = &opts.id;

        for release_name in RELEASES.iter().rev() {
            self.helm
                .delete(
                    ctx,
                    &DeleteHelmReleaseOpts {
                        id: id.clone(),
                        release_name: release_name.to_string(),
                        namespace: MONITORING_NAMESPACE.to_string(),
                    },
                )
                .await
                .with_stage(|| format!("uninstalling {release_name} chart"))?;
        }

        self.manifests
            .delete(
                ctx,
                &DeleteManifestOpts {
                    id: id.clone(),
                    name: GRAFANA_SECRET.to_string(),
                    namespace: MONITORING_NAMESPACE.to_string(),
                },
            )
            .await
            .stage("deleting grafana secret manifest")?;

        for (name, _) in GRAFANA_SECRETS.iter().rev() {
            self.secrets
                .delete(
                    ctx,
                    &DeleteSecretOpts {
                        id: id.clone(),
                        name: name.to_string(),
                    },
                )
                .await
                .with_stage(|| format!("deleting {name}"))?;
        }

        self.pool_clients
            .delete(
                ctx,
                &DeleteIdentityPoolClientOpts {
                    id: id.clone(),
                    purpose: GRAFANA_PURPOSE.to_string(),
                },
            )
            .await
            .stage("deleting grafana identity pool client")?;

        self.certificates
            .delete(
                ctx,
                &DeleteCertificateOpts {
                    id: id.clone(),
                    domain: grafana_domain(&opts.domain),
                },
            )
            .await
            .stage("deleting grafana certificate")?;

        self.namespaces
            .delete(
                ctx,
                &DeleteNamespaceOpts {
                    id: id.clone(),
                    namespace: MONITORING_NAMESPACE.to_string(),
                },
            )
            .await
            .stage("deleting monitoring namespace")?;

        info!(cluster = %id.cluster_name, "monitoring removed");
        Ok(())
    }

    pub fn status(&self, opts: &GetMonitoringOpts) -> Result<CompositeStatus> {
        opts.validate().stage("validating inputs")?;
        let id = &opts.id;

        let mut children = vec![
            present(&self.namespaces, id, MONITORING_NAMESPACE)?,
            present(&self.certificates, id, &grafana_domain(&opts.domain))?,
            present(
                &self.pool_clients,
                id,
                &stack::identity_pool_client(&id.cluster_name, GRAFANA_PURPOSE),
            )?,
        ];
        for (name, _) in GRAFANA_SECRETS {
            children.push(present(&self.secrets, id, name)?);
        }
        children.push(present(
            &self.manifests,
            id,
            &format!("{MONITORING_NAMESPACE}/{GRAFANA_SECRET}"),
        )?);
        for release_name in RELEASES {
            children.push(present(&self.helm, id, release_name)?);
        }
        Ok(CompositeStatus::new("monitoring", children))
    }
}

#[cfg(test)]
mod tests {
    use okctl_provider::testing::SpySet;
    use okctl_state::StateStore;

    use super::*;
    use crate::Services;
    use crate::resource::tests::id;

    fn opts() -> CreateMonitoringOpts {
        CreateMonitoringOpts {
            id: id(),
            domain: "okctl.io".to_string(),
            hosted_zone_id: "Z0123".to_string(),
            user_pool_id: "eu-west-1_abcdef123".to_string(),
            auth_domain: "auth.okctl.io".to_string(),
        }
    }

    fn get() -> GetMonitoringOpts {
        GetMonitoringOpts {
            id: id(),
            domain: "okctl.io".to_string(),
        }
    }

    #[tokio::test]
    async fn grafana_logs_in_through_the_pool_client() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());

        let monitoring = services.monitoring.create(&Ctx::background(), &opts()).await.unwrap();

        assert_eq!(monitoring.grafana_url, "https://grafana.okctl.io");
        assert_eq!(
            monitoring.pool_client.callback_url,
            "https://grafana.okctl.io/login/generic_oauth"
        );
        let names: Vec<_> = monitoring.releases.iter().map(|r| r.release_name.as_str()).collect();
        assert_eq!(names, RELEASES);

        assert_eq!(spies.helm.creates(), 3);

        let secret = &monitoring.manifests[0].content["spec"]["data"];
        assert_eq!(secret[0]["secretKey"], "admin-user");
        assert_eq!(
            secret[2]["remoteRef"]["key"],
            "/okctl/okctl-staging/monitoring/grafana/cookie_secret"
        );

        let status = services.monitoring.status(&get()).unwrap();
        assert!(status.complete);
        assert_eq!(status.children.len(), 10);
    }

    #[tokio::test]
    async fn long_cluster_name_is_rejected_before_any_call() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());
        let mut opts = opts();
        opts.id.cluster_name = format!("okctl-{}", "a".repeat(94));
        assert!(opts.validate().is_ok());

        let err = services.monitoring.create(&Ctx::background(), &opts).await.unwrap_err();
        assert_eq!(err.kind(), okctl_core::Kind::Invalid);
        assert_eq!(err.stages(), ["validating derived options"]);
        assert!(err.detail().contains_key("Certificate"));
        assert!(err.detail().contains_key("PoolClient"));
        assert!(spies.log.entries().is_empty());
    }

    #[tokio::test]
    async fn delete_runs_in_reverse() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());
        services.monitoring.create(&Ctx::background(), &opts()).await.unwrap();
        spies.log.clear();

        services
            .monitoring
            .delete(
                &Ctx::background(),
                &DeleteMonitoringOpts {
                    id: id(),
                    domain: "okctl.io".to_string(),
                },
            )
            .await
            .unwrap();

        let entries = spies.log.entries();
        assert_eq!(entries.first().map(String::as_str), Some("delete helm release"));
        assert_eq!(entries.last().map(String::as_str), Some("delete namespace"));
        let deleted: Vec<_> = spies
            .helm
            .last_delete()
            .into_iter()
            .map(|opts| opts.release_name)
            .collect();
        assert_eq!(deleted, ["kube-prometheus-stack"]);
        assert!(!services.monitoring.status(&get()).unwrap().complete);
    }

    #[tokio::test]
    async fn delete_of_nothing_succeeds() {
        let spies = SpySet::new();
        let services = Services::new(spies.providers(), StateStore::open_in_memory().unwrap());

        services
            .monitoring
            .delete(
                &Ctx::background(),
                &DeleteMonitoringOpts {
                    id: id(),
                    domain: "okctl.io".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(services.monitoring.status(&get()).unwrap().missing().count(), 10);
    }
}

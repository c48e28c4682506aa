//! ArgoCD install.
//!
//! Certificate for `argocd.<domain>` → GitHub OAuth app → session secret →
//! namespace → secret manifests → Helm release. Each step feeds a later
//! one, so the order is fixed. A failure stops the pipeline and leaves the
//! completed steps in place; the matching delete cleans them up.

use okctl_core::types::argocd::*;
use okctl_core::types::*;
use okctl_core::{Ctx, ErrorContext, Id, Resource, Result, Validate, Validator, charts};
use tracing::info;

use crate::generate;
use crate::github::OAuthAppService;
use crate::resource::ResourceService;

#[derive(Clone)]
pub struct ArgoCdService {
    certificates: ResourceService<Certificate>,
    oauth_apps: OAuthAppService,
    secrets: ResourceService<SecretParameter>,
    namespaces: ResourceService<Namespace>,
    manifests: ResourceService<Manifest>,
    helm: ResourceService<HelmRelease>,
}

impl ArgoCdService {
    pub fn new(
        certificates: ResourceService<Certificate>,
        oauth_apps: OAuthAppService,
        secrets: ResourceService<SecretParameter>,
        namespaces: ResourceService<Namespace>,
        manifests: ResourceService<Manifest>,
        helm: ResourceService<HelmRelease>,
    ) -> Self {
        Self {
            certificates,
            oauth_apps,
            secrets,
            namespaces,
            manifests,
            helm,
        }
    }

    pub async fn create(&self, ctx: &Ctx, opts: &CreateArgoCdOpts) -> Result<ArgoCd> {
        opts.validate().stage("validating inputs")?;
        let id = &opts.id;
        let repo = &opts.repository;
        let domain = argo_domain(&opts.domain);
        let url = argo_url(&opts.domain);

        let certificate_opts = CreateCertificateOpts {
            id: id.clone(),
            fqdn: format!("{domain}."),
            domain: domain.clone(),
            hosted_zone_id: opts.hosted_zone_id.clone(),
        };
        let oauth_app_opts = CreateOAuthAppOpts {
            id: id.clone(),
            organisation: repo.organisation.clone(),
            name: oauth_app_name(&id.cluster_name),
            site_url: url.clone(),
            callback_url: format!("{url}/api/dex/callback"),
        };
        let secret_key_opts = CreateSecretOpts {
            id: id.clone(),
            name: SECRET_KEY_NAME.to_string(),
            secret: generate::secret(generate::SECRET_LENGTH),
        };
        let namespace_opts = CreateNamespaceOpts {
            id: id.clone(),
            namespace: ARGOCD_NAMESPACE.to_string(),
            ..Default::default()
        };
        let mut v = Validator::new();
        v.nested("Certificate", &certificate_opts)
            .nested("OAuthApp", &oauth_app_opts)
            .nested("SecretKey", &secret_key_opts)
            .nested("Namespace", &namespace_opts);
        v.finish().stage("validating derived options")?;

        let certificate = self
            .certificates
            .create(ctx, &certificate_opts)
            .await
            .stage("creating argocd certificate")?;

        let oauth_app = self
            .oauth_apps
            .create(ctx, &oauth_app_opts)
            .await
            .stage("creating argocd oauth app")?;

        let secret_key = self
            .secrets
            .create(ctx, &secret_key_opts)
            .await
            .stage("creating argocd session secret")?;

        self.namespaces
            .create(ctx, &namespace_opts)
            .await
            .stage("creating argocd namespace")?;

        let mut manifests = Vec::with_capacity(2);
        for (name, data) in [
            (
                ARGOCD_SECRET,
                vec![
                    ("server.secretkey", secret_key.path.as_str()),
                    ("dex.github.clientSecret", oauth_app.client_secret.path.as_str()),
                ],
            ),
            (
                ARGOCD_PRIVATE_KEY,
                vec![("sshPrivateKey", repo.deploy_key.private_key_secret.path.as_str())],
            ),
        ] {
            let manifest = self
                .manifests
                .create(
                    ctx,
                    &CreateManifestOpts {
                        id: id.clone(),
                        name: name.to_string(),
                        namespace: ARGOCD_NAMESPACE.to_string(),
                        content: kube::external_secret(name, ARGOCD_NAMESPACE, &data),
                    },
                )
                .await
                .with_stage(|| format!("creating {name} manifest"))?;
            manifests.push(manifest);
        }

        let helm = self
            .helm
            .create(
                ctx,
                &CreateHelmReleaseOpts {
                    id: id.clone(),
                    chart: charts::argocd(
                        &domain,
                        &certificate.arn,
                        &repo.organisation,
                        &oauth_app.client_id,
                        &repo.git_url,
                        ARGOCD_SECRET,
                        ARGOCD_PRIVATE_KEY,
                        ARGOCD_NAMESPACE,
                    ),
                },
            )
            .await
            .stage("installing argocd chart")?;

        info!(%domain, cluster = %id.cluster_name, "argocd installed");
        Ok(ArgoCd {
            id: id.clone(),
            argo_domain: domain,
            argo_url: url,
            certificate,
            oauth_app,
            secret_key,
            manifests,
            helm,
        })
    }

    /// Remove everything `create` made, in reverse order. Children that are
    /// already gone are skipped, so a delete after a partial install works.
    pub async fn delete(&self, ctx: &Ctx, opts: &DeleteArgoCdOpts) -> Result<()> {
        opts.validate().stage("validating inputs")?;
        let id = &opts.id;

        self.helm
            .delete(
                ctx,
                &DeleteHelmReleaseOpts {
                    id: id.clone(),
                    release_name: ARGOCD_RELEASE.to_string(),
                    namespace: ARGOCD_NAMESPACE.to_string(),
                },
            )
            .await
            .stage("uninstalling argocd chart")?;

        for name in [ARGOCD_PRIVATE_KEY, ARGOCD_SECRET] {
            self.manifests
                .delete(
                    ctx,
                    &DeleteManifestOpts {
                        id: id.clone(),
                        name: name.to_string(),
                        namespace: ARGOCD_NAMESPACE.to_string(),
                    },
                )
                .await
                .with_stage(|| format!("deleting {name} manifest"))?;
        }

        self.namespaces
            .delete(
                ctx,
                &DeleteNamespaceOpts {
                    id: id.clone(),
                    namespace: ARGOCD_NAMESPACE.to_string(),
                },
            )
            .await
            .stage("deleting argocd namespace")?;

        self.secrets
            .delete(
                ctx,
                &DeleteSecretOpts {
                    id: id.clone(),
                    name: SECRET_KEY_NAME.to_string(),
                },
            )
            .await
            .stage("deleting argocd session secret")?;

        self.oauth_apps
            .delete(
                ctx,
                &DeleteOAuthAppOpts {
                    id: id.clone(),
                    organisation: opts.organisation.clone(),
                    name: oauth_app_name(&id.cluster_name),
                },
            )
            .await
            .stage("deleting argocd oauth app")?;

        self.certificates
            .delete(
                ctx,
                &DeleteCertificateOpts {
                    id: id.clone(),
                    domain: argo_domain(&opts.domain),
                },
            )
            .await
            .stage("deleting argocd certificate")?;

        info!(cluster = %id.cluster_name, "argocd removed");
        Ok(())
    }

    /// Which children of the install are present.
    pub fn status(&self, opts: &GetArgoCdOpts) -> Result<CompositeStatus> {
        opts.validate().stage("validating inputs")?;
        let id = &opts.id;
        let domain = argo_domain(&opts.domain);
        let app = oauth_app_name(&id.cluster_name);
        let manifest_key = |name: &str| format!("{ARGOCD_NAMESPACE}/{name}");

        let children = vec![
            present(&self.certificates, id, &domain)?,
            ChildStatus::new(OAuthApp::KIND, app.clone(), self.oauth_apps.get(id, &app)?.is_some()),
            present(&self.secrets, id, SECRET_KEY_NAME)?,
            present(&self.namespaces, id, ARGOCD_NAMESPACE)?,
            present(&self.manifests, id, &manifest_key(ARGOCD_SECRET))?,
            present(&self.manifests, id, &manifest_key(ARGOCD_PRIVATE_KEY))?,
            present(&self.helm, id, ARGOCD_RELEASE)?,
        ];
        Ok(CompositeStatus::new("argocd", children))
    }
}

/// Presence of one child, looked up by its business key.
pub(crate) fn present<R: Resource>(
    service: &ResourceService<R>,
    id: &Id,
    key: &str,
) -> Result<ChildStatus> {
    Ok(ChildStatus::new(R::KIND, key, service.get(id, key)?.is_some()))
}

#[cfg(test)]
mod tests {
    use okctl_provider::ProviderError;
    use okctl_provider::testing::SpySet;
    use okctl_state::StateStore;

    use super::*;
    use crate::Services;
    use crate::resource::tests::id;

    fn opts() -> CreateArgoCdOpts {
        CreateArgoCdOpts {
            id: id(),
            domain: "okctl.io".to_string(),
            hosted_zone_id: "Z0123".to_string(),
            repository: GithubRepository {
                organisation: "oslokommune".to_string(),
                repository: "okctl-iac".to_string(),
                git_url: "git@github.com:oslokommune/okctl-iac".to_string(),
                deploy_key: DeployKey {
                    title: "okctl-iac-okctl-staging".to_string(),
                    public_key: "ssh-ed25519 AAAA".to_string(),
                    private_key_secret: SecretRef {
                        name: "github/deploykey/okctl-iac".to_string(),
                        path: "/okctl/okctl-staging/github/deploykey/okctl-iac".to_string(),
                        version: 1,
                    },
                },
            },
        }
    }

    fn services(spies: &SpySet) -> Services {
        Services::new(spies.providers(), StateStore::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn install_runs_the_pipeline_in_order() {
        let spies = SpySet::new();
        let services = services(&spies);

        let argocd = services.argocd.create(&Ctx::background(), &opts()).await.unwrap();

        assert_eq!(
            spies.log.entries(),
            [
                "create certificate",
                "create github oauth app",
                "create secret parameter",
                "create secret parameter",
                "create namespace",
                "create kubernetes manifest",
                "create kubernetes manifest",
                "create helm release",
            ]
        );
        assert_eq!(argocd.argo_url, "https://argocd.okctl.io");
        assert_eq!(argocd.certificate.domain, "argocd.okctl.io");

        let chart = spies.helm.last_create().unwrap().chart;
        let annotations = &chart.values["server"]["ingress"]["annotations"];
        assert_eq!(
            annotations["alb.ingress.kubernetes.io/certificate-arn"],
            argocd.certificate.arn.as_str()
        );
        let cm = chart.values["configs"]["cm"]["dex.config"].as_str().unwrap();
        assert!(cm.contains(&argocd.oauth_app.client_id));

        let secret = &argocd.manifests[0].content["spec"]["data"];
        assert_eq!(secret[0]["remoteRef"]["key"], "/okctl/okctl-staging/argocd/secret_key");

        let status = services
            .argocd
            .status(&GetArgoCdOpts {
                id: id(),
                domain: "okctl.io".to_string(),
            })
            .unwrap();
        assert!(status.complete);
    }

    #[tokio::test]
    async fn failure_leaves_a_partial_install() {
        let spies = SpySet::new();
        let services = services(&spies);
        spies.helm.fail_create(|| ProviderError::Api("chart not found".to_string()));

        let err = services.argocd.create(&Ctx::background(), &opts()).await.unwrap_err();
        assert_eq!(err.stages()[0], "installing argocd chart");

        let status = services
            .argocd
            .status(&GetArgoCdOpts {
                id: id(),
                domain: "okctl.io".to_string(),
            })
            .unwrap();
        assert!(!status.complete);
        let missing: Vec<_> = status.missing().map(|c| c.kind.as_str()).collect();
        assert_eq!(missing, ["helm release"]);
    }

    #[tokio::test]
    async fn delete_reverses_the_install() {
        let spies = SpySet::new();
        let services = services(&spies);
        services.argocd.create(&Ctx::background(), &opts()).await.unwrap();
        spies.log.clear();

        services
            .argocd
            .delete(
                &Ctx::background(),
                &DeleteArgoCdOpts {
                    id: id(),
                    domain: "okctl.io".to_string(),
                    organisation: "oslokommune".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            spies.log.entries(),
            [
                "delete helm release",
                "delete kubernetes manifest",
                "delete kubernetes manifest",
                "delete namespace",
                "delete secret parameter",
                "delete github oauth app",
                "delete secret parameter",
                "delete certificate",
            ]
        );
        let status = services
            .argocd
            .status(&GetArgoCdOpts {
                id: id(),
                domain: "okctl.io".to_string(),
            })
            .unwrap();
        assert_eq!(status.missing().count(), status.children.len());
    }

    #[tokio::test]
    async fn long_cluster_name_is_rejected_before_any_call() {
        let spies = SpySet::new();
        let services = services(&spies);
        let mut opts = opts();
        opts.id.cluster_name = format!("okctl-{}", "a".repeat(84));
        assert!(opts.validate().is_ok());

        let err = services.argocd.create(&Ctx::background(), &opts).await.unwrap_err();
        assert_eq!(err.kind(), okctl_core::Kind::Invalid);
        assert_eq!(err.stages(), ["validating derived options"]);
        assert!(err.detail().contains_key("OAuthApp"));
        assert!(spies.log.entries().is_empty());
    }

    #[tokio::test]
    async fn cancelled_context_stops_the_pipeline() {
        let spies = SpySet::new();
        let services = services(&spies);
        let ctx = Ctx::background();
        ctx.cancel();

        let err = services.argocd.create(&ctx, &opts()).await.unwrap_err();
        assert_eq!(err.kind(), okctl_core::Kind::Canceled);
        assert!(spies.log.entries().is_empty());
    }
}

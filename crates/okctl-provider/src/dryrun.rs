//! Providers that touch nothing.
//!
//! `DryRun` answers every create with a synthesized resource whose cloud
//! identifiers are derived from the options, so repeated runs against the
//! same inputs produce the same state. Used by `okctld serve --dry-run` and
//! by end-to-end tests of the HTTP surface.

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use okctl_core::types::*;
use okctl_core::{Ctx, Id, Resource, stack};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ProviderResult;
use crate::provider::{CloudProvider, GithubProvider, IdentityPoolProvider, Providers};

/// Hex digest of `parts`, truncated to `len` characters.
fn fingerprint(parts: &[&str], len: usize) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    let mut out = hex::encode(hasher.finalize());
    out.truncate(len);
    out
}

const AVAILABILITY_ZONES: [&str; 3] = ["a", "b", "c"];

/// Carve three /24 subnets per tier out of the VPC range: public first,
/// then private, then database.
fn subnets(id: &Id, cidr: &str, tier: usize) -> Vec<VpcSubnet> {
    let Some(base) = cidr.split('/').next().and_then(|ip| ip.parse::<Ipv4Addr>().ok()) else {
        return Vec::new();
    };
    let [a, b, c, _] = base.octets();
    AVAILABILITY_ZONES
        .iter()
        .enumerate()
        .map(|(i, az)| {
            let third = c.wrapping_add((tier * AVAILABILITY_ZONES.len() + i) as u8);
            let cidr = format!("{a}.{b}.{third}.0/24");
            VpcSubnet {
                id: format!("subnet-{}", fingerprint(&[&id.cluster_name, &cidr], 17)),
                cidr,
                availability_zone: format!("{}{az}", id.region),
            }
        })
        .collect()
}

/// Build the resource a successful create would have returned.
pub trait Synthesize: Resource {
    fn synthesize(opts: &Self::Create) -> Self;
}

impl Synthesize for Vpc {
    fn synthesize(opts: &CreateVpcOpts) -> Self {
        let id = &opts.id;
        let database_subnets = if opts.minimal { Vec::new() } else { subnets(id, &opts.cidr, 2) };
        Vpc {
            id: id.clone(),
            stack_name: stack::vpc(&id.cluster_name),
            template: Vec::new(),
            vpc_id: format!("vpc-{}", fingerprint(&[&id.cluster_name, &opts.cidr], 17)),
            cidr: opts.cidr.clone(),
            public_subnets: subnets(id, &opts.cidr, 0),
            private_subnets: subnets(id, &opts.cidr, 1),
            database_subnets_group_name: if database_subnets.is_empty() {
                String::new()
            } else {
                format!("{}-database", id.cluster_name)
            },
            database_subnets,
        }
    }
}

impl Synthesize for Cluster {
    fn synthesize(opts: &CreateClusterOpts) -> Self {
        let config = ClusterConfig::build(opts);
        Cluster {
            id: opts.id.clone(),
            name: opts.id.cluster_name.clone(),
            stack_name: stack::cluster(&opts.id.cluster_name),
            template: serde_json::to_vec(&config).unwrap_or_default(),
            config,
        }
    }
}

impl Synthesize for Certificate {
    fn synthesize(opts: &CreateCertificateOpts) -> Self {
        let id = &opts.id;
        Certificate {
            id: id.clone(),
            fqdn: opts.fqdn.clone(),
            domain: opts.domain.clone(),
            hosted_zone_id: opts.hosted_zone_id.clone(),
            arn: format!(
                "arn:aws:acm:{}:{}:certificate/{}",
                id.region,
                id.account_id,
                fingerprint(&[&id.cluster_name, &opts.domain], 32)
            ),
            stack_name: opts.stack_name(),
            template: Vec::new(),
        }
    }
}

impl Synthesize for HostedZone {
    fn synthesize(opts: &CreateHostedZoneOpts) -> Self {
        let id = &opts.id;
        let digest = fingerprint(&[&id.cluster_name, &opts.domain], 20);
        HostedZone {
            id: id.clone(),
            managed: true,
            fqdn: opts.fqdn.clone(),
            domain: opts.domain.clone(),
            hosted_zone_id: format!("Z{}", digest.to_uppercase()),
            name_servers: (1..=4)
                .map(|n| format!("ns-{n}{}.awsdns-{n}.net.", &digest[..3]))
                .collect(),
            stack_name: stack::hosted_zone(&id.cluster_name, &opts.domain),
            template: Vec::new(),
        }
    }
}

impl Synthesize for ManagedPolicy {
    fn synthesize(opts: &CreatePolicyOpts) -> Self {
        let id = &opts.id;
        ManagedPolicy {
            id: id.clone(),
            name: opts.name.clone(),
            stack_name: opts.stack_name(),
            policy_arn: format!(
                "arn:aws:iam::{}:policy/okctl-{}-{}",
                id.account_id, id.cluster_name, opts.name
            ),
            template: opts.template.clone(),
        }
    }
}

impl Synthesize for ServiceAccount {
    fn synthesize(opts: &CreateServiceAccountOpts) -> Self {
        ServiceAccount {
            id: opts.id.clone(),
            name: opts.name.clone(),
            namespace: opts.namespace.clone(),
            policy_arn: opts.policy_arn.clone(),
            config: opts.config.clone(),
        }
    }
}

impl Synthesize for HelmRelease {
    fn synthesize(opts: &CreateHelmReleaseOpts) -> Self {
        HelmRelease {
            id: opts.id.clone(),
            release_name: opts.chart.release_name.clone(),
            namespace: opts.chart.namespace.clone(),
            chart: opts.chart.clone(),
            revision: 1,
            status: "deployed".to_string(),
        }
    }
}

impl Synthesize for IdentityPoolClient {
    fn synthesize(opts: &CreateIdentityPoolClientOpts) -> Self {
        let id = &opts.id;
        IdentityPoolClient {
            id: id.clone(),
            user_pool_id: opts.user_pool_id.clone(),
            purpose: opts.purpose.clone(),
            callback_url: opts.callback_url.clone(),
            client_id: fingerprint(&[&opts.user_pool_id, &opts.purpose], 26),
            stack_name: opts.stack_name(),
            template: Vec::new(),
        }
    }
}

impl Synthesize for SecretParameter {
    fn synthesize(opts: &CreateSecretOpts) -> Self {
        SecretParameter {
            id: opts.id.clone(),
            name: opts.name.clone(),
            path: parameter::secret_path(&opts.id.cluster_name, &opts.name),
            version: 1,
        }
    }
}

impl Synthesize for SecurityGroup {
    fn synthesize(opts: &CreateSecurityGroupOpts) -> Self {
        let id = &opts.id;
        SecurityGroup {
            id: id.clone(),
            name: opts.name.clone(),
            vpc_id: opts.vpc_id.clone(),
            stack_name: stack::security_group(&id.cluster_name, &opts.name),
            template: Vec::new(),
            group_id: format!("sg-{}", fingerprint(&[&opts.vpc_id, &opts.name], 17)),
            inbound_rules: opts.inbound_rules.clone(),
            outbound_rules: opts.outbound_rules.clone(),
        }
    }
}

impl Synthesize for ContainerRepository {
    fn synthesize(opts: &CreateContainerRepositoryOpts) -> Self {
        let id = &opts.id;
        ContainerRepository {
            id: id.clone(),
            image_name: opts.image_name.clone(),
            stack_name: stack::container_repository(&id.cluster_name, &opts.image_name),
            template: Vec::new(),
            repository_uri: format!(
                "{}.dkr.ecr.{}.amazonaws.com/{}",
                id.account_id, id.region, opts.image_name
            ),
        }
    }
}

impl Synthesize for PostgresDatabase {
    fn synthesize(opts: &CreatePostgresDatabaseOpts) -> Self {
        let id = &opts.id;
        let app = &opts.application_name;
        PostgresDatabase {
            id: id.clone(),
            application_name: app.clone(),
            user_name: opts.user_name.clone(),
            stack_name: stack::postgres(&id.cluster_name, app),
            template: Vec::new(),
            endpoint_address: format!(
                "{app}.{}.{}.rds.amazonaws.com",
                fingerprint(&[&id.cluster_name, app], 12),
                id.region
            ),
            endpoint_port: 5432,
            admin_secret_arn: format!(
                "arn:aws:secretsmanager:{}:{}:secret:okctl-{}-{app}-admin",
                id.region, id.account_id, id.cluster_name
            ),
            security_group_id: format!("sg-{}", fingerprint(&[&opts.vpc_id, app], 17)),
        }
    }
}

impl Synthesize for S3Bucket {
    fn synthesize(opts: &CreateS3BucketOpts) -> Self {
        S3Bucket {
            id: opts.id.clone(),
            name: opts.bucket_name.clone(),
            private: opts.private,
            arn: format!("arn:aws:s3:::{}", opts.bucket_name),
            stack_name: stack::s3_bucket(&opts.id.cluster_name, &opts.bucket_name),
            template: Vec::new(),
        }
    }
}

impl Synthesize for Namespace {
    fn synthesize(opts: &CreateNamespaceOpts) -> Self {
        Namespace {
            id: opts.id.clone(),
            namespace: opts.namespace.clone(),
            labels: opts.labels.clone(),
        }
    }
}

impl Synthesize for Manifest {
    fn synthesize(opts: &CreateManifestOpts) -> Self {
        Manifest {
            id: opts.id.clone(),
            name: opts.name.clone(),
            namespace: opts.namespace.clone(),
            content: opts.content.clone(),
        }
    }
}

/// Provider that records nothing and changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

#[async_trait]
impl<R: Synthesize> CloudProvider<R> for DryRun {
    async fn create(&self, ctx: &Ctx, opts: &R::Create) -> ProviderResult<R> {
        ctx.check()?;
        let resource = R::synthesize(opts);
        debug!(kind = R::KIND, key = %resource.key(), "dry-run create");
        Ok(resource)
    }

    async fn delete(&self, ctx: &Ctx, _opts: &R::Delete) -> ProviderResult<()> {
        ctx.check()?;
        debug!(kind = R::KIND, "dry-run delete");
        Ok(())
    }
}

#[async_trait]
impl IdentityPoolProvider for DryRun {
    async fn create_identity_pool(
        &self,
        ctx: &Ctx,
        opts: &CreateIdentityPoolOpts,
        certificate: &Certificate,
    ) -> ProviderResult<IdentityPool> {
        ctx.check()?;
        let id = &opts.id;
        let digest = fingerprint(&[&id.cluster_name, &opts.auth_domain], 14);
        Ok(IdentityPool {
            id: id.clone(),
            user_pool_id: format!("{}_{}", id.region, &digest[..9]),
            auth_domain: opts.auth_domain.clone(),
            hosted_zone_id: opts.hosted_zone_id.clone(),
            stack_name: stack::identity_pool(&id.cluster_name),
            template: Vec::new(),
            certificate: certificate.clone(),
            record_set_alias_target: format!("{digest}.cloudfront.net"),
        })
    }

    async fn delete_identity_pool(
        &self,
        ctx: &Ctx,
        _opts: &DeleteIdentityPoolOpts,
    ) -> ProviderResult<()> {
        ctx.check()?;
        Ok(())
    }
}

#[async_trait]
impl GithubProvider for DryRun {
    async fn create_oauth_app(
        &self,
        ctx: &Ctx,
        opts: &CreateOAuthAppOpts,
    ) -> ProviderResult<OAuthAppCredentials> {
        ctx.check()?;
        Ok(OAuthAppCredentials {
            client_id: format!("Iv1.{}", fingerprint(&[&opts.organisation, &opts.name], 16)),
            client_secret: fingerprint(&[&opts.organisation, &opts.name, "client_secret"], 40),
        })
    }

    async fn delete_oauth_app(&self, ctx: &Ctx, _opts: &DeleteOAuthAppOpts) -> ProviderResult<()> {
        ctx.check()?;
        Ok(())
    }
}

impl Providers {
    /// Every kind backed by [`DryRun`].
    pub fn dry_run() -> Self {
        let p = Arc::new(DryRun);
        Self {
            cluster: p.clone(),
            vpc: p.clone(),
            certificate: p.clone(),
            hosted_zone: p.clone(),
            policy: p.clone(),
            service_account: p.clone(),
            helm: p.clone(),
            identity_pool: p.clone(),
            identity_pool_client: p.clone(),
            secret: p.clone(),
            security_group: p.clone(),
            container_repository: p.clone(),
            postgres: p.clone(),
            s3: p.clone(),
            namespace: p.clone(),
            manifest: p.clone(),
            github: p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use okctl_core::Kind;

    fn id() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    #[test]
    fn vpc_subnets_are_carved_from_the_range() {
        let vpc = Vpc::synthesize(&CreateVpcOpts {
            id: id(),
            cidr: "192.168.0.0/20".to_string(),
            minimal: false,
        });
        assert_eq!(vpc.stack_name, "okctl-vpc-okctl-staging");
        assert_eq!(vpc.public_subnets[0].cidr, "192.168.0.0/24");
        assert_eq!(vpc.private_subnets[0].cidr, "192.168.3.0/24");
        assert_eq!(vpc.database_subnets[2].cidr, "192.168.8.0/24");
        assert_eq!(vpc.public_subnets[1].availability_zone, "eu-west-1b");
        assert_eq!(vpc.database_subnets_group_name, "okctl-staging-database");
    }

    #[test]
    fn minimal_vpc_has_no_database_subnets() {
        let vpc = Vpc::synthesize(&CreateVpcOpts {
            id: id(),
            cidr: "10.0.0.0/16".to_string(),
            minimal: true,
        });
        assert!(vpc.database_subnets.is_empty());
        assert!(vpc.database_subnets_group_name.is_empty());
    }

    #[test]
    fn synthesized_identifiers_are_deterministic() {
        let opts = CreateCertificateOpts {
            id: id(),
            fqdn: "argocd.okctl.io.".to_string(),
            domain: "argocd.okctl.io".to_string(),
            hosted_zone_id: "Z123".to_string(),
        };
        let a = Certificate::synthesize(&opts);
        let b = Certificate::synthesize(&opts);
        assert_eq!(a.arn, b.arn);
        assert!(a.arn.starts_with("arn:aws:acm:eu-west-1:123456789012:certificate/"));
    }

    #[tokio::test]
    async fn cancelled_context_fails_before_synthesis() {
        let ctx = Ctx::background();
        ctx.cancel();
        let provider: &dyn CloudProvider<Namespace> = &DryRun;
        let err = provider
            .create(
                &ctx,
                &CreateNamespaceOpts {
                    id: id(),
                    namespace: "argocd".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Canceled);
    }

    #[tokio::test]
    async fn identity_pool_embeds_the_certificate() {
        let cert = Certificate {
            id: id(),
            domain: "auth.okctl.io".to_string(),
            arn: "arn:aws:acm:eu-west-1:123456789012:certificate/abc".to_string(),
            ..Default::default()
        };
        let pool = DryRun
            .create_identity_pool(
                &Ctx::background(),
                &CreateIdentityPoolOpts {
                    id: id(),
                    auth_domain: "auth.okctl.io".to_string(),
                    hosted_zone_id: "Z123".to_string(),
                },
                &cert,
            )
            .await
            .unwrap();
        assert_eq!(pool.certificate, cert);
        assert!(pool.user_pool_id.starts_with("eu-west-1_"));
    }
}

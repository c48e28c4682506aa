//! One capability trait per resource kind.
//!
//! Orchestration code depends on these traits only, never on the
//! transport: [`Client`] implements all of them by sending the matching
//! [`Request`] variant.

use async_trait::async_trait;
use okctl_core::types::*;
use okctl_core::{Request, Result};

use crate::client::Client;

macro_rules! capability {
    ($(#[$meta:meta])* $name:ident { $( $method:ident($op:ident, $opts:ty) -> $out:ty; )* }) => {
        $(#[$meta])*
        #[async_trait]
        pub trait $name: Send + Sync {
            $( async fn $method(&self, opts: $opts) -> Result<$out>; )*
        }

        #[async_trait]
        impl $name for Client {
            $(
                async fn $method(&self, opts: $opts) -> Result<$out> {
                    self.call(Request::$op(opts)).await
                }
            )*
        }
    };
}

capability! {
    /// EKS clusters.
    ClusterApi {
        create_cluster(CreateCluster, CreateClusterOpts) -> Cluster;
        delete_cluster(DeleteCluster, DeleteClusterOpts) -> ();
        get_cluster(GetCluster, GetClusterOpts) -> Cluster;
    }
}

capability! {
    VpcApi {
        create_vpc(CreateVpc, CreateVpcOpts) -> Vpc;
        delete_vpc(DeleteVpc, DeleteVpcOpts) -> ();
    }
}

capability! {
    CertificateApi {
        create_certificate(CreateCertificate, CreateCertificateOpts) -> Certificate;
        delete_certificate(DeleteCertificate, DeleteCertificateOpts) -> ();
    }
}

capability! {
    /// Route53 hosted zones.
    DomainApi {
        create_hosted_zone(CreateHostedZone, CreateHostedZoneOpts) -> HostedZone;
        delete_hosted_zone(DeleteHostedZone, DeleteHostedZoneOpts) -> ();
        list_hosted_zones(ListHostedZones, ListHostedZonesOpts) -> Vec<HostedZone>;
    }
}

capability! {
    ManagedPolicyApi {
        create_policy(CreatePolicy, CreatePolicyOpts) -> ManagedPolicy;
        delete_policy(DeletePolicy, DeletePolicyOpts) -> ();
    }
}

capability! {
    ServiceAccountApi {
        create_service_account(CreateServiceAccount, CreateServiceAccountOpts) -> ServiceAccount;
        delete_service_account(DeleteServiceAccount, DeleteServiceAccountOpts) -> ();
    }
}

capability! {
    HelmApi {
        create_helm_release(CreateHelmRelease, CreateHelmReleaseOpts) -> HelmRelease;
        delete_helm_release(DeleteHelmRelease, DeleteHelmReleaseOpts) -> ();
    }
}

capability! {
    /// Cognito user pools and their clients.
    IdentityManagerApi {
        create_identity_pool(CreateIdentityPool, CreateIdentityPoolOpts) -> IdentityPool;
        delete_identity_pool(DeleteIdentityPool, DeleteIdentityPoolOpts) -> ();
        create_identity_pool_client(CreateIdentityPoolClient, CreateIdentityPoolClientOpts)
            -> IdentityPoolClient;
        delete_identity_pool_client(DeleteIdentityPoolClient, DeleteIdentityPoolClientOpts) -> ();
    }
}

capability! {
    ParameterApi {
        create_secret(CreateSecret, CreateSecretOpts) -> SecretParameter;
        delete_secret(DeleteSecret, DeleteSecretOpts) -> ();
    }
}

capability! {
    SecurityGroupApi {
        create_security_group(CreateSecurityGroup, CreateSecurityGroupOpts) -> SecurityGroup;
        delete_security_group(DeleteSecurityGroup, DeleteSecurityGroupOpts) -> ();
    }
}

capability! {
    ContainerRepositoryApi {
        create_container_repository(CreateContainerRepository, CreateContainerRepositoryOpts)
            -> ContainerRepository;
        delete_container_repository(DeleteContainerRepository, DeleteContainerRepositoryOpts) -> ();
    }
}

capability! {
    /// Application components: databases and buckets.
    ComponentApi {
        create_postgres_database(CreatePostgresDatabase, CreatePostgresDatabaseOpts)
            -> PostgresDatabase;
        delete_postgres_database(DeletePostgresDatabase, DeletePostgresDatabaseOpts) -> ();
        create_s3_bucket(CreateS3Bucket, CreateS3BucketOpts) -> S3Bucket;
        delete_s3_bucket(DeleteS3Bucket, DeleteS3BucketOpts) -> ();
    }
}

capability! {
    KubeApi {
        create_namespace(CreateNamespace, CreateNamespaceOpts) -> Namespace;
        delete_namespace(DeleteNamespace, DeleteNamespaceOpts) -> ();
        create_manifest(CreateManifest, CreateManifestOpts) -> Manifest;
        delete_manifest(DeleteManifest, DeleteManifestOpts) -> ();
    }
}

capability! {
    GithubApi {
        create_oauth_app(CreateOAuthApp, CreateOAuthAppOpts) -> OAuthApp;
        delete_oauth_app(DeleteOAuthApp, DeleteOAuthAppOpts) -> ();
    }
}

capability! {
    ArgoCdApi {
        create_argocd(CreateArgoCd, CreateArgoCdOpts) -> ArgoCd;
        delete_argocd(DeleteArgoCd, DeleteArgoCdOpts) -> ();
        get_argocd(GetArgoCd, GetArgoCdOpts) -> CompositeStatus;
    }
}

capability! {
    MonitoringApi {
        create_monitoring(CreateMonitoring, CreateMonitoringOpts) -> Monitoring;
        delete_monitoring(DeleteMonitoring, DeleteMonitoringOpts) -> ();
        get_monitoring(GetMonitoring, GetMonitoringOpts) -> CompositeStatus;
    }
}

capability! {
    /// The policy, service account and chart bundles of cluster controllers.
    ControllerApi {
        create_autoscaler(CreateAutoscaler, CreateAutoscalerOpts) -> ControllerInstallation;
        delete_autoscaler(DeleteAutoscaler, DeleteControllerOpts) -> ();
        create_blockstorage(CreateBlockstorage, CreateBlockstorageOpts) -> ControllerInstallation;
        delete_blockstorage(DeleteBlockstorage, DeleteControllerOpts) -> ();
        create_aws_load_balancer_controller(
            CreateAwsLoadBalancerController,
            CreateAwsLoadBalancerControllerOpts
        ) -> ControllerInstallation;
        delete_aws_load_balancer_controller(DeleteAwsLoadBalancerController, DeleteControllerOpts)
            -> ();
        create_external_dns(CreateExternalDns, CreateExternalDnsOpts) -> ControllerInstallation;
        delete_external_dns(DeleteExternalDns, DeleteControllerOpts) -> ();
        create_external_secrets(CreateExternalSecrets, CreateExternalSecretsOpts)
            -> ControllerInstallation;
        delete_external_secrets(DeleteExternalSecrets, DeleteControllerOpts) -> ();
    }
}

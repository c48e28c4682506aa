//! Storage types for every persisted kind and their conversions.
//!
//! Conversions are field-for-field. Both directions build the target with a
//! struct literal, so a field added to a domain type without a storage
//! counterpart fails to compile instead of being silently dropped.

use std::collections::BTreeMap;

use okctl_core::Resource;
use okctl_core::types::cluster::ClusterConfig;
use okctl_core::types::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::tables::{self, Table};
use crate::types::StoredId;

/// A resource kind the state store can persist.
pub trait Storable: Resource {
    type Stored: Serialize + DeserializeOwned + Clone + std::fmt::Debug + PartialEq;

    /// Table the kind's rows live in.
    const TABLE: Table;

    /// Whether deletes keep the row with `deleted = true`.
    const SOFT_DELETE: bool;

    fn to_stored(&self) -> Self::Stored;

    fn from_stored(stored: Self::Stored) -> Self;
}

macro_rules! stored {
    (
        $(#[$meta:meta])*
        $domain:ident => $stored:ident in $table:ident, soft_delete = $soft:literal {
            $( $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $stored {
            #[serde(flatten)]
            pub id: StoredId,
            $( pub $field: $ty, )*
        }

        impl Storable for $domain {
            type Stored = $stored;
            const TABLE: Table = tables::$table;
            const SOFT_DELETE: bool = $soft;

            fn to_stored(&self) -> $stored {
                $stored {
                    id: StoredId::from(&self.id),
                    $( $field: self.$field.clone(), )*
                }
            }

            fn from_stored(stored: $stored) -> Self {
                Self {
                    id: stored.id.into(),
                    $( $field: stored.$field, )*
                }
            }
        }
    };
}

stored! {
    Cluster => StoredCluster in CLUSTERS, soft_delete = false {
        name: String,
        stack_name: String,
        template: Vec<u8>,
        config: ClusterConfig,
    }
}

stored! {
    Vpc => StoredVpc in VPCS, soft_delete = false {
        stack_name: String,
        template: Vec<u8>,
        vpc_id: String,
        cidr: String,
        public_subnets: Vec<VpcSubnet>,
        private_subnets: Vec<VpcSubnet>,
        database_subnets: Vec<VpcSubnet>,
        database_subnets_group_name: String,
    }
}

stored! {
    Certificate => StoredCertificate in CERTIFICATES, soft_delete = false {
        fqdn: String,
        domain: String,
        hosted_zone_id: String,
        arn: String,
        stack_name: String,
        template: Vec<u8>,
    }
}

stored! {
    /// Hosted zones are soft-deleted so a re-created zone keeps its history.
    HostedZone => StoredHostedZone in HOSTED_ZONES, soft_delete = true {
        managed: bool,
        fqdn: String,
        domain: String,
        hosted_zone_id: String,
        name_servers: Vec<String>,
        stack_name: String,
        template: Vec<u8>,
    }
}

stored! {
    ManagedPolicy => StoredManagedPolicy in MANAGED_POLICIES, soft_delete = false {
        name: String,
        stack_name: String,
        policy_arn: String,
        template: Vec<u8>,
    }
}

stored! {
    ServiceAccount => StoredServiceAccount in SERVICE_ACCOUNTS, soft_delete = false {
        name: String,
        namespace: String,
        policy_arn: String,
        config: ServiceAccountConfig,
    }
}

stored! {
    HelmRelease => StoredHelmRelease in HELM_RELEASES, soft_delete = false {
        release_name: String,
        namespace: String,
        chart: Chart,
        revision: u32,
        status: String,
    }
}

stored! {
    IdentityPool => StoredIdentityPool in IDENTITY_POOLS, soft_delete = false {
        user_pool_id: String,
        auth_domain: String,
        hosted_zone_id: String,
        stack_name: String,
        template: Vec<u8>,
        certificate: Certificate,
        record_set_alias_target: String,
    }
}

stored! {
    IdentityPoolClient => StoredIdentityPoolClient in IDENTITY_POOL_CLIENTS, soft_delete = false {
        user_pool_id: String,
        purpose: String,
        callback_url: String,
        client_id: String,
        stack_name: String,
        template: Vec<u8>,
    }
}

stored! {
    /// Only the location and version of a secret; never its value.
    SecretParameter => StoredSecretParameter in SECRET_PARAMETERS, soft_delete = true {
        name: String,
        path: String,
        version: i64,
    }
}

stored! {
    SecurityGroup => StoredSecurityGroup in SECURITY_GROUPS, soft_delete = false {
        name: String,
        vpc_id: String,
        stack_name: String,
        template: Vec<u8>,
        group_id: String,
        inbound_rules: Vec<SecurityGroupRule>,
        outbound_rules: Vec<SecurityGroupRule>,
    }
}

stored! {
    ContainerRepository => StoredContainerRepository in CONTAINER_REPOSITORIES,
        soft_delete = false {
        image_name: String,
        stack_name: String,
        template: Vec<u8>,
        repository_uri: String,
    }
}

stored! {
    PostgresDatabase => StoredPostgresDatabase in POSTGRES_DATABASES, soft_delete = false {
        application_name: String,
        user_name: String,
        stack_name: String,
        template: Vec<u8>,
        endpoint_address: String,
        endpoint_port: u16,
        admin_secret_arn: String,
        security_group_id: String,
    }
}

stored! {
    S3Bucket => StoredS3Bucket in S3_BUCKETS, soft_delete = false {
        name: String,
        private: bool,
        arn: String,
        stack_name: String,
        template: Vec<u8>,
    }
}

stored! {
    Namespace => StoredNamespace in NAMESPACES, soft_delete = false {
        namespace: String,
        labels: BTreeMap<String, String>,
    }
}

stored! {
    Manifest => StoredManifest in MANIFESTS, soft_delete = false {
        name: String,
        namespace: String,
        content: serde_json::Value,
    }
}

stored! {
    OAuthApp => StoredOAuthApp in OAUTH_APPS, soft_delete = false {
        organisation: String,
        name: String,
        site_url: String,
        callback_url: String,
        client_id: String,
        client_secret: SecretRef,
    }
}

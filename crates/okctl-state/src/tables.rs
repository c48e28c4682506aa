//! redb table definitions for the okctl state store.
//!
//! One table per resource kind, keyed by the kind's business key (stack
//! name, domain, release name, ...). Values are JSON-serialized
//! [`Envelope`](crate::types::Envelope)s.

use redb::TableDefinition;

pub type Table = TableDefinition<'static, &'static str, &'static [u8]>;

pub const CLUSTERS: Table = TableDefinition::new("clusters");
pub const VPCS: Table = TableDefinition::new("vpcs");
pub const CERTIFICATES: Table = TableDefinition::new("certificates");
pub const HOSTED_ZONES: Table = TableDefinition::new("hosted_zones");
pub const MANAGED_POLICIES: Table = TableDefinition::new("managed_policies");
pub const SERVICE_ACCOUNTS: Table = TableDefinition::new("service_accounts");
pub const HELM_RELEASES: Table = TableDefinition::new("helm_releases");
pub const IDENTITY_POOLS: Table = TableDefinition::new("identity_pools");
pub const IDENTITY_POOL_CLIENTS: Table = TableDefinition::new("identity_pool_clients");
pub const SECRET_PARAMETERS: Table = TableDefinition::new("secret_parameters");
pub const SECURITY_GROUPS: Table = TableDefinition::new("security_groups");
pub const CONTAINER_REPOSITORIES: Table = TableDefinition::new("container_repositories");
pub const POSTGRES_DATABASES: Table = TableDefinition::new("postgres_databases");
pub const S3_BUCKETS: Table = TableDefinition::new("s3_buckets");
pub const NAMESPACES: Table = TableDefinition::new("namespaces");
pub const MANIFESTS: Table = TableDefinition::new("manifests");
pub const OAUTH_APPS: Table = TableDefinition::new("oauth_apps");

pub const ALL: [Table; 17] = [
    CLUSTERS,
    VPCS,
    CERTIFICATES,
    HOSTED_ZONES,
    MANAGED_POLICIES,
    SERVICE_ACCOUNTS,
    HELM_RELEASES,
    IDENTITY_POOLS,
    IDENTITY_POOL_CLIENTS,
    SECRET_PARAMETERS,
    SECURITY_GROUPS,
    CONTAINER_REPOSITORIES,
    POSTGRES_DATABASES,
    S3_BUCKETS,
    NAMESPACES,
    MANIFESTS,
    OAUTH_APPS,
];

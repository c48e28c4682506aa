//! okctl-client: typed access to okctl capabilities.
//!
//! ```no_run
//! # async fn run() -> okctl_core::Result<()> {
//! use okctl_client::{Client, VpcApi};
//! use okctl_core::types::CreateVpcOpts;
//! use okctl_core::Id;
//!
//! let client = Client::remote("http://127.0.0.1:8085");
//! let vpc = client
//!     .create_vpc(CreateVpcOpts {
//!         id: Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging"),
//!         cidr: "192.168.0.0/20".to_string(),
//!         minimal: false,
//!     })
//!     .await?;
//! println!("{}", vpc.vpc_id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod applier;
pub mod client;
pub mod transport;

pub use api::{
    ArgoCdApi, CertificateApi, ClusterApi, ComponentApi, ContainerRepositoryApi, ControllerApi,
    DomainApi, GithubApi, HelmApi, IdentityManagerApi, KubeApi, ManagedPolicyApi, MonitoringApi,
    ParameterApi, SecurityGroupApi, ServiceAccountApi, VpcApi,
};
pub use applier::{AppliedCluster, Applier, ClusterDeclaration, Integrations};
pub use client::Client;
pub use transport::{DirectTransport, RemoteTransport, Transport, TransportError};

//! Route53 hosted zones.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::validation::{Validate, Validator};

/// Default TTL for the NS record delegating to the zone.
pub const DEFAULT_NS_TTL: i64 = 900;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHostedZoneOpts {
    pub id: Id,
    pub domain: String,
    pub fqdn: String,
    #[serde(default)]
    pub ns_ttl: i64,
}

impl Validate for CreateHostedZoneOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain)
            .dns_name("FQDN", &self.fqdn)
            .check("NSTTL", self.ns_ttl >= 0, "must be no less than 0");
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHostedZoneOpts {
    pub id: Id,
    pub domain: String,
}

impl Validate for DeleteHostedZoneOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain);
        v.finish()
    }
}

impl Keyed for DeleteHostedZoneOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.domain.clone()
    }
}

/// Options for listing the hosted zones of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHostedZonesOpts {
    pub id: Id,
}

impl Validate for ListHostedZonesOpts {
    fn validate(&self) -> Result<(), Error> {
        self.id.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedZone {
    pub id: Id,
    /// Whether okctl created the zone or adopted an existing one.
    pub managed: bool,
    pub fqdn: String,
    pub domain: String,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
    pub name_servers: Vec<String>,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
}

impl Resource for HostedZone {
    const KIND: &'static str = "hosted zone";
    type Create = CreateHostedZoneOpts;
    type Delete = DeleteHostedZoneOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.domain.clone()
    }
}

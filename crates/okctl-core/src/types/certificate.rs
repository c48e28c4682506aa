//! ACM certificates validated through a Route53 hosted zone.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::Id;
use crate::resource::{Keyed, Resource};
use crate::stack;
use crate::validation::{Validate, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateOpts {
    pub id: Id,
    pub fqdn: String,
    pub domain: String,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
}

impl CreateCertificateOpts {
    pub fn stack_name(&self) -> String {
        stack::certificate(&self.id.cluster_name, &self.domain)
    }
}

impl Validate for CreateCertificateOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain)
            .dns_name("FQDN", &self.fqdn)
            .required("HostedZoneID", &self.hosted_zone_id)
            .stack_name("StackName", &self.stack_name());
        v.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCertificateOpts {
    pub id: Id,
    pub domain: String,
}

impl Validate for DeleteCertificateOpts {
    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.id.check(&mut v);
        v.dns_name("Domain", &self.domain);
        v.finish()
    }
}

impl Keyed for DeleteCertificateOpts {
    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.domain.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Id,
    pub fqdn: String,
    pub domain: String,
    #[serde(rename = "hostedZoneID")]
    pub hosted_zone_id: String,
    #[serde(rename = "certificateARN")]
    pub arn: String,
    pub stack_name: String,
    #[serde(default)]
    pub template: Vec<u8>,
}

impl Resource for Certificate {
    const KIND: &'static str = "certificate";
    type Create = CreateCertificateOpts;
    type Delete = DeleteCertificateOpts;

    fn id(&self) -> &Id {
        &self.id
    }

    fn key(&self) -> String {
        self.domain.clone()
    }
}

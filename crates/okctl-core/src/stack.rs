//! Deterministic CloudFormation stack names.
//!
//! A delete locates its stack by recomputing the name from the same inputs
//! the create used, so these functions must stay stable.

/// CloudFormation rejects longer stack names.
pub const MAX_NAME_LEN: usize = 128;

/// Replace dots and anything outside `[a-zA-Z0-9-]` with dashes.
pub fn slug(value: &str) -> String {
    value
        .trim_end_matches('.')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

pub fn cluster(cluster_name: &str) -> String {
    format!("eksctl-{cluster_name}-cluster")
}

pub fn vpc(cluster_name: &str) -> String {
    format!("okctl-vpc-{cluster_name}")
}

pub fn certificate(cluster_name: &str, domain: &str) -> String {
    format!("okctl-certificate-{cluster_name}-{}", slug(domain))
}

pub fn hosted_zone(cluster_name: &str, domain: &str) -> String {
    format!("okctl-hostedzone-{cluster_name}-{}", slug(domain))
}

pub fn policy(cluster_name: &str, name: &str) -> String {
    format!("okctl-policy-{cluster_name}-{}", slug(name))
}

pub fn identity_pool(cluster_name: &str) -> String {
    format!("okctl-identitypool-{cluster_name}")
}

pub fn identity_pool_client(cluster_name: &str, purpose: &str) -> String {
    format!("okctl-identitypoolclient-{cluster_name}-{}", slug(purpose))
}

pub fn security_group(cluster_name: &str, name: &str) -> String {
    format!("okctl-securitygroup-{cluster_name}-{}", slug(name))
}

pub fn container_repository(cluster_name: &str, image: &str) -> String {
    format!("okctl-containerrepository-{cluster_name}-{}", slug(image))
}

pub fn postgres(cluster_name: &str, application: &str) -> String {
    format!("okctl-rds-{cluster_name}-{}", slug(application))
}

pub fn s3_bucket(cluster_name: &str, bucket: &str) -> String {
    format!("okctl-s3bucket-{cluster_name}-{}", slug(bucket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_replaces_dots() {
        assert_eq!(slug("auth.okctl.example.com."), "auth-okctl-example-com");
    }

    #[test]
    fn names_are_stable() {
        assert_eq!(vpc("okctl-staging"), "okctl-vpc-okctl-staging");
        assert_eq!(cluster("okctl-staging"), "eksctl-okctl-staging-cluster");
        assert_eq!(
            certificate("okctl-staging", "argocd.okctl.io"),
            "okctl-certificate-okctl-staging-argocd-okctl-io"
        );
        assert_eq!(
            policy("okctl-staging", "ExternalDNS"),
            "okctl-policy-okctl-staging-ExternalDNS"
        );
    }
}

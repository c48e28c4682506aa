//! Pinned Helm charts and the values okctl installs them with.

use serde_json::json;

use crate::id::Id;
use crate::types::helm::Chart;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

fn chart(
    repository_name: &str,
    repository_url: &str,
    chart: &str,
    version: &str,
    release_name: &str,
    namespace: &str,
    values: serde_json::Value,
) -> Chart {
    Chart {
        repository_name: repository_name.to_string(),
        repository_url: repository_url.to_string(),
        release_name: release_name.to_string(),
        version: version.to_string(),
        chart: chart.to_string(),
        namespace: namespace.to_string(),
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        values,
    }
}

pub fn autoscaler(id: &Id, service_account: &str, namespace: &str) -> Chart {
    chart(
        "autoscaler",
        "https://kubernetes.github.io/autoscaler",
        "cluster-autoscaler",
        "9.35.0",
        "cluster-autoscaler",
        namespace,
        json!({
            "autoDiscovery": { "clusterName": id.cluster_name },
            "awsRegion": id.region,
            "rbac": {
                "serviceAccount": { "create": false, "name": service_account },
            },
            "extraArgs": {
                "balance-similar-node-groups": true,
                "skip-nodes-with-system-pods": false,
            },
        }),
    )
}

pub fn blockstorage(id: &Id, service_account: &str, namespace: &str) -> Chart {
    chart(
        "aws-ebs-csi-driver",
        "https://kubernetes-sigs.github.io/aws-ebs-csi-driver",
        "aws-ebs-csi-driver",
        "2.28.1",
        "aws-ebs-csi-driver",
        namespace,
        json!({
            "controller": {
                "region": id.region,
                "serviceAccount": { "create": false, "name": service_account },
            },
            "storageClasses": [{
                "name": "ebs-sc",
                "annotations": { "storageclass.kubernetes.io/is-default-class": "true" },
                "volumeBindingMode": "WaitForFirstConsumer",
                "reclaimPolicy": "Retain",
                "parameters": { "type": "gp3", "encrypted": "true" },
            }],
        }),
    )
}

pub fn aws_load_balancer_controller(
    id: &Id,
    service_account: &str,
    namespace: &str,
    vpc_id: &str,
) -> Chart {
    chart(
        "eks",
        "https://aws.github.io/eks-charts",
        "aws-load-balancer-controller",
        "1.7.1",
        "aws-load-balancer-controller",
        namespace,
        json!({
            "clusterName": id.cluster_name,
            "region": id.region,
            "vpcId": vpc_id,
            "serviceAccount": { "create": false, "name": service_account },
        }),
    )
}

pub fn external_dns(
    id: &Id,
    service_account: &str,
    namespace: &str,
    domain: &str,
    hosted_zone_id: &str,
) -> Chart {
    chart(
        "external-dns",
        "https://kubernetes-sigs.github.io/external-dns",
        "external-dns",
        "1.14.3",
        "external-dns",
        namespace,
        json!({
            "provider": "aws",
            "domainFilters": [domain],
            "txtOwnerId": hosted_zone_id,
            "policy": "sync",
            "env": [{ "name": "AWS_DEFAULT_REGION", "value": id.region }],
            "serviceAccount": { "create": false, "name": service_account },
        }),
    )
}

pub fn external_secrets(id: &Id, service_account: &str, namespace: &str) -> Chart {
    chart(
        "external-secrets",
        "https://charts.external-secrets.io",
        "external-secrets",
        "0.9.13",
        "external-secrets",
        namespace,
        json!({
            "installCRDs": true,
            "env": { "AWS_REGION": id.region },
            "serviceAccount": { "create": false, "name": service_account },
        }),
    )
}

/// Argo CD wired to GitHub login through Dex and to the infrastructure
/// repository through a deploy key.
#[allow(clippy::too_many_arguments)]
pub fn argocd(
    argo_domain: &str,
    certificate_arn: &str,
    organisation: &str,
    client_id: &str,
    git_url: &str,
    secret_name: &str,
    private_key_secret_name: &str,
    namespace: &str,
) -> Chart {
    let url = format!("https://{argo_domain}");
    chart(
        "argo",
        "https://argoproj.github.io/argo-helm",
        "argo-cd",
        "6.7.3",
        "argocd",
        namespace,
        json!({
            "configs": {
                "secret": { "createSecret": false },
                "cm": {
                    "url": url,
                    "admin.enabled": false,
                    "dex.config": format!(
                        "connectors:\n- type: github\n  id: github\n  name: GitHub\n  config:\n    clientID: {client_id}\n    clientSecret: $argocd-secret:dex.github.clientSecret\n    orgs:\n    - name: {organisation}\n"
                    ),
                },
                "repositories": {
                    "infrastructure": {
                        "url": git_url,
                        "type": "git",
                        "sshPrivateKeySecret": {
                            "name": private_key_secret_name,
                            "key": "sshPrivateKey",
                        },
                    },
                },
            },
            "server": {
                "ingress": {
                    "enabled": true,
                    "ingressClassName": "alb",
                    "hostname": argo_domain,
                    "annotations": {
                        "alb.ingress.kubernetes.io/scheme": "internet-facing",
                        "alb.ingress.kubernetes.io/certificate-arn": certificate_arn,
                        "alb.ingress.kubernetes.io/listen-ports": "[{\"HTTPS\":443}]",
                    },
                },
            },
            "global": { "secretName": secret_name },
        }),
    )
}

pub fn kube_prometheus_stack(
    grafana_domain: &str,
    certificate_arn: &str,
    auth_domain: &str,
    client_id: &str,
    secret_name: &str,
    namespace: &str,
) -> Chart {
    chart(
        "prometheus-community",
        "https://prometheus-community.github.io/helm-charts",
        "kube-prometheus-stack",
        "57.0.3",
        "kube-prometheus-stack",
        namespace,
        json!({
            "grafana": {
                "admin": {
                    "existingSecret": secret_name,
                    "userKey": "admin-user",
                    "passwordKey": "admin-pass",
                },
                "ingress": {
                    "enabled": true,
                    "ingressClassName": "alb",
                    "hosts": [grafana_domain],
                    "annotations": {
                        "alb.ingress.kubernetes.io/scheme": "internet-facing",
                        "alb.ingress.kubernetes.io/certificate-arn": certificate_arn,
                    },
                },
                "grafana.ini": {
                    "server": { "root_url": format!("https://{grafana_domain}") },
                    "auth.generic_oauth": {
                        "enabled": true,
                        "name": "Cognito",
                        "client_id": client_id,
                        "use_pkce": true,
                        "scopes": "openid email profile",
                        "auth_url": format!("https://{auth_domain}/oauth2/authorize"),
                        "token_url": format!("https://{auth_domain}/oauth2/token"),
                        "api_url": format!("https://{auth_domain}/oauth2/userInfo"),
                    },
                },
                "envFromSecret": secret_name,
            },
        }),
    )
}

pub fn loki(namespace: &str) -> Chart {
    chart(
        "grafana",
        "https://grafana.github.io/helm-charts",
        "loki",
        "2.16.0",
        "loki",
        namespace,
        json!({
            "persistence": { "enabled": true, "size": "10Gi", "storageClassName": "ebs-sc" },
            "config": {
                "table_manager": { "retention_deletes_enabled": true, "retention_period": "336h" },
            },
        }),
    )
}

pub fn promtail(namespace: &str) -> Chart {
    chart(
        "grafana",
        "https://grafana.github.io/helm-charts",
        "promtail",
        "6.15.5",
        "promtail",
        namespace,
        json!({
            "config": {
                "clients": [{ "url": format!("http://loki.{namespace}:3100/loki/api/v1/push") }],
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validate;

    fn id() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    #[test]
    fn every_chart_is_valid() {
        let charts = [
            autoscaler(&id(), "cluster-autoscaler", "kube-system"),
            blockstorage(&id(), "ebs-csi-controller-sa", "kube-system"),
            aws_load_balancer_controller(
                &id(),
                "aws-load-balancer-controller",
                "kube-system",
                "vpc-1",
            ),
            external_dns(&id(), "external-dns", "kube-system", "okctl.io", "Z123"),
            external_secrets(&id(), "external-secrets", "kube-system"),
            argocd(
                "argocd.okctl.io",
                "arn:aws:acm:eu-west-1:123456789012:certificate/abc",
                "oslokommune",
                "client",
                "git@github.com:oslokommune/iac.git",
                "argocd-secret",
                "argocd-privatekey",
                "argocd",
            ),
            kube_prometheus_stack(
                "grafana.okctl.io",
                "arn:aws:acm:eu-west-1:123456789012:certificate/abc",
                "auth.okctl.io",
                "client",
                "grafana-secrets",
                "monitoring",
            ),
            loki("monitoring"),
            promtail("monitoring"),
        ];
        for chart in charts {
            chart.validate().unwrap();
        }
    }

    #[test]
    fn argocd_ingress_uses_certificate() {
        let c = argocd(
            "argocd.okctl.io",
            "arn:aws:acm:cert",
            "org",
            "id",
            "git@github.com:org/repo.git",
            "argocd-secret",
            "argocd-privatekey",
            "argocd",
        );
        let annotations = &c.values["server"]["ingress"]["annotations"];
        assert_eq!(
            annotations["alb.ingress.kubernetes.io/certificate-arn"],
            "arn:aws:acm:cert"
        );
    }
}

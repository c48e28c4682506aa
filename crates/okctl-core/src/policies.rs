//! IAM managed policy templates for the cluster controllers.
//!
//! Each template is a CloudFormation document with a single
//! `AWS::IAM::ManagedPolicy` and an output carrying its ARN. The bytes are
//! handed to the provider and stored as-is.

use serde_json::{Value, json};

use crate::id::Id;

/// Logical id of the policy resource inside every template.
pub const POLICY_RESOURCE: &str = "ManagedPolicy";

/// Render a managed policy template.
pub fn template(id: &Id, name: &str, output_name: &str, statements: Value) -> Vec<u8> {
    let doc = json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": format!("okctl managed policy {name} for {}", id.cluster_name),
        "Resources": {
            POLICY_RESOURCE: {
                "Type": "AWS::IAM::ManagedPolicy",
                "Properties": {
                    "ManagedPolicyName": format!("okctl-{}-{name}", id.cluster_name),
                    "Description": format!("Service account policy for {name}"),
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": statements,
                    },
                },
            },
        },
        "Outputs": {
            output_name: {
                "Value": { "Ref": POLICY_RESOURCE },
                "Export": { "Name": format!("{}-{output_name}", id.cluster_name) },
            },
        },
    });
    // json! values always serialize
    serde_json::to_vec_pretty(&doc).unwrap_or_default()
}

pub fn autoscaler(id: &Id) -> Value {
    let owned_tag = format!(
        "autoscaling:ResourceTag/k8s.io/cluster-autoscaler/{}",
        id.cluster_name
    );
    json!([
        {
            "Effect": "Allow",
            "Action": [
                "autoscaling:DescribeAutoScalingGroups",
                "autoscaling:DescribeAutoScalingInstances",
                "autoscaling:DescribeLaunchConfigurations",
                "autoscaling:DescribeTags",
                "ec2:DescribeLaunchTemplateVersions",
                "ec2:DescribeInstanceTypes",
            ],
            "Resource": "*",
        },
        {
            "Effect": "Allow",
            "Action": [
                "autoscaling:SetDesiredCapacity",
                "autoscaling:TerminateInstanceInAutoScalingGroup",
            ],
            "Resource": "*",
            "Condition": {
                "StringEquals": {
                    owned_tag: "owned",
                },
            },
        },
    ])
}

pub fn blockstorage(_id: &Id) -> Value {
    json!([
        {
            "Effect": "Allow",
            "Action": [
                "ec2:AttachVolume",
                "ec2:CreateSnapshot",
                "ec2:CreateTags",
                "ec2:CreateVolume",
                "ec2:DeleteSnapshot",
                "ec2:DeleteTags",
                "ec2:DeleteVolume",
                "ec2:DescribeAvailabilityZones",
                "ec2:DescribeInstances",
                "ec2:DescribeSnapshots",
                "ec2:DescribeTags",
                "ec2:DescribeVolumes",
                "ec2:DescribeVolumesModifications",
                "ec2:DetachVolume",
                "ec2:ModifyVolume",
            ],
            "Resource": "*",
        },
    ])
}

pub fn aws_load_balancer_controller(_id: &Id) -> Value {
    json!([
        {
            "Effect": "Allow",
            "Action": [
                "iam:CreateServiceLinkedRole",
                "ec2:DescribeAccountAttributes",
                "ec2:DescribeAddresses",
                "ec2:DescribeInternetGateways",
                "ec2:DescribeVpcs",
                "ec2:DescribeSubnets",
                "ec2:DescribeSecurityGroups",
                "ec2:DescribeInstances",
                "ec2:DescribeNetworkInterfaces",
                "ec2:DescribeTags",
                "elasticloadbalancing:*",
                "acm:ListCertificates",
                "acm:DescribeCertificate",
                "wafv2:GetWebACLForResource",
                "shield:GetSubscriptionState",
            ],
            "Resource": "*",
        },
        {
            "Effect": "Allow",
            "Action": [
                "ec2:AuthorizeSecurityGroupIngress",
                "ec2:RevokeSecurityGroupIngress",
                "ec2:CreateSecurityGroup",
                "ec2:DeleteSecurityGroup",
                "ec2:CreateTags",
            ],
            "Resource": "*",
        },
    ])
}

pub fn external_dns(_id: &Id, hosted_zone_id: &str) -> Value {
    json!([
        {
            "Effect": "Allow",
            "Action": ["route53:ChangeResourceRecordSets"],
            "Resource": [format!("arn:aws:route53:::hostedzone/{hosted_zone_id}")],
        },
        {
            "Effect": "Allow",
            "Action": ["route53:ListHostedZones", "route53:ListResourceRecordSets"],
            "Resource": ["*"],
        },
    ])
}

pub fn external_secrets(id: &Id) -> Value {
    json!([
        {
            "Effect": "Allow",
            "Action": ["ssm:GetParameter", "ssm:GetParameters", "ssm:GetParametersByPath"],
            "Resource": [format!(
                "arn:aws:ssm:{}:{}:parameter/okctl/{}/*",
                id.region, id.account_id, id.cluster_name
            )],
        },
        {
            "Effect": "Allow",
            "Action": ["kms:Decrypt"],
            "Resource": ["*"],
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_exports_policy_arn() {
        let id = Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging");
        let bytes = template(
            &id,
            "ExternalSecrets",
            "ExternalSecretsPolicy",
            external_secrets(&id),
        );
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            doc["Resources"][POLICY_RESOURCE]["Type"],
            "AWS::IAM::ManagedPolicy"
        );
        assert_eq!(
            doc["Outputs"]["ExternalSecretsPolicy"]["Value"]["Ref"],
            POLICY_RESOURCE
        );
        let properties = &doc["Resources"][POLICY_RESOURCE]["Properties"];
        let statement = &properties["PolicyDocument"]["Statement"];
        let resource = &statement[0]["Resource"][0];
        assert_eq!(
            resource,
            "arn:aws:ssm:eu-west-1:123456789012:parameter/okctl/okctl-staging/*"
        );
    }
}

mod config_service;

pub use self::config_service::AwsConfigCatalog;

use crate::collector_core::{RawResourceEntry, RecordDefaults, ResourceCatalog};
use anyhow::Result;
use aws_config::SdkConfig;
use aws_sdk_sts as sts;
use std::future::Future;
use std::sync::Arc;

/// Resource kinds swept when no override is configured.
pub const DEFAULT_RESOURCE_KINDS: &[&str] = &[
    "AWS::EC2::Instance",
    "AWS::EC2::SecurityGroup",
    "AWS::EC2::VPC",
    "AWS::EC2::Subnet",
    "AWS::EC2::Volume",
    "AWS::EC2::NetworkInterface",
    "AWS::EC2::EIP",
    "AWS::EC2::RouteTable",
    "AWS::EC2::InternetGateway",
    "AWS::EC2::NatGateway",
    "AWS::S3::Bucket",
    "AWS::IAM::User",
    "AWS::IAM::Role",
    "AWS::IAM::Policy",
    "AWS::RDS::DBInstance",
    "AWS::RDS::DBCluster",
    "AWS::Lambda::Function",
    "AWS::CloudFormation::Stack",
    "AWS::ECS::Cluster",
    "AWS::ECS::Service",
    "AWS::EKS::Cluster",
    "AWS::ElasticLoadBalancingV2::LoadBalancer",
    "AWS::ElasticLoadBalancingV2::TargetGroup",
    "AWS::DynamoDB::Table",
    "AWS::SNS::Topic",
    "AWS::SQS::Queue",
    "AWS::CloudWatch::Alarm",
    "AWS::KMS::Key",
    "AWS::SecretsManager::Secret",
    "AWS::ECR::Repository",
    "AWS::CodeBuild::Project",
    "AWS::CodePipeline::Pipeline",
    "AWS::CloudFront::Distribution",
    "AWS::ApiGateway::RestApi",
    "AWS::ApiGatewayV2::Api",
    "AWS::ElastiCache::CacheCluster",
    "AWS::Redshift::Cluster",
    "AWS::AutoScaling::AutoScalingGroup",
    "AWS::ElasticBeanstalk::Application",
    "AWS::Backup::BackupPlan",
];

/// Ordered list of resource kinds to discover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKinds(Vec<String>);

impl ResourceKinds {
    /// Parses a comma-separated list, dropping blanks and repeats.
    pub fn parse_list(s: &str) -> Self {
        let mut kinds: Vec<String> = Vec::new();
        for kind in s.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            if !kinds.iter().any(|k| k == kind) {
                kinds.push(kind.to_string());
            }
        }
        Self(kinds)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ResourceKinds {
    fn default() -> Self {
        Self(DEFAULT_RESOURCE_KINDS.iter().map(|k| k.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogMode {
    Aggregated { aggregator_name: String },
    SingleAccount { account_id: String, region: String },
}

impl CatalogMode {
    /// Fallback account/region for entries that do not carry their own.
    pub fn record_defaults(&self) -> RecordDefaults {
        match self {
            CatalogMode::Aggregated { .. } => RecordDefaults::default(),
            CatalogMode::SingleAccount { account_id, region } => RecordDefaults {
                account_id: account_id.clone(),
                region: region.clone(),
            },
        }
    }
}

/// One page of a token-paginated listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub entries: Vec<RawResourceEntry>,
    pub next_token: Option<String>,
}

/// Follows `next_token` until the listing is exhausted, returning every entry
/// and the number of pages read. A failed page discards everything gathered.
pub async fn drain_pages<F, Fut>(mut fetch: F) -> Result<(Vec<RawResourceEntry>, usize)>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    let mut out = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;
        out.extend(page.entries);

        token = page.next_token.filter(|t| !t.is_empty());
        if token.is_none() {
            break;
        }
    }
    Ok((out, pages))
}

pub fn build_catalog(conf: &SdkConfig, mode: CatalogMode) -> Arc<dyn ResourceCatalog> {
    Arc::new(AwsConfigCatalog::new(conf, mode))
}

/// Account the process is running as.
pub async fn caller_account_id(conf: &SdkConfig) -> Result<String> {
    let client = sts::Client::new(conf);
    let who = client.get_caller_identity().send().await?;
    who.account()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("caller identity has no account"))
}

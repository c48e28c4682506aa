//! Call-recording providers for tests.
//!
//! Every spy shares a [`CallLog`] so tests can assert the order in which a
//! composite touched its collaborators. Successful creates answer with the
//! same synthesized resources [`DryRun`](crate::DryRun) produces.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use okctl_core::types::*;
use okctl_core::{Ctx, Resource};

use crate::dryrun::{DryRun, Synthesize};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{CloudProvider, GithubProvider, IdentityPoolProvider, Providers};

/// Ordered record of provider calls, as `"create <kind>"` / `"delete <kind>"`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Index of the first occurrence of `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Builds the error a spy fails with.
pub type Failure = Arc<dyn Fn() -> ProviderError + Send + Sync>;

fn locked<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spy for one kind. Counts calls, remembers the last options and can be
/// told to fail or stall.
pub struct SpyProvider<R: Resource> {
    log: CallLog,
    creates: AtomicUsize,
    deletes: AtomicUsize,
    last_create: Mutex<Option<R::Create>>,
    last_delete: Mutex<Option<R::Delete>>,
    fail_create: Mutex<Option<Failure>>,
    fail_delete: Mutex<Option<Failure>>,
    delay: Mutex<Option<Duration>>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Resource> SpyProvider<R> {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            creates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            last_create: Mutex::new(None),
            last_delete: Mutex::new(None),
            fail_create: Mutex::new(None),
            fail_delete: Mutex::new(None),
            delay: Mutex::new(None),
            _kind: PhantomData,
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn last_create(&self) -> Option<R::Create> {
        locked(&self.last_create).clone()
    }

    pub fn last_delete(&self) -> Option<R::Delete> {
        locked(&self.last_delete).clone()
    }

    /// Fail every following create with the error built by `f`.
    pub fn fail_create(&self, f: impl Fn() -> ProviderError + Send + Sync + 'static) {
        *locked(&self.fail_create) = Some(Arc::new(f));
    }

    pub fn fail_delete(&self, f: impl Fn() -> ProviderError + Send + Sync + 'static) {
        *locked(&self.fail_delete) = Some(Arc::new(f));
    }

    /// Sleep for `delay` inside every call before answering.
    pub fn stall(&self, delay: Duration) {
        *locked(&self.delay) = Some(delay);
    }

    async fn enter_create(&self, opts: &R::Create) -> ProviderResult<()> {
        self.log.record(format!("create {}", R::KIND));
        self.creates.fetch_add(1, Ordering::SeqCst);
        *locked(&self.last_create) = Some(opts.clone());
        self.pause().await;
        match locked(&self.fail_create).clone() {
            Some(f) => Err(f()),
            None => Ok(()),
        }
    }

    async fn enter_delete(&self, opts: &R::Delete) -> ProviderResult<()> {
        self.log.record(format!("delete {}", R::KIND));
        self.deletes.fetch_add(1, Ordering::SeqCst);
        *locked(&self.last_delete) = Some(opts.clone());
        self.pause().await;
        match locked(&self.fail_delete).clone() {
            Some(f) => Err(f()),
            None => Ok(()),
        }
    }

    async fn pause(&self) {
        let delay = *locked(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<R: Synthesize> CloudProvider<R> for SpyProvider<R> {
    async fn create(&self, _ctx: &Ctx, opts: &R::Create) -> ProviderResult<R> {
        self.enter_create(opts).await?;
        Ok(R::synthesize(opts))
    }

    async fn delete(&self, _ctx: &Ctx, opts: &R::Delete) -> ProviderResult<()> {
        self.enter_delete(opts).await
    }
}

#[async_trait]
impl IdentityPoolProvider for SpyProvider<IdentityPool> {
    async fn create_identity_pool(
        &self,
        ctx: &Ctx,
        opts: &CreateIdentityPoolOpts,
        certificate: &Certificate,
    ) -> ProviderResult<IdentityPool> {
        self.enter_create(opts).await?;
        DryRun.create_identity_pool(ctx, opts, certificate).await
    }

    async fn delete_identity_pool(
        &self,
        _ctx: &Ctx,
        opts: &DeleteIdentityPoolOpts,
    ) -> ProviderResult<()> {
        self.enter_delete(opts).await
    }
}

#[async_trait]
impl GithubProvider for SpyProvider<OAuthApp> {
    async fn create_oauth_app(
        &self,
        ctx: &Ctx,
        opts: &CreateOAuthAppOpts,
    ) -> ProviderResult<OAuthAppCredentials> {
        self.enter_create(opts).await?;
        DryRun.create_oauth_app(ctx, opts).await
    }

    async fn delete_oauth_app(&self, _ctx: &Ctx, opts: &DeleteOAuthAppOpts) -> ProviderResult<()> {
        self.enter_delete(opts).await
    }
}

/// One spy per kind, all writing to the same log.
pub struct SpySet {
    pub log: CallLog,
    pub cluster: Arc<SpyProvider<Cluster>>,
    pub vpc: Arc<SpyProvider<Vpc>>,
    pub certificate: Arc<SpyProvider<Certificate>>,
    pub hosted_zone: Arc<SpyProvider<HostedZone>>,
    pub policy: Arc<SpyProvider<ManagedPolicy>>,
    pub service_account: Arc<SpyProvider<ServiceAccount>>,
    pub helm: Arc<SpyProvider<HelmRelease>>,
    pub identity_pool: Arc<SpyProvider<IdentityPool>>,
    pub identity_pool_client: Arc<SpyProvider<IdentityPoolClient>>,
    pub secret: Arc<SpyProvider<SecretParameter>>,
    pub security_group: Arc<SpyProvider<SecurityGroup>>,
    pub container_repository: Arc<SpyProvider<ContainerRepository>>,
    pub postgres: Arc<SpyProvider<PostgresDatabase>>,
    pub s3: Arc<SpyProvider<S3Bucket>>,
    pub namespace: Arc<SpyProvider<Namespace>>,
    pub manifest: Arc<SpyProvider<Manifest>>,
    pub github: Arc<SpyProvider<OAuthApp>>,
}

impl Default for SpySet {
    fn default() -> Self {
        Self::new()
    }
}

impl SpySet {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            cluster: Arc::new(SpyProvider::new(log.clone())),
            vpc: Arc::new(SpyProvider::new(log.clone())),
            certificate: Arc::new(SpyProvider::new(log.clone())),
            hosted_zone: Arc::new(SpyProvider::new(log.clone())),
            policy: Arc::new(SpyProvider::new(log.clone())),
            service_account: Arc::new(SpyProvider::new(log.clone())),
            helm: Arc::new(SpyProvider::new(log.clone())),
            identity_pool: Arc::new(SpyProvider::new(log.clone())),
            identity_pool_client: Arc::new(SpyProvider::new(log.clone())),
            secret: Arc::new(SpyProvider::new(log.clone())),
            security_group: Arc::new(SpyProvider::new(log.clone())),
            container_repository: Arc::new(SpyProvider::new(log.clone())),
            postgres: Arc::new(SpyProvider::new(log.clone())),
            s3: Arc::new(SpyProvider::new(log.clone())),
            namespace: Arc::new(SpyProvider::new(log.clone())),
            manifest: Arc::new(SpyProvider::new(log.clone())),
            github: Arc::new(SpyProvider::new(log.clone())),
            log,
        }
    }

    /// Providers backed by these spies.
    pub fn providers(&self) -> Providers {
        Providers {
            cluster: self.cluster.clone(),
            vpc: self.vpc.clone(),
            certificate: self.certificate.clone(),
            hosted_zone: self.hosted_zone.clone(),
            policy: self.policy.clone(),
            service_account: self.service_account.clone(),
            helm: self.helm.clone(),
            identity_pool: self.identity_pool.clone(),
            identity_pool_client: self.identity_pool_client.clone(),
            secret: self.secret.clone(),
            security_group: self.security_group.clone(),
            container_repository: self.container_repository.clone(),
            postgres: self.postgres.clone(),
            s3: self.s3.clone(),
            namespace: self.namespace.clone(),
            manifest: self.manifest.clone(),
            github: self.github.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use okctl_core::{Id, Kind};

    fn opts() -> CreateNamespaceOpts {
        CreateNamespaceOpts {
            id: Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging"),
            namespace: "monitoring".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn records_calls_in_order() {
        let spies = SpySet::new();
        let providers = spies.providers();
        providers.namespace.create(&Ctx::background(), &opts()).await.unwrap();
        providers
            .namespace
            .delete(
                &Ctx::background(),
                &DeleteNamespaceOpts {
                    id: opts().id,
                    namespace: "monitoring".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(spies.log.entries(), ["create namespace", "delete namespace"]);
        assert_eq!(spies.namespace.creates(), 1);
        assert_eq!(spies.namespace.last_create(), Some(opts()));
    }

    #[tokio::test]
    async fn injected_failure_is_returned() {
        let spies = SpySet::new();
        spies
            .namespace
            .fail_create(|| ProviderError::Api("exceeded wait attempts".to_string()));
        let err = spies
            .providers()
            .namespace
            .create(&Ctx::background(), &opts())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Timeout);
        assert_eq!(spies.namespace.creates(), 1);
    }
}

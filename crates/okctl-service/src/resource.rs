//! The generic resource service: validate, provision, persist.

use std::sync::Arc;

use okctl_core::{Ctx, Error, ErrorContext, Keyed, Kind, Resource, Result, Validate};
use okctl_provider::CloudProvider;
use okctl_state::{Repository, ResourceStore, StateStore, Storable};
use tracing::{debug, info};

/// Service for one resource kind.
///
/// Every step short-circuits the ones after it: invalid options never reach
/// the provider, and a failed provider call persists nothing. A provider
/// call that succeeded followed by a failed save leaves the cloud resource
/// unrecorded; re-running the create against an idempotent provider repairs
/// the record.
pub struct ResourceService<R: Resource> {
    provider: Arc<dyn CloudProvider<R>>,
    store: Arc<dyn ResourceStore<R>>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            store: self.store.clone(),
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(provider: Arc<dyn CloudProvider<R>>, store: Arc<dyn ResourceStore<R>>) -> Self {
        Self { provider, store }
    }

    pub async fn create(&self, ctx: &Ctx, opts: &R::Create) -> Result<R> {
        opts.validate().stage("validating inputs")?;

        let resource = ctx
            .run(async { self.provider.create(ctx, opts).await.map_err(Error::from) })
            .await
            .with_stage(|| format!("creating {}", R::KIND))?;

        self.store
            .save(&resource)
            .with_stage(|| format!("storing {}", R::KIND))?;

        info!(kind = R::KIND, key = %resource.key(), "created");
        Ok(resource)
    }

    /// Delete the resource. A resource the provider no longer knows and a
    /// missing local record both count as already deleted.
    pub async fn delete(&self, ctx: &Ctx, opts: &R::Delete) -> Result<()> {
        opts.validate().stage("validating inputs")?;
        let key = opts.key();

        let deleted = ctx
            .run(async { self.provider.delete(ctx, opts).await.map_err(Error::from) })
            .await;
        match deleted {
            Ok(()) => {}
            Err(e) if e.is(Kind::NotExist) => {
                debug!(kind = R::KIND, %key, "already gone at provider");
            }
            Err(e) => return Err(e.stage(format!("deleting {}", R::KIND))),
        }

        let removed = self
            .store
            .remove(opts.id(), &key)
            .with_stage(|| format!("removing {}", R::KIND))?;
        info!(kind = R::KIND, %key, removed, "deleted");
        Ok(())
    }

    /// Stored record under `key`, if any.
    pub fn get(&self, id: &okctl_core::Id, key: &str) -> Result<Option<R>> {
        self.store
            .get(id, key)
            .with_stage(|| format!("reading {}", R::KIND))
    }

    /// Stored record under `key`; `NotExist` when absent.
    pub fn one(&self, id: &okctl_core::Id, key: &str) -> Result<R> {
        self.get(id, key)?
            .ok_or_else(|| Error::not_exist(format!("{} {key} not found", R::KIND)))
    }

    pub fn list(&self, id: &okctl_core::Id) -> Result<Vec<R>> {
        self.store
            .list(id)
            .with_stage(|| format!("listing {}", R::KIND))
    }
}

impl<R: Storable> ResourceService<R> {
    /// Service persisting into the kind's table of `state`.
    pub fn with_state(provider: Arc<dyn CloudProvider<R>>, state: &StateStore) -> Self {
        Self::new(provider, Arc::new(Repository::<R>::new(state.clone())))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use okctl_core::Id;
    use okctl_core::types::*;
    use okctl_provider::ProviderError;
    use okctl_provider::testing::{CallLog, SpySet};
    use okctl_state::{StateError, StateResult};

    use super::*;

    /// Store wrapper recording `save <kind>` / `remove <kind>` into the
    /// provider call log.
    pub(crate) struct RecordingStore<R: Storable> {
        inner: Repository<R>,
        log: CallLog,
        fail_save: bool,
    }

    impl<R: Storable> RecordingStore<R> {
        pub(crate) fn new(state: &StateStore, log: CallLog) -> Self {
            Self {
                inner: Repository::new(state.clone()),
                log,
                fail_save: false,
            }
        }
    }

    impl<R: Storable> ResourceStore<R> for RecordingStore<R> {
        fn save(&self, value: &R) -> StateResult<()> {
            self.log.record(format!("save {}", R::KIND));
            if self.fail_save {
                return Err(StateError::Write("disk full".to_string()));
            }
            self.inner.save(value)
        }

        fn get(&self, id: &Id, key: &str) -> StateResult<Option<R>> {
            Repository::get(&self.inner, id, key)
        }

        fn list(&self, id: &Id) -> StateResult<Vec<R>> {
            self.inner.all(id)
        }

        fn remove(&self, id: &Id, key: &str) -> StateResult<bool> {
            self.log.record(format!("remove {}", R::KIND));
            ResourceStore::remove(&self.inner, id, key)
        }
    }

    pub(crate) fn id() -> Id {
        Id::new("eu-west-1", "123456789012", "staging", "okctl", "okctl-staging")
    }

    fn cluster_opts() -> CreateClusterOpts {
        CreateClusterOpts {
            id: id(),
            cidr: "192.168.0.0/20".to_string(),
            vpc_id: "vpc-123".to_string(),
            ..Default::default()
        }
    }

    fn clusters(spies: &SpySet, state: &StateStore) -> ResourceService<Cluster> {
        ResourceService::new(
            spies.cluster.clone(),
            Arc::new(RecordingStore::<Cluster>::new(state, spies.log.clone())),
        )
    }

    #[tokio::test]
    async fn create_cluster_provisions_then_persists() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);

        let cluster = service.create(&Ctx::background(), &cluster_opts()).await.unwrap();
        assert_eq!(cluster.id, id());
        assert_eq!(cluster.config.metadata.name, "okctl-staging");
        assert_eq!(cluster.config.vpc.id, "vpc-123");

        assert_eq!(spies.log.entries(), ["create cluster", "save cluster"]);
        assert_eq!(spies.cluster.creates(), 1);

        let stored = Repository::<Cluster>::new(state).all(&id()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key(), "okctl-staging");
        assert_eq!(stored[0], cluster);
    }

    #[tokio::test]
    async fn zero_value_options_never_reach_the_provider() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);

        let err = service
            .create(&Ctx::background(), &CreateClusterOpts::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Invalid);
        assert_eq!(err.stages(), ["validating inputs"]);
        assert_eq!(
            err.message(),
            "AccountID: cannot be blank; Cidr: cannot be blank; ClusterName: cannot be blank; \
             Environment: cannot be blank; Region: cannot be blank; Repository: cannot be blank; \
             VpcID: cannot be blank"
        );

        let err = service
            .delete(&Ctx::background(), &DeleteClusterOpts::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Invalid);
        assert_eq!(spies.cluster.creates(), 0);
        assert_eq!(spies.cluster.deletes(), 0);
        assert!(spies.log.entries().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_persists_nothing() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);
        spies.cluster.fail_create(|| ProviderError::Api("AccessDenied".to_string()));

        let err = service.create(&Ctx::background(), &cluster_opts()).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Internal);
        assert_eq!(err.to_string(), "creating cluster: API error: AccessDenied");
        assert_eq!(spies.log.entries(), ["create cluster"]);
        assert!(service.list(&id()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn wait_timeout_surfaces_as_timeout() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);
        spies.cluster.fail_create(|| {
            ProviderError::Stack {
                stack: "eksctl-okctl-staging-cluster".to_string(),
                reason: "ResourceNotReady: exceeded wait attempts".to_string(),
            }
            .context("waiting for cluster")
        });

        let err = service.create(&Ctx::background(), &cluster_opts()).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Timeout);
        assert!(err.kind().is_retryable());
    }

    #[tokio::test]
    async fn save_failure_is_io() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let mut store = RecordingStore::<Cluster>::new(&state, spies.log.clone());
        store.fail_save = true;
        let service = ResourceService::<Cluster>::new(spies.cluster.clone(), Arc::new(store));

        let err = service.create(&Ctx::background(), &cluster_opts()).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Io);
        assert_eq!(err.stages(), ["storing cluster"]);
        // the provider did its part; the record is what is missing
        assert_eq!(spies.cluster.creates(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_key_succeeds() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);
        spies
            .cluster
            .fail_delete(|| ProviderError::NotFound("eksctl-okctl-staging-cluster".to_string()));

        service
            .delete(&Ctx::background(), &DeleteClusterOpts { id: id() })
            .await
            .unwrap();
        assert_eq!(spies.log.entries(), ["delete cluster", "remove cluster"]);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);
        service.create(&Ctx::background(), &cluster_opts()).await.unwrap();

        service
            .delete(&Ctx::background(), &DeleteClusterOpts { id: id() })
            .await
            .unwrap();
        let err = service.one(&id(), "okctl-staging").unwrap_err();
        assert_eq!(err.kind(), Kind::NotExist);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_record() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);
        service.create(&Ctx::background(), &cluster_opts()).await.unwrap();
        spies.cluster.fail_delete(|| ProviderError::Api("DeleteConflict".to_string()));

        let err = service
            .delete(&Ctx::background(), &DeleteClusterOpts { id: id() })
            .await
            .unwrap_err();
        assert_eq!(err.stages(), ["deleting cluster"]);
        assert!(service.get(&id(), "okctl-staging").unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_a_slow_provider() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = clusters(&spies, &state);
        spies.cluster.stall(Duration::from_secs(60));

        let ctx = Ctx::with_timeout(Duration::from_secs(1));
        let err = service.create(&ctx, &cluster_opts()).await.unwrap_err();
        assert_eq!(err.kind(), Kind::Timeout);
        assert_eq!(err.to_string(), "creating cluster: context deadline exceeded");
        assert!(service.list(&id()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn secrets_are_soft_deleted() {
        let spies = SpySet::new();
        let state = StateStore::open_in_memory().unwrap();
        let service = ResourceService::<SecretParameter>::with_state(spies.secret.clone(), &state);
        let secret = service
            .create(
                &Ctx::background(),
                &CreateSecretOpts {
                    id: id(),
                    name: "argocd/secret_key".to_string(),
                    secret: "s3cr3t".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(secret.path, "/okctl/okctl-staging/argocd/secret_key");

        service
            .delete(
                &Ctx::background(),
                &DeleteSecretOpts {
                    id: id(),
                    name: "argocd/secret_key".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(service.list(&id()).unwrap().is_empty());
        let meta = Repository::<SecretParameter>::new(state)
            .metadata(&id(), "argocd/secret_key")
            .unwrap()
            .unwrap();
        assert!(meta.deleted);
    }
}

//! Identity pool: the certificate for the auth domain, then the pool.

use std::sync::Arc;

use okctl_core::types::*;
use okctl_core::{Ctx, Error, ErrorContext, Keyed, Kind, Resource, Result, Validate};
use okctl_provider::IdentityPoolProvider;
use okctl_state::{Repository, ResourceStore, StateStore};
use tracing::{debug, info};

use crate::resource::ResourceService;

#[derive(Clone)]
pub struct IdentityPoolService {
    certificates: ResourceService<Certificate>,
    provider: Arc<dyn IdentityPoolProvider>,
    store: Arc<dyn ResourceStore<IdentityPool>>,
}

impl IdentityPoolService {
    pub fn new(
        certificates: ResourceService<Certificate>,
        provider: Arc<dyn IdentityPoolProvider>,
        state: &StateStore,
    ) -> Self {
        Self {
            certificates,
            provider,
            store: Arc::new(Repository::<IdentityPool>::new(state.clone())),
        }
    }

    /// The pool is created with the certificate for its auth domain, and the
    /// returned pool embeds that certificate.
    pub async fn create(&self, ctx: &Ctx, opts: &CreateIdentityPoolOpts) -> Result<IdentityPool> {
        opts.validate().stage("validating inputs")?;

        let certificate = self
            .certificates
            .create(
                ctx,
                &CreateCertificateOpts {
                    id: opts.id.clone(),
                    fqdn: format!("{}.", opts.auth_domain),
                    domain: opts.auth_domain.clone(),
                    hosted_zone_id: opts.hosted_zone_id.clone(),
                },
            )
            .await
            .stage("creating auth domain certificate")?;

        let pool = ctx
            .run(async {
                self.provider
                    .create_identity_pool(ctx, opts, &certificate)
                    .await
                    .map_err(Error::from)
            })
            .await
            .with_stage(|| format!("creating {}", IdentityPool::KIND))?;

        self.store
            .save(&pool)
            .with_stage(|| format!("storing {}", IdentityPool::KIND))?;

        info!(
            user_pool_id = %pool.user_pool_id,
            auth_domain = %pool.auth_domain,
            "identity pool created"
        );
        Ok(pool)
    }

    /// Delete the pool, then its certificate. The reverse order would leave
    /// a pool pointing at a certificate that no longer exists.
    pub async fn delete(&self, ctx: &Ctx, opts: &DeleteIdentityPoolOpts) -> Result<()> {
        opts.validate().stage("validating inputs")?;

        let deleted = ctx
            .run(async {
                self.provider
                    .delete_identity_pool(ctx, opts)
                    .await
                    .map_err(Error::from)
            })
            .await;
        match deleted {
            Ok(()) => {}
            Err(e) if e.is(Kind::NotExist) => {
                debug!(key = %opts.key(), "identity pool already gone")
            }
            Err(e) => return Err(e.stage(format!("deleting {}", IdentityPool::KIND))),
        }
        self.store
            .remove(&opts.id, &opts.key())
            .with_stage(|| format!("removing {}", IdentityPool::KIND))?;

        self.certificates
            .delete(
                ctx,
                &DeleteCertificateOpts {
                    id: opts.id.clone(),
                    domain: opts.auth_domain.clone(),
                },
            )
            .await
            .stage("deleting auth domain certificate")?;

        info!(auth_domain = %opts.auth_domain, "identity pool deleted");
        Ok(())
    }

    pub fn get(&self, id: &okctl_core::Id) -> Result<Option<IdentityPool>> {
        self.store
            .get(id, &okctl_core::stack::identity_pool(&id.cluster_name))
            .stage("reading identity pool")
    }
}

//! GitHub OAuth apps. The client secret goes to the parameter store; the
//! stored app only references it.

use std::sync::Arc;

use okctl_core::types::github::oauth_client_secret_name;
use okctl_core::types::*;
use okctl_core::{Ctx, Error, ErrorContext, Id, Keyed, Kind, Resource, Result, Validate};
use okctl_provider::GithubProvider;
use okctl_state::{Repository, ResourceStore, StateStore};
use tracing::{debug, info};

use crate::resource::ResourceService;

#[derive(Clone)]
pub struct OAuthAppService {
    provider: Arc<dyn GithubProvider>,
    secrets: ResourceService<SecretParameter>,
    store: Arc<dyn ResourceStore<OAuthApp>>,
}

impl OAuthAppService {
    pub fn new(
        provider: Arc<dyn GithubProvider>,
        secrets: ResourceService<SecretParameter>,
        state: &StateStore,
    ) -> Self {
        Self {
            provider,
            secrets,
            store: Arc::new(Repository::<OAuthApp>::new(state.clone())),
        }
    }

    pub async fn create(&self, ctx: &Ctx, opts: &CreateOAuthAppOpts) -> Result<OAuthApp> {
        opts.validate().stage("validating inputs")?;

        let credentials = ctx
            .run(async { self.provider.create_oauth_app(ctx, opts).await.map_err(Error::from) })
            .await
            .with_stage(|| format!("creating {}", OAuthApp::KIND))?;

        let secret = self
            .secrets
            .create(
                ctx,
                &CreateSecretOpts {
                    id: opts.id.clone(),
                    name: oauth_client_secret_name(&opts.name),
                    secret: credentials.client_secret,
                },
            )
            .await
            .stage("storing client secret")?;

        let app = OAuthApp {
            id: opts.id.clone(),
            organisation: opts.organisation.clone(),
            name: opts.name.clone(),
            site_url: opts.site_url.clone(),
            callback_url: opts.callback_url.clone(),
            client_id: credentials.client_id,
            client_secret: secret.reference(),
        };
        self.store
            .save(&app)
            .with_stage(|| format!("storing {}", OAuthApp::KIND))?;

        info!(app = %app.name, organisation = %app.organisation, "oauth app created");
        Ok(app)
    }

    pub async fn delete(&self, ctx: &Ctx, opts: &DeleteOAuthAppOpts) -> Result<()> {
        opts.validate().stage("validating inputs")?;

        let deleted = ctx
            .run(async { self.provider.delete_oauth_app(ctx, opts).await.map_err(Error::from) })
            .await;
        match deleted {
            Ok(()) => {}
            Err(e) if e.is(Kind::NotExist) => debug!(app = %opts.name, "oauth app already gone"),
            Err(e) => return Err(e.stage(format!("deleting {}", OAuthApp::KIND))),
        }

        self.secrets
            .delete(
                ctx,
                &DeleteSecretOpts {
                    id: opts.id.clone(),
                    name: oauth_client_secret_name(&opts.name),
                },
            )
            .await
            .stage("deleting client secret")?;

        self.store
            .remove(opts.id(), &opts.key())
            .with_stage(|| format!("removing {}", OAuthApp::KIND))?;
        Ok(())
    }

    pub fn get(&self, id: &Id, name: &str) -> Result<Option<OAuthApp>> {
        self.store.get(id, name).stage("reading github oauth app")
    }
}

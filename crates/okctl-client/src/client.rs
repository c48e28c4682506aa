use std::sync::Arc;

use okctl_core::{Error, Request, Response, Result};
use okctl_service::Handler;

use crate::transport::{DirectTransport, RemoteTransport, Transport};

/// Entry point for callers. Implements every capability trait in
/// [`crate::api`] over whichever transport it was built with.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// In-process client over an already composed handler.
    pub fn direct(handler: Arc<dyn Handler>) -> Self {
        Self::new(DirectTransport::new(handler))
    }

    /// Client for the daemon listening at `base_url`.
    pub fn remote(base_url: impl Into<String>) -> Self {
        Self::new(RemoteTransport::new(base_url))
    }

    /// Send `request` and convert the response into the expected type.
    pub async fn call<T>(&self, request: Request) -> Result<T>
    where
        T: TryFrom<Response, Error = Error>,
    {
        let response = self.transport.send(request).await?;
        T::try_from(response)
    }
}

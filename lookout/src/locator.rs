use tracing::{debug, instrument};

use crate::element::ElementHandle;
use crate::errors::WebDriverError;
use crate::poll::Poller;
use crate::protocol::{Executor, ProtocolAction};
use crate::selector::{chain_to_string, Selector};
use std::sync::Arc;
use std::time::Duration;

/// Resolves scope chains into remote element handles.
///
/// A chain of length N costs up to N sequential find round trips, each
/// scoped to the previous link's handle. Links that already resolved are
/// never re-resolved within one call; only the link that has not appeared
/// yet is retried.
pub struct Resolver {
    executor: Arc<Executor>,
    poll_interval: Duration,
}

impl Resolver {
    pub fn new(executor: Arc<Executor>, poll_interval: Duration) -> Self {
        Self {
            executor,
            poll_interval,
        }
    }

    /// Resolve the whole chain, polling each pending link until `budget`
    /// runs out. Used by terminal actions, which need a handle or a final
    /// failure.
    #[instrument(level = "debug", skip(self, chain), fields(chain = %chain_to_string(chain)))]
    pub async fn resolve(
        &self,
        chain: &[Selector],
        budget: Duration,
    ) -> Result<ElementHandle, WebDriverError> {
        if chain.is_empty() {
            return Err(WebDriverError::InvalidSelector(
                "empty scope chain".to_string(),
            ));
        }

        let mut poller = Poller::new(budget, self.poll_interval);
        let mut scope: Option<ElementHandle> = None;
        let mut link = 0;

        while link < chain.len() {
            match self.find_first(scope.as_ref(), &chain[link]).await? {
                Some(handle) => {
                    debug!(link, handle = %handle, "scope link resolved");
                    scope = Some(handle);
                    link += 1;
                }
                None if poller.should_retry() => poller.pause().await,
                None => {
                    return Err(WebDriverError::NotFound(format!(
                        "element <{}> not found after {:?} ({} retries)",
                        chain_to_string(&chain[..=link]),
                        poller.elapsed(),
                        poller.retries()
                    )));
                }
            }
        }

        scope.ok_or_else(|| WebDriverError::Internal("resolved chain produced no handle".into()))
    }

    /// One non-polling pass over the chain, for callers that already run
    /// their own poll loop (an expectation's attempt). `Ok(None)` means some
    /// link has not appeared yet.
    pub async fn try_resolve(
        &self,
        chain: &[Selector],
    ) -> Result<Option<ElementHandle>, WebDriverError> {
        let mut scope: Option<ElementHandle> = None;
        for selector in chain {
            match self.find_first(scope.as_ref(), selector).await? {
                Some(handle) => scope = Some(handle),
                None => return Ok(None),
            }
        }
        Ok(scope)
    }

    /// Issue one find for `selector` under `scope`, taking the first handle
    /// of a multi-match. A failed round trip reads as "not observed yet".
    async fn find_first(
        &self,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> Result<Option<ElementHandle>, WebDriverError> {
        if let Selector::Invalid(reason) = selector {
            return Err(WebDriverError::InvalidSelector(reason.clone()));
        }

        let action = match scope {
            None => ProtocolAction::FindElements {
                selector: selector.clone(),
            },
            Some(parent) => ProtocolAction::FindChildElements {
                parent: parent.clone(),
                selector: selector.clone(),
            },
        };

        let result = self.executor.execute(&action).await?;
        if !result.succeeded {
            return Ok(None);
        }
        Ok(result.element_handles().into_iter().next())
    }
}

//! Conversation persistence hook.
//!
//! Follows the same pattern as the agent-facing traits elsewhere: an RPITIT
//! `TranscriptStore` for implementors, an object-safe `TranscriptStoreDyn`
//! with a blanket impl, and `BoxTranscriptStore` for runtime selection.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use chatloop_types::error::PersistError;

use super::session::SessionAccumulator;

/// Saves the session transcript somewhere durable.
///
/// Implementations live in chatloop-infra (e.g., `ConversationStore`).
pub trait TranscriptStore: Send + Sync {
    /// Persist the current transcript, returning where it was written.
    fn persist(
        &self,
        session: &SessionAccumulator,
    ) -> impl Future<Output = Result<PathBuf, PersistError>> + Send;
}

/// Object-safe version of [`TranscriptStore`] with boxed futures.
pub trait TranscriptStoreDyn: Send + Sync {
    fn persist_boxed<'a>(
        &'a self,
        session: &'a SessionAccumulator,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf, PersistError>> + Send + 'a>>;
}

impl<T: TranscriptStore> TranscriptStoreDyn for T {
    fn persist_boxed<'a>(
        &'a self,
        session: &'a SessionAccumulator,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf, PersistError>> + Send + 'a>> {
        Box::pin(self.persist(session))
    }
}

/// Type-erased transcript store.
pub struct BoxTranscriptStore {
    inner: Box<dyn TranscriptStoreDyn + Send + Sync>,
}

impl BoxTranscriptStore {
    pub fn new<T: TranscriptStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn persist(&self, session: &SessionAccumulator) -> Result<PathBuf, PersistError> {
        self.inner.persist_boxed(session).await
    }
}

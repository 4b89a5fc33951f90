//! Starting the pool and talking to it from outside the actor system.

use std::sync::Arc;
use std::time::Duration;

use ractor::rpc::CallResult;
use ractor::{Actor, ActorRef};
use scribe_core::{ArticleId, ProcessingEvent};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::dispatcher::{Dispatcher, DispatcherArgs};
use crate::messages::{ActorError, DispatcherMessage, PoolStats};
use crate::processor::ArticleProcessor;

const CALL_TIMEOUT: Duration = Duration::from_secs(5);
const EVENT_CAPACITY: usize = 1024;

/// Cloneable handle to a running processing pool.
#[derive(Clone)]
pub struct ProcessingHandle {
    dispatcher: ActorRef<DispatcherMessage>,
    event_tx: broadcast::Sender<ProcessingEvent>,
}

impl ProcessingHandle {
    /// Begin processing an article.
    ///
    /// Returns once the article is queued; the outcome is written to the
    /// article record. Each article id must be submitted at most once while
    /// it is in flight.
    pub async fn submit(&self, article_id: ArticleId) -> Result<(), ActorError> {
        call(&self.dispatcher, |reply| DispatcherMessage::Submit { article_id, reply })
            .await?
    }

    /// Subscribe to pool events. Only events sent after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessingEvent> {
        self.event_tx.subscribe()
    }

    pub async fn stats(&self) -> Result<PoolStats, ActorError> {
        call(&self.dispatcher, |reply| DispatcherMessage::GetStats { reply }).await
    }

    /// Stop accepting work. Articles still waiting are dropped; articles in
    /// flight run to completion before the pool task ends.
    pub fn shutdown(&self) -> Result<(), ActorError> {
        self.dispatcher
            .send_message(DispatcherMessage::Shutdown)
            .map_err(|e| ActorError::Actor(e.to_string()))
    }
}

async fn call<T, F>(dispatcher: &ActorRef<DispatcherMessage>, msg: F) -> Result<T, ActorError>
where
    T: Send + 'static,
    F: FnOnce(ractor::RpcReplyPort<T>) -> DispatcherMessage,
{
    let result = ractor::rpc::call(dispatcher, msg, Some(CALL_TIMEOUT))
        .await
        .map_err(|e| ActorError::Actor(e.to_string()))?;

    match result {
        CallResult::Success(value) => Ok(value),
        CallResult::Timeout => Err(ActorError::Timeout),
        CallResult::SenderError => Err(ActorError::Actor("dispatcher dropped the reply".into())),
    }
}

/// Start a pool of `config.workers` workers running `processor`.
///
/// The returned join handle completes after [`ProcessingHandle::shutdown`]
/// once every in-flight article has finished.
pub async fn start_processing(
    processor: Arc<dyn ArticleProcessor>,
    config: PoolConfig,
) -> Result<(ProcessingHandle, JoinHandle<()>), ActorError> {
    config.validate()?;

    let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
    let args = DispatcherArgs {
        config,
        processor,
        event_tx: event_tx.clone(),
    };

    let (dispatcher, handle) = Actor::spawn(None, Dispatcher, args)
        .await
        .map_err(|e| ActorError::Actor(format!("Failed to start dispatcher: {}", e)))?;

    Ok((
        ProcessingHandle {
            dispatcher,
            event_tx,
        },
        handle,
    ))
}

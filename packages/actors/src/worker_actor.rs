//! Worker actor for processing articles.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use scribe_core::{ArticleId, ProcessingEvent};
use tokio::sync::broadcast;

use crate::messages::{DispatcherMessage, WorkerMessage};
use crate::processor::ArticleProcessor;

/// State for the worker actor.
pub struct WorkerActorState {
    /// Unique worker ID.
    pub worker_id: String,
    /// Article currently being processed.
    pub current_article: Option<ArticleId>,
    /// Dispatcher actor reference.
    pub dispatcher: ActorRef<DispatcherMessage>,
    pub processor: Arc<dyn ArticleProcessor>,
    /// Event broadcaster.
    pub event_tx: broadcast::Sender<ProcessingEvent>,
}

impl WorkerActorState {
    /// Check if the worker is idle.
    pub fn is_idle(&self) -> bool {
        self.current_article.is_none()
    }

    fn broadcast(&self, event: ProcessingEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub worker_id: String,
    pub dispatcher: ActorRef<DispatcherMessage>,
    pub processor: Arc<dyn ArticleProcessor>,
    pub event_tx: broadcast::Sender<ProcessingEvent>,
}

/// Worker actor that runs one article at a time.
///
/// Messages are handled strictly in order, so a worker never holds more
/// than one article.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::debug!(worker_id = %args.worker_id, "Starting worker");

        Ok(WorkerActorState {
            worker_id: args.worker_id,
            current_article: None,
            dispatcher: args.dispatcher,
            processor: args.processor,
            event_tx: args.event_tx,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Process { article_id } => {
                if !state.is_idle() {
                    tracing::warn!(worker_id = %state.worker_id, %article_id, "Worker already busy");
                }
                state.current_article = Some(article_id);

                state.broadcast(ProcessingEvent::Started {
                    article_id,
                    worker_id: state.worker_id.clone(),
                    timestamp: Utc::now(),
                });

                let started = Instant::now();
                state.processor.process(article_id).await;
                let duration_ms = started.elapsed().as_millis() as u64;

                state.current_article = None;
                state.broadcast(ProcessingEvent::Finished {
                    article_id,
                    worker_id: state.worker_id.clone(),
                    duration_ms,
                    timestamp: Utc::now(),
                });

                if state
                    .dispatcher
                    .send_message(DispatcherMessage::WorkFinished {
                        worker: myself.get_id(),
                        article_id,
                    })
                    .is_err()
                {
                    tracing::debug!(worker_id = %state.worker_id, "Dispatcher gone, stopping worker");
                    myself.stop(None);
                }
            }

            WorkerMessage::Shutdown => {
                tracing::debug!(worker_id = %state.worker_id, "Shutting down worker");
                myself.stop(None);
            }
        }

        Ok(())
    }
}

//! Dispatcher actor: the bounded FIFO in front of the worker pool.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use ractor::{Actor, ActorId, ActorProcessingErr, ActorRef, SupervisionEvent};
use scribe_core::{ArticleId, ProcessingEvent};
use tokio::sync::broadcast;

use crate::config::PoolConfig;
use crate::messages::{ActorError, DispatcherMessage, PoolStats, WorkerMessage};
use crate::processor::ArticleProcessor;
use crate::worker_actor::{WorkerActor, WorkerArgs};

struct WorkerSlot {
    worker_id: String,
    actor: ActorRef<WorkerMessage>,
    current: Option<(ArticleId, Instant)>,
}

/// State for the dispatcher actor.
pub struct DispatcherState {
    config: PoolConfig,
    processor: Arc<dyn ArticleProcessor>,
    event_tx: broadcast::Sender<ProcessingEvent>,
    /// Accepted articles not yet handed to a worker, oldest first.
    pending: VecDeque<ArticleId>,
    workers: HashMap<ActorId, WorkerSlot>,
    idle: VecDeque<ActorId>,
    worker_counter: u64,
    submitted: u64,
    finished: u64,
    accepting: bool,
}

impl DispatcherState {
    fn new(args: DispatcherArgs) -> Self {
        Self {
            config: args.config,
            processor: args.processor,
            event_tx: args.event_tx,
            pending: VecDeque::new(),
            workers: HashMap::new(),
            idle: VecDeque::new(),
            worker_counter: 0,
            submitted: 0,
            finished: 0,
            accepting: true,
        }
    }

    /// Generate a unique worker ID.
    fn next_worker_id(&mut self) -> String {
        self.worker_counter += 1;
        format!("worker-{}", self.worker_counter)
    }

    fn broadcast(&self, event: ProcessingEvent) {
        let _ = self.event_tx.send(event);
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.workers.len(),
            busy: self.workers.values().filter(|w| w.current.is_some()).count(),
            pending: self.pending.len(),
            submitted: self.submitted,
            finished: self.finished,
        }
    }

    /// Hand pending articles to idle workers until one side runs out.
    fn dispatch(&mut self) {
        while !self.pending.is_empty() {
            let Some(actor_id) = self.idle.pop_front() else {
                break;
            };
            let Some(slot) = self.workers.get_mut(&actor_id) else {
                continue;
            };
            let Some(article_id) = self.pending.pop_front() else {
                break;
            };

            if slot
                .actor
                .send_message(WorkerMessage::Process { article_id })
                .is_err()
            {
                // The worker is on its way out; its replacement picks this up.
                tracing::warn!(worker_id = %slot.worker_id, %article_id, "Worker unreachable, requeueing");
                self.pending.push_front(article_id);
                continue;
            }

            tracing::debug!(worker_id = %slot.worker_id, %article_id, "Dispatched article");
            slot.current = Some((article_id, Instant::now()));
        }
    }
}

/// Dispatcher actor arguments.
pub struct DispatcherArgs {
    pub config: PoolConfig,
    pub processor: Arc<dyn ArticleProcessor>,
    pub event_tx: broadcast::Sender<ProcessingEvent>,
}

async fn spawn_worker(
    myself: &ActorRef<DispatcherMessage>,
    state: &mut DispatcherState,
) -> Result<(), ActorProcessingErr> {
    let worker_id = state.next_worker_id();
    let args = WorkerArgs {
        worker_id: worker_id.clone(),
        dispatcher: myself.clone(),
        processor: state.processor.clone(),
        event_tx: state.event_tx.clone(),
    };

    let (actor, _handle) = Actor::spawn_linked(None, WorkerActor, args, myself.get_cell())
        .await
        .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn worker: {}", e)))?;

    let actor_id = actor.get_id();
    state.workers.insert(
        actor_id,
        WorkerSlot {
            worker_id,
            actor,
            current: None,
        },
    );
    state.idle.push_back(actor_id);
    Ok(())
}

/// Dispatcher actor that owns the pending queue and the workers.
///
/// Workers are linked children: one that dies is replaced while the pool
/// is accepting work. After `Shutdown` the dispatcher stops once the last
/// worker has finished its current article.
pub struct Dispatcher;

impl Actor for Dispatcher {
    type Msg = DispatcherMessage;
    type State = DispatcherState;
    type Arguments = DispatcherArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let mut state = DispatcherState::new(args);
        for _ in 0..state.config.workers {
            spawn_worker(&myself, &mut state).await?;
        }

        tracing::info!(
            workers = state.config.workers,
            max_pending = state.config.max_pending,
            "Started processing pool"
        );
        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DispatcherMessage::Submit { article_id, reply } => {
                if !state.accepting {
                    let _ = reply.send(Err(ActorError::ShuttingDown));
                    return Ok(());
                }

                if state.idle.is_empty() && state.pending.len() >= state.config.max_pending {
                    tracing::warn!(%article_id, pending = state.pending.len(), "Pending queue full");
                    let _ = reply.send(Err(ActorError::QueueFull));
                    return Ok(());
                }

                state.pending.push_back(article_id);
                state.submitted += 1;
                state.broadcast(ProcessingEvent::Submitted {
                    article_id,
                    timestamp: Utc::now(),
                });
                state.dispatch();

                let _ = reply.send(Ok(()));
            }

            DispatcherMessage::WorkFinished { worker, article_id } => {
                let Some(slot) = state.workers.get_mut(&worker) else {
                    return Ok(());
                };
                slot.current = None;
                state.finished += 1;
                tracing::debug!(worker_id = %slot.worker_id, %article_id, "Worker finished article");

                if state.accepting {
                    state.idle.push_back(worker);
                    state.dispatch();
                } else {
                    let _ = slot.actor.send_message(WorkerMessage::Shutdown);
                }
            }

            DispatcherMessage::GetStats { reply } => {
                let _ = reply.send(state.stats());
            }

            DispatcherMessage::Shutdown => {
                tracing::info!("Shutting down processing pool");
                state.accepting = false;

                if !state.pending.is_empty() {
                    tracing::warn!(
                        dropped = state.pending.len(),
                        "Dropping articles that never started"
                    );
                    state.pending.clear();
                }

                for actor_id in state.idle.drain(..) {
                    if let Some(slot) = state.workers.get(&actor_id) {
                        let _ = slot.actor.send_message(WorkerMessage::Shutdown);
                    }
                }

                if state.workers.is_empty() {
                    myself.stop(None);
                }
            }
        }

        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let (cell, reason) = match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => (cell, reason),
            SupervisionEvent::ActorFailed(cell, err) => (cell, Some(err.to_string())),
            _ => return Ok(()),
        };

        let actor_id = cell.get_id();
        let Some(slot) = state.workers.remove(&actor_id) else {
            return Ok(());
        };
        state.idle.retain(|id| *id != actor_id);

        if let Some((article_id, started)) = slot.current {
            tracing::error!(
                worker_id = %slot.worker_id,
                %article_id,
                reason = reason.as_deref().unwrap_or("unknown"),
                "Worker died while processing article"
            );
            state.finished += 1;
            state.broadcast(ProcessingEvent::Finished {
                article_id,
                worker_id: slot.worker_id.clone(),
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });
        }

        if state.accepting {
            tracing::warn!(worker_id = %slot.worker_id, "Replacing worker");
            spawn_worker(&myself, state).await?;
            state.dispatch();
        } else if state.workers.is_empty() {
            myself.stop(None);
        }

        Ok(())
    }
}

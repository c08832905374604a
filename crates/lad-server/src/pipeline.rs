//! Debounced derivation pipeline.
//!
//! One task owns a session's [`DerivedState`] and is its only mutator. Edits
//! arrive over a channel and are applied immediately; every accepted edit bumps
//! the generation and restarts the debounce timer. When the timer fires the
//! geometry is re-derived and the async resolutions (declination, per-point
//! elevation) start, all tagged with the generation they were started for.
//! A result is merged only while that generation is still current, so a burst
//! of edits commits exactly once, with the latest inputs.
//!
//! Phases: Idle -> Scheduled -> Computing -> Idle, or Computing -> Scheduled
//! when an edit supersedes the running computation.

use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use lad_core::{DeclinationModel, DeclinationSource, DerivedState, Edit, EditError, Phase, PointId};

use crate::config::Config;
use crate::elevation::ElevationResolver;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub debounce: Duration,
    pub declination: DeclinationModel,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            declination: config.declination,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            declination: DeclinationModel::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Rejected(#[from] EditError),
    #[error("derivation pipeline has stopped")]
    Closed,
}

enum Command {
    /// Apply an edit and report whether the state at that point accepted it.
    Edit {
        edit: Edit,
        reply: oneshot::Sender<Result<(), EditError>>,
    },
    /// Reply with the generation once every earlier command is applied.
    Sync(oneshot::Sender<u64>),
}

#[derive(Debug)]
enum Resolved {
    Declination(f64),
    Elevation { point: PointId, meters: f64 },
}

#[derive(Debug)]
struct Resolution {
    generation: u64,
    resolved: Resolved,
}

/// Cloneable handle to a running pipeline. The pipeline stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct PipelineHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<DerivedState>,
}

impl PipelineHandle {
    /// Apply an edit. It is validated by the pipeline in submission order,
    /// so it sees every edit queued before it.
    pub async fn submit(&self, edit: Edit) -> Result<(), PipelineError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(Command::Edit { edit, reply })
            .map_err(|_| PipelineError::Closed)?;
        outcome.await.map_err(|_| PipelineError::Closed)??;
        Ok(())
    }

    pub fn snapshot(&self) -> DerivedState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every committed change.
    pub fn subscribe(&self) -> watch::Receiver<DerivedState> {
        self.state.clone()
    }

    /// Wait until all edits submitted so far have been derived and the
    /// pipeline is idle again.
    pub async fn settled(&self) -> Result<DerivedState, PipelineError> {
        let (reply, generation) = oneshot::channel();
        self.commands
            .send(Command::Sync(reply))
            .map_err(|_| PipelineError::Closed)?;
        let generation = generation.await.map_err(|_| PipelineError::Closed)?;

        let mut state = self.state.clone();
        let settled = state
            .wait_for(|s| s.generation >= generation && s.phase == Phase::Idle)
            .await
            .map_err(|_| PipelineError::Closed)?;
        Ok(settled.clone())
    }
}

/// Start a pipeline for a new form session.
pub fn spawn_pipeline(config: PipelineConfig, resolver: Arc<ElevationResolver>) -> PipelineHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(DerivedState::default());

    let pipeline = Pipeline {
        commands: commands_rx,
        state: state_tx,
        resolver,
        config,
        outstanding: 0,
    };
    tokio::spawn(pipeline.run());

    PipelineHandle {
        commands: commands_tx,
        state: state_rx,
    }
}

struct Pipeline {
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<DerivedState>,
    resolver: Arc<ElevationResolver>,
    config: PipelineConfig,
    /// Resolutions still pending for the current generation.
    outstanding: usize,
}

impl Pipeline {
    async fn run(mut self) {
        let debounce = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(debounce);
        let mut armed = false;
        let mut in_flight: FuturesUnordered<BoxFuture<'static, Resolution>> =
            FuturesUnordered::new();

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    match command {
                        Command::Edit { edit, reply } => {
                            let outcome = self.on_edit(edit);
                            if outcome.is_ok() {
                                debounce.as_mut().reset(Instant::now() + self.config.debounce);
                                armed = true;
                            }
                            let _ = reply.send(outcome);
                        }
                        Command::Sync(reply) => {
                            let _ = reply.send(self.state.borrow().generation);
                        }
                    }
                }
                () = &mut debounce, if armed => {
                    armed = false;
                    for job in self.start_computation() {
                        in_flight.push(job);
                    }
                }
                Some(resolution) = in_flight.next(), if !in_flight.is_empty() => {
                    self.on_resolved(resolution);
                }
            }
        }

        tracing::debug!("Derivation pipeline stopped");
    }

    /// Apply a raw edit against the latest state.
    fn on_edit(&mut self, edit: Edit) -> Result<(), EditError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match edit.apply(state) {
            Ok(()) => {
                state.generation += 1;
                state.phase = Phase::Scheduled;
                true
            }
            Err(err) => {
                outcome = Err(err);
                false
            }
        });

        match &outcome {
            // Anything still in flight belongs to an older generation now.
            Ok(()) => self.outstanding = 0,
            Err(err) => tracing::info!("Rejected edit {:?}: {}", edit, err),
        }
        outcome
    }

    /// Re-derive geometry and start the async resolutions for the current
    /// generation.
    fn start_computation(&mut self) -> Vec<BoxFuture<'static, Resolution>> {
        let mut jobs: Vec<BoxFuture<'static, Resolution>> = Vec::new();
        let mut generation = 0;

        self.state.send_modify(|state| {
            generation = state.generation;
            state.derive_geometry();

            if state.place_kind().is_some() && state.points.center.is_populated() {
                let (lat, lng) = state.points.center.decimal();
                let model = self.config.declination;
                let as_of = Utc::now();
                jobs.push(Box::pin(async move {
                    Resolution {
                        generation,
                        resolved: Resolved::Declination(round_to_hundredths(
                            model.declination(lat, lng, as_of),
                        )),
                    }
                }));
            }

            for point in state.active_point_ids() {
                let (lat, lng) = state.points.get(point).decimal();
                let resolver = Arc::clone(&self.resolver);
                jobs.push(Box::pin(async move {
                    let meters = resolver.resolve(lat, lng).await;
                    Resolution {
                        generation,
                        resolved: Resolved::Elevation { point, meters },
                    }
                }));
            }

            if jobs.is_empty() {
                state.phase = Phase::Idle;
                state.busy = false;
            } else {
                state.phase = Phase::Computing;
                state.busy = true;
            }
        });

        self.outstanding = jobs.len();
        if jobs.is_empty() {
            tracing::debug!("Generation {} committed with nothing to resolve", generation);
        } else {
            tracing::debug!(
                "Generation {} computing: {} resolution(s)",
                generation,
                jobs.len()
            );
        }
        jobs
    }

    fn on_resolved(&mut self, resolution: Resolution) {
        let current = self.state.borrow().generation;
        if resolution.generation != current {
            tracing::debug!(
                "Discarding stale {:?} from generation {} (current {})",
                resolution.resolved,
                resolution.generation,
                current
            );
            return;
        }

        self.outstanding = self.outstanding.saturating_sub(1);
        let settled = self.outstanding == 0;

        self.state.send_if_modified(|state| {
            let mut changed = match resolution.resolved {
                Resolved::Declination(degrees) => {
                    let value = replace_if_changed(&mut state.declination_deg, degrees);
                    let source = replace_if_changed(
                        &mut state.declination_source,
                        DeclinationSource::Estimated,
                    );
                    value || source
                }
                Resolved::Elevation { point, meters } => replace_if_changed(
                    &mut state.points.get_mut(point).elevation,
                    Some(format_elevation(meters)),
                ),
            };
            if settled {
                changed |= replace_if_changed(&mut state.phase, Phase::Idle);
                changed |= replace_if_changed(&mut state.busy, false);
            }
            changed
        });

        if settled {
            tracing::debug!("Generation {} committed", current);
        }
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn format_elevation(meters: f64) -> String {
    // Adding 0.0 turns -0.0 into 0.0.
    format!("{:.0}", meters.round() + 0.0)
}

//! Per-tick actor bookkeeping.
//!
//! Each tick resolves the world, diffs the actor array, creates tracked
//! actors for new addresses that pass classification, refreshes every
//! tracked actor, and evicts the ones that unloaded or stopped reading.

use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::actor::{ClassifierRules, TrackedActor};
use crate::config::{ActorsConfig, Config};
use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::Layout;
use crate::names::NamePool;
use crate::offset::OffsetsCollection;
use crate::radar::{BlipFrame, BlipStyle, Presenter, RadarView, ViewTransform};
use crate::retry::RetryStrategy;
use crate::world::{ActorSnapshot, NewActor, Viewpoint};

/// Counts from one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub created: usize,
    pub refreshed: usize,
    pub evicted: usize,
    /// Addresses in the actor array
    pub live: usize,
    /// Actors tracked after the tick
    pub tracked: usize,
}

struct Entry<B> {
    actor: TrackedActor,
    style: BlipStyle,
    blip: B,
}

pub struct ActorTracker<P: Presenter> {
    offsets: OffsetsCollection,
    layout: Layout,
    rules: ClassifierRules,
    actors_config: ActorsConfig,
    names: NamePool,
    snapshot: ActorSnapshot,
    radar: RadarView,
    viewpoint: Viewpoint,
    entries: Vec<Entry<P::Blip>>,
}

impl<P: Presenter> ActorTracker<P> {
    pub fn new(offsets: OffsetsCollection, config: &Config) -> Self {
        Self {
            names: NamePool::new(offsets.names).with_name_logging(config.debug.fnames),
            offsets,
            layout: config.layout.clone(),
            rules: ClassifierRules::from_config(config),
            actors_config: config.actors.clone(),
            snapshot: ActorSnapshot::new(),
            radar: RadarView::new(config.radar.window_size, config.radar.max_range),
            viewpoint: Viewpoint::default(),
            entries: Vec::new(),
        }
    }

    /// Camera and pawn as of the last successful tick.
    pub fn viewpoint(&self) -> &Viewpoint {
        &self.viewpoint
    }

    pub fn radar(&self) -> &RadarView {
        &self.radar
    }

    pub fn radar_mut(&mut self) -> &mut RadarView {
        &mut self.radar
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform::new(&self.viewpoint, &self.radar)
    }

    pub fn actors(&self) -> impl Iterator<Item = &TrackedActor> {
        self.entries.iter().map(|entry| &entry.actor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> &NamePool {
        &self.names
    }

    /// Run one poll. A fault while resolving the world or the actor array
    /// returns [`Error::WorldUnavailable`] and leaves every tracked actor
    /// and its blip untouched.
    pub fn tick<R: ReadMemory>(&mut self, reader: &R, presenter: &mut P) -> Result<TickSummary> {
        let (viewpoint, new_actors) = self
            .poll_world(reader)
            .map_err(Error::world_unavailable)?;
        self.viewpoint = viewpoint;

        let mut summary = TickSummary {
            live: self.snapshot.len(),
            ..Default::default()
        };

        for new_actor in new_actors {
            if self.track_new(reader, presenter, new_actor) {
                summary.created += 1;
            }
        }

        let transform = ViewTransform::new(&viewpoint, &self.radar);
        for mut entry in mem::take(&mut self.entries) {
            let address = entry.actor.address();
            if self.snapshot.contains(address) && address != viewpoint.pawn {
                match entry.actor.refresh(reader, &self.layout) {
                    Ok(()) => {
                        let frame = BlipFrame::build(&entry.actor, entry.style, &transform, &viewpoint);
                        presenter.update(&mut entry.blip, &frame);
                        self.entries.push(entry);
                        summary.refreshed += 1;
                        continue;
                    }
                    Err(e) => debug!("{}", e),
                }
            }

            debug!("Evicting {} {:#x}", entry.actor.kind(), address);
            presenter.release(entry.blip);
            summary.evicted += 1;
        }

        summary.tracked = self.entries.len();
        Ok(summary)
    }

    /// [`ActorTracker::tick`] with a bounded retry loop around an
    /// unavailable world.
    ///
    /// `wait` sleeps for the given delay and returns `true` if the caller is
    /// shutting down, in which case `Ok(None)` is returned. A target that
    /// reports itself gone is still retried. Running out of attempts is
    /// fatal: [`Error::ProcessExited`] when the target is gone by then,
    /// [`Error::TargetStalled`] otherwise.
    pub fn tick_with_retry<R, S, W>(
        &mut self,
        reader: &R,
        presenter: &mut P,
        strategy: &S,
        mut wait: W,
    ) -> Result<Option<TickSummary>>
    where
        R: ReadMemory,
        S: RetryStrategy,
        W: FnMut(Duration) -> bool,
    {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            let err = match self.tick(reader, presenter) {
                Ok(summary) => {
                    if attempts > 0 {
                        info!("World readable again after {} attempts", attempts);
                    }
                    return Ok(Some(summary));
                }
                Err(e) if e.is_world_unavailable() => e,
                Err(e) => return Err(e),
            };

            attempts += 1;
            let elapsed = started.elapsed();
            let Some(delay) = strategy.delay(attempts, elapsed) else {
                // liveness is advisory here; it only picks the error
                if !reader.is_alive() {
                    return Err(Error::ProcessExited {
                        pid: reader.pid().unwrap_or_default(),
                    });
                }
                return Err(Error::TargetStalled { attempts, elapsed });
            };

            if attempts == 1 {
                warn!("{}; retrying every {}ms", err, delay.as_millis());
            } else {
                debug!(
                    "World still unavailable (attempt {}/{}): {}",
                    attempts,
                    strategy.max_attempts(),
                    err
                );
            }

            if wait(delay) {
                return Ok(None);
            }
        }
    }

    /// Release every blip, e.g. on shutdown.
    pub fn clear(&mut self, presenter: &mut P) {
        for entry in self.entries.drain(..) {
            presenter.release(entry.blip);
        }
    }

    fn poll_world<R: ReadMemory>(&mut self, reader: &R) -> Result<(Viewpoint, Vec<NewActor>)> {
        let world = reader.read_ptr(self.offsets.world)?;
        let viewpoint = Viewpoint::read(reader, world, &self.layout)?;
        let new_actors = self.snapshot.poll(reader, world, &self.layout)?;
        Ok((viewpoint, new_actors))
    }

    fn track_new<R: ReadMemory>(&mut self, reader: &R, presenter: &mut P, new_actor: NewActor) -> bool {
        let NewActor { address, handle } = new_actor;
        let type_name = match self.names.resolve(reader, handle) {
            Ok(name) => name,
            Err(e) => {
                debug!("Name of actor {:#x} unresolved: {}", address, e);
                self.snapshot.mark_unresolved(address);
                return false;
            }
        };

        let Some(kind) = self.rules.classify(address, &type_name, self.viewpoint.pawn) else {
            return false;
        };

        let actor = TrackedActor::new(address, kind, type_name);
        let style = BlipStyle::for_actor(&actor, &self.actors_config);
        debug!("Tracking {} {} at {:#x}", kind, actor.type_name(), address);
        let blip = presenter.create(&actor, style);
        self.entries.push(Entry { actor, style, blip });
        true
    }
}

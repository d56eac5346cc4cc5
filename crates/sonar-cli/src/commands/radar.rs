//! Radar mode: attach, resolve offsets, then poll and draw until stopped.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::Result;
use sonar_core::{ActorTracker, Config, FixedDelay, MemoryReader, RadarView, save_offsets};
use tracing::{debug, error, info, warn};

use super::Target;
use crate::input::{self, KeyAction};
use crate::offsets;
use crate::presenter::{ConsolePresenter, TerminalGuard};
use crate::shutdown::{ShutdownSignal, StopReason};

/// Run the radar.
pub fn run(
    config: &Config,
    target: &Target,
    offsets_file: Option<&Path>,
    save: bool,
) -> Result<()> {
    info!("sonar {}", env!("CARGO_PKG_VERSION"));

    let process = target.open(config)?;
    let reader = MemoryReader::new(&process);

    let resolved = offsets::resolve(&reader, config, offsets_file, target.signatures.as_deref())?;
    info!(
        "World at {:#x}, names at {:#x}",
        resolved.offsets.world, resolved.offsets.names
    );
    if save
        && resolved.scanned
        && let Some(path) = offsets_file
    {
        match save_offsets(path, &resolved.offsets) {
            Ok(()) => info!("Saved offsets to {}", path.display()),
            Err(e) => warn!("Failed to save offsets to {}: {}", path.display(), e),
        }
    }

    let shutdown = Arc::new(ShutdownSignal::new());
    shutdown.install_ctrlc_handler()?;

    let (key_tx, key_rx) = mpsc::channel();
    let _keyboard_handle = input::spawn_keyboard_monitor(Arc::clone(&shutdown), key_tx);

    let mut tracker = ActorTracker::new(resolved.offsets, config);
    let mut presenter = ConsolePresenter::new();
    let strategy = FixedDelay::from_config(&config.retry);
    let frame_interval = config.frame_interval();

    let result = {
        let _terminal = TerminalGuard::enter()?;
        frame_loop(
            &reader,
            &mut tracker,
            &mut presenter,
            &strategy,
            &shutdown,
            &key_rx,
            frame_interval,
        )
    };

    tracker.clear(&mut presenter);

    if let Err(e) = &result {
        error!("Radar stopped: {:#}", e);
    }

    match shutdown.reason() {
        Some(StopReason::Interrupted) => info!("Interrupted, shutting down"),
        Some(StopReason::QuitKey) => info!("Quit requested, shutting down"),
        None => {}
    }
    // Wake the keyboard thread if the loop ended on an error
    shutdown.trigger(StopReason::Interrupted);

    result
}

fn frame_loop(
    reader: &MemoryReader,
    tracker: &mut ActorTracker<ConsolePresenter>,
    presenter: &mut ConsolePresenter,
    strategy: &FixedDelay,
    shutdown: &ShutdownSignal,
    keys: &Receiver<KeyAction>,
    frame_interval: Duration,
) -> Result<()> {
    while !shutdown.is_shutdown() {
        let frame_start = Instant::now();

        drain_keys(keys, tracker.radar_mut());

        // zoom stays live while the world is being retried
        let mut radar = *tracker.radar();
        let ticked = tracker.tick_with_retry(reader, presenter, strategy, |delay| {
            wait_with_keys(shutdown, keys, &mut radar, delay)
        })?;
        *tracker.radar_mut() = radar;

        let Some(summary) = ticked else {
            break;
        };
        if summary.created > 0 || summary.evicted > 0 {
            debug!(
                "Tick: +{} -{} ({} tracked)",
                summary.created, summary.evicted, summary.tracked
            );
        }

        presenter.render(tracker, &summary)?;

        if wait_with_keys(
            shutdown,
            keys,
            tracker.radar_mut(),
            frame_interval.saturating_sub(frame_start.elapsed()),
        ) {
            break;
        }
    }
    Ok(())
}

/// Apply pending zoom keys, then sleep. Returns `true` on shutdown.
fn wait_with_keys(
    shutdown: &ShutdownSignal,
    keys: &Receiver<KeyAction>,
    radar: &mut RadarView,
    delay: Duration,
) -> bool {
    drain_keys(keys, radar);
    shutdown.wait(delay)
}

fn drain_keys(keys: &Receiver<KeyAction>, radar: &mut RadarView) {
    for action in keys.try_iter() {
        match action {
            KeyAction::ZoomIn => radar.zoom_in(),
            KeyAction::ZoomOut => radar.zoom_out(),
            KeyAction::Quit => continue,
        }
        debug!("Radar range {:.0}", radar.range());
    }
}

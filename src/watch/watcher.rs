// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::paths::normalize::relative_str;
use crate::watch::bindings::{WatchBinding, units_for_path};
use crate::watch::debounce::Debouncer;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Roots and timing shared by the watcher and its dispatcher task.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub debounce: Duration,
}

/// Watch `settings.source_root` recursively and send one
/// `RuntimeEvent::TaskTriggered` per affected unit after each quiet interval.
pub fn spawn_watcher(
    settings: WatchSettings,
    bindings: Vec<WatchBinding>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let source_root = canonical(&settings.source_root);
    let output_root = canonical(&settings.output_root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetdag: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetdag: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&source_root, RecursiveMode::Recursive)?;
    info!(root = ?source_root, debounce_ms = settings.debounce.as_millis() as u64, "file watcher started");

    spawn_dispatcher(
        WatchSettings {
            source_root,
            output_root,
            ..settings
        },
        bindings,
        event_rx,
        runtime_tx,
    );

    Ok(WatcherHandle { _inner: watcher })
}

/// Consume raw notify events, debounce them and forward unit triggers.
///
/// Split out of [`spawn_watcher`] so it can be driven with synthetic events.
/// Pending units are flushed when `event_rx` closes.
pub fn spawn_dispatcher(
    settings: WatchSettings,
    bindings: Vec<WatchBinding>,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> JoinHandle<()> {
    let bindings = Arc::new(bindings);

    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(settings.debounce);

        loop {
            let deadline = debouncer.deadline();
            tokio::select! {
                maybe_event = event_rx.recv() => {
                    let Some(event) = maybe_event else {
                        let units = debouncer.drain();
                        dispatch(&runtime_tx, units).await;
                        break;
                    };
                    let units = units_for_event(&settings, &bindings, &event);
                    debouncer.record(units, Instant::now());
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(units) = debouncer.flush(Instant::now()) {
                        if !dispatch(&runtime_tx, units).await {
                            break;
                        }
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    })
}

fn units_for_event(
    settings: &WatchSettings,
    bindings: &[WatchBinding],
    event: &Event,
) -> BTreeSet<TaskName> {
    if matches!(event.kind, EventKind::Access(_)) {
        return BTreeSet::new();
    }

    let mut units = BTreeSet::new();
    for path in &event.paths {
        if path.starts_with(&settings.output_root) {
            continue;
        }
        let Some(rel) = relative_str(&settings.source_root, path) else {
            continue;
        };
        let hit = units_for_path(bindings, &rel);
        if !hit.is_empty() {
            debug!(path = %rel, units = ?hit, "change matched watch patterns");
        }
        units.extend(hit);
    }
    units
}

/// Returns false once the runtime has gone away.
async fn dispatch(runtime_tx: &mpsc::Sender<RuntimeEvent>, units: BTreeSet<TaskName>) -> bool {
    if units.is_empty() {
        return true;
    }
    info!(units = ?units, "dispatching rebuild after quiet interval");
    for task in units {
        let event = RuntimeEvent::TaskTriggered {
            task,
            reason: TriggerReason::FileWatch,
        };
        if runtime_tx.send(event).await.is_err() {
            warn!("runtime channel closed; stopping watcher dispatch");
            return false;
        }
    }
    true
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_config;
    use crate::config::model::ConfigFile;
    use crate::types::CssPolicy;
    use crate::watch::bindings::build_bindings;
    use notify::event::{AccessKind, ModifyKind};

    fn settings() -> WatchSettings {
        WatchSettings {
            source_root: PathBuf::from("/site/src"),
            output_root: PathBuf::from("/site/dist"),
            debounce: Duration::from_millis(200),
        }
    }

    fn bindings() -> Vec<WatchBinding> {
        let cfg = ConfigFile::try_from(builtin_config(CssPolicy::Scss)).unwrap();
        build_bindings(&cfg).unwrap()
    }

    fn modify(path: &str) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from(path))
    }

    fn triggered(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let RuntimeEvent::TaskTriggered { task, reason } = ev {
                assert_eq!(reason, TriggerReason::FileWatch);
                out.push(task);
            }
        }
        out
    }

    #[test]
    fn access_and_output_events_are_ignored() {
        let b = bindings();
        let s = settings();
        let access = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/site/src/index.html"));
        assert!(units_for_event(&s, &b, &access).is_empty());
        assert!(units_for_event(&s, &b, &modify("/site/dist/index.html")).is_empty());
        assert_eq!(
            units_for_event(&s, &b, &modify("/site/src/index.html"))
                .into_iter()
                .collect::<Vec<_>>(),
            vec!["html"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn burst_dispatches_each_unit_once() {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (rt_tx, mut rt_rx) = mpsc::channel(16);
        let handle = spawn_dispatcher(settings(), bindings(), event_rx, rt_tx);

        for _ in 0..5 {
            event_tx.send(modify("/site/src/scss/_vars.scss")).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(triggered(&mut rt_rx).is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(triggered(&mut rt_rx), vec!["styles"]);

        drop(event_tx);
        handle.await.unwrap();
        assert!(triggered(&mut rt_rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_event_stream_flushes_pending_units() {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (rt_tx, mut rt_rx) = mpsc::channel(16);
        let handle = spawn_dispatcher(settings(), bindings(), event_rx, rt_tx);

        event_tx.send(modify("/site/src/js/app.js")).unwrap();
        event_tx.send(modify("/site/src/about.html")).unwrap();
        drop(event_tx);
        handle.await.unwrap();

        assert_eq!(triggered(&mut rt_rx), vec!["html", "scripts"]);
    }
}

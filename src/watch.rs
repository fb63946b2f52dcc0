//! Background file watcher
//!
//! Runs a dedicated thread that owns a `notify` watcher and dispatches change
//! events to per-path handlers. The owner talks to the thread only through a
//! control channel: `start` blocks until the thread acknowledges that every
//! watch is installed, and `stop` (or drop) sends an explicit shutdown message
//! and joins the thread.

use crate::error::WatchError;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Kind of filesystem change reported to a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Created,
    Modified,
    Renamed,
    Removed,
    Attributes,
}

/// Filesystem change event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

/// Receives events for one registered path
///
/// Returning `false` unregisters the handler.
pub trait EventHandler: Send {
    fn handle(&mut self, event: &FileEvent) -> bool;
}

impl<F> EventHandler for F
where
    F: FnMut(&FileEvent) -> bool + Send,
{
    fn handle(&mut self, event: &FileEvent) -> bool {
        self(event)
    }
}

struct Registration {
    handler: Box<dyn EventHandler>,
    /// Directories receive events for everything below them
    is_dir: bool,
}

enum Message {
    Fs(notify::Result<Event>),
    Shutdown,
}

struct Worker {
    control: Sender<Message>,
    thread: JoinHandle<()>,
}

/// Watches registered paths on a background thread
#[derive(Default)]
pub struct FileWatcher {
    pending: HashMap<PathBuf, Registration>,
    worker: Option<Worker>,
}

impl FileWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a file or directory; takes effect on `start`
    pub fn register_handler(&mut self, path: &Path, handler: impl EventHandler + 'static) {
        let path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let is_dir = path.is_dir();
        self.pending.insert(
            path,
            Registration {
                handler: Box::new(handler),
                is_dir,
            },
        );
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the watcher thread and wait for it to become ready
    ///
    /// Returns `Ok(false)` if the watcher is already running.
    pub fn start(&mut self) -> Result<bool, WatchError> {
        if self.worker.is_some() {
            return Ok(false);
        }

        let (control_tx, control_rx) = mpsc::channel::<Message>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), WatchError>>(1);
        let registrations = std::mem::take(&mut self.pending);
        let event_tx = control_tx.clone();

        let thread = thread::Builder::new()
            .name("snapcat-watcher".to_string())
            .spawn(move || run_event_loop(registrations, event_tx, control_rx, ready_tx))
            .map_err(WatchError::Spawn)?;

        // Block until the thread has installed its watches
        let ready = ready_rx.recv();
        match ready {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(WatchError::Handshake);
            }
        }

        self.worker = Some(Worker {
            control: control_tx,
            thread,
        });
        info!("File watcher started");
        Ok(true)
    }

    /// Signal shutdown and join the watcher thread
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.control.send(Message::Shutdown);
            if worker.thread.join().is_err() {
                warn!("Could not join watcher thread");
            }
            debug!("File watcher stopped");
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_event_loop(
    mut registrations: HashMap<PathBuf, Registration>,
    event_tx: Sender<Message>,
    control_rx: Receiver<Message>,
    ready_tx: SyncSender<Result<(), WatchError>>,
) {
    let mut watcher = match notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = event_tx.send(Message::Fs(res));
    }) {
        Ok(w) => w,
        Err(e) => {
            let _ = ready_tx.send(Err(e.into()));
            return;
        }
    };

    for (target, mode) in watch_targets(&registrations) {
        if let Err(e) = watcher.watch(&target, mode) {
            let _ = ready_tx.send(Err(e.into()));
            return;
        }
        debug!(path = %target.display(), ?mode, "Watching");
    }

    let _ = ready_tx.send(Ok(()));

    for message in control_rx {
        match message {
            Message::Shutdown => break,
            Message::Fs(Ok(event)) => dispatch(&mut registrations, &event),
            Message::Fs(Err(e)) => warn!("Watch error: {}", e),
        }
    }
    debug!("Watcher event loop exited");
}

/// One watch per directory, recursive if any registration needs it
///
/// Files are watched through their parent so that replace-by-rename keeps working.
fn watch_targets(registrations: &HashMap<PathBuf, Registration>) -> HashMap<PathBuf, RecursiveMode> {
    let mut targets = HashMap::new();
    for (path, registration) in registrations {
        let (target, mode) = if registration.is_dir {
            (path.clone(), RecursiveMode::Recursive)
        } else {
            (
                path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone()),
                RecursiveMode::NonRecursive,
            )
        };
        let entry = targets.entry(target).or_insert(mode);
        if mode == RecursiveMode::Recursive {
            *entry = RecursiveMode::Recursive;
        }
    }
    targets
}

/// Convert a notify event kind to ours; access events are dropped
fn convert_kind(kind: &EventKind) -> Option<FileEventKind> {
    match kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileEventKind::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(FileEventKind::Attributes),
        EventKind::Modify(_) => Some(FileEventKind::Modified),
        EventKind::Remove(_) => Some(FileEventKind::Removed),
        _ => None,
    }
}

fn dispatch(registrations: &mut HashMap<PathBuf, Registration>, event: &Event) {
    let Some(kind) = convert_kind(&event.kind) else {
        return;
    };

    let mut finished = Vec::new();
    for path in &event.paths {
        for (registered, registration) in registrations.iter_mut() {
            let relevant = path == registered || (registration.is_dir && path.starts_with(registered));
            if !relevant || finished.contains(registered) {
                continue;
            }
            let file_event = FileEvent {
                path: path.clone(),
                kind,
            };
            trace!(path = %path.display(), ?kind, "Dispatching file event");
            if !registration.handler.handle(&file_event) {
                finished.push(registered.clone());
            }
        }
    }

    for path in finished {
        debug!(path = %path.display(), "Handler finished, unregistering");
        registrations.remove(&path);
    }
}

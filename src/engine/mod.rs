//! Debounced, batching translation cache.
//!
//! UI code calls [`TranslationEngine::translate`] (or `request` + `lookup`) for
//! every label it renders. Lookups never wait: they return the cached
//! translation or the original text. Requests for unknown texts are queued and
//! sent to the backend in one batch once the callers go quiet for the debounce
//! window.

pub mod cache;
mod dispatcher;
pub mod queue;
pub mod scheduler;

pub use cache::ResultCache;
pub use queue::PendingQueue;
pub use scheduler::{DebounceScheduler, DEFAULT_DEBOUNCE};

use crate::config::Config;
use crate::error::{LingoError, Result};
use crate::language::LanguagePair;
use crate::translate::Translator;
use dispatcher::{Batch, BatchDispatcher, DispatchOutcome};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

/// Tunables for a [`TranslationEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Quiet period after the last request before a batch is sent.
    pub debounce: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
        }
    }
}

/// Where the current session is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing queued, no timer armed, no call outstanding.
    Idle,
    /// Texts are waiting for the debounce timer.
    Queued,
    /// A batch call is outstanding.
    Dispatching,
}

/// Counters for the engine's lifetime, plus current cache and queue sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub dispatches: u64,
    pub failed_dispatches: u64,
    pub stale_dispatches: u64,
    pub cached: usize,
    pub pending: usize,
}

#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    pub dispatches: u64,
    pub failed_dispatches: u64,
    pub stale_dispatches: u64,
}

/// Mutable state for the active language pair.
pub(crate) struct Session {
    pub(crate) pair: LanguagePair,
    /// Bumped on every pair change; batches carry the value they were drained under.
    pub(crate) generation: u64,
    pub(crate) cache: ResultCache,
    pub(crate) queue: PendingQueue,
    pub(crate) scheduler: DebounceScheduler,
    pub(crate) stats: DispatchCounters,
}

impl Session {
    pub(crate) fn new(pair: LanguagePair, runtime: Handle) -> Self {
        Self {
            pair,
            generation: 0,
            cache: ResultCache::new(),
            queue: PendingQueue::new(),
            scheduler: DebounceScheduler::new(runtime),
            stats: DispatchCounters::default(),
        }
    }
}

pub(crate) fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    session: Mutex<Session>,
    dispatcher: BatchDispatcher,
    debounce: Duration,
    runtime: Handle,
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }

    /// Timer callback: drain the queue and hand the batch to a dispatch task.
    fn flush(self: &Arc<Self>) {
        let batch = {
            let mut session = self.session();
            if session.pair.is_identity() {
                return;
            }
            Batch {
                texts: session.queue.drain_all(),
                pair: session.pair,
                generation: session.generation,
            }
        };

        // Busy from the moment texts leave the queue, not from when the task starts.
        let handoff = (!batch.texts.is_empty()).then(|| self.dispatcher.mark_busy());

        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            let outcome = inner.dispatcher.dispatch(batch, &inner.session).await;
            drop(handoff);
            match outcome {
                DispatchOutcome::Resolved {
                    requested,
                    resolved,
                } => debug!(requested, resolved, "Batch settled"),
                other => debug!(outcome = ?other, "Batch settled"),
            }
        });
    }
}

/// Shared handle to a translation cache for one UI tree.
///
/// Cloning is cheap; all clones see the same cache, queue and busy flag.
#[derive(Clone)]
pub struct TranslationEngine {
    inner: Arc<Inner>,
}

impl TranslationEngine {
    /// Create an engine with default options.
    ///
    /// Must be called from within a tokio runtime; the engine spawns its
    /// timers and batch calls on it.
    pub fn new(translator: Arc<dyn Translator>, pair: LanguagePair) -> Result<Self> {
        Self::with_options(translator, pair, EngineOptions::default())
    }

    pub fn with_options(
        translator: Arc<dyn Translator>,
        pair: LanguagePair,
        options: EngineOptions,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| LingoError::NoRuntime)?;

        info!(
            %pair,
            debounce_ms = options.debounce.as_millis() as u64,
            "Translation engine using {}",
            translator.name()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session::new(pair, runtime.clone())),
                dispatcher: BatchDispatcher::new(translator),
                debounce: options.debounce,
                runtime,
            }),
        })
    }

    /// Best text to show for `text` right now.
    ///
    /// Returns the translation if known, otherwise `text` itself. Never waits.
    pub fn lookup(&self, text: &str) -> String {
        let session = self.inner.session();
        if session.pair.is_identity() {
            return text.to_string();
        }
        session.cache.get(text).unwrap_or(text).to_string()
    }

    /// Ask for `text` to be translated in the next batch.
    ///
    /// No-op for identity pairs and for texts already cached or queued.
    pub fn request(&self, text: &str) {
        let mut guard = self.inner.session();
        let session = &mut *guard;

        if session.pair.is_identity() || !session.queue.add(text, &session.cache) {
            return;
        }

        debug!(pending = session.queue.len(), "Queued {:?}", text);

        let weak = Arc::downgrade(&self.inner);
        session.scheduler.schedule(self.inner.debounce, move || {
            if let Some(inner) = weak.upgrade() {
                inner.flush();
            }
        });
    }

    /// `request` followed by `lookup`: what a label calls on every render.
    pub fn translate(&self, text: &str) -> String {
        self.request(text);
        self.lookup(text)
    }

    pub fn language_pair(&self) -> LanguagePair {
        self.inner.session().pair
    }

    /// Switch to `pair`, discarding every cached translation and queued text.
    ///
    /// A batch already in flight is not interrupted, but its results are
    /// dropped when they arrive.
    pub fn set_language_pair(&self, pair: LanguagePair) {
        let mut session = self.inner.session();
        if session.pair == pair {
            return;
        }

        info!(from = %session.pair, to = %pair, "Switching language pair");

        session.scheduler.cancel();
        session.queue.clear();
        session.cache.clear();
        session.generation += 1;
        session.pair = pair;
    }

    /// True while at least one batch call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.inner.dispatcher.is_busy()
    }

    /// Watch the busy flag, e.g. to drive a progress indicator.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.inner.dispatcher.subscribe_busy()
    }

    pub fn state(&self) -> EngineState {
        if self.is_busy() {
            return EngineState::Dispatching;
        }
        let session = self.inner.session();
        if !session.queue.is_empty() || session.scheduler.is_armed() {
            EngineState::Queued
        } else {
            EngineState::Idle
        }
    }

    /// Time until the queued texts are sent, or `None` if no flush is pending.
    pub fn time_until_flush(&self) -> Option<Duration> {
        self.inner.session().scheduler.remaining()
    }

    pub fn stats(&self) -> EngineStats {
        let session = self.inner.session();
        EngineStats {
            dispatches: session.stats.dispatches,
            failed_dispatches: session.stats.failed_dispatches,
            stale_dispatches: session.stats.stale_dispatches,
            cached: session.cache.len(),
            pending: session.queue.len(),
        }
    }

    pub fn translator_name(&self) -> &'static str {
        self.inner.dispatcher.translator_name()
    }
}

impl std::fmt::Debug for TranslationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationEngine")
            .field("pair", &self.language_pair())
            .field("translator", &self.translator_name())
            .field("busy", &self.is_busy())
            .finish()
    }
}

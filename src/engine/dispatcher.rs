//! Batch dispatch: one backend call per flush, results merged into the cache.

use super::{lock_session, Session};
use crate::language::LanguagePair;
use crate::translate::Translator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Texts drained from the queue, tagged with the session they were drained under.
#[derive(Debug, Clone)]
pub(crate) struct Batch {
    pub(crate) texts: Vec<String>,
    pub(crate) pair: LanguagePair,
    pub(crate) generation: u64,
}

/// How a dispatch settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    /// Nothing to send.
    Skipped,
    /// Backend answered; `resolved` of `requested` texts were cached.
    Resolved { requested: usize, resolved: usize },
    /// Backend call failed; nothing was cached.
    Failed,
    /// The language pair changed while the call was in flight; results dropped.
    Stale,
}

/// Aggregate busy signal over all in-flight dispatches.
struct BusyFlag {
    tx: watch::Sender<bool>,
    in_flight: AtomicUsize,
}

impl BusyFlag {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx,
            in_flight: AtomicUsize::new(0),
        }
    }

    fn acquire(self: &Arc<Self>) -> BusyGuard {
        self.tx.send_if_modified(|busy| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let changed = !*busy;
            *busy = true;
            changed
        });
        BusyGuard {
            flag: Arc::clone(self),
        }
    }
}

/// Keeps the busy flag raised until dropped, on every exit path.
pub(crate) struct BusyGuard {
    flag: Arc<BusyFlag>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let flag = &self.flag;
        flag.tx.send_if_modified(|busy| {
            let remaining = flag.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            let now = remaining > 0;
            let changed = *busy != now;
            *busy = now;
            changed
        });
    }
}

pub(crate) struct BatchDispatcher {
    translator: Arc<dyn Translator>,
    busy: Arc<BusyFlag>,
}

impl BatchDispatcher {
    pub(crate) fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            busy: Arc::new(BusyFlag::new()),
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        *self.busy.tx.borrow()
    }

    pub(crate) fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.tx.subscribe()
    }

    /// Raise the busy flag outside of `dispatch`, e.g. while a drained batch
    /// is being handed to the task that will send it.
    pub(crate) fn mark_busy(&self) -> BusyGuard {
        self.busy.acquire()
    }

    pub(crate) fn translator_name(&self) -> &'static str {
        self.translator.name()
    }

    /// Send `batch` to the backend and merge the answer into `session`'s cache.
    ///
    /// Failures are logged and swallowed. Results are dropped if the session
    /// moved to another generation while the call was in flight.
    pub(crate) async fn dispatch(&self, batch: Batch, session: &Mutex<Session>) -> DispatchOutcome {
        if batch.texts.is_empty() {
            return DispatchOutcome::Skipped;
        }

        let _busy = self.busy.acquire();
        let started = Instant::now();
        let requested = batch.texts.len();

        debug!(
            texts = requested,
            pair = %batch.pair,
            generation = batch.generation,
            "Dispatching batch to {}",
            self.translator.name()
        );

        let result = self.translator.translate_batch(&batch.texts, batch.pair).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let mut session = lock_session(session);
        session.stats.dispatches += 1;

        let translations = match result {
            Ok(translations) => translations,
            Err(e) => {
                session.stats.failed_dispatches += 1;
                warn!(texts = requested, elapsed_ms, "Batch translation failed: {}", e);
                return DispatchOutcome::Failed;
            }
        };

        if session.generation != batch.generation {
            session.stats.stale_dispatches += 1;
            debug!(
                batch_generation = batch.generation,
                current_generation = session.generation,
                "Dropping results for a previous language pair"
            );
            return DispatchOutcome::Stale;
        }

        let mut translations = translations.into_iter();
        let mut resolved = 0;
        for text in batch.texts {
            if let Some(Some(translated)) = translations.next() {
                session.cache.put(text, translated);
                resolved += 1;
            }
        }

        if resolved < requested {
            warn!(
                "Backend answered {} of {} texts; the rest fall back to the original",
                resolved, requested
            );
        }
        debug!(resolved, elapsed_ms, "Batch merged into cache");

        DispatchOutcome::Resolved {
            requested,
            resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LingoError, Result};
    use crate::language::Language;
    use async_trait::async_trait;
    use tokio::runtime::Handle;
    use tokio::sync::Notify;

    fn en_es() -> LanguagePair {
        LanguagePair::new(Language::En, Language::Es)
    }

    fn batch(texts: &[&str], generation: u64) -> Batch {
        Batch {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            pair: en_es(),
            generation,
        }
    }

    /// Answers with a fixed reply, optionally waiting for a signal first.
    struct ScriptedTranslator {
        reply: Option<Vec<Option<String>>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedTranslator {
        fn answering(reply: &[Option<&str>]) -> Self {
            Self {
                reply: Some(reply.iter().map(|r| r.map(str::to_string)).collect()),
                gate: None,
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl Translator for ScriptedTranslator {
        async fn translate_batch(
            &self,
            _texts: &[String],
            _pair: LanguagePair,
        ) -> Result<Vec<Option<String>>> {
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            self.reply
                .clone()
                .ok_or_else(|| LingoError::Api("backend unavailable".to_string()))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct PanickingTranslator;

    #[async_trait]
    impl Translator for PanickingTranslator {
        async fn translate_batch(
            &self,
            _texts: &[String],
            _pair: LanguagePair,
        ) -> Result<Vec<Option<String>>> {
            panic!("backend bug");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn session() -> Mutex<Session> {
        Mutex::new(Session::new(en_es(), Handle::current()))
    }

    #[tokio::test]
    async fn test_empty_batch_is_skipped() {
        let dispatcher = BatchDispatcher::new(Arc::new(ScriptedTranslator::failing()));
        let session = session();

        let outcome = dispatcher.dispatch(batch(&[], 0), &session).await;
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert_eq!(lock_session(&session).stats.dispatches, 0);
    }

    #[tokio::test]
    async fn test_results_merged_by_position() {
        let dispatcher = BatchDispatcher::new(Arc::new(ScriptedTranslator::answering(&[
            Some("Hola"),
            Some("Mundo"),
        ])));
        let session = session();

        let outcome = dispatcher.dispatch(batch(&["Hello", "World"], 0), &session).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Resolved {
                requested: 2,
                resolved: 2
            }
        );

        let session = lock_session(&session);
        assert_eq!(session.cache.get("Hello"), Some("Hola"));
        assert_eq!(session.cache.get("World"), Some("Mundo"));
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn test_partial_response_caches_present_positions() {
        let dispatcher = BatchDispatcher::new(Arc::new(ScriptedTranslator::answering(&[
            None,
            Some("Mundo"),
        ])));
        let session = session();

        let outcome = dispatcher
            .dispatch(batch(&["Hello", "World", "Again"], 0), &session)
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Resolved {
                requested: 3,
                resolved: 1
            }
        );

        let session = lock_session(&session);
        assert!(session.cache.get("Hello").is_none());
        assert_eq!(session.cache.get("World"), Some("Mundo"));
        assert!(session.cache.get("Again").is_none());
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let dispatcher = BatchDispatcher::new(Arc::new(ScriptedTranslator::failing()));
        let session = session();

        let outcome = dispatcher.dispatch(batch(&["Hello"], 0), &session).await;
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert!(!dispatcher.is_busy());

        let session = lock_session(&session);
        assert!(session.cache.is_empty());
        assert_eq!(session.stats.failed_dispatches, 1);
    }

    #[tokio::test]
    async fn test_stale_generation_is_dropped() {
        let dispatcher =
            BatchDispatcher::new(Arc::new(ScriptedTranslator::answering(&[Some("Hola")])));
        let session = session();
        lock_session(&session).generation = 3;

        let outcome = dispatcher.dispatch(batch(&["Hello"], 2), &session).await;
        assert_eq!(outcome, DispatchOutcome::Stale);

        let session = lock_session(&session);
        assert!(session.cache.is_empty());
        assert_eq!(session.stats.stale_dispatches, 1);
    }

    #[tokio::test]
    async fn test_busy_only_while_call_outstanding() {
        let gate = Arc::new(Notify::new());
        let translator = ScriptedTranslator {
            reply: Some(vec![Some("Hola".to_string())]),
            gate: Some(Arc::clone(&gate)),
        };
        let dispatcher = Arc::new(BatchDispatcher::new(Arc::new(translator)));
        let session = Arc::new(session());
        let mut busy = dispatcher.subscribe_busy();
        assert!(!*busy.borrow());

        let task = {
            let dispatcher = Arc::clone(&dispatcher);
            let session = Arc::clone(&session);
            tokio::spawn(async move { dispatcher.dispatch(batch(&["Hello"], 0), &session).await })
        };

        busy.wait_for(|b| *b).await.unwrap();
        assert!(dispatcher.is_busy());

        gate.notify_one();
        let outcome = task.await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Resolved { .. }));
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn test_busy_cleared_when_backend_panics() {
        let dispatcher = Arc::new(BatchDispatcher::new(Arc::new(PanickingTranslator)));
        let session = Arc::new(session());

        let task = {
            let dispatcher = Arc::clone(&dispatcher);
            let session = Arc::clone(&session);
            tokio::spawn(async move { dispatcher.dispatch(batch(&["Hello"], 0), &session).await })
        };

        assert!(task.await.is_err());
        assert!(!dispatcher.is_busy());
    }
}

//! Request dispatch.
//!
//! A trigger renders the corpus into an owned prompt and hands it to a
//! background task on the tokio runtime, so the message thread never waits
//! on the network. Results come back over a channel; the platform notifier
//! wakes the message loop, which then calls [`RequestOrchestrator::drain`].
//!
//! Jobs are numbered in dispatch order. Display is last-writer-wins: a job
//! finishing after a newer one still overwrites it, and that is logged.

use crate::platform::Notifier;
use crate::prompts::build_prompt;
use crate::providers::Provider;
use crate::selection::SelectionState;
use crate::snapshot::AccumulatedCorpus;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Handle;

pub const EMPTY_CORPUS_MESSAGE: &str = "No text extracted yet. Take screenshots first using Ctrl+H.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub id: u64,
    pub text: String,
}

/// What the caller should display right after a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing was sent; show this message instead.
    Skipped(String),
    /// A job is in flight; show this loading message meanwhile.
    Started { id: u64, message: String },
}

impl Dispatch {
    pub fn message(&self) -> &str {
        match self {
            Dispatch::Skipped(message) | Dispatch::Started { message, .. } => message,
        }
    }
}

pub struct RequestOrchestrator {
    runtime: Handle,
    providers: Vec<Arc<dyn Provider>>,
    notifier: Notifier,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
    next_id: u64,
    last_shown: u64,
}

impl RequestOrchestrator {
    pub fn new(runtime: Handle, providers: Vec<Arc<dyn Provider>>, notifier: Notifier) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            runtime,
            providers,
            notifier,
            tx,
            rx,
            next_id: 1,
            last_shown: 0,
        }
    }

    fn provider(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.id().eq_ignore_ascii_case(id))
            .cloned()
    }

    /// Starts a job for the current corpus and selection.
    pub fn dispatch(&mut self, corpus: &AccumulatedCorpus, selection: &SelectionState) -> Dispatch {
        if corpus.is_empty() {
            return Dispatch::Skipped(EMPTY_CORPUS_MESSAGE.to_string());
        }
        let Some(provider) = self.provider(selection.provider()) else {
            let supported: Vec<_> = self.providers.iter().map(|p| p.id()).collect();
            return Dispatch::Skipped(format!(
                "Unsupported AI type: {}. Supported types: {}",
                selection.provider(),
                supported.join(", ")
            ));
        };

        let prompt = build_prompt(selection.problem_type(), selection.language(), &corpus.render());
        let id = self.next_id;
        self.next_id += 1;
        log::info!(
            "Dispatching job {} to {} ({} / {}, {} chars)",
            id,
            provider.label(),
            selection.problem_type(),
            selection.language(),
            prompt.len()
        );

        let message = format!("Analyzing extracted text with {}... Please wait.", provider.label());
        let tx = self.tx.clone();
        let notify = Arc::clone(&self.notifier);
        self.runtime.spawn(async move {
            let text = provider.complete(prompt).await;
            log::debug!("Job {} finished", id);
            if tx.send(JobResult { id, text }).is_ok() {
                notify();
            }
        });

        Dispatch::Started { id, message }
    }

    /// Collects finished jobs and returns the text to display, if any.
    pub fn drain(&mut self) -> Option<String> {
        let mut latest = None;
        while let Ok(result) = self.rx.try_recv() {
            if result.id < self.last_shown {
                log::warn!(
                    "Job {} finished after job {}; showing the older result",
                    result.id,
                    self.last_shown
                );
            }
            self.last_shown = result.id;
            latest = Some(result.text);
        }
        latest
    }

    /// Number of jobs dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.next_id - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Waits for the gate, then records the prompt it was given.
    struct GatedProvider {
        gate: Arc<Notify>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl Provider for GatedProvider {
        fn id(&self) -> &'static str {
            "gemini"
        }

        fn label(&self) -> &'static str {
            "Gemini"
        }

        fn complete(&self, prompt: String) -> BoxFuture<'static, String> {
            let gate = Arc::clone(&self.gate);
            let prompts = Arc::clone(&self.prompts);
            Box::pin(async move {
                gate.notified().await;
                prompts.lock().unwrap().push(prompt);
                "done".to_string()
            })
        }
    }

    /// Answers with the corpus marker it finds, slowly for `FIRST`.
    struct DelayedProvider;

    impl Provider for DelayedProvider {
        fn id(&self) -> &'static str {
            "gemini"
        }

        fn label(&self) -> &'static str {
            "Gemini"
        }

        fn complete(&self, prompt: String) -> BoxFuture<'static, String> {
            Box::pin(async move {
                let (delay, text) = if prompt.contains("FIRST") {
                    (Duration::from_millis(200), "FIRST")
                } else {
                    (Duration::from_millis(10), "SECOND")
                };
                tokio::time::sleep(delay).await;
                text.to_string()
            })
        }
    }

    fn orchestrator_with(provider: impl Provider + 'static) -> (RequestOrchestrator, mpsc::Receiver<()>) {
        let (wake_tx, wake_rx) = mpsc::channel();
        let notifier: Notifier = Arc::new(move || {
            let _ = wake_tx.send(());
        });
        let orchestrator = RequestOrchestrator::new(Handle::current(), vec![Arc::new(provider)], notifier);
        (orchestrator, wake_rx)
    }

    fn orchestrator() -> (RequestOrchestrator, Arc<Notify>, Arc<Mutex<Vec<String>>>, mpsc::Receiver<()>) {
        let gate = Arc::new(Notify::new());
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let provider = GatedProvider {
            gate: Arc::clone(&gate),
            prompts: Arc::clone(&prompts),
        };
        let (orchestrator, wake_rx) = orchestrator_with(provider);
        (orchestrator, gate, prompts, wake_rx)
    }

    async fn wait_for_wake(wake_rx: mpsc::Receiver<()>) -> mpsc::Receiver<()> {
        tokio::task::spawn_blocking(move || {
            wake_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            wake_rx
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn empty_corpus_sends_nothing() {
        let (mut orchestrator, _gate, prompts, _wake) = orchestrator();
        let dispatch = orchestrator.dispatch(&AccumulatedCorpus::new(), &SelectionState::default());
        assert_eq!(dispatch, Dispatch::Skipped(EMPTY_CORPUS_MESSAGE.to_string()));
        assert_eq!(orchestrator.dispatched(), 0);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unsupported_provider_is_reported() {
        let (mut orchestrator, _gate, _prompts, _wake) = orchestrator();
        let mut corpus = AccumulatedCorpus::new();
        corpus.append(1, "X");
        let mut selection = SelectionState::default();
        selection.dimension_mut(crate::selection::Dimension::Provider).advance();

        let dispatch = orchestrator.dispatch(&corpus, &selection);
        assert_eq!(
            dispatch.message(),
            "Unsupported AI type: chatgpt. Supported types: gemini"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn job_sees_the_corpus_as_dispatched() {
        let (mut orchestrator, gate, prompts, wake_rx) = orchestrator();
        let mut corpus = AccumulatedCorpus::new();
        corpus.append(1, "original text");

        let dispatch = orchestrator.dispatch(&corpus, &SelectionState::default());
        assert_eq!(
            dispatch,
            Dispatch::Started {
                id: 1,
                message: "Analyzing extracted text with Gemini... Please wait.".into()
            }
        );

        corpus.clear();
        corpus.append(2, "mutated after dispatch");
        gate.notify_one();

        let _wake_rx = wait_for_wake(wake_rx).await;
        assert_eq!(orchestrator.drain(), Some("done".to_string()));
        assert_eq!(orchestrator.drain(), None);

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("original text"));
        assert!(prompts[0].contains("c++"));
        assert!(!prompts[0].contains("mutated"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn older_job_finishing_last_overwrites_the_newer_one() {
        let (mut orchestrator, wake_rx) = orchestrator_with(DelayedProvider);
        let selection = SelectionState::default();

        let mut corpus = AccumulatedCorpus::new();
        corpus.append(1, "FIRST");
        let first = orchestrator.dispatch(&corpus, &selection);
        corpus.clear();
        corpus.append(1, "SECOND");
        let second = orchestrator.dispatch(&corpus, &selection);
        assert!(matches!(first, Dispatch::Started { id: 1, .. }));
        assert!(matches!(second, Dispatch::Started { id: 2, .. }));

        let wake_rx = wait_for_wake(wake_rx).await;
        assert_eq!(orchestrator.drain(), Some("SECOND".to_string()));
        assert_eq!(orchestrator.last_shown, 2);

        let _wake_rx = wait_for_wake(wake_rx).await;
        assert_eq!(orchestrator.drain(), Some("FIRST".to_string()));
        assert_eq!(orchestrator.last_shown, 1);
        assert_eq!(orchestrator.dispatched(), 2);
    }
}

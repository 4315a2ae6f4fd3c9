//! Recommendation engine: one bounded attempt at the generative backend,
//! rule-based fallback on anything else.
//!
//! Each call to [`RecommendationEngine::generate`]:
//! - takes a slot from the in-flight limiter (none free means fallback),
//! - spawns the backend call as its own task holding that slot,
//! - waits at most the configured budget, aborting the task on timeout,
//! - parses the answer, falling back when no recommendation line is found.
//!
//! The spawned task only reports to the `JoinHandle` owned by its own request,
//! so a late answer cannot end up in some other response.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::{
    advisor,
    backend::TextBackend,
    config::BackendConfig,
    diagnostics::{DiagnosticSink, TraceEvent},
    error::GenerationError,
    model::{Recommendation, WeatherReading},
    prompt::build_prompt,
    response::parse_response,
};

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    backend: Arc<dyn TextBackend>,
    budget: Duration,
    in_flight: Arc<Semaphore>,
    diagnostics: DiagnosticSink,
    next_request_id: Arc<AtomicU64>,
}

impl RecommendationEngine {
    /// A zero `budget` is raised to one second so the backend gets a chance at all.
    pub fn new(backend: Arc<dyn TextBackend>, budget: Duration, max_in_flight: usize) -> Self {
        let budget = if budget.is_zero() { Duration::from_secs(1) } else { budget };

        Self {
            backend,
            budget,
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
            diagnostics: DiagnosticSink::disabled(),
            next_request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn from_config(backend: Arc<dyn TextBackend>, config: &BackendConfig) -> Self {
        Self::new(backend, config.timeout(), config.max_in_flight)
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSink) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Produce a recommendation for `reading`. Never fails.
    pub async fn generate(&self, reading: &WeatherReading) -> Recommendation {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        self.diagnostics.record(request_id, TraceEvent::Request(reading.clone()));

        match self.ask_backend(request_id, reading).await {
            Ok(rec) => {
                info!(request_id, icon = %rec.icon, "recommendation generated by backend");
                rec
            }
            Err(e) => {
                warn!(request_id, "using fallback recommendation: {e}");
                self.diagnostics.record(request_id, TraceEvent::Fallback(e.to_string()));
                advisor::fallback(reading)
            }
        }
    }

    async fn ask_backend(
        &self,
        request_id: u64,
        reading: &WeatherReading,
    ) -> Result<Recommendation, GenerationError> {
        let permit = Arc::clone(&self.in_flight)
            .try_acquire_owned()
            .map_err(|_| GenerationError::Saturated)?;

        let prompt = build_prompt(reading);
        let backend = Arc::clone(&self.backend);

        let mut task = tokio::spawn(async move {
            let _permit = permit;
            backend.complete(&prompt).await
        });

        let raw = match tokio::time::timeout(self.budget, &mut task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_err)) => return Err(GenerationError::TaskFailed(join_err.to_string())),
            Err(_) => {
                // Dropping the in-flight future cancels the HTTP request and frees the slot.
                task.abort();
                return Err(GenerationError::Timeout(self.budget));
            }
        };

        debug!(request_id, "backend answered");
        self.diagnostics.record(request_id, TraceEvent::Response(raw.clone()));

        parse_response(&raw).into_recommendation().ok_or(GenerationError::MalformedOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::model::reading;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    const BUDGET: Duration = Duration::from_millis(200);

    #[derive(Debug)]
    struct Fixed(&'static str);

    #[async_trait]
    impl TextBackend for Fixed {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl TextBackend for Failing {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            Err(BackendError::Transport("connection refused".into()))
        }
    }

    #[derive(Debug)]
    struct Panicking;

    #[async_trait]
    impl TextBackend for Panicking {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            panic!("backend exploded")
        }
    }

    /// Answers after `delay`, counting how many calls actually finished.
    #[derive(Debug)]
    struct Slow {
        delay: Duration,
        answer: &'static str,
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TextBackend for Slow {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.to_string())
        }
    }

    /// Blocks until released; used to keep a slot occupied.
    #[derive(Debug)]
    struct Gated {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl TextBackend for Gated {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("Recommendation: Finally.\nIcon: couch".to_string())
        }
    }

    fn engine(backend: impl TextBackend + 'static) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(backend), BUDGET, 4)
    }

    fn cold() -> WeatherReading {
        reading(5.0, 0.0, 2.0, "Clear sky")
    }

    #[tokio::test]
    async fn uses_backend_answer() {
        let rec = engine(Fixed("Recommendation: Bring a hat\nIcon: SUN\n")).generate(&cold()).await;
        assert_eq!(rec, Recommendation::new("Bring a hat", "sun"));
    }

    #[tokio::test]
    async fn backend_answer_without_icon_uses_default() {
        let rec = engine(Fixed("Recommendation: Layer up.")).generate(&cold()).await;
        assert_eq!(rec, Recommendation::new("Layer up.", "default"));
    }

    #[tokio::test]
    async fn garbage_answer_falls_back() {
        let rec = engine(Fixed("I'm sorry, I can't help with that.")).generate(&cold()).await;
        assert_eq!(rec, advisor::fallback(&cold()));
    }

    #[tokio::test]
    async fn backend_error_falls_back() {
        let rec = engine(Failing).generate(&cold()).await;
        assert_eq!(rec.icon, "jacket");
    }

    #[tokio::test]
    async fn backend_panic_falls_back() {
        let rec = engine(Panicking).generate(&cold()).await;
        assert_eq!(rec, advisor::fallback(&cold()));
    }

    #[tokio::test]
    async fn slow_backend_falls_back_and_is_cancelled() {
        let finished = Arc::new(AtomicUsize::new(0));
        let eng = engine(Slow {
            delay: Duration::from_secs(2),
            answer: "Recommendation: Too late.\nIcon: couch",
            finished: Arc::clone(&finished),
        });

        let started = tokio::time::Instant::now();
        let rec = eng.generate(&cold()).await;

        assert_eq!(rec, advisor::fallback(&cold()));
        assert!(started.elapsed() < Duration::from_secs(1));

        // The aborted call never completes and its slot is free again.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert_eq!(eng.in_flight.available_permits(), 4);
    }

    #[tokio::test]
    async fn late_answer_never_leaks_into_next_request() {
        let slow = engine(Slow {
            delay: Duration::from_millis(400),
            answer: "Recommendation: STALE\nIcon: stale",
            finished: Arc::new(AtomicUsize::new(0)),
        });

        let first = slow.generate(&cold()).await;
        assert_eq!(first.icon, "jacket");

        let warm = reading(30.0, 0.0, 3.0, "Sunny");
        tokio::time::sleep(Duration::from_millis(400)).await;
        let second = slow.generate(&warm).await;

        assert_eq!(second, advisor::fallback(&warm));
        assert_ne!(second.recommendation, "STALE");
    }

    #[tokio::test]
    async fn saturated_engine_falls_back_immediately() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let eng = RecommendationEngine::new(
            Arc::new(Gated { entered: Arc::clone(&entered), release: Arc::clone(&release) }),
            Duration::from_secs(5),
            1,
        );

        let busy = {
            let eng = eng.clone();
            tokio::spawn(async move { eng.generate(&cold()).await })
        };
        entered.notified().await;

        let started = tokio::time::Instant::now();
        let rec = eng.generate(&reading(18.0, 0.0, 3.0, "Cloudy")).await;
        assert_eq!(rec.icon, "walk");
        assert!(started.elapsed() < Duration::from_secs(1));

        release.notify_one();
        let first = busy.await.unwrap();
        assert_eq!(first, Recommendation::new("Finally.", "couch"));
        assert_eq!(eng.in_flight.available_permits(), 1);
    }

    #[tokio::test]
    async fn trace_records_cover_request_response_and_fallback() {
        let (sink, mut rx) = DiagnosticSink::channel(16);

        let ok = engine(Fixed("Recommendation: Walk.\nIcon: walk")).with_diagnostics(sink.clone());
        ok.generate(&cold()).await;

        let failing = engine(Failing).with_diagnostics(sink);
        failing.generate(&cold()).await;

        let mut events = Vec::new();
        while let Ok(record) = rx.try_recv() {
            events.push(record.event);
        }

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], TraceEvent::Request(_)));
        assert_eq!(events[1], TraceEvent::Response("Recommendation: Walk.\nIcon: walk".into()));
        assert!(matches!(events[2], TraceEvent::Request(_)));
        assert!(matches!(&events[3], TraceEvent::Fallback(reason) if reason.contains("connection refused")));
    }

    #[tokio::test]
    async fn zero_budget_still_reaches_backend() {
        let eng = RecommendationEngine::new(Arc::new(Fixed("Recommendation: Go.\nIcon: walk")), Duration::ZERO, 1);
        assert_eq!(eng.budget(), Duration::from_secs(1));
        assert_eq!(eng.generate(&cold()).await, Recommendation::new("Go.", "walk"));

        let from_config = RecommendationEngine::from_config(
            Arc::new(Failing),
            &BackendConfig { timeout_secs: 0, ..BackendConfig::default() },
        );
        assert_eq!(from_config.budget(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn request_ids_increase() {
        let (sink, mut rx) = DiagnosticSink::channel(16);
        let eng = engine(Failing).with_diagnostics(sink);

        eng.generate(&cold()).await;
        eng.generate(&cold()).await;

        let ids: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok()).map(|r| r.request_id).collect();
        assert_eq!(ids, vec![1, 1, 2, 2]);
    }
}

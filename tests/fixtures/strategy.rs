//! Strategy whose per-attempt outcomes are scripted, with call counting and an
//! in-flight high-water mark.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use recovery_pilot::recovery::{
    BoxedStrategy, ErrorRecord, RecoveryContext, RecoveryOutcome, RecoveryStrategy,
};
use recovery_pilot::{RecoveryError, Result};

#[derive(Debug, Clone)]
pub enum Step {
    Succeed(&'static str),
    SucceedWithRetry(&'static str),
    Retry(&'static str),
    RetryAfter(&'static str, u64),
    Fail(&'static str),
    Escalate(&'static str),
    Raise(&'static str),
    Panic,
}

/// Shared counters so tests can observe a strategy after handing it to the orchestrator.
#[derive(Debug, Default)]
pub struct StrategyProbe {
    calls: AtomicU32,
    in_flight: AtomicU32,
    peak_in_flight: AtomicU32,
    log: Mutex<Vec<String>>,
}

impl StrategyProbe {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> u32 {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

pub struct CountingStrategy {
    name: String,
    priority: i32,
    max_attempts: u32,
    cooldown: Option<Duration>,
    work: Duration,
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    probe: Arc<StrategyProbe>,
}

impl CountingStrategy {
    pub fn builder(name: impl Into<String>) -> CountingStrategyBuilder {
        CountingStrategyBuilder {
            name: name.into(),
            priority: 0,
            max_attempts: 1,
            cooldown: None,
            work: Duration::ZERO,
            steps: Vec::new(),
            fallback: Step::Succeed("recovered"),
            probe: Arc::new(StrategyProbe::default()),
        }
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl RecoveryStrategy for CountingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn cooldown(&self) -> Option<Duration> {
        self.cooldown
    }

    async fn run(&self, error: &ErrorRecord, _context: &RecoveryContext) -> Result<RecoveryOutcome> {
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        self.probe
            .log
            .lock()
            .push(format!("{}:{}", self.name, error.category));

        let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.work.is_zero() {
            tokio::time::sleep(self.work).await;
        }
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_step() {
            Step::Succeed(msg) => Ok(RecoveryOutcome::recovered(msg)),
            Step::SucceedWithRetry(msg) => {
                Ok(RecoveryOutcome::recovered(msg).with_should_retry(true))
            }
            Step::Retry(msg) => Ok(RecoveryOutcome::retry(msg)),
            Step::RetryAfter(msg, ms) => Ok(RecoveryOutcome::retry_after(msg, ms)),
            Step::Fail(msg) => Ok(RecoveryOutcome::failed(msg)),
            Step::Escalate(msg) => Ok(RecoveryOutcome::escalated(msg)),
            Step::Raise(msg) => Err(RecoveryError::strategy(self.name.clone(), msg)),
            Step::Panic => panic!("strategy {} blew up", self.name),
        }
    }
}

pub struct CountingStrategyBuilder {
    name: String,
    priority: i32,
    max_attempts: u32,
    cooldown: Option<Duration>,
    work: Duration,
    steps: Vec<Step>,
    fallback: Step,
    probe: Arc<StrategyProbe>,
}

impl CountingStrategyBuilder {
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Simulated time spent inside each attempt.
    pub fn work(mut self, work: Duration) -> Self {
        self.work = work;
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps = steps.into_iter().collect();
        self
    }

    /// Outcome once scripted steps run out.
    pub fn then_always(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }

    pub fn build(self) -> (BoxedStrategy, Arc<StrategyProbe>) {
        let probe = self.probe.clone();
        let strategy = CountingStrategy {
            name: self.name,
            priority: self.priority,
            max_attempts: self.max_attempts,
            cooldown: self.cooldown,
            work: self.work,
            steps: Mutex::new(self.steps.into()),
            fallback: self.fallback,
            probe: self.probe,
        };
        (Arc::new(strategy), probe)
    }
}

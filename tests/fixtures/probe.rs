//! Connectivity probe and token refresher with scripted answers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use recovery_pilot::recovery::{ConnectivityProbe, TokenRefresher};
use recovery_pilot::{RecoveryError, Result};

/// Answers each probe call with the next scripted value; the last value repeats.
///
/// An offline answer waits out the full timeout like a real probe would.
#[derive(Debug)]
pub struct SequenceProbe {
    answers: Mutex<VecDeque<bool>>,
    last: Mutex<bool>,
    calls: AtomicUsize,
}

impl SequenceProbe {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        let answers: VecDeque<bool> = answers.into_iter().collect();
        let last = answers.back().copied().unwrap_or(true);
        Self {
            answers: Mutex::new(answers),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn online() -> Self {
        Self::new([true])
    }

    pub fn offline() -> Self {
        Self::new([false])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_answer(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.answers.lock();
        match answers.pop_front() {
            Some(answer) => {
                *self.last.lock() = answer;
                answer
            }
            None => *self.last.lock(),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for SequenceProbe {
    async fn wait_for_connection(&self, timeout: Duration) -> bool {
        let online = self.next_answer();
        if !online {
            tokio::time::sleep(timeout).await;
        }
        online
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RefreshBehavior {
    Accept,
    Reject,
    Fail,
    /// The identity provider cannot be reached at the socket level.
    Unreachable,
}

#[derive(Debug)]
pub struct ScriptedRefresher {
    behavior: RefreshBehavior,
    calls: AtomicUsize,
}

impl ScriptedRefresher {
    pub fn new(behavior: RefreshBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for ScriptedRefresher {
    async fn refresh_token(&self) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            RefreshBehavior::Accept => Ok(true),
            RefreshBehavior::Reject => Ok(false),
            RefreshBehavior::Fail => Err(RecoveryError::TokenRefresh(
                "refresh token revoked".into(),
            )),
            RefreshBehavior::Unreachable => Err(RecoveryError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "identity provider unreachable",
            ))),
        }
    }
}

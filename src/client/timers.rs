use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// No answer was given on a displayed question.
    Inactivity,
    /// Feedback has been on screen long enough.
    AutoAdvance,
}

/// Expiry notice delivered through the owner's channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Single-shot countdown. Re-arming or cancelling invalidates every earlier expiry, including
/// one already sitting in the channel.
pub struct Countdown {
    kind: TimerKind,
    duration: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new(kind: TimerKind, duration: Duration) -> Self {
        Self {
            kind,
            duration,
            generation: 0,
            handle: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn arm<M>(&mut self, events: &UnboundedSender<M>)
    where
        M: From<TimerFired> + Send + 'static,
    {
        self.cancel();

        let fired = TimerFired {
            kind: self.kind,
            generation: self.generation,
        };
        let events = events.clone();
        let duration = self.duration;

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // receiver gone means the controller shut down
            let _ = events.send(M::from(fired));
        }));
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Consumes an expiry. Returns `true` only for the expiry of the currently armed countdown.
    pub fn acknowledge(&mut self, fired: TimerFired) -> bool {
        if fired.kind != self.kind || fired.generation != self.generation || self.handle.is_none()
        {
            log::debug!("Ignoring stale {:?} timer", fired.kind);
            return false;
        }
        self.handle = None;
        true
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

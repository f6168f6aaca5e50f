//! Progressive reveal of answer text that has already arrived.
//!
//! [`Revealer`] is the pure state machine; [`RevealTicker`] drives one on a
//! tokio interval and publishes the visible prefix over a channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_REVEAL_STEP: usize = 5;
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    Advancing,
    Settled,
}

/// Visible prefix of `target`, measured in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revealer {
    target: String,
    target_len: usize,
    visible: usize,
    step: usize,
    phase: RevealPhase,
}

impl Revealer {
    pub fn new(target: impl Into<String>, step: usize) -> Self {
        let target = target.into();
        Self {
            target_len: target.chars().count(),
            target,
            visible: 0,
            step: step.max(1),
            phase: RevealPhase::Idle,
        }
    }

    /// Fully visible from the start.
    pub fn settled(target: impl Into<String>, step: usize) -> Self {
        let mut revealer = Self::new(target, step);
        revealer.visible = revealer.target_len;
        revealer.phase = RevealPhase::Settled;
        revealer
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn visible_len(&self) -> usize {
        self.visible
    }

    pub fn is_settled(&self) -> bool {
        self.phase == RevealPhase::Settled
    }

    pub fn is_fully_visible(&self) -> bool {
        self.visible >= self.target_len
    }

    pub fn visible_text(&self) -> &str {
        match self.target.char_indices().nth(self.visible) {
            Some((byte, _)) => &self.target[..byte],
            None => &self.target,
        }
    }

    /// Starts advancing. Only has an effect while idle; returns whether the
    /// phase changed.
    pub fn activate(&mut self) -> bool {
        if self.phase != RevealPhase::Idle {
            return false;
        }
        self.phase = if self.is_fully_visible() {
            RevealPhase::Settled
        } else {
            RevealPhase::Advancing
        };
        true
    }

    /// Grows the prefix by one step. Returns the new visible length, or
    /// `None` when not advancing.
    pub fn tick(&mut self) -> Option<usize> {
        if self.phase != RevealPhase::Advancing {
            return None;
        }
        self.visible = (self.visible + self.step).min(self.target_len);
        if self.is_fully_visible() {
            self.phase = RevealPhase::Settled;
        }
        Some(self.visible)
    }

    /// Replaces the text being revealed. The prefix is kept (clamped to the
    /// new length), never reset.
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
        self.target_len = self.target.chars().count();
        self.visible = self.visible.min(self.target_len);
        self.sync_phase();
    }

    /// Jumps the prefix forward to `visible` characters. Never moves it
    /// backwards.
    pub fn advance_to(&mut self, visible: usize) {
        self.visible = self.visible.max(visible).min(self.target_len);
        self.sync_phase();
    }

    fn sync_phase(&mut self) {
        self.phase = match self.phase {
            RevealPhase::Settled if !self.is_fully_visible() => RevealPhase::Advancing,
            RevealPhase::Advancing if self.is_fully_visible() => RevealPhase::Settled,
            phase => phase,
        };
    }
}

/// One published state of a running [`RevealTicker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealEvent {
    pub visible: usize,
    pub text: String,
    pub phase: RevealPhase,
}

impl RevealEvent {
    fn capture(revealer: &Revealer) -> Self {
        Self {
            visible: revealer.visible_len(),
            text: revealer.visible_text().to_string(),
            phase: revealer.phase(),
        }
    }
}

#[derive(Debug)]
enum RevealCommand {
    Activate,
    Retarget(String),
}

/// Control side of a running ticker. Dropping it stops the task.
pub struct RevealHandle {
    commands: mpsc::UnboundedSender<RevealCommand>,
    cancel_token: CancellationToken,
}

impl RevealHandle {
    pub fn activate(&self) {
        let _ = self.commands.send(RevealCommand::Activate);
    }

    pub fn retarget(&self, target: impl Into<String>) {
        let _ = self.commands.send(RevealCommand::Retarget(target.into()));
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub struct RevealTicker;

impl RevealTicker {
    /// Runs `revealer` on a background task, publishing an event each time
    /// the visible text changes. Must be called inside a tokio runtime.
    pub fn spawn(
        revealer: Revealer,
        period: Duration,
    ) -> (RevealHandle, mpsc::UnboundedReceiver<RevealEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        tokio::spawn(run_ticker(
            revealer,
            period,
            command_rx,
            event_tx,
            cancel_token.clone(),
        ));

        (
            RevealHandle {
                commands: command_tx,
                cancel_token,
            },
            event_rx,
        )
    }
}

async fn run_ticker(
    mut revealer: Revealer,
    period: Duration,
    mut commands: mpsc::UnboundedReceiver<RevealCommand>,
    events: mpsc::UnboundedSender<RevealEvent>,
    cancel_token: CancellationToken,
) {
    let period = period.max(Duration::from_millis(1));
    let mut ticker: Option<Interval> = None;
    let mut last_text = revealer.visible_text().to_string();

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            command = commands.recv() => match command {
                Some(RevealCommand::Activate) => {
                    revealer.activate();
                }
                Some(RevealCommand::Retarget(target)) => revealer.set_target(target),
                None => break,
            },
            _ = next_tick(&mut ticker) => {
                revealer.tick();
            }
        }

        match (revealer.phase(), ticker.is_some()) {
            (RevealPhase::Advancing, false) => {
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker = Some(interval);
            }
            (RevealPhase::Idle | RevealPhase::Settled, true) => ticker = None,
            _ => {}
        }

        if revealer.visible_text() != last_text {
            if cancel_token.is_cancelled() {
                break;
            }
            last_text = revealer.visible_text().to_string();
            if events.send(RevealEvent::capture(&revealer)).is_err() {
                break;
            }
        }
    }

    debug!(visible = revealer.visible_len(), "reveal ticker stopped");
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_after_ceil_n_over_s_ticks() {
        let mut revealer = Revealer::new("a".repeat(23), 5);
        assert_eq!(revealer.tick(), None, "idle revealer must not advance");
        assert!(revealer.activate());

        let mut ticks = 0;
        while revealer.tick().is_some() {
            ticks += 1;
        }
        assert_eq!(ticks, 23_usize.div_ceil(5));
        assert!(revealer.is_settled());
        assert_eq!(revealer.visible_len(), 23);
        assert_eq!(revealer.tick(), None);
    }

    #[test]
    fn activation_happens_once() {
        let mut revealer = Revealer::new("hello", 2);
        assert!(revealer.activate());
        assert!(!revealer.activate());
        assert_eq!(revealer.tick(), Some(2));
    }

    #[test]
    fn activating_empty_text_settles_immediately() {
        let mut revealer = Revealer::new("", 5);
        revealer.activate();
        assert!(revealer.is_settled());
    }

    #[test]
    fn longer_target_resumes_without_reset() {
        let mut revealer = Revealer::settled("hello", 5);
        revealer.set_target("hello world");
        assert_eq!(revealer.phase(), RevealPhase::Advancing);
        assert_eq!(revealer.visible_text(), "hello");
        assert_eq!(revealer.tick(), Some(10));
        assert_eq!(revealer.tick(), Some(11));
        assert!(revealer.is_settled());
    }

    #[test]
    fn shorter_target_clamps_prefix() {
        let mut revealer = Revealer::new("abcdefghij", 4);
        revealer.activate();
        revealer.tick();
        revealer.tick();
        revealer.set_target("abc");
        assert_eq!(revealer.visible_len(), 3);
        assert!(revealer.is_settled());
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let mut revealer = Revealer::new("héllo wörld", 2);
        revealer.activate();
        revealer.tick();
        assert_eq!(revealer.visible_text(), "hé");
        revealer.advance_to(1);
        assert_eq!(revealer.visible_text(), "hé");
    }

    #[test]
    fn zero_step_is_clamped_to_one() {
        assert_eq!(Revealer::new("abc", 0).step(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_publishes_each_step_until_settled() {
        let start = Instant::now();
        let (handle, mut rx) =
            RevealTicker::spawn(Revealer::new("x".repeat(23), 5), DEFAULT_REVEAL_INTERVAL);
        handle.activate();

        let mut visible = Vec::new();
        while let Some(event) = rx.recv().await {
            visible.push(event.visible);
            if event.phase == RevealPhase::Settled {
                break;
            }
        }
        assert_eq!(visible, vec![5, 10, 15, 20, 23]);
        assert!(start.elapsed() >= DEFAULT_REVEAL_INTERVAL * 5);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_ticker_publishes_nothing() {
        let (_handle, mut rx) =
            RevealTicker::spawn(Revealer::new("pending", 5), DEFAULT_REVEAL_INTERVAL);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn retarget_after_settling_resumes() {
        let (handle, mut rx) =
            RevealTicker::spawn(Revealer::new("hello", 5), DEFAULT_REVEAL_INTERVAL);
        handle.activate();
        let first = rx.recv().await.unwrap();
        assert_eq!(first.phase, RevealPhase::Settled);

        handle.retarget("hello world");
        let second = rx.recv().await.unwrap();
        let third = rx.recv().await.unwrap();
        assert_eq!(second.text, "hello worl");
        assert_eq!(third.text, "hello world");
        assert_eq!(third.phase, RevealPhase::Settled);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_events() {
        let (handle, mut rx) =
            RevealTicker::spawn(Revealer::new("y".repeat(500), 5), DEFAULT_REVEAL_INTERVAL);
        handle.activate();
        assert_eq!(rx.recv().await.unwrap().visible, 5);

        drop(handle);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.recv().await.is_none());
    }
}

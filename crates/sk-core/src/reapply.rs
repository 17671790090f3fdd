//! Debounced reapplication loop
//!
//! Host pages rewrite their DOM and can strip or reorder the managed node.
//! Every mutation signal (re)starts a debounce timer; when it expires the
//! controller re-injects the current in-memory override. The loop never
//! carries an override of its own, so an expiry always applies whatever is
//! current at that moment.
//!
//! ```text
//!   Idle --mutation--> PendingReapply --mutation--> PendingReapply (timer reset)
//!                            |
//!                         expiry
//!                            v
//!                          Idle (reapply)
//! ```

use std::time::Duration;

use crate::error::DomError;

/// Cancellable one-shot timers.
///
/// When a timer fires the host hands `token` back to
/// [`StyleController::handle_reapply_timer`](crate::StyleController::handle_reapply_timer).
pub trait Scheduler {
    type Handle;

    fn schedule(&mut self, delay: Duration, token: u64) -> Result<Self::Handle, DomError>;
    fn cancel(&mut self, handle: Self::Handle);
}

/// State of the loop.
#[derive(Debug)]
pub enum LoopState<H> {
    Idle,
    PendingReapply { token: u64, handle: H },
}

/// Two-state debounce machine.
pub struct ReapplyLoop<S: Scheduler> {
    scheduler: S,
    delay: Duration,
    state: LoopState<S::Handle>,
    next_token: u64,
}

impl<S: Scheduler> ReapplyLoop<S> {
    pub fn new(scheduler: S, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            state: LoopState::Idle,
            next_token: 0,
        }
    }

    /// A page mutation was observed: cancel any pending timer and start a
    /// fresh one.
    pub fn on_mutation(&mut self) {
        self.cancel();

        self.next_token = self.next_token.wrapping_add(1);
        let token = self.next_token;
        match self.scheduler.schedule(self.delay, token) {
            Ok(handle) => self.state = LoopState::PendingReapply { token, handle },
            Err(e) => log::warn!("Failed to schedule reapply: {e}"),
        }
    }

    /// A timer fired. Returns whether it is the live one, in which case the
    /// loop is back to idle and the caller reapplies.
    pub fn on_timer(&mut self, token: u64) -> bool {
        match self.state {
            LoopState::PendingReapply { token: live, .. } if live == token => {
                self.state = LoopState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending timer.
    pub fn cancel(&mut self) {
        if let LoopState::PendingReapply { handle, .. } =
            std::mem::replace(&mut self.state, LoopState::Idle)
        {
            self.scheduler.cancel(handle);
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, LoopState::PendingReapply { .. })
    }
}

/// Scheduler driven by hand from tests.
#[cfg(test)]
pub(crate) mod manual {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    struct Timers {
        now: u64,
        next_handle: u32,
        /// (handle, due, token)
        pending: Vec<(u32, u64, u64)>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct ManualScheduler(Rc<RefCell<Timers>>);

    impl ManualScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn pending(&self) -> usize {
            self.0.borrow().pending.len()
        }

        /// Advance the clock and return the tokens of expired timers.
        pub fn advance(&self, ms: u64) -> Vec<u64> {
            let mut timers = self.0.borrow_mut();
            timers.now += ms;
            let now = timers.now;
            let (due, rest): (Vec<_>, Vec<_>) =
                timers.pending.drain(..).partition(|&(_, at, _)| at <= now);
            timers.pending = rest;
            due.into_iter().map(|(_, _, token)| token).collect()
        }
    }

    impl Scheduler for ManualScheduler {
        type Handle = u32;

        fn schedule(&mut self, delay: Duration, token: u64) -> Result<u32, DomError> {
            let mut timers = self.0.borrow_mut();
            timers.next_handle += 1;
            let handle = timers.next_handle;
            let due = timers.now + delay.as_millis() as u64;
            timers.pending.push((handle, due, token));
            Ok(handle)
        }

        fn cancel(&mut self, handle: u32) {
            self.0.borrow_mut().pending.retain(|&(h, _, _)| h != handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::manual::ManualScheduler;
    use super::*;

    fn looped() -> (ReapplyLoop<ManualScheduler>, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        (ReapplyLoop::new(scheduler.clone(), Duration::from_millis(100)), scheduler)
    }

    #[test]
    fn test_single_signal_fires_once() {
        let (mut reapply, timers) = looped();
        assert!(!reapply.is_pending());

        reapply.on_mutation();
        assert!(reapply.is_pending());
        assert!(timers.advance(99).is_empty());

        let fired = timers.advance(1);
        assert_eq!(fired.len(), 1);
        assert!(reapply.on_timer(fired[0]));
        assert!(!reapply.is_pending());
    }

    #[test]
    fn test_burst_resets_timer() {
        let (mut reapply, timers) = looped();
        for _ in 0..5 {
            reapply.on_mutation();
            assert!(timers.advance(60).is_empty());
        }
        assert_eq!(timers.pending(), 1);

        let fired = timers.advance(40);
        assert_eq!(fired.len(), 1);
        assert!(reapply.on_timer(fired[0]));
    }

    #[test]
    fn test_stale_token_ignored() {
        let (mut reapply, _timers) = looped();
        reapply.on_mutation();
        reapply.on_mutation();
        // Token 1 belonged to the cancelled timer
        assert!(!reapply.on_timer(1));
        assert!(reapply.is_pending());
        assert!(reapply.on_timer(2));
        assert!(!reapply.on_timer(2));
    }

    #[test]
    fn test_cancel() {
        let (mut reapply, timers) = looped();
        reapply.on_mutation();
        reapply.cancel();
        assert!(!reapply.is_pending());
        assert_eq!(timers.pending(), 0);
    }
}

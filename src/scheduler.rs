//! Keystroke debouncing
//!
//! Collapses bursts of keystrokes into a single search per pause in typing.
//! The scheduler never reads a clock itself; callers pass `now` in so the
//! host event loop (or a test) decides how time moves.

use std::time::{Duration, Instant};

/// Debounce state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// A search for `query` fires once `deadline` has passed
    Pending { query: String, deadline: Instant },
}

/// What a keystroke did to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    /// Query shorter than the trigger length; the panel should close
    TooShort,
    /// Search scheduled for the trimmed query
    Scheduled { deadline: Instant },
}

/// Single-shot debounce timer over the latest query
#[derive(Debug, Clone)]
pub struct QueryScheduler {
    min_chars: usize,
    debounce: Duration,
    state: SchedulerState,
}

impl QueryScheduler {
    pub fn new(min_chars: usize, debounce: Duration) -> Self {
        Self {
            min_chars,
            debounce,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Feed the raw input value after a keystroke.
    ///
    /// Any pending timer is superseded.
    pub fn on_keystroke(&mut self, raw: &str, now: Instant) -> Keystroke {
        let query = raw.trim();

        if query.chars().count() < self.min_chars {
            self.state = SchedulerState::Idle;
            return Keystroke::TooShort;
        }

        let deadline = now + self.debounce;
        self.state = SchedulerState::Pending {
            query: query.to_string(),
            deadline,
        };
        Keystroke::Scheduled { deadline }
    }

    /// Fire the pending search if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = matches!(
            &self.state,
            SchedulerState::Pending { deadline, .. } if now >= *deadline
        );
        if !due {
            return None;
        }

        match std::mem::replace(&mut self.state, SchedulerState::Idle) {
            SchedulerState::Pending { query, .. } => Some(query),
            SchedulerState::Idle => None,
        }
    }

    /// Deadline of the pending search, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            SchedulerState::Pending { deadline, .. } => Some(*deadline),
            SchedulerState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn short_queries_never_fire() {
        let t0 = Instant::now();
        let mut scheduler = QueryScheduler::new(2, DEBOUNCE);

        assert_eq!(scheduler.on_keystroke("a", t0), Keystroke::TooShort);
        assert_eq!(scheduler.on_keystroke("  b  ", t0), Keystroke::TooShort);
        assert_eq!(scheduler.poll(t0 + ms(10_000)), None);
        assert_eq!(scheduler.state(), &SchedulerState::Idle);
    }

    #[test]
    fn burst_collapses_into_one_search_for_last_value() {
        let t0 = Instant::now();
        let mut scheduler = QueryScheduler::new(2, DEBOUNCE);

        for (i, value) in ["wi", "wid", "widg", "widge"].iter().enumerate() {
            let now = t0 + ms(100 * i as u64);
            scheduler.on_keystroke(value, now);
            assert_eq!(scheduler.poll(now), None);
        }

        // 299ms after the last keystroke: still quiet
        assert_eq!(scheduler.poll(t0 + ms(300 + 299)), None);
        assert_eq!(scheduler.poll(t0 + ms(300 + 300)), Some("widge".to_string()));
        // single-shot
        assert_eq!(scheduler.poll(t0 + ms(5_000)), None);
    }

    #[test]
    fn shortening_the_query_cancels_the_pending_search() {
        let t0 = Instant::now();
        let mut scheduler = QueryScheduler::new(2, DEBOUNCE);

        scheduler.on_keystroke("wid", t0);
        assert_eq!(scheduler.on_keystroke("w", t0 + ms(50)), Keystroke::TooShort);
        assert_eq!(scheduler.poll(t0 + ms(1_000)), None);
    }

    #[test]
    fn query_is_trimmed_before_firing() {
        let t0 = Instant::now();
        let mut scheduler = QueryScheduler::new(2, DEBOUNCE);

        assert_eq!(
            scheduler.on_keystroke("  mouse ", t0),
            Keystroke::Scheduled { deadline: t0 + DEBOUNCE }
        );
        assert_eq!(scheduler.poll(t0 + DEBOUNCE), Some("mouse".to_string()));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let t0 = Instant::now();
        let mut scheduler = QueryScheduler::new(3, DEBOUNCE);
        // two characters, four bytes
        assert_eq!(scheduler.on_keystroke("çã", t0), Keystroke::TooShort);
    }

    #[test]
    fn zero_trigger_length_and_zero_debounce() {
        let t0 = Instant::now();
        let mut scheduler = QueryScheduler::new(0, Duration::ZERO);

        scheduler.on_keystroke("", t0);
        assert_eq!(scheduler.next_deadline(), Some(t0));
        assert_eq!(scheduler.poll(t0), Some(String::new()));
    }
}

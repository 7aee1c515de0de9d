use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    job: T,
    due: Instant,
}

/// Single-slot timer with a quiescence delay gated by a minimum interval
/// between releases. Time is supplied by the caller on every call.
#[derive(Debug, Clone)]
pub(crate) struct CoalescingScheduler<T> {
    quiet: Duration,
    min_interval: Duration,
    pending: Option<Pending<T>>,
    last_release: Option<Instant>,
}

impl<T> CoalescingScheduler<T> {
    pub(crate) fn new(quiet: Duration, min_interval: Duration) -> Self {
        Self {
            quiet,
            min_interval,
            pending: None,
            last_release: None,
        }
    }

    /// Replaces any pending job and restarts the quiescence timer.
    pub(crate) fn schedule(&mut self, now: Instant, job: T) {
        self.pending = Some(Pending {
            job,
            due: now + self.quiet,
        });
    }

    pub(crate) fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        let pending = self.pending.as_ref()?;
        let gate = self
            .last_release
            .map(|released| released + self.min_interval);
        Some(match gate {
            Some(gate) if gate > pending.due => gate,
            _ => pending.due,
        })
    }

    pub(crate) fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.next_deadline()?;
        if now < deadline {
            return None;
        }
        self.last_release = Some(now);
        self.pending.take().map(|pending| pending.job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(100);
    const WINDOW: Duration = Duration::from_millis(300);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn releases_only_after_quiescence() {
        let start = Instant::now();
        let mut scheduler = CoalescingScheduler::new(QUIET, WINDOW);
        scheduler.schedule(start, 7);
        assert_eq!(scheduler.poll(start + ms(50)), None);
        assert_eq!(scheduler.poll(start + ms(100)), Some(7));
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(scheduler.poll(start + ms(500)), None);
    }

    #[test]
    fn burst_of_schedules_collapses_to_one_release() {
        let start = Instant::now();
        let mut scheduler = CoalescingScheduler::new(QUIET, WINDOW);
        let mut released = Vec::new();
        for step in 0..10u64 {
            let now = start + ms(step * 20);
            scheduler.schedule(now, step);
            if let Some(job) = scheduler.poll(now) {
                released.push(job);
            }
        }
        assert!(released.is_empty());
        assert_eq!(scheduler.next_deadline(), Some(start + ms(180) + QUIET));
        released.extend(scheduler.poll(start + ms(400)));
        assert_eq!(released, vec![9]);
    }

    #[test]
    fn cancel_drops_pending_job() {
        let start = Instant::now();
        let mut scheduler = CoalescingScheduler::new(QUIET, WINDOW);
        scheduler.schedule(start, "stale");
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        assert_eq!(scheduler.poll(start + ms(1000)), None);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn releases_are_rate_limited() {
        let start = Instant::now();
        let mut scheduler = CoalescingScheduler::new(QUIET, WINDOW);
        scheduler.schedule(start, 1);
        assert_eq!(scheduler.poll(start + ms(100)), Some(1));

        scheduler.schedule(start + ms(110), 2);
        assert_eq!(scheduler.next_deadline(), Some(start + ms(400)));
        assert_eq!(scheduler.poll(start + ms(250)), None);
        assert_eq!(scheduler.poll(start + ms(399)), None);
        assert_eq!(scheduler.poll(start + ms(400)), Some(2));
    }
}

use std::time::{Duration, Instant};

use crate::engine::index::Control;

/// What a repeating task does on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Autoplay: one frame per tick, down when `reverse`, stopping after one
    /// pass when `once`.
    Autoplay { reverse: bool, once: bool },
    /// A held prev/next control.
    Repeat(Control),
}

/// Identifies one scheduled task. A handle from a cancelled or replaced task
/// no longer matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct ScheduledTask {
    handle: TaskHandle,
    kind: TaskKind,
    interval: Duration,
    next_due: Instant,
}

/// Single-slot repeating timer owned by a viewer. Nothing fires unless the
/// owner polls it, so ticks run on the owner's thread between events.
#[derive(Debug, Default)]
pub struct Scheduler {
    task: Option<ScheduledTask>,
    issued: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `kind`, replacing whatever was scheduled.
    pub fn schedule(&mut self, kind: TaskKind, interval: Duration, now: Instant) -> TaskHandle {
        self.issued += 1;
        let handle = TaskHandle(self.issued);
        let interval = interval.max(Duration::from_millis(1));
        self.task = Some(ScheduledTask {
            handle,
            kind,
            interval,
            next_due: now + interval,
        });
        handle
    }

    /// Cancel only if `handle` is still the live task.
    pub fn cancel_handle(&mut self, handle: TaskHandle) -> bool {
        if self.task.as_ref().is_some_and(|t| t.handle == handle) {
            self.task = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<TaskKind> {
        self.task.as_ref().map(|t| t.kind)
    }

    pub fn is_autoplay(&self) -> bool {
        matches!(self.current(), Some(TaskKind::Autoplay { .. }))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.task.as_ref().map(|t| t.next_due)
    }

    /// Fire at most once if the task is due. Missed periods are skipped
    /// rather than replayed in a burst.
    pub fn poll(&mut self, now: Instant) -> Option<TaskKind> {
        let task = self.task.as_mut()?;
        if now < task.next_due {
            return None;
        }
        task.next_due += task.interval;
        if task.next_due <= now {
            task.next_due = now + task.interval;
        }
        Some(task.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTOPLAY: TaskKind = TaskKind::Autoplay { reverse: false, once: false };

    #[test]
    fn fires_only_when_due() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(AUTOPLAY, Duration::from_millis(100), t0);
        assert_eq!(s.poll(t0 + Duration::from_millis(50)), None);
        assert_eq!(s.poll(t0 + Duration::from_millis(100)), Some(AUTOPLAY));
        assert_eq!(s.deadline(), Some(t0 + Duration::from_millis(200)));
    }

    #[test]
    fn skips_missed_periods() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(AUTOPLAY, Duration::from_millis(10), t0);
        let late = t0 + Duration::from_secs(1);
        assert!(s.poll(late).is_some());
        assert_eq!(s.poll(late), None);
        assert_eq!(s.deadline(), Some(late + Duration::from_millis(10)));
    }

    #[test]
    fn stale_handle_cannot_cancel_new_task() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        let old = s.schedule(AUTOPLAY, Duration::from_millis(10), t0);
        let new = s.schedule(TaskKind::Repeat(Control::Next), Duration::from_millis(10), t0);
        assert!(!s.cancel_handle(old));
        assert_eq!(s.current(), Some(TaskKind::Repeat(Control::Next)));
        assert!(s.cancel_handle(new));
        assert_eq!(s.current(), None);
        assert_eq!(s.poll(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn cancelled_handle_is_spent() {
        let mut s = Scheduler::new();
        let handle = s.schedule(AUTOPLAY, Duration::from_millis(10), Instant::now());
        assert!(s.is_autoplay());
        assert!(s.cancel_handle(handle));
        assert!(!s.is_autoplay());
        assert!(!s.cancel_handle(handle));
        assert_eq!(s.deadline(), None);
    }
}

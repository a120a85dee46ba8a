#![deny(unsafe_code)]
//! Cooperative periodic task set
//!
//! A fixed, ordered list of `{kind, period, next due}` records. The
//! dispatcher asks which tasks are due at `now`, runs them in list order and
//! sleeps until [`TaskSet::next_due_ms`]. Nothing here preempts or blocks.

use heapless::Vec;

use crate::config::TaskPeriods;

/// Number of task kinds
pub const TASK_COUNT: usize = 5;

/// Periodic units of work, listed in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskKind {
    /// Drain BLE notifications into the link state machine
    LinkPoll,
    /// Advance the calendar clock
    Tick,
    /// Re-publish Current Time (connected only)
    Push,
    /// Blink the status light (disconnected only)
    Indicator,
    /// Log the system time
    Report,
}

#[derive(Debug, Clone, Copy)]
struct PeriodicTask {
    kind: TaskKind,
    period_ms: u64,
    next_due_ms: u64,
    enabled: bool,
}

/// Due task kinds for one dispatch pass
pub type DueTasks = Vec<TaskKind, TASK_COUNT>;

#[derive(Debug, Clone)]
pub struct TaskSet {
    tasks: [PeriodicTask; TASK_COUNT],
}

impl TaskSet {
    /// Build the task set with every task first due one period after `now_ms`
    ///
    /// Push starts disabled (no link yet) and Indicator enabled.
    pub fn new(periods: &TaskPeriods, now_ms: u64) -> Self {
        let task = |kind, period_ms: u64, enabled| PeriodicTask {
            kind,
            period_ms,
            next_due_ms: now_ms + period_ms,
            enabled,
        };
        Self {
            tasks: [
                task(TaskKind::LinkPoll, periods.link_poll_ms, true),
                task(TaskKind::Tick, periods.tick_ms, true),
                task(TaskKind::Push, periods.push_ms, false),
                task(TaskKind::Indicator, periods.indicator_ms, true),
                task(TaskKind::Report, periods.report_ms, true),
            ],
        }
    }

    /// Collect tasks due at `now_ms`, in dispatch order, and reschedule them
    ///
    /// A task is rescheduled one period after its previous deadline. If it
    /// fell a full period or more behind, it is rescheduled one period after
    /// `now_ms` instead, so a stalled loop never causes a burst of catch-up
    /// runs.
    pub fn due(&mut self, now_ms: u64) -> DueTasks {
        let mut due = DueTasks::new();
        for task in self.tasks.iter_mut().filter(|t| t.enabled) {
            if now_ms < task.next_due_ms {
                continue;
            }
            task.next_due_ms += task.period_ms;
            if task.next_due_ms <= now_ms {
                task.next_due_ms = now_ms + task.period_ms;
            }
            // Capacity equals the number of tasks
            let _ = due.push(task.kind);
        }
        due
    }

    /// Enable or disable a task
    ///
    /// Enabling a disabled task arms it one period after `now_ms`. Enabling
    /// an already enabled task keeps its schedule.
    pub fn set_enabled(&mut self, kind: TaskKind, enabled: bool, now_ms: u64) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.kind == kind) {
            if enabled && !task.enabled {
                task.next_due_ms = now_ms + task.period_ms;
            }
            task.enabled = enabled;
        }
    }

    pub fn is_enabled(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind && t.enabled)
    }

    /// Earliest deadline among enabled tasks
    pub fn next_due_ms(&self) -> Option<u64> {
        self.tasks
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.next_due_ms)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periods() -> TaskPeriods {
        TaskPeriods::default()
    }

    #[test]
    fn test_nothing_due_before_first_period() {
        let mut tasks = TaskSet::new(&periods(), 0);
        assert!(tasks.due(4).is_empty());
        assert_eq!(tasks.due(5).as_slice(), &[TaskKind::LinkPoll]);
    }

    #[test]
    fn test_due_order_and_disabled_push() {
        let mut tasks = TaskSet::new(&periods(), 0);
        let due = tasks.due(5000);
        assert_eq!(
            due.as_slice(),
            &[
                TaskKind::LinkPoll,
                TaskKind::Tick,
                TaskKind::Indicator,
                TaskKind::Report
            ]
        );
        assert!(!tasks.is_enabled(TaskKind::Push));
    }

    #[test]
    fn test_reschedule_keeps_cadence() {
        let mut tasks = TaskSet::new(&periods(), 0);
        // Tick fires slightly late; next deadline stays on the 1 s grid
        assert!(tasks.due(1003).contains(&TaskKind::Tick));
        assert!(!tasks.due(1999).contains(&TaskKind::Tick));
        assert!(tasks.due(2000).contains(&TaskKind::Tick));
    }

    #[test]
    fn test_stall_does_not_burst() {
        let mut tasks = TaskSet::new(&periods(), 0);
        assert!(tasks.due(10_500).contains(&TaskKind::Tick));
        // Rescheduled relative to now, not replayed ten times
        assert!(!tasks.due(10_600).contains(&TaskKind::Tick));
        assert!(tasks.due(11_500).contains(&TaskKind::Tick));
    }

    #[test]
    fn test_enable_arms_from_now() {
        let mut tasks = TaskSet::new(&periods(), 0);
        tasks.set_enabled(TaskKind::Push, true, 7000);
        assert!(!tasks.due(8499).contains(&TaskKind::Push));
        assert!(tasks.due(8500).contains(&TaskKind::Push));

        tasks.set_enabled(TaskKind::Indicator, false, 8500);
        assert!(!tasks.due(20_000).contains(&TaskKind::Indicator));
    }

    #[test]
    fn test_next_due() {
        let mut tasks = TaskSet::new(&periods(), 100);
        assert_eq!(tasks.next_due_ms(), Some(105));
        tasks.set_enabled(TaskKind::LinkPoll, false, 100);
        assert_eq!(tasks.next_due_ms(), Some(1100));
    }
}

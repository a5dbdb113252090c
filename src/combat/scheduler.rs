//! Wall-clock scheduler for delayed skill effects
//!
//! Skills queue follow-up work (chain hops, beam ticks, delayed strikes) as
//! plain data tagged with a due time. The scheduler only orders and releases
//! them; whoever runs a released action re-validates every entity it touches.

/// A queued action with its due time and insertion sequence.
#[derive(Debug, Clone)]
struct ScheduledTask<A> {
    due: f32,
    seq: u64,
    action: A,
}

/// Due-time ordered queue of deferred actions.
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    tasks: Vec<ScheduledTask<A>>,
    next_seq: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to run once the wall clock reaches `due`.
    pub fn schedule(&mut self, due: f32, action: A) {
        self.tasks.push(ScheduledTask {
            due,
            seq: self.next_seq,
            action,
        });
        self.next_seq += 1;
    }

    /// Remove and return every action due at `now`, earliest first.
    /// Actions due at the same time keep their scheduling order.
    pub fn take_due(&mut self, now: f32) -> Vec<A> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.due <= now);
        self.tasks = pending;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|task| task.action).collect()
    }

    /// Time of the earliest pending action.
    pub fn next_due(&self) -> Option<f32> {
        self.tasks.iter().map(|t| t.due).min_by(|a, b| a.total_cmp(b))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every pending action.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_orders_by_time_then_insertion() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(2.0, "late");
        scheduler.schedule(1.0, "first");
        scheduler.schedule(1.0, "second");
        scheduler.schedule(5.0, "future");

        assert_eq!(scheduler.take_due(2.0), vec!["first", "second", "late"]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(5.0));
    }

    #[test]
    fn test_nothing_due_before_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, 42);
        assert!(scheduler.take_due(0.99).is_empty());
        assert_eq!(scheduler.take_due(1.0), vec![42]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, ());
        scheduler.clear();
        assert!(scheduler.take_due(10.0).is_empty());
        assert_eq!(scheduler.next_due(), None);
    }
}

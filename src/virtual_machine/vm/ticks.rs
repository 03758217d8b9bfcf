use crate::virtual_machine::isa::Op;

/// Default cap on dispatch cycles per `run`.
pub const DEFAULT_TICK_BUDGET: u64 = 1_000_000;

/// Per-opcode count of dispatched cycles for one run.
///
/// Backed by a flat array indexed by [`Op`] discriminant so accounting stays
/// branch-free on the hot path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TickProfile {
    counts: [u64; Op::COUNT],
}

impl Default for TickProfile {
    fn default() -> Self {
        Self {
            counts: [0; Op::COUNT],
        }
    }
}

impl TickProfile {
    /// Creates a new empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one dispatched `op`.
    #[inline(always)]
    pub fn record(&mut self, op: Op) {
        let slot = &mut self.counts[op as usize];
        *slot = slot.saturating_add(1);
    }

    /// Returns how many times `op` was dispatched.
    pub fn count(&self, op: Op) -> u64 {
        self.counts[op as usize]
    }

    /// Returns the number of dispatched instructions across all opcodes.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Iterates opcodes that were dispatched at least once.
    pub fn iter(&self) -> impl Iterator<Item = (Op, u64)> + '_ {
        Op::ALL
            .into_iter()
            .zip(self.counts)
            .filter(|(_, count)| *count > 0)
    }
}

/// Watchdog over the number of dispatch cycles in a single run.
#[derive(Clone, Debug)]
pub(super) struct Watchdog {
    budget: u64,
    tick: u64,
}

impl Watchdog {
    pub(super) fn new(budget: u64) -> Self {
        Self { budget, tick: 0 }
    }

    pub(super) fn reset(&mut self) {
        self.tick = 0;
    }

    /// Counts one cycle; returns `false` once the budget is exceeded.
    #[inline(always)]
    pub(super) fn tick(&mut self) -> bool {
        self.tick = self.tick.saturating_add(1);
        self.tick <= self.budget
    }

    pub(super) fn ticks(&self) -> u64 {
        self.tick
    }

    pub(super) fn budget(&self) -> u64 {
        self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_counts_per_op() {
        let mut profile = TickProfile::new();
        profile.record(Op::Noop);
        profile.record(Op::Noop);
        profile.record(Op::Jmp);
        assert_eq!(profile.count(Op::Noop), 2);
        assert_eq!(profile.count(Op::Jmp), 1);
        assert_eq!(profile.count(Op::Gosub), 0);
        assert_eq!(profile.total(), 3);
        assert_eq!(
            profile.iter().collect::<Vec<_>>(),
            vec![(Op::Jmp, 1), (Op::Noop, 2)]
        );
    }

    #[test]
    fn watchdog_allows_exactly_budget_ticks() {
        let mut dog = Watchdog::new(3);
        assert!(dog.tick());
        assert!(dog.tick());
        assert!(dog.tick());
        assert!(!dog.tick());
        assert_eq!(dog.ticks(), 4);
        dog.reset();
        assert_eq!(dog.ticks(), 0);
        assert_eq!(dog.budget(), 3);
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let mut dog = Watchdog::new(0);
        assert!(!dog.tick());
    }
}

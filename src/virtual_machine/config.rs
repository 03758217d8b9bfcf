//! Construction-time configuration for a [`Vm`](super::vm::Vm).

use crate::virtual_machine::cell::Cell;
use crate::virtual_machine::vm::DEFAULT_TICK_BUDGET;

/// Bytes per kibibyte.
pub const KIB: usize = 1024;

/// Default core size in KiB.
pub const DEFAULT_CORE_KIB: usize = 64;

/// Default size of each stack in KiB.
pub const DEFAULT_STACK_KIB: usize = 4;

/// What a `HALT` instruction does.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum HaltMode {
    /// `HALT` ends the run successfully.
    #[default]
    Stop,
    /// `HALT` only advances the program counter, like `NOOP`.
    Advance,
}

/// Region sizes (in whole cells), watchdog budget, and halt behaviour.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VmConfig {
    pub core_capacity: usize,
    pub data_capacity: usize,
    pub return_capacity: usize,
    /// Maximum dispatch cycles per `run`.
    pub tick_budget: u64,
    pub halt_mode: HaltMode,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::from_kib(DEFAULT_CORE_KIB, DEFAULT_STACK_KIB, DEFAULT_STACK_KIB)
    }
}

impl VmConfig {
    /// Sizes each region in whole cells.
    pub fn new(core_capacity: usize, data_capacity: usize, return_capacity: usize) -> Self {
        Self {
            core_capacity,
            data_capacity,
            return_capacity,
            tick_budget: DEFAULT_TICK_BUDGET,
            halt_mode: HaltMode::default(),
        }
    }

    /// Sizes each region from a kibibyte budget, rounding down to whole cells.
    pub fn from_kib(core_kib: usize, data_kib: usize, return_kib: usize) -> Self {
        Self::new(
            kib_to_cells(core_kib),
            kib_to_cells(data_kib),
            kib_to_cells(return_kib),
        )
    }

    pub fn with_tick_budget(mut self, tick_budget: u64) -> Self {
        self.tick_budget = tick_budget;
        self
    }

    pub fn with_halt_mode(mut self, halt_mode: HaltMode) -> Self {
        self.halt_mode = halt_mode;
        self
    }
}

/// Number of whole cells that fit in `kib` kibibytes.
pub fn kib_to_cells(kib: usize) -> usize {
    kib.saturating_mul(KIB) / size_of::<Cell>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kib_scaling_uses_cell_size() {
        let per_kib = KIB / size_of::<Cell>();
        assert_eq!(kib_to_cells(1), per_kib);
        assert_eq!(kib_to_cells(3), 3 * KIB / size_of::<Cell>());
        assert_eq!(kib_to_cells(0), 0);
    }

    #[test]
    fn defaults() {
        let config = VmConfig::default();
        assert_eq!(config.core_capacity, kib_to_cells(DEFAULT_CORE_KIB));
        assert_eq!(config.data_capacity, kib_to_cells(DEFAULT_STACK_KIB));
        assert_eq!(config.return_capacity, kib_to_cells(DEFAULT_STACK_KIB));
        assert_eq!(config.tick_budget, DEFAULT_TICK_BUDGET);
        assert_eq!(config.halt_mode, HaltMode::Stop);
    }

    #[test]
    fn builders() {
        let config = VmConfig::new(4, 4, 4)
            .with_tick_budget(10)
            .with_halt_mode(HaltMode::Advance);
        assert_eq!(config.core_capacity, 4);
        assert_eq!(config.tick_budget, 10);
        assert_eq!(config.halt_mode, HaltMode::Advance);
    }
}

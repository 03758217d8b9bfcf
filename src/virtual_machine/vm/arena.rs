use crate::virtual_machine::cell::Cell;
use crate::virtual_machine::errors::VmError;
use std::ops::Range;

/// Single cell buffer holding the core and both stacks.
///
/// Memory layout: `[core][data stack][return stack]`
/// - **Core**: program cells, index 0 is the lowest address.
/// - **Data stack**: operand cells.
/// - **Return stack**: saved resume addresses.
///
/// Regions are fixed at construction and never resized. Addresses stored in cells
/// are indices into this buffer, and since the core starts at index 0 a core address
/// equals its core-relative index.
pub(super) struct Arena {
    cells: Vec<Cell>,
    core: Range<usize>,
    data: Range<usize>,
    ret: Range<usize>,
}

impl Arena {
    /// Allocates all three regions and sentinel-fills every cell.
    ///
    /// Core cells become [`Cell::CORE_SENTINEL`] so a stray jump into unformatted
    /// program space traps deterministically; stack cells become
    /// [`Cell::STACK_SENTINEL`].
    pub(super) fn new(core: usize, data: usize, ret: usize) -> Result<Self, VmError> {
        let overflow = VmError::CapacityOverflow { core, data, ret };
        let data_start = core;
        let ret_start = data_start.checked_add(data).ok_or(overflow.clone())?;
        let end = ret_start.checked_add(ret).ok_or(overflow.clone())?;

        let mut cells = Vec::new();
        cells.try_reserve_exact(end).map_err(|_| overflow)?;
        cells.resize(data_start, Cell::CORE_SENTINEL);
        cells.resize(end, Cell::STACK_SENTINEL);

        Ok(Self {
            cells,
            core: 0..data_start,
            data: data_start..ret_start,
            ret: ret_start..end,
        })
    }

    pub(super) fn core(&self) -> Range<usize> {
        self.core.clone()
    }

    pub(super) fn data(&self) -> Range<usize> {
        self.data.clone()
    }

    pub(super) fn ret(&self) -> Range<usize> {
        self.ret.clone()
    }

    pub(super) fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(super) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub(super) fn core_cells(&self) -> &[Cell] {
        &self.cells[self.core.clone()]
    }

    pub(super) fn core_cells_mut(&mut self) -> &mut [Cell] {
        let core = self.core.clone();
        &mut self.cells[core]
    }

    /// Returns the core cell at arena index `index`, or `None` outside the core.
    #[inline]
    pub(super) fn fetch(&self, index: usize) -> Option<Cell> {
        if self.core.contains(&index) {
            Some(self.cells[index])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::cell::Value;
    use crate::virtual_machine::isa::Op;

    #[test]
    fn regions_are_contiguous_and_disjoint() {
        let arena = Arena::new(4, 3, 2).unwrap();
        assert_eq!(arena.core(), 0..4);
        assert_eq!(arena.data(), 4..7);
        assert_eq!(arena.ret(), 7..9);
        assert_eq!(arena.cells().len(), 9);
    }

    #[test]
    fn sentinel_fill() {
        let arena = Arena::new(3, 2, 2).unwrap();
        for cell in arena.core_cells() {
            assert_eq!(cell.op, Op::Panic);
            assert_eq!(cell.value, Value::Text(Some("a blast from the past!")));
        }
        for cell in &arena.cells()[3..] {
            assert_eq!(*cell, Cell::STACK_SENTINEL);
        }
    }

    #[test]
    fn fetch_is_core_only() {
        let arena = Arena::new(2, 2, 2).unwrap();
        assert_eq!(arena.fetch(1), Some(Cell::CORE_SENTINEL));
        assert_eq!(arena.fetch(2), None);
        assert_eq!(arena.fetch(usize::MAX), None);
    }

    #[test]
    fn zero_capacities_are_legal() {
        let arena = Arena::new(0, 0, 0).unwrap();
        assert!(arena.cells().is_empty());
        assert_eq!(arena.fetch(0), None);
    }

    #[test]
    fn capacity_overflow() {
        assert!(matches!(
            Arena::new(usize::MAX, 1, 0),
            Err(VmError::CapacityOverflow { .. })
        ));
        assert!(matches!(
            Arena::new(1, usize::MAX - 1, 1),
            Err(VmError::CapacityOverflow { .. })
        ));
        // Fits in usize as a count but not as an allocation.
        assert!(matches!(
            Arena::new(usize::MAX / 2, 0, 0),
            Err(VmError::CapacityOverflow { .. })
        ));
    }
}

use crate::virtual_machine::cell::Cell;
use crate::virtual_machine::errors::PanicKind;
use std::ops::Range;

/// Cursor over one fixed-capacity stack region of the arena.
///
/// `top` points at the current top element (inclusive). `None` is the
/// "below start" position of an empty stack; a push computes the next slot first
/// and only moves the cursor once the write is known to fit.
#[derive(Clone, Debug)]
pub(super) struct Stack {
    region: Range<usize>,
    top: Option<usize>,
    overflow: PanicKind,
    underflow: PanicKind,
}

impl Stack {
    pub(super) fn data(region: Range<usize>) -> Self {
        Self::new(
            region,
            PanicKind::DataStackOverflow,
            PanicKind::DataStackUnderflow,
        )
    }

    pub(super) fn ret(region: Range<usize>) -> Self {
        Self::new(
            region,
            PanicKind::ReturnStackOverflow,
            PanicKind::ReturnStackUnderflow,
        )
    }

    fn new(region: Range<usize>, overflow: PanicKind, underflow: PanicKind) -> Self {
        Self {
            region,
            top: None,
            overflow,
            underflow,
        }
    }

    /// Arena index of the top element, `None` when empty.
    pub(super) fn top(&self) -> Option<usize> {
        self.top
    }

    pub(super) fn depth(&self) -> usize {
        self.top.map_or(0, |top| top + 1 - self.region.start)
    }

    pub(super) fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Writes `cell` at the next slot.
    ///
    /// Returns the overflow kind, with the cursor untouched, when the region is full.
    #[inline]
    pub(super) fn push(&mut self, cells: &mut [Cell], cell: Cell) -> Result<(), PanicKind> {
        let next = match self.top {
            Some(top) => top + 1,
            None => self.region.start,
        };
        if next >= self.region.end {
            return Err(self.overflow);
        }
        cells[next] = cell;
        self.top = Some(next);
        Ok(())
    }

    /// Copies out the top cell and retreats the cursor.
    #[inline]
    pub(super) fn pop(&mut self, cells: &[Cell]) -> Result<Cell, PanicKind> {
        let top = self.top.ok_or(self.underflow)?;
        let cell = cells[top];
        self.top = if top == self.region.start {
            None
        } else {
            Some(top - 1)
        };
        Ok(cell)
    }

    /// Live cells, bottom first.
    pub(super) fn live<'a>(&self, cells: &'a [Cell]) -> &'a [Cell] {
        &cells[self.region.start..self.region.start + self.depth()]
    }

    pub(super) fn clear(&mut self) {
        self.top = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(len: usize) -> Vec<Cell> {
        vec![Cell::STACK_SENTINEL; len]
    }

    #[test]
    fn pops_in_reverse_push_order() {
        let mut cells = arena(8);
        let mut stack = Stack::data(2..6);
        let pushed = [Cell::integer(1), Cell::number(2.5), Cell::text("three")];
        for cell in pushed {
            stack.push(&mut cells, cell).unwrap();
        }
        assert_eq!(stack.top(), Some(4));
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.live(&cells), &pushed);

        for expected in pushed.iter().rev() {
            assert_eq!(stack.pop(&cells).unwrap(), *expected);
        }
        assert_eq!(stack.top(), None);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn underflow_leaves_cursor() {
        let cells = arena(4);
        let mut stack = Stack::data(0..4);
        assert_eq!(stack.pop(&cells), Err(PanicKind::DataStackUnderflow));
        assert_eq!(stack.top(), None);

        let mut ret = Stack::ret(0..4);
        assert_eq!(ret.pop(&cells), Err(PanicKind::ReturnStackUnderflow));
    }

    #[test]
    fn overflow_leaves_cursor_and_cells() {
        let mut cells = arena(6);
        let mut stack = Stack::data(2..4);
        stack.push(&mut cells, Cell::integer(1)).unwrap();
        stack.push(&mut cells, Cell::integer(2)).unwrap();
        assert_eq!(
            stack.push(&mut cells, Cell::integer(3)),
            Err(PanicKind::DataStackOverflow)
        );
        assert_eq!(stack.top(), Some(3));
        assert_eq!(cells[4], Cell::STACK_SENTINEL);

        let mut ret = Stack::ret(4..6);
        ret.push(&mut cells, Cell::address(0)).unwrap();
        ret.push(&mut cells, Cell::address(1)).unwrap();
        assert_eq!(
            ret.push(&mut cells, Cell::address(2)),
            Err(PanicKind::ReturnStackOverflow)
        );
        assert_eq!(ret.top(), Some(5));
    }

    #[test]
    fn empty_region_always_overflows() {
        let mut cells = arena(2);
        let mut stack = Stack::data(2..2);
        assert_eq!(stack.capacity(), 0);
        assert_eq!(
            stack.push(&mut cells, Cell::null()),
            Err(PanicKind::DataStackOverflow)
        );
        assert_eq!(stack.top(), None);
    }

    #[test]
    fn stack_at_arena_start_round_trips() {
        let mut cells = arena(2);
        let mut stack = Stack::data(0..2);
        stack.push(&mut cells, Cell::offset(7)).unwrap();
        assert_eq!(stack.pop(&cells).unwrap(), Cell::offset(7));
        assert_eq!(stack.top(), None);
        stack.push(&mut cells, Cell::offset(8)).unwrap();
        stack.clear();
        assert_eq!(stack.depth(), 0);
    }
}

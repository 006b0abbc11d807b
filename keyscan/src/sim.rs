//! Simulated switch matrix for tests.
//!
//! [`SimMatrix`] models the electrical state of a diode-less switch matrix:
//! closed switches short their row and column lines together, and a sense
//! line reads low exactly when some conductive path of closed switches
//! connects it to a line currently driven low. Three closed switches
//! forming three corners of a rectangle therefore make the fourth corner
//! read shorted as well, which is the ghost the scanner has to reject.
//!
//! [`SimLine`] implements [`Line`] on top of the shared board state, so the
//! whole scan path runs against it unchanged.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::line::Line;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum LineMode {
    #[default]
    Floating,
    PullUp,
    OutputLow,
    OutputHigh,
}

#[derive(Copy, Clone)]
enum LineId {
    Row(usize),
    Col(usize),
}

/// Shared electrical state of a simulated switch matrix.
pub struct SimMatrix<const ROW: usize, const COL: usize> {
    rows: [Cell<LineMode>; ROW],
    cols: [Cell<LineMode>; COL],
    /// Closed switches, one mask per row, bit set = closed.
    switches: [Cell<u32>; ROW],
}

impl<const ROW: usize, const COL: usize> Default for SimMatrix<ROW, COL> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROW: usize, const COL: usize> SimMatrix<ROW, COL> {
    pub fn new() -> Self {
        assert!(ROW <= 32 && COL <= 32, "simulated matrix is limited to 32 lines per axis");
        SimMatrix {
            rows: core::array::from_fn(|_| Cell::new(LineMode::Floating)),
            cols: core::array::from_fn(|_| Cell::new(LineMode::Floating)),
            switches: core::array::from_fn(|_| Cell::new(0)),
        }
    }

    /// Close the switch at (row, col).
    pub fn press(&self, row: usize, col: usize) {
        assert!(col < COL);
        self.switches[row].set(self.switches[row].get() | 1 << col);
    }

    /// Open the switch at (row, col).
    pub fn release(&self, row: usize, col: usize) {
        assert!(col < COL);
        self.switches[row].set(self.switches[row].get() & !(1 << col));
    }

    /// The row lines of the board, for handing to a matrix.
    pub fn row_lines(&self) -> [SimLine<'_, ROW, COL>; ROW] {
        core::array::from_fn(|r| SimLine {
            board: self,
            id: LineId::Row(r),
        })
    }

    /// The column lines of the board, for handing to a matrix.
    pub fn col_lines(&self) -> [SimLine<'_, ROW, COL>; COL] {
        core::array::from_fn(|c| SimLine {
            board: self,
            id: LineId::Col(c),
        })
    }

    pub fn row_has_pullup(&self, row: usize) -> bool {
        self.rows[row].get() == LineMode::PullUp
    }

    pub fn col_has_pullup(&self, col: usize) -> bool {
        self.cols[col].get() == LineMode::PullUp
    }

    fn mode(&self, id: LineId) -> &Cell<LineMode> {
        match id {
            LineId::Row(r) => &self.rows[r],
            LineId::Col(c) => &self.cols[c],
        }
    }

    fn reads_low(&self, id: LineId) -> bool {
        match self.mode(id).get() {
            LineMode::OutputLow => true,
            LineMode::OutputHigh => false,
            LineMode::PullUp | LineMode::Floating => self.connected_to_driven(id),
        }
    }

    /// Whether a conductive path of closed switches connects this line to
    /// any line currently driven low. Grows the reachable line set to a
    /// fixpoint, so multi-hop paths through other closed switches count,
    /// exactly like the shorts on a real diode-less board.
    fn connected_to_driven(&self, id: LineId) -> bool {
        let mut rows: u32 = 0;
        let mut cols: u32 = 0;
        for r in 0..ROW {
            if self.rows[r].get() == LineMode::OutputLow {
                rows |= 1 << r;
            }
        }
        for c in 0..COL {
            if self.cols[c].get() == LineMode::OutputLow {
                cols |= 1 << c;
            }
        }

        loop {
            let mut changed = false;
            for r in 0..ROW {
                if rows & (1 << r) != 0 {
                    let reached = self.switches[r].get() & !cols;
                    if reached != 0 {
                        cols |= reached;
                        changed = true;
                    }
                } else if self.switches[r].get() & cols != 0 {
                    rows |= 1 << r;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        match id {
            LineId::Row(r) => rows & (1 << r) != 0,
            LineId::Col(c) => cols & (1 << c) != 0,
        }
    }
}

/// One line of a [`SimMatrix`].
pub struct SimLine<'a, const ROW: usize, const COL: usize> {
    board: &'a SimMatrix<ROW, COL>,
    id: LineId,
}

impl<const ROW: usize, const COL: usize> ErrorType for SimLine<'_, ROW, COL> {
    type Error = Infallible;
}

impl<const ROW: usize, const COL: usize> InputPin for SimLine<'_, ROW, COL> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.board.reads_low(self.id))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.board.reads_low(self.id))
    }
}

impl<const ROW: usize, const COL: usize> OutputPin for SimLine<'_, ROW, COL> {
    // The drive level is only tracked while the line is an output.
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mode = self.board.mode(self.id);
        if mode.get() == LineMode::OutputLow || mode.get() == LineMode::OutputHigh {
            mode.set(LineMode::OutputLow);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mode = self.board.mode(self.id);
        if mode.get() == LineMode::OutputLow || mode.get() == LineMode::OutputHigh {
            mode.set(LineMode::OutputHigh);
        }
        Ok(())
    }
}

impl<const ROW: usize, const COL: usize> Line for SimLine<'_, ROW, COL> {
    fn set_as_input(&mut self) {
        self.board.mode(self.id).set(LineMode::Floating);
    }

    fn set_as_input_pullup(&mut self) {
        self.board.mode(self.id).set(LineMode::PullUp);
    }

    // A line switched to output idles high until driven low.
    fn set_as_output(&mut self) {
        self.board.mode(self.id).set(LineMode::OutputHigh);
    }
}

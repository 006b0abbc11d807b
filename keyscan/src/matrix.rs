use embassy_time::{Duration, Instant};

use crate::debounce::{Debouncer, Edge};
use crate::keys::{PressedKey, PressedKeys, ReleasedKey, ReleasedKeys};
use crate::line::Line;

/// Orientation of the diodes in the switch matrix, which fixes which axis
/// carries the pull-up sense lines and which axis is driven low during a
/// sweep.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiodeDirection {
    /// Current flows column to row: column pins sense with pull-ups, row
    /// lines are driven low one at a time.
    ColToRow,
    /// Current flows row to column: row pins sense with pull-ups, column
    /// lines are driven low one at a time.
    RowToCol,
}

/// A scanned, debounced switch matrix.
///
/// `ROW` and `COL` are the matrix dimensions, `CAP` the capacity of the
/// pressed and released key buffers (at least `ROW * COL`). The matrix owns
/// one [`Line`] per row and per column; which side is driven and which is
/// sensed follows from the [`DiodeDirection`].
///
/// [`init`](Self::init) must run once before the first
/// [`scan`](Self::scan). Each scan performs one full sweep, feeds every
/// cell through the debouncer, applies ghost rejection and key tracking,
/// and leaves the edge queries and key buffers readable until the next
/// scan. The caller paces scans; hardware settle time between driving a
/// line and sampling belongs in the [`Line`] implementation.
pub struct Matrix<P: Line, const ROW: usize, const COL: usize, const CAP: usize> {
    row_pins: [P; ROW],
    col_pins: [P; COL],
    direction: DiodeDirection,
    debouncer: Debouncer<ROW, COL>,
    /// Raw sweep result, one mask per row. Bit = 1 means released.
    raw: [u32; ROW],
    /// Debounced state, same layout as `raw`.
    state: [u32; ROW],
    /// `state` as it was at the start of the current cycle.
    prev_state: [u32; ROW],
    pressed: PressedKeys<CAP>,
    released: ReleasedKeys<CAP>,
    /// Microsecond timestamp of the previous sweep, wrapping.
    last_scan: u32,
    /// Scan cycle counter, the ghost tag on fresh presses.
    cycle: u32,
}

impl<P: Line, const ROW: usize, const COL: usize, const CAP: usize> Matrix<P, ROW, COL, CAP> {
    /// Create a matrix from its row and column lines.
    pub fn new(row_pins: [P; ROW], col_pins: [P; COL], direction: DiodeDirection) -> Self {
        assert!(COL <= 32, "column count exceeds the row bitmask width");
        assert!(ROW <= 256, "row count exceeds the row index range");
        assert!(CAP >= ROW * COL, "key buffers must be able to hold every key");
        Matrix {
            row_pins,
            col_pins,
            direction,
            debouncer: Debouncer::new(),
            raw: [u32::MAX; ROW],
            state: [u32::MAX; ROW],
            prev_state: [u32::MAX; ROW],
            pressed: PressedKeys::new(),
            released: ReleasedKeys::new(),
            last_scan: 0,
            cycle: 0,
        }
    }

    /// Configure the lines for the wiring topology and reset all scan
    /// state. Must be called once before the first [`scan`](Self::scan).
    pub fn init(&mut self) {
        match self.direction {
            DiodeDirection::ColToRow => {
                for pin in self.col_pins.iter_mut() {
                    pin.set_as_input_pullup();
                }
                for pin in self.row_pins.iter_mut() {
                    pin.set_as_input();
                }
            }
            DiodeDirection::RowToCol => {
                for pin in self.row_pins.iter_mut() {
                    pin.set_as_input_pullup();
                }
                for pin in self.col_pins.iter_mut() {
                    pin.set_as_input();
                }
            }
        }
        self.debouncer.reset();
        self.raw = [u32::MAX; ROW];
        self.state = [u32::MAX; ROW];
        self.prev_state = [u32::MAX; ROW];
        self.pressed.clear();
        self.released.clear();
        self.last_scan = Instant::now().as_micros() as u32;
        self.cycle = 0;
        info!("Initialized {}x{} matrix, {:?}", ROW, COL, self.direction);
    }

    /// Run one scan cycle: sweep the matrix, debounce every cell, update
    /// the key buffers and accumulate hold times. Returns whether any row's
    /// debounced state changed.
    pub fn scan(&mut self) -> bool {
        // Entries queued last cycle have had one full cycle to be observed.
        self.released.clear();
        self.cycle = self.cycle.wrapping_add(1);

        self.sweep();

        let now = Instant::now().as_micros() as u32;
        let elapsed = Duration::from_micros(now.wrapping_sub(self.last_scan) as u64);
        self.last_scan = now;

        self.prev_state = self.state;

        let mut fresh_presses = 0;
        for row in 0..ROW {
            for col in 0..COL {
                let shorted = self.raw[row] & (1 << col) == 0;
                let Some(edge) = self.debouncer.update(row, col, shorted) else {
                    continue;
                };
                match edge {
                    Edge::Press => {
                        fresh_presses += 1;
                        if fresh_presses > 1 {
                            // Two keys landing in one cycle is the ghost
                            // signature: drop the whole fresh run, restoring
                            // each rejected key to released.
                            warn!("Ghost press at ({}, {}), rejecting this cycle's presses", row, col);
                            let cycle = self.cycle;
                            while let Some(ghost) = self.pressed.pop_if(|k| k.cycle == cycle) {
                                self.state[ghost.row as usize] |= 1 << ghost.col;
                            }
                        } else {
                            self.state[row] &= !(1 << col);
                            self.pressed.push(PressedKey::new(row as u8, col as u8, self.cycle));
                            debug!("Key pressed at ({}, {})", row, col);
                        }
                    }
                    Edge::Release => {
                        self.state[row] |= 1 << col;
                        self.pressed.remove(row as u8, col as u8);
                        self.released.push(ReleasedKey {
                            row: row as u8,
                            col: col as u8,
                        });
                        debug!("Key released at ({}, {})", row, col);
                    }
                }
            }
        }

        // Keys that were already down on entry to this cycle accumulate the
        // scan interval; a key pressed this cycle stays at zero.
        let state = self.state;
        let prev_state = self.prev_state;
        for key in self.pressed.iter_mut() {
            let mask = 1u32 << key.col;
            if state[key.row as usize] & mask == 0 && prev_state[key.row as usize] & mask == 0 {
                key.hold_time += elapsed;
            }
        }

        self.state != self.prev_state
    }

    /// Sweep the whole matrix once, one driven line at a time, into `raw`.
    fn sweep(&mut self) {
        match self.direction {
            DiodeDirection::ColToRow => {
                for (row, row_pin) in self.row_pins.iter_mut().enumerate() {
                    row_pin.set_as_output();
                    row_pin.set_low().ok();
                    let mut mask = u32::MAX;
                    for (col, col_pin) in self.col_pins.iter_mut().enumerate() {
                        if col_pin.is_low().ok().unwrap_or_default() {
                            mask &= !(1 << col);
                        }
                    }
                    row_pin.set_as_input();
                    self.raw[row] = mask;
                }
            }
            DiodeDirection::RowToCol => {
                self.raw = [u32::MAX; ROW];
                for (col, col_pin) in self.col_pins.iter_mut().enumerate() {
                    col_pin.set_as_output();
                    col_pin.set_low().ok();
                    for (row, row_pin) in self.row_pins.iter_mut().enumerate() {
                        if row_pin.is_low().ok().unwrap_or_default() {
                            self.raw[row] &= !(1 << col);
                        }
                    }
                    col_pin.set_as_input();
                }
            }
        }
    }

    /// The key at (row, col) debounced to pressed during the last scan.
    pub fn pressed(&self, row: usize, col: usize) -> bool {
        debug_assert!(col < COL);
        self.state[row] & (1 << col) == 0 && self.prev_state[row] & (1 << col) != 0
    }

    /// The key at (row, col) debounced to released during the last scan.
    pub fn released(&self, row: usize, col: usize) -> bool {
        debug_assert!(col < COL);
        self.state[row] & (1 << col) != 0 && self.prev_state[row] & (1 << col) == 0
    }

    /// The key at (row, col) was already pressed before the last scan and
    /// still is.
    pub fn held(&self, row: usize, col: usize) -> bool {
        debug_assert!(col < COL);
        self.state[row] & (1 << col) == 0 && self.prev_state[row] & (1 << col) == 0
    }

    /// Currently pressed keys in the order their presses debounced.
    pub fn pressed_keys(&self) -> &[PressedKey] {
        self.pressed.as_slice()
    }

    /// Keys released during the last scan. Valid until the next scan
    /// drains them.
    pub fn released_keys(&self) -> &[ReleasedKey] {
        self.released.as_slice()
    }

    /// Accumulated hold time of the key at (row, col), if it is currently
    /// pressed.
    pub fn hold_time(&self, row: usize, col: usize) -> Option<Duration> {
        self.pressed.find(row as u8, col as u8).map(|k| k.hold_time)
    }
}

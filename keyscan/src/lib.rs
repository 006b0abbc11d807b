#![no_std]

//! Matrix scanning core for keyboard firmware.
//!
//! `keyscan` turns the raw electrical state of a row/column switch matrix
//! into debounced, ghost-free key events with per-key hold times. One
//! [`Matrix`] owns the row and column [`Line`]s; every call to
//! [`Matrix::scan`] sweeps the matrix once, feeds each cell through a
//! hysteresis debouncer, rejects ghost presses, and updates the pressed
//! and released key buffers that the caller reads between scans.
//!
//! The crate is `no_std` and allocation-free. It knows nothing about
//! keycodes, layers or HID: the caller maps the (row, col) positions it
//! reports onto whatever layout it wants.
//!
//! ```
//! use keyscan::{DiodeDirection, Matrix};
//!
//! let mut matrix: Matrix<_, 2, 2, 4> = Matrix::new(row_lines, col_lines, DiodeDirection::ColToRow);
//! matrix.init();
//! loop {
//!     if matrix.scan() {
//!         for row in 0..2 {
//!             for col in 0..2 {
//!                 if matrix.pressed(row, col) {
//!                     // handle the press, e.g. look up a keycode
//!                 }
//!             }
//!         }
//!     }
//!     // pace the next sweep
//! }
//! ```
//!
//! ## Feature flags
#![doc = document_features::document_features!()]

// Must come first so the rest of the crate sees the logging macros.
pub(crate) mod fmt;

pub mod debounce;
pub mod keys;
pub mod line;
pub mod matrix;
#[cfg(feature = "std")]
pub mod sim;

pub use debounce::{Debouncer, Edge, Phase, SwitchState};
pub use keys::{PressedKey, PressedKeys, ReleasedKey, ReleasedKeys};
pub use line::Line;
pub use matrix::{DiodeDirection, Matrix};

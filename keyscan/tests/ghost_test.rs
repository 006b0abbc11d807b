mod common;

use keyscan::sim::SimMatrix;
use keyscan::{DiodeDirection, Matrix};

#[test]
fn same_cycle_presses_are_all_rejected() {
    let board: SimMatrix<2, 2> = SimMatrix::new();
    let mut matrix: Matrix<_, 2, 2, 4> =
        Matrix::new(board.row_lines(), board.col_lines(), DiodeDirection::ColToRow);
    matrix.init();

    // Two keys landing in the very same cycle cannot be told apart from a
    // ghost, so neither is accepted.
    board.press(0, 0);
    board.press(1, 1);
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(matrix.pressed_keys().is_empty());
    assert!(!matrix.pressed(0, 0));
    assert!(!matrix.pressed(1, 1));

    // The cells stay settled on the pressed side without re-reporting, so
    // the rejection is permanent until the switches open again.
    for _ in 0..30 {
        assert!(!matrix.scan());
        assert!(matrix.pressed_keys().is_empty());
    }

    // Their eventual release is still announced through the queue even
    // though no tracked entry existed.
    board.release(0, 0);
    board.release(1, 1);
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert_eq!(matrix.released_keys().len(), 2);
    assert!(matrix.pressed_keys().is_empty());
}

#[test]
fn phantom_corner_is_rejected_and_earlier_keys_survive() {
    let board: SimMatrix<2, 2> = SimMatrix::new();
    let mut matrix: Matrix<_, 2, 2, 4> =
        Matrix::new(board.row_lines(), board.col_lines(), DiodeDirection::ColToRow);
    matrix.init();

    // Two keys pressed in different cycles are accepted normally.
    board.press(0, 0);
    for _ in 0..25 {
        matrix.scan();
    }
    board.press(0, 1);
    for _ in 0..25 {
        matrix.scan();
    }
    assert_eq!(matrix.pressed_keys().len(), 2);

    // Closing the third corner of the rectangle makes the board conduct at
    // (1, 1) as well: the real press at (1, 0) and the phantom at (1, 1)
    // debounce in the same cycle and the whole burst is rejected.
    board.press(1, 0);
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(!matrix.pressed(1, 0));
    assert!(!matrix.pressed(1, 1));

    // Only the two earlier keys survive, in their insertion order.
    assert_eq!(matrix.pressed_keys().len(), 2);
    assert_eq!(matrix.pressed_keys()[0].col, 0);
    assert_eq!(matrix.pressed_keys()[1].col, 1);
    assert!(matrix.held(0, 0));
    assert!(matrix.held(0, 1));

    for _ in 0..20 {
        assert!(!matrix.scan());
        assert_eq!(matrix.pressed_keys().len(), 2);
    }

    // Opening the third corner releases the phantom with it; the queue
    // reports both, the survivors are untouched.
    board.release(1, 0);
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert_eq!(matrix.released_keys().len(), 2);
    assert_eq!(matrix.pressed_keys().len(), 2);
    assert!(matrix.held(0, 0));
    assert!(matrix.held(0, 1));
}

#[test]
fn three_fresh_presses_in_one_cycle_are_all_rejected() {
    let board: SimMatrix<3, 3> = SimMatrix::new();
    let mut matrix: Matrix<_, 3, 3, 9> =
        Matrix::new(board.row_lines(), board.col_lines(), DiodeDirection::ColToRow);
    matrix.init();

    // Three keys on disjoint rows and columns: no phantom conduction, but
    // still one burst, and the rejection covers the whole run.
    board.press(0, 0);
    board.press(1, 1);
    board.press(2, 2);
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(!matrix.scan());
    assert!(matrix.pressed_keys().is_empty());
    for row in 0..3 {
        for col in 0..3 {
            assert!(!matrix.pressed(row, col));
            assert!(!matrix.held(row, col));
        }
    }
}

//! Hysteresis debouncing for matrix switches.
//!
//! Every cell carries a signed vote counter that each raw sample pushes
//! toward `+STEADY_VOTES` (shorted) or `-STEADY_VOTES` (open). A settled
//! switch sits at one rail and reports a tentative edge once
//! `STEADY_VOTES - REPORT_THRESHOLD` consecutive opposite samples pull the
//! counter to magnitude `REPORT_THRESHOLD`, so any bounce shorter than that
//! run is absorbed without ever firing. A tentative edge that fails to
//! reach the opposite rail is retracted by reporting the inverse edge.

/// Consecutive same-direction samples needed to fully settle a switch.
pub const STEADY_VOTES: i8 = 20;

/// Vote magnitude at or below which a settled switch turns transient and
/// reports a tentative edge.
pub const REPORT_THRESHOLD: i8 = 17;

/// Debounce phase of a single switch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Settled released.
    Released,
    /// Tentatively pressed, accumulating votes toward settled pressed.
    Pressing,
    /// Settled pressed.
    Pressed,
    /// Tentatively released, accumulating votes toward settled released.
    Releasing,
}

/// A debounced transition reported for one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Press,
    Release,
}

/// Debounce state of a single switch: its phase plus the vote counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchState {
    phase: Phase,
    counter: i8,
}

impl Default for SwitchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchState {
    /// A fully settled released switch.
    pub const fn new() -> Self {
        SwitchState {
            phase: Phase::Released,
            counter: -STEADY_VOTES,
        }
    }

    /// Feed one raw sample and return the next state plus the edge this
    /// sample produced, if any.
    ///
    /// Which edge is reported follows from the phase after the transition:
    /// `Pressing`/`Pressed` report a press, `Releasing`/`Released` report a
    /// release. The retraction transitions (a tentative press that drains
    /// back to the released rail, or the reverse) therefore report the
    /// inverse of the tentative edge they cancel.
    #[must_use]
    pub fn step(self, shorted: bool) -> (Self, Option<Edge>) {
        let counter = if shorted {
            (self.counter + 1).min(STEADY_VOTES)
        } else {
            (self.counter - 1).max(-STEADY_VOTES)
        };

        let (phase, counter, report) = match self.phase {
            Phase::Released if counter >= -REPORT_THRESHOLD => (Phase::Pressing, 0, true),
            Phase::Pressing if counter == STEADY_VOTES => (Phase::Pressed, counter, false),
            Phase::Pressing if counter == -STEADY_VOTES => (Phase::Released, counter, true),
            Phase::Pressed if counter <= REPORT_THRESHOLD => (Phase::Releasing, 0, true),
            Phase::Releasing if counter == STEADY_VOTES => (Phase::Pressed, counter, true),
            Phase::Releasing if counter == -STEADY_VOTES => (Phase::Released, counter, false),
            phase => (phase, counter, false),
        };

        let edge = if report {
            Some(match phase {
                Phase::Pressing | Phase::Pressed => Edge::Press,
                Phase::Released | Phase::Releasing => Edge::Release,
            })
        } else {
            None
        };

        (SwitchState { phase, counter }, edge)
    }
}

/// Per-cell debounce state for a whole matrix.
pub struct Debouncer<const ROW: usize, const COL: usize> {
    states: [[SwitchState; COL]; ROW],
}

impl<const ROW: usize, const COL: usize> Default for Debouncer<ROW, COL> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROW: usize, const COL: usize> Debouncer<ROW, COL> {
    pub fn new() -> Self {
        Debouncer {
            states: [[SwitchState::new(); COL]; ROW],
        }
    }

    /// Reset every cell to settled released.
    pub fn reset(&mut self) {
        self.states = [[SwitchState::new(); COL]; ROW];
    }

    /// Feed the raw sample for one cell and return the debounced edge, if
    /// this sample produced one.
    pub fn update(&mut self, row: usize, col: usize, shorted: bool) -> Option<Edge> {
        let (next, edge) = self.states[row][col].step(shorted);
        self.states[row][col] = next;
        edge
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[ctor::ctor]
    fn init_log() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    // Feed `n` identical samples, counting the edges they produce.
    fn feed(mut state: SwitchState, shorted: bool, n: usize) -> (SwitchState, usize, usize) {
        let mut presses = 0;
        let mut releases = 0;
        for _ in 0..n {
            let (next, edge) = state.step(shorted);
            state = next;
            match edge {
                Some(Edge::Press) => presses += 1,
                Some(Edge::Release) => releases += 1,
                None => {}
            }
        }
        (state, presses, releases)
    }

    fn settled_pressed() -> SwitchState {
        let (state, presses, releases) = feed(SwitchState::new(), true, 23);
        assert_eq!((presses, releases), (1, 0));
        assert_eq!(state.phase, Phase::Pressed);
        state
    }

    #[test]
    fn test_press_edge_on_third_consecutive_sample() {
        let mut state = SwitchState::new();
        for _ in 0..2 {
            let (next, edge) = state.step(true);
            state = next;
            assert_eq!(edge, None);
            assert_eq!(state.phase, Phase::Released);
        }
        let (state, edge) = state.step(true);
        assert_eq!(edge, Some(Edge::Press));
        assert_eq!(state.phase, Phase::Pressing);
        assert_eq!(state.counter, 0);
    }

    #[test]
    fn test_short_bounce_absorbed() {
        // Two shorted samples then open again: the counter never comes
        // within the report threshold, so no edge fires.
        let (state, presses, releases) = feed(SwitchState::new(), true, 2);
        assert_eq!((presses, releases), (0, 0));
        let (state, presses, releases) = feed(state, false, 10);
        assert_eq!((presses, releases), (0, 0));
        assert_eq!(state.phase, Phase::Released);
        assert_eq!(state.counter, -STEADY_VOTES);
    }

    #[test]
    fn test_full_press_settles_with_one_edge() {
        let state = settled_pressed();
        info!("settled: {:?}", state);

        // Holding it shorted reports nothing further.
        let (state, presses, releases) = feed(state, true, 50);
        assert_eq!((presses, releases), (0, 0));
        assert_eq!(state.phase, Phase::Pressed);
        assert_eq!(state.counter, STEADY_VOTES);
    }

    #[test]
    fn test_retracted_press_reports_release() {
        // Tentative press at sample 3, then the switch stays open: the
        // counter drains to the released rail and the press is retracted.
        let (state, presses, _) = feed(SwitchState::new(), true, 3);
        assert_eq!(presses, 1);
        let (state, presses, releases) = feed(state, false, 20);
        assert_eq!((presses, releases), (0, 1));
        assert_eq!(state.phase, Phase::Released);
        assert_eq!(state.counter, -STEADY_VOTES);
    }

    #[test]
    fn test_release_edge_on_third_open_sample() {
        let (state, _, releases) = feed(settled_pressed(), false, 2);
        assert_eq!(releases, 0);
        let (state, edge) = state.step(false);
        assert_eq!(edge, Some(Edge::Release));
        assert_eq!(state.phase, Phase::Releasing);
        assert_eq!(state.counter, 0);

        // And a full release settles back without another edge.
        let (state, presses, releases) = feed(state, false, 20);
        assert_eq!((presses, releases), (0, 0));
        assert_eq!(state.phase, Phase::Released);
    }

    #[test]
    fn test_retracted_release_reports_press() {
        let (state, _, releases) = feed(settled_pressed(), false, 3);
        assert_eq!(releases, 1);
        let (state, presses, releases) = feed(state, true, 20);
        assert_eq!((presses, releases), (1, 0));
        assert_eq!(state.phase, Phase::Pressed);
        assert_eq!(state.counter, STEADY_VOTES);
    }

    #[test]
    fn test_counter_clamps_at_rail() {
        let (state, presses, releases) = feed(SwitchState::new(), false, 100);
        assert_eq!((presses, releases), (0, 0));
        assert_eq!(state.counter, -STEADY_VOTES);
    }

    #[test]
    fn test_grid_cells_are_independent() {
        let mut debouncer: Debouncer<2, 2> = Debouncer::new();
        let mut edges = 0;
        for _ in 0..3 {
            if debouncer.update(0, 0, true).is_some() {
                edges += 1;
            }
            assert_eq!(debouncer.update(1, 1, false), None);
        }
        assert_eq!(edges, 1);
        assert_eq!(debouncer.states[0][0].phase, Phase::Pressing);
        assert_eq!(debouncer.states[1][1].phase, Phase::Released);
    }
}

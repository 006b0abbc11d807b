use embassy_time::Duration;

/// A key currently held down, tracked from its debounced press until its
/// debounced release.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressedKey {
    pub row: u8,
    pub col: u8,
    /// Time accumulated while the key stays pressed. Zero for the cycle the
    /// press debounced in; grows by the scan interval every cycle after.
    pub hold_time: Duration,
    /// Scan cycle the press debounced in, used to detect ghost bursts.
    pub(crate) cycle: u32,
}

impl PressedKey {
    pub(crate) fn new(row: u8, col: u8, cycle: u32) -> Self {
        Self {
            row,
            col,
            hold_time: Duration::from_ticks(0),
            cycle,
        }
    }
}

/// A key that debounced to released during the most recent scan.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReleasedKey {
    pub row: u8,
    pub col: u8,
}

/// Insertion-ordered buffer of currently pressed keys.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressedKeys<const CAP: usize> {
    keys: heapless::Vec<PressedKey, CAP>,
}

impl<const CAP: usize> PressedKeys<CAP> {
    pub fn new() -> Self {
        Self {
            keys: heapless::Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, key: PressedKey) {
        if let Err(key) = self.keys.push(key) {
            error!("Pressed key buffer overflowed, dropping ({}, {})", key.row, key.col);
        }
    }

    /// Pop the newest entry if it satisfies the predicate.
    pub(crate) fn pop_if<P>(&mut self, predicate: P) -> Option<PressedKey>
    where
        P: FnOnce(&PressedKey) -> bool,
    {
        match self.keys.last() {
            Some(last) if predicate(last) => self.keys.pop(),
            _ => None,
        }
    }

    /// Remove the entry for a key, keeping the order of the rest.
    pub(crate) fn remove(&mut self, row: u8, col: u8) -> Option<PressedKey> {
        if let Some(i) = self.keys.iter().position(|k| k.row == row && k.col == col) {
            Some(self.keys.remove(i))
        } else {
            None
        }
    }

    pub fn find(&self, row: u8, col: u8) -> Option<&PressedKey> {
        self.keys.iter().find(|k| k.row == row && k.col == col)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PressedKey> {
        self.keys.iter_mut()
    }

    pub fn as_slice(&self) -> &[PressedKey] {
        &self.keys
    }

    pub(crate) fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Keys released during the most recent scan, drained at the start of the
/// next one.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReleasedKeys<const CAP: usize> {
    keys: heapless::Vec<ReleasedKey, CAP>,
}

impl<const CAP: usize> ReleasedKeys<CAP> {
    pub fn new() -> Self {
        Self {
            keys: heapless::Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, key: ReleasedKey) {
        if let Err(key) = self.keys.push(key) {
            error!("Released key queue overflowed, dropping ({}, {})", key.row, key.col);
        }
    }

    pub fn as_slice(&self) -> &[ReleasedKey] {
        &self.keys
    }

    pub(crate) fn clear(&mut self) {
        self.keys.clear();
    }
}

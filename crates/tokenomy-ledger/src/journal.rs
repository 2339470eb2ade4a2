//! Append-only per-tick record of supply releases and burns.
//!
//! One row is kept per tick rather than one per operation: a long run with a
//! large roster performs millions of small burns, and only the per-tick
//! totals are needed to audit circulating supply.

/// Release and burn totals for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickSupply {
    /// The tick these totals belong to.
    pub tick: u64,
    /// Tokens released into circulation during the tick.
    pub released: f64,
    /// Tokens burned during the tick.
    pub burned: f64,
}

impl TickSupply {
    /// Net change in circulating supply during the tick.
    pub fn net(&self) -> f64 {
        self.released - self.burned
    }
}

/// Append-only journal of supply movements, one row per tick.
///
/// Rows are only ever appended or added to while their tick is current;
/// once a later tick opens, earlier rows are never touched again.
#[derive(Debug, Clone, Default)]
pub struct SupplyJournal {
    rows: Vec<TickSupply>,
}

impl SupplyJournal {
    /// Create an empty journal.
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Number of tick rows recorded.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no movement has been recorded yet.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Record a release during `tick`.
    pub fn record_release(&mut self, tick: u64, amount: f64) {
        if let Some(row) = self.row_mut(tick) {
            row.released += amount;
        }
    }

    /// Record a burn during `tick`.
    pub fn record_burn(&mut self, tick: u64, amount: f64) {
        if let Some(row) = self.row_mut(tick) {
            row.burned += amount;
        }
    }

    /// Sum of all releases ever recorded.
    pub fn total_released(&self) -> f64 {
        self.rows.iter().map(|r| r.released).sum()
    }

    /// Sum of all burns ever recorded.
    pub fn total_burned(&self) -> f64 {
        self.rows.iter().map(|r| r.burned).sum()
    }

    /// Totals for a single tick, if anything moved during it.
    pub fn for_tick(&self, tick: u64) -> Option<&TickSupply> {
        self.rows.iter().rev().find(|r| r.tick == tick)
    }

    /// All rows, oldest first.
    pub fn rows(&self) -> &[TickSupply] {
        &self.rows
    }

    /// Return the row for `tick`, opening a new one if `tick` is past the
    /// last recorded row.
    ///
    /// A tick earlier than the last row is folded into the last row so the
    /// journal stays append-only.
    fn row_mut(&mut self, tick: u64) -> Option<&mut TickSupply> {
        if self.rows.last().is_none_or(|last| tick > last.tick) {
            self.rows.push(TickSupply {
                tick,
                ..TickSupply::default()
            });
        }
        self.rows.last_mut()
    }
}

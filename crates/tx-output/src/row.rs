//! Plain data row types written by output backends.

/// One taxi's state at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxiSnapshotRow {
    pub taxi_id:     u32,
    pub tick:        u64,
    pub x:           f64,
    pub y:           f64,
    pub busy:        bool,
    /// Committed requests, picked up or not.
    pub assigned:    u32,
    /// Seats currently occupied.
    pub load:        u32,
    /// Idle repositioning distance so far.
    pub idle_travel: f64,
}

/// Counters for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:              u64,
    pub sim_time_ms:       i64,
    pub announced:         u32,
    pub pickups:           u32,
    pub deliveries:        u32,
    pub trades:            u32,
    pub waiting_customers: u32,
    pub riding_customers:  u32,
    pub idle_taxis:        u32,
    pub busy_taxis:        u32,
    pub messages:          u32,
}

// Rate estimation between two successive counter snapshots.

use crate::models::{CounterSnapshot, RateSample};

/// Elapsed time substituted when the clock did not advance or went backwards.
pub const ELAPSED_FLOOR_SECS: f64 = 1.0;

const BITS_PER_BYTE: f64 = 8.0;
const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Counter increase between two samples; a decrease (reset or wraparound) counts as 0.
pub fn counter_delta(prev: u64, curr: u64) -> u64 {
    curr.saturating_sub(prev)
}

/// Megabits per second for `delta_bytes` moved over `elapsed_secs`.
pub fn megabits_per_sec(delta_bytes: u64, elapsed_secs: f64) -> f64 {
    delta_bytes as f64 * BITS_PER_BYTE / BITS_PER_MEGABIT / effective_elapsed(elapsed_secs)
}

/// Elapsed seconds actually used for division: non-positive or non-finite values become 1s.
pub fn effective_elapsed(elapsed_secs: f64) -> f64 {
    if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
        elapsed_secs
    } else {
        ELAPSED_FLOOR_SECS
    }
}

/// Derives throughput and error/drop deltas from `prev` to `curr`.
///
/// Never fails: a counter that went backwards contributes 0 for this tick, and the caller
/// replaces `prev` with `curr` regardless, so a bad tick heals on the next one.
pub fn estimate(prev: &CounterSnapshot, curr: &CounterSnapshot, elapsed_secs: f64) -> RateSample {
    let recv = counter_delta(prev.bytes_recv, curr.bytes_recv);
    let sent = counter_delta(prev.bytes_sent, curr.bytes_sent);
    let errors = counter_delta(prev.err_in, curr.err_in)
        .saturating_add(counter_delta(prev.err_out, curr.err_out));
    let drops = counter_delta(prev.drop_in, curr.drop_in)
        .saturating_add(counter_delta(prev.drop_out, curr.drop_out));

    RateSample {
        download_mbps: megabits_per_sec(recv, elapsed_secs),
        upload_mbps: megabits_per_sec(sent, elapsed_secs),
        error_delta: errors,
        drop_delta: drops,
    }
}

/// Seconds between two snapshot timestamps; negative when the wall clock stepped back.
pub fn elapsed_between(prev: &CounterSnapshot, curr: &CounterSnapshot) -> f64 {
    (curr.timestamp_ms as f64 - prev.timestamp_ms as f64) / 1000.0
}

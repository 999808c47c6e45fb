//! Result ordering and rendering.
//!
//! Output format, one line per lane: `<lane> <seconds with 4 decimals>\n`.
//! The same block goes to the serial link and the display.

use core::fmt::Write;

use heapless::String;

use crate::clock::to_seconds;
use crate::lane::{Lane, LaneRegistry, LaneSnapshot, LaneStatus, MAX_LANES};

/// Room for `MAX_LANES` lines of `"8 4294.9673\n"` with margin.
pub const RESULTS_TEXT_LEN: usize = 16 * MAX_LANES;

/// Rendered result block.
pub type ResultsText = String<RESULTS_TEXT_LEN>;

/// Stable insertion sort; the registry never holds more than `MAX_LANES`.
fn stable_sort_by_key<K: Ord>(lanes: &mut [Lane], key: impl Fn(&Lane) -> K) {
    for i in 1..lanes.len() {
        let mut j = i;
        while j > 0 && key(&lanes[j - 1]) > key(&lanes[j]) {
            lanes.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Order by race duration, fastest first. Ties keep their input order.
pub fn sort_by_duration(lanes: &mut [Lane]) {
    stable_sort_by_key(lanes, |lane| lane.race_duration);
}

/// Order by lane number.
pub fn sort_by_lane(lanes: &mut [Lane]) {
    stable_sort_by_key(lanes, |lane| lane.number());
}

/// Render lanes in the given order.
pub fn render_results(lanes: &[Lane]) -> ResultsText {
    let mut text = ResultsText::new();
    for lane in lanes {
        // Capacity covers MAX_LANES lines of the widest u32 duration
        let _ = writeln!(text, "{} {:.4}", lane.number(), to_seconds(lane.race_duration));
    }
    text
}

/// Race results view: in-use lanes of `registry` ordered by finish.
///
/// [`LaneStatus::NotInUse`] lanes are left out of the block.
pub fn race_results(registry: &LaneRegistry) -> ResultsText {
    let mut lanes: LaneSnapshot = registry.snapshot();
    lanes.retain(|lane| lane.status != LaneStatus::NotInUse);
    sort_by_duration(&mut lanes);
    render_results(&lanes)
}

/// Diagnostic view: snapshot of `registry` ordered by lane number.
pub fn lane_order(registry: &LaneRegistry) -> LaneSnapshot {
    let mut lanes = registry.snapshot();
    sort_by_lane(&mut lanes);
    lanes
}

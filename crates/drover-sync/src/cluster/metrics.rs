use std::time::{Duration, SystemTime, UNIX_EPOCH};

use drover_model::timestamp::truncate_to_hour;

const LOOKBACK_CAP: Duration = Duration::from_secs(24 * 3600);

/// Hourly utilization-metrics gate.
///
/// Returns the collection window `[from, to]` when a new full hour has
/// elapsed since the effective watermark, `None` otherwise. The watermark is
/// the latest of the cached hour, the last heartbeat and `now - 1 day`, so a
/// long-dead task never backfills more than a day. The caller advances the
/// cached watermark to `to` after a successful fetch, which bounds
/// collection to at most one call per hour per cluster regardless of poll
/// frequency.
pub fn metrics_window(
    collected_till_hour: SystemTime,
    heartbeat_time: SystemTime,
    now: SystemTime,
) -> Option<(SystemTime, SystemTime)> {
    let lookback_floor = now.checked_sub(LOOKBACK_CAP).unwrap_or(UNIX_EPOCH);
    let watermark = truncate_to_hour(collected_till_hour.max(heartbeat_time).max(lookback_floor));
    let this_hour = truncate_to_hour(now);

    if this_hour > watermark {
        Some((watermark, this_hour))
    } else {
        None
    }
}

use chrono::{Local, TimeZone, Utc};

/// Wall-clock source for the next-break projection.
pub trait Clock: Send {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// `YYYY-MM-DD HH:MM:SS` in local time, as shown to the user.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("<invalid timestamp {}>", timestamp_ms),
    }
}

/// Follows tokio's clock, so paused-time tests see `now` advance with `tokio::time::advance`.
#[cfg(test)]
pub(crate) struct TokioClock {
    origin: tokio::time::Instant,
    origin_ms: i64,
}

#[cfg(test)]
impl TokioClock {
    pub(crate) fn starting_at(origin_ms: i64) -> Self {
        Self {
            origin: tokio::time::Instant::now(),
            origin_ms,
        }
    }
}

#[cfg(test)]
impl Clock for TokioClock {
    fn now_ms(&self) -> i64 {
        self.origin_ms + self.origin.elapsed().as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_shape() {
        let text = format_timestamp(Utc::now().timestamp_millis());
        assert_eq!(text.len(), 19);
        assert_eq!(&text[4..5], "-");
        assert_eq!(&text[10..11], " ");
        assert_eq!(&text[13..14], ":");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_tracks_paused_time() {
        let clock = TokioClock::starting_at(0);
        tokio::time::advance(std::time::Duration::from_secs(90)).await;
        assert_eq!(clock.now_ms(), 90_000);
    }
}

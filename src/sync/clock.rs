//! Time source abstraction and service-day arithmetic.
//!
//! Feed stop times are offsets from local midnight of the service day, so
//! every refresh needs the current date key, the absolute instant of local
//! midnight and the elapsed seconds since it. All three derive from a single
//! `DateTime<Utc>` taken from an injectable [`Clock`], which lets tests pin
//! arbitrary instants including midnight and DST boundaries.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Capability providing the current instant.
pub trait Clock: Send + Sync + 'static {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The feed's notion of "today", computed fresh for every upstream fetch.
#[derive(Debug, Clone)]
pub struct ServiceDay {
    /// 8-digit date key (`YYYYMMDD`) in the feed timezone
    pub date_key: String,
    /// Absolute instant of local midnight
    pub midnight: DateTime<Utc>,
    /// Whole seconds elapsed since local midnight, never negative
    pub seconds_since_midnight: i64,
}

impl ServiceDay {
    pub fn at(now: DateTime<Utc>, tz: Tz) -> Self {
        let local = now.with_timezone(&tz);
        let date = local.date_naive();

        // Local midnight can be ambiguous or nonexistent around DST
        // transitions; `earliest` resolves ambiguity, the fallback covers
        // zones whose day starts after 00:00.
        let midnight = tz
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| {
                now - Duration::seconds(i64::from(local.num_seconds_from_midnight()))
            });

        let seconds_since_midnight = (now - midnight).num_seconds().max(0);

        Self {
            date_key: date.format("%Y%m%d").to_string(),
            midnight,
            seconds_since_midnight,
        }
    }
}

use time::OffsetDateTime;
use uuid::Uuid;

pub type SessionId = Uuid;

/// Wall-clock instant as unix milliseconds. Only recorded into events and
/// session bookkeeping; never an input to round generation, which must stay
/// a pure function of the session seed.
pub fn unix_millis_now() -> i64 {
    let now = OffsetDateTime::now_utc();
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}

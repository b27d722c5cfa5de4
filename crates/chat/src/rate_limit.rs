//! Detection of the backend's free-text throttling notice.
//!
//! The chat backend does not use a status code or header for throttling. It
//! answers with a plain-text body such as
//! `You can perform this action again in 4 seconds` where JSON was expected.

use std::{sync::LazyLock, time::Duration};

use regex::Regex;

const RATE_LIMIT_PATTERN: &str = r"You can perform this action again in (\d+) seconds";

static RATE_LIMIT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(RATE_LIMIT_PATTERN).ok());

/// Number of seconds the backend asked us to wait, if the body carries the
/// throttling notice.
#[must_use]
pub fn retry_after_secs(body: &str) -> Option<u64> {
    RATE_LIMIT_RE
        .as_ref()?
        .captures(body)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Wait before the next attempt: the advertised delay plus `buffer` to absorb
/// clock skew. `None` means no limit was signaled.
#[must_use]
pub fn rate_limit_delay(body: &str, buffer: Duration) -> Option<Duration> {
    retry_after_secs(body).map(|secs| Duration::from_secs(secs).saturating_add(buffer))
}

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current calendar date in the given canonical timezone, e.g. "Pacific/Auckland".
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    get_local_offset(canonical_timezone)
        .map(|offset| OffsetDateTime::now_utc().to_offset(offset).date())
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))
}

#[cfg(test)]
mod local_today_tests {
    use super::local_today;

    #[test]
    fn returns_date_for_canonical_timezone() {
        assert!(local_today("Etc/UTC").is_ok());
    }

    #[test]
    fn fails_on_unknown_timezone() {
        assert!(local_today("Atlantis/Central").is_err());
    }
}

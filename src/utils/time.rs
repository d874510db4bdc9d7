use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `YYYY-MM` keys for the `months` calendar months ending with the month of `end`, oldest first.
pub fn trailing_month_keys(end: NaiveDate, months: u32) -> Vec<String> {
    let mut year = end.year();
    let mut month = end.month();
    let mut keys = Vec::with_capacity(months as usize);
    for _ in 0..months {
        keys.push(format!("{:04}-{:02}", year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    keys.reverse();
    keys
}

/// First day of the oldest month in the trailing window.
pub fn window_start(end: NaiveDate, months: u32) -> NaiveDate {
    let back = months.saturating_sub(1) as i32;
    let total = end.year() * 12 + end.month0() as i32 - back;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_keys_cross_year_boundary() {
        let end = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap();
        let keys = trailing_month_keys(end, 4);
        assert_eq!(keys, vec!["2025-11", "2025-12", "2026-01", "2026-02"]);
    }

    #[test]
    fn window_start_is_first_of_oldest_month() {
        let end = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(window_start(end, 12), NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(window_start(end, 1), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
    }
}

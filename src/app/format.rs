use time::macros::format_description;
use time::OffsetDateTime;

/// Long form for the note screen, e.g. `Oct 16, 2026 at 14:05`.
pub fn format_last_modified(epoch: i64) -> String {
    let format = format_description!(
        "[month repr:short] [day padding:none], [year] at [hour]:[minute]"
    );
    OffsetDateTime::from_unix_timestamp(epoch)
        .ok()
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_else(|| epoch.to_string())
}

/// Short form for grid cards, e.g. `Oct 16`.
pub fn format_card_date(epoch: i64) -> String {
    let format = format_description!("[month repr:short] [day padding:none]");
    OffsetDateTime::from_unix_timestamp(epoch)
        .ok()
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_else(|| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_note_timestamp_renders_epoch_start() {
        assert_eq!(format_last_modified(0), "Jan 1, 1970 at 00:00");
    }

    #[test]
    fn formats_card_and_long_dates() {
        // 2026-10-16T14:05:00Z
        let epoch = 1_792_159_500;
        assert_eq!(format_card_date(epoch), "Oct 16");
        assert_eq!(format_last_modified(epoch), "Oct 16, 2026 at 14:05");
    }

    #[test]
    fn out_of_range_epoch_falls_back_to_number() {
        assert_eq!(format_card_date(i64::MAX), i64::MAX.to_string());
    }
}

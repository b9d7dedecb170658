//! UTC時刻の整形（エポックミリ秒から）

/// エポックミリ秒をRFC3339（ミリ秒付きUTC）に変換。例: 2025-01-15T10:30:00.123Z
pub fn rfc3339_millis(epoch_ms: u64) -> String {
    let (year, month, day, hour, minute, second) = utc_components(epoch_ms / 1_000);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        hour,
        minute,
        second,
        epoch_ms % 1_000
    )
}

/// ファイル名用のスタンプ。例: 20250115_103000_123
pub fn file_stamp(epoch_ms: u64) -> String {
    let (year, month, day, hour, minute, second) = utc_components(epoch_ms / 1_000);
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}_{:03}",
        year,
        month,
        day,
        hour,
        minute,
        second,
        epoch_ms % 1_000
    )
}

/// エポック秒を (年, 月, 日, 時, 分, 秒) に分解
pub fn utc_components(secs: u64) -> (i32, u32, u32, u32, u32, u32) {
    let days = (secs / 86_400) as i64;
    let rem = (secs % 86_400) as i64;
    let hour = (rem / 3_600) as u32;
    let minute = ((rem % 3_600) / 60) as u32;
    let second = (rem % 60) as u32;
    let (year, month, day) = civil_from_days(days);
    (year, month, day, hour, minute, second)
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// 1970-01-01 からの日数を (年, 月, 日) に変換（1970年以降のみ）
fn civil_from_days(mut days: i64) -> (i32, u32, u32) {
    let mut year = 1970;
    loop {
        let len = if is_leap(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }
    let feb = if is_leap(year) { 29 } else { 28 };
    let months = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 0;
    while days >= months[month] {
        days -= months[month];
        month += 1;
    }
    (year as i32, month as u32 + 1, days as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch_zero() {
        assert_eq!(rfc3339_millis(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(file_stamp(0), "19700101_000000_000");
    }

    #[test]
    fn formats_known_instant() {
        // 2024-02-29T12:34:56.789Z
        let ms = 1_709_210_096_789;
        assert_eq!(rfc3339_millis(ms), "2024-02-29T12:34:56.789Z");
        assert_eq!(file_stamp(ms), "20240229_123456_789");
    }

    #[test]
    fn year_boundaries() {
        assert_eq!(civil_from_days(365), (1971, 1, 1));
        assert_eq!(civil_from_days(10_956), (1999, 12, 31));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
    }
}

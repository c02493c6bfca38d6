use std::convert::TryInto;

use time::PrimitiveDateTime;

/// Decodes packed DOS date/time bits. Returns `None` if the bits do not
/// form a valid calendar date or time of day.
pub fn datetime_from_bits(date: u16, time: u16) -> Option<PrimitiveDateTime> {
    let year = (date >> 9) as i32 + 1980;
    let month = (((date >> 5) & 0xf) as u8).try_into().ok()?;
    let day = (date & 0x1f) as u8;
    let date = time::Date::from_calendar_date(year, month, day).ok()?;

    let hour = (time >> 11) as u8;
    let minute = ((time >> 5) & 0x3f) as u8;
    let second = 2 * (time & 0x1f) as u8;
    let time = time::Time::from_hms(hour, minute, second).ok()?;

    Some(PrimitiveDateTime::new(date, time))
}

/// Encodes a datetime as packed DOS date/time bits.
///
/// The format stores years 1980-2107 with two-second resolution. A year
/// before 1980 encodes as date 0 (losing the date, keeping the time);
/// a year after 2107 is clamped to the last representable instant. Odd
/// seconds are rounded up.
pub fn datetime_to_bits(mut datetime: PrimitiveDateTime) -> (u16, u16) {
    if datetime.year() > 2107 {
        return (0xff9f, 0xbf7d); // 2107-12-31 23:59:58
    }

    // Round to nearest two seconds. Rounding 2107-12-31 23:59:59 up
    // crosses into 2108, so the clamp must be re-checked.
    if datetime.second() % 2 != 0 {
        datetime += time::Duration::seconds(1);
        if datetime.year() > 2107 {
            return (0xff9f, 0xbf7d);
        }
    }

    let hour = datetime.hour() as u16;
    let minute = datetime.minute() as u16;
    let second = datetime.second() as u16;
    let time = (hour << 11) | (minute << 5) | (second / 2);

    if datetime.year() < 1980 {
        return (0, time);
    }
    let year = datetime.year() as u16;
    let month = datetime.month() as u16;
    let day = datetime.day() as u16;
    let date = ((year - 1980) << 9) | (month << 5) | day;
    (date, time)
}

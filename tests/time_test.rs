use chrono::{Local, Offset};
use memory_box::utils::time::{format_local, now, parse_datetime};

#[test]
fn test_parse_datetime_keeps_offset() {
    let dt = parse_datetime("2024-01-01T12:00:00-05:00").unwrap();
    assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
    assert_eq!(dt.to_rfc3339(), "2024-01-01T12:00:00-05:00");
}

#[test]
fn test_parse_datetime_naive_is_utc() {
    let dt = parse_datetime("2024-01-01 12:00:00").unwrap();
    assert_eq!(dt.offset().local_minus_utc(), 0);
    assert_eq!(dt.to_rfc3339(), "2024-01-01T12:00:00+00:00");
}

#[test]
fn test_parse_datetime_invalid() {
    assert!(parse_datetime("invalid date").is_none());
    assert!(parse_datetime("").is_none());
}

#[test]
fn test_now_round_trips() {
    let stamp = now();
    assert_eq!(
        stamp.offset().fix(),
        Local::now().offset().fix(),
        "now() should carry the local offset"
    );
    assert_eq!(parse_datetime(&stamp.to_rfc3339()), Some(stamp));
}

#[test]
fn test_format_local() {
    let dt = parse_datetime("2024-06-01T08:30:00+00:00").unwrap();
    assert_eq!(format_local(&dt).len(), "2024-06-01 08:30:00".len());
}

//! Date parsing and display formatting.
//!
//! Display formats use date-fns style tokens (`yyyy-MM-dd`, `MM/dd/yyyy`,
//! `d MMM yyyy`, ...), which are translated to chrono strftime items.
//! Every function returns `None` instead of failing loudly; callers keep the
//! raw value in that case.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Translate a date-fns format string into a strftime string.
///
/// Returns `None` for tokens with no chrono counterpart.
pub fn to_strftime(format: &str) -> Option<String> {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // Quoted literal; '' is an escaped quote.
            let mut j = i + 1;
            if j < chars.len() && chars[j] == '\'' {
                out.push('\'');
                i = j + 1;
                continue;
            }
            while j < chars.len() && chars[j] != '\'' {
                push_literal(&mut out, chars[j]);
                j += 1;
            }
            i = j + 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('E', 4) => "%A",
            ('E', _) => "%a",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('a', _) => "%p",
            _ => return None,
        };
        out.push_str(spec);
        i += run;
    }

    Some(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Parse an ISO 8601 date or date-time.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, naive date-times and RFC 3339
/// timestamps. Offsets are dropped; the wall-clock value is kept.
pub fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    // Year-month and bare year forms.
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y, m] if y.len() == 4 && m.len() == 2 => {
            NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, 1)
                .map(|d| d.and_time(NaiveTime::MIN))
        }
        [y] if y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()) => {
            NaiveDate::from_ymd_opt(y.parse().ok()?, 1, 1).map(|d| d.and_time(NaiveTime::MIN))
        }
        _ => None,
    }
}

/// Render a date-time with a date-fns format.
pub fn format_date(dt: &NaiveDateTime, format: &str) -> Option<String> {
    let strftime = to_strftime(format)?;
    let items: Vec<_> = chrono::format::StrftimeItems::new(&strftime).collect();
    if items.iter().any(|i| matches!(i, chrono::format::Item::Error)) {
        return None;
    }
    Some(dt.format_with_items(items.into_iter()).to_string())
}

/// Reformat an ISO value for display. `None` when it does not parse.
pub fn reformat_iso(raw: &str, format: &str) -> Option<String> {
    format_date(&parse_iso(raw)?, format)
}

/// Parse a date as typed or stored by a control.
///
/// Tries ISO first, then the field's display format, then the common
/// `MM/dd/yyyy` style.
pub fn parse_loose(s: &str, display_format: Option<&str>) -> Option<NaiveDateTime> {
    if let Some(dt) = parse_iso(s) {
        return Some(dt);
    }
    let s = s.trim();
    let mut formats: Vec<String> = Vec::new();
    if let Some(fmt) = display_format.and_then(to_strftime) {
        formats.push(fmt);
    }
    formats.push("%m/%d/%Y".to_string());

    for fmt in &formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_translation() {
        assert_eq!(to_strftime("yyyy-MM-dd").unwrap(), "%Y-%m-%d");
        assert_eq!(to_strftime("MM/dd/yyyy").unwrap(), "%m/%d/%Y");
        assert_eq!(to_strftime("d MMM yy").unwrap(), "%-d %b %y");
        assert_eq!(to_strftime("'Day' d").unwrap(), "Day %-d");
        assert_eq!(to_strftime("HH:mm 100%").unwrap(), "%H:%M 100%%");
        assert!(to_strftime("Q yyyy").is_none());
    }

    #[test]
    fn test_reformat_iso() {
        assert_eq!(
            reformat_iso("2024-03-05", "MM/dd/yyyy").as_deref(),
            Some("03/05/2024")
        );
        assert_eq!(
            reformat_iso("2024-03-05T10:30:00Z", "yyyy-MM-dd").as_deref(),
            Some("2024-03-05")
        );
        assert_eq!(reformat_iso("2024-03", "MMMM yyyy").as_deref(), Some("March 2024"));
        assert!(reformat_iso("03/05/2024", "yyyy-MM-dd").is_none());
        assert!(reformat_iso("not a date", "yyyy-MM-dd").is_none());
    }

    #[test]
    fn test_parse_loose_uses_display_format() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_time(NaiveTime::MIN);
        assert_eq!(parse_loose("05.03.2024", Some("dd.MM.yyyy")), Some(expected));
        assert_eq!(parse_loose("03/05/2024", None), Some(expected));
        assert_eq!(parse_loose("2024-02-30", None), None);
    }
}

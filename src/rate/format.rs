/// Placed between groups of three digits when grouping is enabled.
pub const GROUP_SEPARATOR: char = ' ';

fn group_from_left(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(c);
    }
    grouped
}

fn group_from_right(digits: &str) -> String {
    let reversed = digits.chars().rev().collect::<String>();
    group_from_left(&reversed).chars().rev().collect()
}

/// Renders `value` with exactly `precision` fractional digits. With `grouping` the integer part
/// is split into groups of three counted from the decimal point leftwards and the fractional
/// part into groups counted rightwards.
pub fn format_number(value: f64, precision: usize, grouping: bool) -> String {
    let formatted = format!("{value:.precision$}");
    if !grouping || !value.is_finite() {
        return formatted;
    }
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    match unsigned.split_once('.') {
        Some((integer, fraction)) => format!(
            "{sign}{}.{}",
            group_from_right(integer),
            group_from_left(fraction)
        ),
        None => format!("{sign}{}", group_from_right(unsigned)),
    }
}

#[cfg(test)]
mod format_tests {
    use super::format_number;

    #[test]
    fn keeps_requested_precision() {
        assert_eq!(format_number(3.4, 2, false), "3.40");
        assert_eq!(format_number(2., 1, false), "2.0");
        assert_eq!(format_number(1234567., 0, false), "1234567");
    }

    #[test]
    fn groups_both_parts() {
        assert_eq!(format_number(1234567., 0, true), "1 234 567");
        assert_eq!(format_number(1234.56789, 5, true), "1 234.567 89");
        assert_eq!(format_number(-1234.5, 1, true), "-1 234.5");
        assert_eq!(format_number(123., 0, true), "123");
        assert_eq!(format_number(0.5, 3, true), "0.500");
    }
}

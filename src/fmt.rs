/// Group an integer string's digits in threes: "1234567" -> "1,234,567".
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Currency amount with thousands separators: `money(-1234.5, "$")` -> `-$1,234.50`.
pub fn money(val: f64, symbol: &str) -> String {
    let fixed = format!("{:.2}", val.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let sign = if val < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{symbol}{}.{cents}", group_thousands(whole))
}

/// Plain number with separators, dropping the fraction when it is whole.
pub fn quantity(val: f64) -> String {
    if val.fract() == 0.0 && val.abs() < 1e15 {
        let sign = if val < 0.0 { "-" } else { "" };
        format!("{sign}{}", group_thousands(&format!("{}", val.abs() as i64)))
    } else {
        format!("{val:.2}")
    }
}

/// Horizontal bar scaled against `max`, at most `width` cells.
pub fn bar(val: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || val <= 0.0 {
        return String::new();
    }
    let cells = ((val / max) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

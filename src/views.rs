use regex::Regex;
use std::sync::OnceLock;

static COUNT_RE: OnceLock<Regex> = OnceLock::new();

/// Turn a display count like "1.2M views", "45,123 views" or "2.3K" into the
/// integer it stands for. Returns `None` when the string carries no usable
/// number, so "0 views" stays distinguishable from unparsable input.
///
/// Fractions are truncated toward zero after the multiplier is applied:
/// "1.25M" -> 1_250_000, "1.2345K" -> 1_234.
pub fn parse_view_count(text: &str) -> Option<i64> {
    let re = COUNT_RE
        .get_or_init(|| Regex::new(r"^([0-9]+)(?:\.([0-9]+))?\s*([kmb])?$").unwrap());

    let s = text
        .to_lowercase()
        .replace("views", "")
        .replace("view", "")
        .replace(',', "");
    let s = s.trim();

    let caps = re.captures(s)?;
    let whole: i64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier: i64 = match caps.get(3).map(|m| m.as_str()) {
        Some("k") => 1_000,
        Some("m") => 1_000_000,
        Some("b") => 1_000_000_000,
        _ => 1,
    };

    let mut count = whole.checked_mul(multiplier)?;
    if let Some(frac) = caps.get(2) {
        // Integer arithmetic so "2.3K" is exactly 2300, not a float rounded
        // down to 2299.
        let digits = frac.as_str();
        let frac_val: i64 = digits.parse().ok()?;
        let scale = 10_i64.checked_pow(digits.len() as u32)?;
        count = count.checked_add(frac_val.checked_mul(multiplier)? / scale)?;
    }
    Some(count)
}

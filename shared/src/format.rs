/// Kill/death ratio with two decimals. Zero deaths reads as "0.00".
pub fn kd_ratio(kills: u64, deaths: u64) -> String {
    if deaths == 0 {
        return "0.00".to_string();
    }
    fixed_ratio(u128::from(kills), u128::from(deaths), 2)
}

/// Win percentage with one decimal. No finished matches reads as "0.0".
pub fn win_rate(wins: u64, losses: u64) -> String {
    let played = u128::from(wins) + u128::from(losses);
    if played == 0 {
        return "0.0".to_string();
    }
    fixed_ratio(u128::from(wins) * 100, played, 1)
}

/// Compact a raw count for a 72px key: `1.5K`, `2.5M`, or the plain integer.
pub fn format_count(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{}M", fixed_ratio(u128::from(value), 1_000_000, 1))
    } else if value >= 1_000 {
        format!("{}K", fixed_ratio(u128::from(value), 1_000, 1))
    } else {
        value.to_string()
    }
}

/// `numer / denom` with `digits` decimals, computed exactly. Halves round up,
/// so 1.25 reads as "1.3" and 0.125 as "0.13".
fn fixed_ratio(numer: u128, denom: u128, digits: u32) -> String {
    let scale = 10u128.pow(digits);
    let scaled = (numer * scale * 2 + denom) / (denom * 2);
    let width = digits as usize;
    format!("{}.{:0width$}", scaled / scale, scaled % scale)
}

#[cfg(test)]
mod tests {
    use super::{format_count, kd_ratio, win_rate};

    #[test]
    fn kd_without_deaths_is_zero() {
        assert_eq!(kd_ratio(42, 0), "0.00");
        assert_eq!(kd_ratio(0, 0), "0.00");
    }

    #[test]
    fn kd_rounds_to_two_decimals() {
        assert_eq!(kd_ratio(150, 75), "2.00");
        assert_eq!(kd_ratio(100, 30), "3.33");
        assert_eq!(kd_ratio(1, 3), "0.33");
    }

    #[test]
    fn kd_halves_round_up() {
        assert_eq!(kd_ratio(1, 8), "0.13");
        assert_eq!(kd_ratio(5, 8), "0.63");
        assert_eq!(kd_ratio(2, 3), "0.67");
    }

    #[test]
    fn win_rate_without_matches_is_zero() {
        assert_eq!(win_rate(0, 0), "0.0");
    }

    #[test]
    fn win_rate_rounds_to_one_decimal() {
        assert_eq!(win_rate(30, 70), "30.0");
        assert_eq!(win_rate(10, 10), "50.0");
        assert_eq!(win_rate(2, 1), "66.7");
        assert_eq!(win_rate(5, 0), "100.0");
    }

    #[test]
    fn win_rate_halves_round_up() {
        assert_eq!(win_rate(1, 7), "12.5");
        assert_eq!(win_rate(1, 15), "6.3");
    }

    #[test]
    fn small_counts_stay_plain() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn thousands_use_k_suffix() {
        assert_eq!(format_count(1_000), "1.0K");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(12_340), "12.3K");
    }

    #[test]
    fn millions_use_m_suffix() {
        assert_eq!(format_count(1_000_000), "1.0M");
        assert_eq!(format_count(2_500_000), "2.5M");
    }

    #[test]
    fn compact_counts_round_halves_up() {
        assert_eq!(format_count(1_250), "1.3K");
        assert_eq!(format_count(2_250), "2.3K");
        assert_eq!(format_count(1_249), "1.2K");
        assert_eq!(format_count(1_250_000), "1.3M");
        assert_eq!(format_count(2_250_000), "2.3M");
    }
}

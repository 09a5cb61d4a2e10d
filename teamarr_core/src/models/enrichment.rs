//! Derived per-team context computed by the enrichment service (C3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStats {
    pub record: String,
    pub home_record: String,
    pub away_record: String,
    pub points_per_game: Option<f64>,
    pub points_against_per_game: Option<f64>,
    pub rank: Option<u32>,
    pub playoff_seed: Option<u32>,
    pub games_back: Option<f64>,
    /// Signed: positive = win streak, negative = loss streak.
    pub streak_count: i32,
    pub conference: Option<String>,
    pub division: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousGame {
    pub abbreviated_score: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct H2H {
    pub team_wins: u32,
    pub opp_wins: u32,
    pub previous_game: Option<PreviousGame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Streaks {
    /// `W3`, `L1`, etc.
    pub current_streak: String,
    pub home_streak: String,
    pub away_streak: String,
    pub last_5_record: String,
    pub last_10_record: String,
    /// Newest last, e.g. `"LWWLW"`.
    pub recent_form: String,
}

/// Formats a signed streak count as `W{n}`/`L{n}`. Zero renders as `W0`.
pub fn format_streak(signed_count: i32) -> String {
    if signed_count < 0 {
        format!("L{}", signed_count.unsigned_abs())
    } else {
        format!("W{}", signed_count)
    }
}

/// Inverse of [`format_streak`]: parses a `"W3"`/`"L1"` string back into its
/// signed count. Unrecognized input parses as zero.
pub fn parse_signed_streak(s: &str) -> i32 {
    let mut chars = s.chars();
    match chars.next() {
        Some('W') => chars.as_str().parse::<i32>().unwrap_or(0),
        Some('L') => -chars.as_str().parse::<i32>().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_streak_win() {
        assert_eq!(format_streak(3), "W3");
    }

    #[test]
    fn test_format_streak_loss() {
        assert_eq!(format_streak(-1), "L1");
    }

    #[test]
    fn test_format_streak_zero() {
        assert_eq!(format_streak(0), "W0");
    }
}

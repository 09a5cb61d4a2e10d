//! Team identity record. Immutable for the duration of a generation run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    /// Upstream provider's team id (e.g. ESPN's numeric team id, as a string).
    pub provider_team_id: String,
    /// Canonical league code, e.g. `nfl`, `eng.1`.
    pub league_code: String,
    pub name: String,
    pub abbrev: String,
    pub logo_url: Option<String>,
    pub template_id: Uuid,
    pub active: bool,
}

impl Team {
    pub fn is_soccer(&self) -> bool {
        crate::league_config::get_league_config(&self.league_code)
            .map(|c| c.is_soccer)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Team {
        Team {
            id: Uuid::nil(),
            provider_team_id: "10".to_string(),
            league_code: "eng.1".to_string(),
            name: "Tottenham Hotspur".to_string(),
            abbrev: "TOT".to_string(),
            logo_url: None,
            template_id: Uuid::nil(),
            active: true,
        }
    }

    #[test]
    fn test_is_soccer() {
        assert!(sample().is_soccer());
        let mut t = sample();
        t.league_code = "nfl".to_string();
        assert!(!t.is_soccer());
    }
}

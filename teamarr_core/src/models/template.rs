//! Formatting rules attached to a team (or, for event-EPG, an event).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Team,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameDurationMode {
    Default,
    Sport,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidnightCrossoverMode {
    Postgame,
    Idle,
    None,
}

/// The closed set of predicates a conditional-description entry may test.
/// Parsed once from the persisted JSON condition string at template load
/// into this sum-type representation, rather than matched against raw
/// strings at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    IsHome,
    IsAway,
    StreakWinsAtLeast { n: u32 },
    StreakLossesAtLeast { n: u32 },
    HomeStreakWinsAtLeast { n: u32 },
    HomeStreakLossesAtLeast { n: u32 },
    AwayStreakWinsAtLeast { n: u32 },
    AwayStreakLossesAtLeast { n: u32 },
    IsPlayoff,
    IsPreseason,
    HasOdds,
    RankedOpponentTop25,
    Top10Matchup,
    OpponentNameContains { needle: String },
    IsNationalBroadcast,
    /// The documented fallback slot (priority 100 in practice, matched last).
    Always,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionOption {
    pub condition: Condition,
    pub text: String,
    /// Lower wins. Priority 100 is the conventional fallback slot.
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub title_format: String,
    pub subtitle_format: Option<String>,
    /// Ordered by priority ascending at load time (see [`Template::sorted_description_options`]).
    pub description_options: Vec<DescriptionOption>,

    pub pregame_enabled: bool,
    pub pregame_minutes: u32,
    pub pregame_template: Option<String>,

    pub postgame_enabled: bool,
    pub postgame_minutes: u32,
    pub postgame_template: Option<String>,

    pub idle_enabled: bool,
    pub idle_template: Option<String>,

    pub max_program_hours: f64,
    pub game_duration_mode: GameDurationMode,
    pub custom_duration_minutes: Option<u32>,
    pub midnight_crossover_mode: MidnightCrossoverMode,

    pub categories: Vec<String>,
    pub flags: HashSet<String>,
}

impl Template {
    /// Description options in ascending-priority order (first satisfied wins).
    pub fn sorted_description_options(&self) -> Vec<&DescriptionOption> {
        let mut opts: Vec<&DescriptionOption> = self.description_options.iter().collect();
        opts.sort_by_key(|o| o.priority);
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        Template {
            id: Uuid::nil(),
            name: "default".to_string(),
            template_type: TemplateType::Team,
            title_format: "{team_name}".to_string(),
            subtitle_format: None,
            description_options: vec![
                DescriptionOption {
                    condition: Condition::IsNationalBroadcast,
                    text: "National TV".to_string(),
                    priority: 20,
                },
                DescriptionOption {
                    condition: Condition::Top10Matchup,
                    text: "Top-10 showdown".to_string(),
                    priority: 10,
                },
                DescriptionOption {
                    condition: Condition::Always,
                    text: String::new(),
                    priority: 100,
                },
            ],
            pregame_enabled: true,
            pregame_minutes: 30,
            pregame_template: None,
            postgame_enabled: true,
            postgame_minutes: 30,
            postgame_template: None,
            idle_enabled: true,
            idle_template: None,
            max_program_hours: 4.0,
            game_duration_mode: GameDurationMode::Sport,
            custom_duration_minutes: None,
            midnight_crossover_mode: MidnightCrossoverMode::Postgame,
            categories: vec!["Sports".to_string()],
            flags: HashSet::new(),
        }
    }

    #[test]
    fn test_sorted_description_options_ascending_priority() {
        let t = template();
        let sorted = t.sorted_description_options();
        assert_eq!(sorted[0].priority, 10);
        assert_eq!(sorted[1].priority, 20);
        assert_eq!(sorted[2].priority, 100);
    }
}

//! Evaluates the closed-set conditional-description predicates against a
//! single game, selecting the description text whose condition is satisfied
//! at the lowest priority number (ties broken by table order).

use crate::models::{Condition, DescriptionOption, Event, SeasonType, Template};

/// Everything a [`Condition`] predicate needs to know about one game, from
/// the perspective of the team whose programme is being described.
#[derive(Debug, Clone, Default)]
pub struct DescriptionContext {
    pub is_home: bool,
    /// Signed: positive win streak, negative loss streak, entering this game.
    pub streak_count: i32,
    pub home_streak_count: i32,
    pub away_streak_count: i32,
    pub season_type: Option<SeasonType>,
    pub has_odds: bool,
    pub opponent_rank: Option<u32>,
    pub own_rank: Option<u32>,
    pub opponent_name: String,
    pub broadcasts: Vec<String>,
}

impl DescriptionContext {
    pub fn from_event(event: &Event, is_home: bool, streak_count: i32, home_streak_count: i32, away_streak_count: i32, own_rank: Option<u32>, opponent_rank: Option<u32>) -> Self {
        let opponent_name = if is_home { event.away.name.clone() } else { event.home.name.clone() };
        Self {
            is_home,
            streak_count,
            home_streak_count,
            away_streak_count,
            season_type: Some(event.season_type),
            has_odds: event.odds.is_some(),
            opponent_rank,
            own_rank,
            opponent_name,
            broadcasts: event.broadcasts.clone(),
        }
    }
}

fn evaluate(condition: &Condition, ctx: &DescriptionContext) -> bool {
    match condition {
        Condition::IsHome => ctx.is_home,
        Condition::IsAway => !ctx.is_home,
        Condition::StreakWinsAtLeast { n } => ctx.streak_count >= *n as i32,
        Condition::StreakLossesAtLeast { n } => ctx.streak_count <= -(*n as i32),
        Condition::HomeStreakWinsAtLeast { n } => ctx.home_streak_count >= *n as i32,
        Condition::HomeStreakLossesAtLeast { n } => ctx.home_streak_count <= -(*n as i32),
        Condition::AwayStreakWinsAtLeast { n } => ctx.away_streak_count >= *n as i32,
        Condition::AwayStreakLossesAtLeast { n } => ctx.away_streak_count <= -(*n as i32),
        Condition::IsPlayoff => ctx.season_type == Some(SeasonType::Postseason),
        Condition::IsPreseason => ctx.season_type == Some(SeasonType::Preseason),
        Condition::HasOdds => ctx.has_odds,
        Condition::RankedOpponentTop25 => ctx.opponent_rank.map(|r| r <= 25).unwrap_or(false),
        Condition::Top10Matchup => matches!((ctx.own_rank, ctx.opponent_rank), (Some(a), Some(b)) if a <= 10 && b <= 10),
        Condition::OpponentNameContains { needle } => ctx.opponent_name.to_lowercase().contains(&needle.to_lowercase()),
        Condition::IsNationalBroadcast => crate::template::variables::is_national_broadcast(&ctx.broadcasts),
        Condition::Always => true,
    }
}

/// Picks the first description option (in ascending-priority order) whose
/// condition is satisfied. `Template::description_options` always carries an
/// `Always` entry at priority 100, so this only returns `None` when the
/// template has no description options configured at all.
pub fn select_description<'a>(template: &'a Template, ctx: &DescriptionContext) -> Option<&'a DescriptionOption> {
    template.sorted_description_options().into_iter().find(|opt| evaluate(&opt.condition, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Competitor, Event, EventStatus, SeasonType};
    use chrono::Utc;

    fn event() -> Event {
        Event {
            id: "1".to_string(),
            provider: "espn".to_string(),
            league_code: "nba".to_string(),
            start_utc: Utc::now(),
            status: EventStatus::Scheduled,
            home: Competitor { team_id: "1".to_string(), name: "Boston Celtics".to_string(), abbrev: "BOS".to_string(), score: None, record: None },
            away: Competitor { team_id: "2".to_string(), name: "Miami Heat".to_string(), abbrev: "MIA".to_string(), score: None, record: None },
            venue: None,
            broadcasts: vec!["ESPN".to_string()],
            odds: None,
            player_leaders: Default::default(),
            season_type: SeasonType::Regular,
            source_league: None,
        }
    }

    fn template_with(opts: Vec<DescriptionOption>) -> Template {
        use crate::models::{GameDurationMode, MidnightCrossoverMode, TemplateType};
        use std::collections::HashSet;
        use uuid::Uuid;
        Template {
            id: Uuid::nil(),
            name: "t".to_string(),
            template_type: TemplateType::Team,
            title_format: String::new(),
            subtitle_format: None,
            description_options: opts,
            pregame_enabled: false,
            pregame_minutes: 0,
            pregame_template: None,
            postgame_enabled: false,
            postgame_minutes: 0,
            postgame_template: None,
            idle_enabled: false,
            idle_template: None,
            max_program_hours: 4.0,
            game_duration_mode: GameDurationMode::Sport,
            custom_duration_minutes: None,
            midnight_crossover_mode: MidnightCrossoverMode::Idle,
            categories: vec![],
            flags: HashSet::new(),
        }
    }

    #[test]
    fn test_national_broadcast_wins_over_fallback() {
        let t = template_with(vec![
            DescriptionOption { condition: Condition::IsNationalBroadcast, text: "On national TV".to_string(), priority: 20 },
            DescriptionOption { condition: Condition::Always, text: "fallback".to_string(), priority: 100 },
        ]);
        let ctx = DescriptionContext::from_event(&event(), true, 2, 2, 0, None, None);
        let picked = select_description(&t, &ctx).unwrap();
        assert_eq!(picked.text, "On national TV");
    }

    #[test]
    fn test_falls_back_when_nothing_else_matches() {
        let t = template_with(vec![
            DescriptionOption { condition: Condition::Top10Matchup, text: "top 10".to_string(), priority: 10 },
            DescriptionOption { condition: Condition::Always, text: "fallback".to_string(), priority: 100 },
        ]);
        let ctx = DescriptionContext::from_event(&event(), true, 1, 1, 0, None, None);
        let picked = select_description(&t, &ctx).unwrap();
        assert_eq!(picked.text, "fallback");
    }

    #[test]
    fn test_priority_order_lower_wins() {
        let t = template_with(vec![
            DescriptionOption { condition: Condition::IsHome, text: "home".to_string(), priority: 50 },
            DescriptionOption { condition: Condition::StreakWinsAtLeast { n: 3 }, text: "hot streak".to_string(), priority: 5 },
            DescriptionOption { condition: Condition::Always, text: "fallback".to_string(), priority: 100 },
        ]);
        let ctx = DescriptionContext::from_event(&event(), true, 4, 0, 0, None, None);
        let picked = select_description(&t, &ctx).unwrap();
        assert_eq!(picked.text, "hot streak");
    }

    #[test]
    fn test_streak_losses_are_negative_threshold() {
        let t = template_with(vec![
            DescriptionOption { condition: Condition::StreakLossesAtLeast { n: 2 }, text: "slumping".to_string(), priority: 10 },
            DescriptionOption { condition: Condition::Always, text: "fallback".to_string(), priority: 100 },
        ]);
        let ctx = DescriptionContext::from_event(&event(), true, -3, 0, 0, None, None);
        let picked = select_description(&t, &ctx).unwrap();
        assert_eq!(picked.text, "slumping");
    }
}

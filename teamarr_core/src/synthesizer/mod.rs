//! C5: assembles a single team's game, pregame, postgame and idle
//! programmes into one time-ordered, non-overlapping stream.
//!
//! The synthesizer runs after C3 (enrichment) and C4 (template resolution)
//! have produced, respectively, the team's derived stats/streaks/H2H and the
//! machinery to render a variable map into text. It owns only the timeline
//! arithmetic: which programme occupies which span, and which game each
//! filler's `.next`/`.last` slots point to.

use crate::config::Settings;
use crate::models::{
    Event, GameDurationMode, MidnightCrossoverMode, Programme, ProgrammeSourceKind, Streaks, Team, TeamStats, Template, H2H,
};
use crate::template::variables::{build_game_facts, build_team_facts, GameFacts, TeamFacts};
use crate::template::{render, resolve_variables, DescriptionContext};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::time::Duration as StdDuration;

/// Everything the synthesizer needs to assemble one team's programme stream.
pub struct SynthesisInput<'a> {
    pub team: &'a Team,
    pub template: &'a Template,
    /// The full known schedule (past and future), ascending by `start_utc`.
    /// Past completed games are used only to seed the initial `.last` binding.
    pub schedule: &'a [Event],
    pub team_stats: Option<&'a TeamStats>,
    pub streaks: Option<&'a Streaks>,
    pub head_coach: Option<&'a str>,
    pub current_season: &'a str,
    pub own_rank: Option<u32>,
    /// Opponent provider-team-id -> AP/poll rank, for `ranked_opponent_top25`/`top10_matchup`.
    pub opponent_ranks: &'a HashMap<String, u32>,
    /// Opponent provider-team-id -> head-to-head record against that opponent.
    pub h2h_by_opponent: &'a HashMap<String, H2H>,
    pub now_utc: DateTime<Utc>,
    pub days_ahead: u32,
    pub tz: &'a Tz,
    pub settings: &'a Settings,
}

fn resolve_game_duration(template: &Template, league_code: &str, settings: &Settings) -> ChronoDuration {
    let std_dur: StdDuration = match template.game_duration_mode {
        GameDurationMode::Custom => StdDuration::from_secs(template.custom_duration_minutes.unwrap_or(180) as u64 * 60),
        GameDurationMode::Default => settings.default_durations.get(league_code).copied().unwrap_or(settings.default_game_duration),
        GameDurationMode::Sport => crate::league_config::get_league_config(league_code)
            .map(|c| c.default_duration)
            .unwrap_or_else(|| {
                let sport_slug = crate::league_config::get_league_config(league_code).map(|c| c.sport_slug).unwrap_or("");
                crate::league_config::default_duration_for_sport_slug(sport_slug)
            }),
    };
    ChronoDuration::from_std(std_dur).unwrap_or_else(|_| ChronoDuration::hours(3))
}

fn opponent_id(event: &Event, team: &Team) -> String {
    if event.home.team_id == team.provider_team_id { event.away.team_id.clone() } else { event.home.team_id.clone() }
}

fn is_home(event: &Event, team: &Team) -> bool {
    event.home.team_id == team.provider_team_id
}

struct Anchor<'a> {
    event: &'a Event,
    facts: GameFacts,
    duration: ChronoDuration,
}

/// Assembles `input.team`'s programme stream across `[now_utc, now_utc + days_ahead)`.
pub fn synthesize(input: &SynthesisInput<'_>) -> Vec<Programme> {
    let channel_id = Programme::channel_id_for("espn", &input.team.provider_team_id);
    let window_start = input.now_utc;
    let window_end = input.now_utc + ChronoDuration::days(input.days_ahead as i64);

    let team_facts = build_team_facts(
        input.team,
        input.team_stats,
        input.streaks,
        input.head_coach,
        input.current_season,
        input.now_utc,
        input.tz,
        input.days_ahead,
    );

    // Seed `.last` with the most recent completed game strictly before the window,
    // so idle/pregame fillers at the very start of the run can still bind `.last`.
    let mut last_facts: Option<GameFacts> = input
        .schedule
        .iter()
        .filter(|e| e.start_utc < window_start && e.is_final())
        .max_by_key(|e| e.start_utc)
        .map(|e| build_facts_for(e, input));

    let anchors: Vec<Anchor> = input
        .schedule
        .iter()
        .filter(|e| e.start_utc >= window_start && e.start_utc < window_end)
        .map(|event| Anchor {
            event,
            facts: build_facts_for(event, input),
            duration: resolve_game_duration(input.template, &event.league_code, input.settings),
        })
        .collect();

    let mut programmes = Vec::new();
    let mut cursor = window_start;

    for (idx, anchor) in anchors.iter().enumerate() {
        let next_facts = anchors.get(idx + 1).map(|a| a.facts.clone());
        let game_start = anchor.event.start_utc;
        let game_end = game_start + anchor.duration;

        // Pregame immediately precedes the game; clipped to not overlap the
        // previous programme (e.g. a prior game's postgame/idle running long).
        if input.template.pregame_enabled {
            let pregame_start = (game_start - ChronoDuration::minutes(input.template.pregame_minutes as i64)).max(cursor);
            if pregame_start < game_start {
                let vars = resolve_variables(&team_facts, None, Some(&anchor.facts), last_facts.as_ref());
                let desc_ctx = None;
                let rendered = render_with(input.template, &vars, desc_ctx, ProgrammeSourceKind::Pregame);
                programmes.push(make_programme(&channel_id, &rendered, pregame_start, game_start, ProgrammeSourceKind::Pregame, input.template));
            }
        }

        // Gap between cursor and pregame/game start is idle filler.
        let fill_until = if input.template.pregame_enabled {
            (game_start - ChronoDuration::minutes(input.template.pregame_minutes as i64)).max(cursor)
        } else {
            game_start
        };
        if cursor < fill_until {
            fill_idle(&mut programmes, &channel_id, input, &team_facts, last_facts.as_ref(), Some(&anchor.facts), cursor, fill_until);
        }

        // The game itself.
        let vars = resolve_variables(&team_facts, Some(&anchor.facts), next_facts.as_ref(), last_facts.as_ref());
        let desc_ctx = DescriptionContext::from_event(
            anchor.event,
            is_home(anchor.event, input.team),
            input.streaks.map(signed_streak).unwrap_or(0),
            input.streaks.map(|s| signed_named_streak(&s.home_streak)).unwrap_or(0),
            input.streaks.map(|s| signed_named_streak(&s.away_streak)).unwrap_or(0),
            input.own_rank,
            input.opponent_ranks.get(&opponent_id(anchor.event, input.team)).copied(),
        );
        let rendered = render_with(input.template, &vars, Some(&desc_ctx), ProgrammeSourceKind::Game);
        programmes.push(make_programme(&channel_id, &rendered, game_start, game_end, ProgrammeSourceKind::Game, input.template));

        let crosses_midnight = {
            let start_local = game_start.with_timezone(input.tz);
            let end_local = game_end.with_timezone(input.tz);
            end_local.date_naive() > start_local.date_naive()
        };

        if anchor.event.is_final() {
            last_facts = Some(anchor.facts.clone());
        }

        cursor = if crosses_midnight {
            match input.template.midnight_crossover_mode {
                MidnightCrossoverMode::Postgame if input.template.postgame_enabled => {
                    let postgame_end = game_end + ChronoDuration::minutes(input.template.postgame_minutes as i64);
                    let vars = resolve_variables(&team_facts, None, next_facts.as_ref(), Some(&anchor.facts));
                    let rendered = render_with(input.template, &vars, None, ProgrammeSourceKind::Postgame);
                    programmes.push(make_programme(&channel_id, &rendered, game_end, postgame_end, ProgrammeSourceKind::Postgame, input.template));
                    postgame_end
                }
                MidnightCrossoverMode::Idle if input.template.idle_enabled => {
                    let idle_end = game_end + ChronoDuration::minutes(input.template.pregame_minutes.max(30) as i64);
                    fill_idle(&mut programmes, &channel_id, input, &team_facts, Some(&anchor.facts), next_facts.as_ref(), game_end, idle_end);
                    idle_end
                }
                _ => game_end,
            }
        } else if input.template.postgame_enabled {
            let postgame_end = game_end + ChronoDuration::minutes(input.template.postgame_minutes as i64);
            let vars = resolve_variables(&team_facts, None, next_facts.as_ref(), Some(&anchor.facts));
            let rendered = render_with(input.template, &vars, None, ProgrammeSourceKind::Postgame);
            programmes.push(make_programme(&channel_id, &rendered, game_end, postgame_end, ProgrammeSourceKind::Postgame, input.template));
            postgame_end
        } else {
            game_end
        };
    }

    if cursor < window_end {
        fill_idle(&mut programmes, &channel_id, input, &team_facts, last_facts.as_ref(), None, cursor, window_end);
    }

    programmes
}

fn build_facts_for(event: &Event, input: &SynthesisInput<'_>) -> GameFacts {
    let opp_id = opponent_id(event, input.team);
    let h2h = input.h2h_by_opponent.get(&opp_id);
    let opponent_rank = input.opponent_ranks.get(&opp_id).copied();
    build_game_facts(event, input.team, input.own_rank, opponent_rank, h2h, input.now_utc, input.tz, None, None)
}

fn render_with(
    template: &Template,
    vars: &HashMap<String, String>,
    desc_ctx: Option<&DescriptionContext>,
    source_kind: ProgrammeSourceKind,
) -> crate::template::RenderedText {
    render(template, vars, desc_ctx, source_kind)
}

fn make_programme(
    channel_id: &str,
    rendered: &crate::template::RenderedText,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    kind: ProgrammeSourceKind,
    template: &Template,
) -> Programme {
    Programme {
        channel_id: channel_id.to_string(),
        title: rendered.title.clone(),
        subtitle: rendered.subtitle.clone(),
        description: rendered.description.clone(),
        start_utc: start,
        stop_utc: stop,
        categories: template.categories.clone(),
        icon: None,
        source_kind: kind,
    }
}

/// Fills `[from, to)` with idle programmes, chunked at `max_program_hours`
/// (the last chunk may be shorter). Each chunk re-renders independently so a
/// `.next`-bound countdown field can tick down across chunks. No-op when
/// idle is disabled or the template has no idle template configured.
#[allow(clippy::too_many_arguments)]
fn fill_idle(
    programmes: &mut Vec<Programme>,
    channel_id: &str,
    input: &SynthesisInput<'_>,
    team_facts: &TeamFacts,
    last_facts: Option<&GameFacts>,
    next_facts: Option<&GameFacts>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) {
    if !input.template.idle_enabled || from >= to {
        return;
    }
    let chunk = ChronoDuration::from_std(StdDuration::from_secs_f64(input.template.max_program_hours.max(0.25) * 3600.0))
        .unwrap_or_else(|_| ChronoDuration::hours(4));

    let mut cur = from;
    while cur < to {
        let chunk_end = (cur + chunk).min(to);
        let vars = resolve_variables(team_facts, None, next_facts, last_facts);
        let rendered = render(input.template, &vars, None, ProgrammeSourceKind::Idle);
        programmes.push(make_programme(channel_id, &rendered, cur, chunk_end, ProgrammeSourceKind::Idle, input.template));
        cur = chunk_end;
    }
}

fn signed_streak(streaks: &Streaks) -> i32 {
    signed_named_streak(&streaks.current_streak)
}

/// Parses a `"W3"`/`"L1"` formatted streak string back into its signed count.
fn signed_named_streak(s: &str) -> i32 {
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
    use crate::models::{Competitor, EventStatus, GameDurationMode, MidnightCrossoverMode, SeasonType, TemplateType};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn team() -> Team {
        Team {
            id: Uuid::nil(),
            provider_team_id: "1".to_string(),
            league_code: "nba".to_string(),
            name: "Boston Celtics".to_string(),
            abbrev: "BOS".to_string(),
            logo_url: None,
            template_id: Uuid::nil(),
            active: true,
        }
    }

    fn template() -> Template {
        Template {
            id: Uuid::nil(),
            name: "t".to_string(),
            template_type: TemplateType::Team,
            title_format: "{team_name} vs {opponent_name}".to_string(),
            subtitle_format: None,
            description_options: vec![crate::models::DescriptionOption {
                condition: crate::models::Condition::Always,
                text: "{team_name} takes on {opponent_name}".to_string(),
                priority: 100,
            }],
            pregame_enabled: true,
            pregame_minutes: 30,
            pregame_template: Some("Pregame vs {opponent_name.next}".to_string()),
            postgame_enabled: true,
            postgame_minutes: 30,
            postgame_template: Some("Postgame: {result.last}".to_string()),
            idle_enabled: true,
            idle_template: Some("{team_name} idle".to_string()),
            max_program_hours: 4.0,
            game_duration_mode: GameDurationMode::Sport,
            custom_duration_minutes: None,
            midnight_crossover_mode: MidnightCrossoverMode::Postgame,
            categories: vec!["Sports".to_string()],
            flags: HashSet::new(),
        }
    }

    fn game(start: DateTime<Utc>, home_id: &str, away_id: &str) -> Event {
        Event {
            id: format!("evt-{}", start.timestamp()),
            provider: "espn".to_string(),
            league_code: "nba".to_string(),
            start_utc: start,
            status: EventStatus::Scheduled,
            home: Competitor { team_id: home_id.to_string(), name: "Home".to_string(), abbrev: "HOM".to_string(), score: None, record: None },
            away: Competitor { team_id: away_id.to_string(), name: "Away".to_string(), abbrev: "AWY".to_string(), score: None, record: None },
            venue: None,
            broadcasts: vec![],
            odds: None,
            player_leaders: Default::default(),
            season_type: SeasonType::Regular,
            source_league: None,
        }
    }

    #[test]
    fn test_non_overlap_invariant_holds() {
        let team = team();
        let tz: Tz = "America/New_York".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let schedule = vec![game(now + ChronoDuration::hours(20), "1", "2")];
        let opp_ranks = HashMap::new();
        let h2h = HashMap::new();
        let settings = Settings::for_test();
        let template = template();
        let input = SynthesisInput {
            team: &team,
            template: &template,
            schedule: &schedule,
            team_stats: None,
            streaks: None,
            head_coach: None,
            current_season: "2025",
            own_rank: None,
            opponent_ranks: &opp_ranks,
            h2h_by_opponent: &h2h,
            now_utc: now,
            days_ahead: 1,
            tz: &tz,
            settings: &settings,
        };
        let programmes = synthesize(&input);
        assert!(!programmes.is_empty());
        for w in programmes.windows(2) {
            assert_eq!(w[0].stop_utc, w[1].start_utc, "expected no gap/overlap between adjacent programmes");
        }
        for p in &programmes {
            assert!(p.start_utc < p.stop_utc);
        }
    }

    #[test]
    fn test_no_games_yields_idle_only_fill() {
        let team = team();
        let tz: Tz = "UTC".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let schedule: Vec<Event> = vec![];
        let opp_ranks = HashMap::new();
        let h2h = HashMap::new();
        let settings = Settings::for_test();
        let template = template();
        let input = SynthesisInput {
            team: &team,
            template: &template,
            schedule: &schedule,
            team_stats: None,
            streaks: None,
            head_coach: None,
            current_season: "2025",
            own_rank: None,
            opponent_ranks: &opp_ranks,
            h2h_by_opponent: &h2h,
            now_utc: now,
            days_ahead: 1,
            tz: &tz,
            settings: &settings,
        };
        let programmes = synthesize(&input);
        assert!(programmes.iter().all(|p| p.source_kind == ProgrammeSourceKind::Idle));
        assert_eq!(programmes.first().unwrap().start_utc, now);
        assert_eq!(programmes.last().unwrap().stop_utc, now + ChronoDuration::days(1));
    }

    #[test]
    fn test_idle_chunks_respect_max_program_hours() {
        let team = team();
        let tz: Tz = "UTC".parse().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let schedule: Vec<Event> = vec![];
        let opp_ranks = HashMap::new();
        let h2h = HashMap::new();
        let settings = Settings::for_test();
        let mut template = template();
        template.max_program_hours = 5.0;
        let input = SynthesisInput {
            team: &team,
            template: &template,
            schedule: &schedule,
            team_stats: None,
            streaks: None,
            head_coach: None,
            current_season: "2025",
            own_rank: None,
            opponent_ranks: &opp_ranks,
            h2h_by_opponent: &h2h,
            now_utc: now,
            days_ahead: 1,
            tz: &tz,
            settings: &settings,
        };
        let programmes = synthesize(&input);
        for p in &programmes {
            assert!(p.duration() <= ChronoDuration::hours(5));
        }
    }

    #[test]
    fn test_signed_named_streak_parsing() {
        assert_eq!(signed_named_streak("W4"), 4);
        assert_eq!(signed_named_streak("L2"), -2);
        assert_eq!(signed_named_streak(""), 0);
    }
}

//! C4: the template engine.
//!
//! A game (or filler programme) is rendered in three steps: compute the
//! team-level and per-slot game facts ([`variables`]), flatten them into the
//! 237-placeholder variable map ([`resolver::resolve_variables`]), then
//! substitute that map into the template's title/subtitle/description
//! formats ([`resolver::substitute`]). Description text additionally runs
//! through the closed-set conditional selector ([`conditions`]) before
//! substitution, since a template can carry several candidate descriptions.

pub mod conditions;
pub mod resolver;
pub mod variables;

pub use conditions::{select_description, DescriptionContext};
pub use resolver::{resolve_variables, substitute};
pub use variables::{build_game_facts, GameFacts, TeamFacts, VarStrategy};

use crate::models::{ProgrammeSourceKind, Template};
use std::collections::HashMap;

/// One fully-rendered programme's text fields, ready to hand to the
/// synthesizer (C5) for assembly into a [`crate::models::Programme`].
#[derive(Debug, Clone)]
pub struct RenderedText {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: String,
}

/// The title-format string for a given programme kind: `pregame_template`/
/// `postgame_template`/`idle_template` for filler, falling back to
/// `title_format` when the kind-specific field is unset (and always for a
/// `Game` programme, which has no filler template of its own).
fn title_format_for(template: &Template, source_kind: ProgrammeSourceKind) -> &str {
    let kind_specific = match source_kind {
        ProgrammeSourceKind::Game => None,
        ProgrammeSourceKind::Pregame => template.pregame_template.as_deref(),
        ProgrammeSourceKind::Postgame => template.postgame_template.as_deref(),
        ProgrammeSourceKind::Idle => template.idle_template.as_deref(),
    };
    kind_specific.unwrap_or(&template.title_format)
}

/// Renders a template's title, subtitle and description against an
/// already-resolved variable map and description context. `source_kind`
/// selects which title format applies: `pregame_template`/`postgame_template`/
/// `idle_template` for filler programmes, `title_format` for an actual game
/// (and as the fallback when a filler template field is unset).
/// `description_ctx` is `None` for contexts with no natural "current game"
/// (e.g. pure idle filler with no game at all that day) — in that case the
/// description falls through to the template's lowest-priority (`Always`)
/// option.
pub fn render(
    template: &Template,
    vars: &HashMap<String, String>,
    description_ctx: Option<&DescriptionContext>,
    source_kind: ProgrammeSourceKind,
) -> RenderedText {
    let title = substitute(title_format_for(template, source_kind), vars);
    let subtitle = template.subtitle_format.as_deref().map(|f| substitute(f, vars));

    let description_format = description_ctx
        .and_then(|ctx| select_description(template, ctx))
        .map(|opt| opt.text.as_str())
        .or_else(|| template.description_options.iter().find(|o| matches!(o.condition, crate::models::Condition::Always)).map(|o| o.text.as_str()))
        .unwrap_or("");

    RenderedText {
        title,
        subtitle,
        description: substitute(description_format, vars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, DescriptionOption, GameDurationMode, MidnightCrossoverMode, TemplateType};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn template() -> Template {
        Template {
            id: Uuid::nil(),
            name: "t".to_string(),
            template_type: TemplateType::Team,
            title_format: "{team_name} vs {opponent_name}".to_string(),
            subtitle_format: Some("{game_date}".to_string()),
            description_options: vec![
                DescriptionOption { condition: Condition::IsNationalBroadcast, text: "{team_name} on {broadcast_network}".to_string(), priority: 10 },
                DescriptionOption { condition: Condition::Always, text: "{team_name} takes on {opponent_name}".to_string(), priority: 100 },
            ],
            pregame_enabled: true,
            pregame_minutes: 30,
            pregame_template: Some("Pregame: {team_name} vs {opponent_name}".to_string()),
            postgame_enabled: true,
            postgame_minutes: 30,
            postgame_template: Some("Postgame: {result.last}".to_string()),
            idle_enabled: true,
            idle_template: Some("{team_name} - {record}".to_string()),
            max_program_hours: 4.0,
            game_duration_mode: GameDurationMode::Sport,
            custom_duration_minutes: None,
            midnight_crossover_mode: MidnightCrossoverMode::Idle,
            categories: vec!["Sports".to_string()],
            flags: HashSet::new(),
        }
    }

    #[test]
    fn test_render_falls_back_to_always_without_description_context() {
        let mut vars = HashMap::new();
        vars.insert("team_name".to_string(), "Celtics".to_string());
        vars.insert("opponent_name".to_string(), "Heat".to_string());
        let rendered = render(&template(), &vars, None, ProgrammeSourceKind::Game);
        assert_eq!(rendered.description, "Celtics takes on Heat");
    }

    #[test]
    fn test_render_title_and_subtitle() {
        let mut vars = HashMap::new();
        vars.insert("team_name".to_string(), "Celtics".to_string());
        vars.insert("opponent_name".to_string(), "Heat".to_string());
        vars.insert("game_date".to_string(), "2026-02-01".to_string());
        let rendered = render(&template(), &vars, None, ProgrammeSourceKind::Game);
        assert_eq!(rendered.title, "Celtics vs Heat");
        assert_eq!(rendered.subtitle, Some("2026-02-01".to_string()));
    }

    #[test]
    fn test_render_selects_pregame_template_for_pregame_kind() {
        let mut vars = HashMap::new();
        vars.insert("team_name".to_string(), "Celtics".to_string());
        vars.insert("opponent_name".to_string(), "Heat".to_string());
        let rendered = render(&template(), &vars, None, ProgrammeSourceKind::Pregame);
        assert_eq!(rendered.title, "Pregame: Celtics vs Heat");
    }

    #[test]
    fn test_render_selects_postgame_template_for_postgame_kind() {
        let mut vars = HashMap::new();
        vars.insert("result.last".to_string(), "win".to_string());
        let rendered = render(&template(), &vars, None, ProgrammeSourceKind::Postgame);
        assert_eq!(rendered.title, "Postgame: win");
    }

    #[test]
    fn test_render_selects_idle_template_for_idle_kind() {
        let mut vars = HashMap::new();
        vars.insert("team_name".to_string(), "Celtics".to_string());
        vars.insert("record".to_string(), "10-5".to_string());
        let rendered = render(&template(), &vars, None, ProgrammeSourceKind::Idle);
        assert_eq!(rendered.title, "Celtics - 10-5");
    }

    #[test]
    fn test_render_falls_back_to_title_format_when_filler_template_unset() {
        let mut t = template();
        t.pregame_template = None;
        let mut vars = HashMap::new();
        vars.insert("team_name".to_string(), "Celtics".to_string());
        vars.insert("opponent_name".to_string(), "Heat".to_string());
        let rendered = render(&t, &vars, None, ProgrammeSourceKind::Pregame);
        assert_eq!(rendered.title, "Celtics vs Heat");
    }
}

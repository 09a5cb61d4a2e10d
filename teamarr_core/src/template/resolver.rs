//! Single-pass placeholder substitution over the variable table in
//! [`super::variables`].
//!
//! All 237 placeholders (`{name}`, `{name.next}`, `{name.last}`) are resolved
//! into a flat map once per programme, then substituted into
//! `title_format`/`subtitle_format`/description text/filler templates with
//! one regex pass each. An unrecognized placeholder (not in the 112-entry
//! table) or a recognized one with no data for its slot renders as an empty
//! string — it is never left verbatim and never errors the run.

use super::variables::{
    all_variable_defs, game_facts_value, team_facts_value, GameFacts, TeamFacts, VarStrategy,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z][a-z0-9_]*)(\.(?:next|last))?\}").expect("valid placeholder regex"));

/// Builds the flat `{name}` / `{name.next}` / `{name.last}` -> value map for
/// one programme render. `current`/`next`/`last` are `None` whenever that
/// slot has no backing game (e.g. an idle filler with no upcoming game within
/// the lookahead window).
pub fn resolve_variables(
    team: &TeamFacts,
    current: Option<&GameFacts>,
    next: Option<&GameFacts>,
    last: Option<&GameFacts>,
) -> HashMap<String, String> {
    let mut out = HashMap::with_capacity(237);

    for def in all_variable_defs() {
        match def.strategy {
            VarStrategy::Base => {
                out.insert(def.name.to_string(), team_facts_value(def.name, team));
            }
            VarStrategy::Last => {
                if let Some(g) = last {
                    out.insert(format!("{}.last", def.name), game_facts_value(def.name, g));
                }
            }
            VarStrategy::BaseNext => {
                if let Some(g) = current {
                    out.insert(def.name.to_string(), game_facts_value(def.name, g));
                }
                if let Some(g) = next {
                    out.insert(format!("{}.next", def.name), game_facts_value(def.name, g));
                }
            }
            VarStrategy::All => {
                if let Some(g) = current {
                    out.insert(def.name.to_string(), game_facts_value(def.name, g));
                }
                if let Some(g) = next {
                    out.insert(format!("{}.next", def.name), game_facts_value(def.name, g));
                }
                if let Some(g) = last {
                    out.insert(format!("{}.last", def.name), game_facts_value(def.name, g));
                }
            }
        }
    }

    out
}

/// Substitutes every recognized placeholder in `text` with its resolved
/// value, in one regex pass. Placeholders with no entry in `vars` (unknown
/// names, or a recognized name with no data for that slot) become empty
/// strings.
pub fn substitute(text: &str, vars: &HashMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let slot = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            vars.get(&format!("{}{}", name, slot)).cloned().unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::variables::TeamFacts;

    fn team() -> TeamFacts {
        TeamFacts {
            team_name: "Boston Celtics".to_string(),
            team_abbrev: "BOS".to_string(),
            record: "10-4".to_string(),
            streak: "W3".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_base_variable_substitution() {
        let vars = resolve_variables(&team(), None, None, None);
        let out = substitute("{team_name} ({record})", &vars);
        assert_eq!(out, "Boston Celtics (10-4)");
    }

    #[test]
    fn test_unknown_placeholder_resolves_empty() {
        let vars = resolve_variables(&team(), None, None, None);
        let out = substitute("Score: {totally_made_up_field}", &vars);
        assert_eq!(out, "Score: ");
    }

    #[test]
    fn test_last_slot_empty_when_no_completed_game() {
        let vars = resolve_variables(&team(), None, None, None);
        let out = substitute("Last result: {result.last}", &vars);
        assert_eq!(out, "Last result: ");
    }

    #[test]
    fn test_base_slot_empty_when_no_current_game() {
        let vars = resolve_variables(&team(), None, None, None);
        let out = substitute("Opponent: {opponent_name}", &vars);
        assert_eq!(out, "Opponent: ");
    }

    #[test]
    fn test_single_pass_does_not_re_resolve_substituted_braces() {
        let mut vars = HashMap::new();
        vars.insert("team_name".to_string(), "{record}".to_string());
        vars.insert("record".to_string(), "10-4".to_string());
        let out = substitute("{team_name}", &vars);
        assert_eq!(out, "{record}");
    }
}

//! The final per-channel unit emitted by the synthesizer (C5) and serialized
//! by the XMLTV writer (C6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgrammeSourceKind {
    Game,
    Pregame,
    Postgame,
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Programme {
    pub channel_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: String,
    pub start_utc: DateTime<Utc>,
    pub stop_utc: DateTime<Utc>,
    pub categories: Vec<String>,
    pub icon: Option<String>,
    pub source_kind: ProgrammeSourceKind,
}

impl Programme {
    pub fn duration(&self) -> chrono::Duration {
        self.stop_utc - self.start_utc
    }

    /// A stable channel id: `teamarr-team-{provider}-{provider_team_id}`.
    pub fn channel_id_for(provider: &str, provider_team_id: &str) -> String {
        format!("teamarr-team-{}-{}", provider, provider_team_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_format() {
        assert_eq!(
            Programme::channel_id_for("espn", "10"),
            "teamarr-team-espn-10"
        );
    }

    #[test]
    fn test_duration() {
        let start = Utc::now();
        let p = Programme {
            channel_id: "c".to_string(),
            title: "t".to_string(),
            subtitle: None,
            description: String::new(),
            start_utc: start,
            stop_utc: start + chrono::Duration::hours(2),
            categories: vec![],
            icon: None,
            source_kind: ProgrammeSourceKind::Game,
        };
        assert_eq!(p.duration(), chrono::Duration::hours(2));
    }
}

//! Data model for the EPG orchestration engine.
//!
//! Team and Template are read-only identity/formatting records supplied by
//! the persisted store; Event, TeamStats, H2H, Streaks and Programme are all
//! constructed fresh on every generation run and never persisted as
//! authoritative truth.

pub mod enrichment;
pub mod event;
pub mod programme;
pub mod team;
pub mod template;

pub use enrichment::{H2H, Streaks, TeamStats};
pub use event::{Competitor, Event, EventStatus, Odds, PlayerLeaders, SeasonType};
pub use programme::{Programme, ProgrammeSourceKind};
pub use team::Team;
pub use template::{DescriptionOption, GameDurationMode, MidnightCrossoverMode, Template, TemplateType};

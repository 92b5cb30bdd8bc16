pub mod aggregate;
pub mod colors;
pub mod derived;
pub mod error;
pub mod matches;
pub mod record;
pub mod snapshot;
pub mod version;
pub mod view;
pub mod week;

pub use aggregate::{CumulativePlayerRecord, Leaderboard, aggregate};
pub use colors::position_color;
pub use derived::{DerivedStats, PointsFormula};
pub use error::{Result, ScoutedError, SnapshotKind};
pub use matches::{MatchRecord, MatchRequest, MatchView, build_match_view};
pub use record::{CountingStats, Gender, PlayerKey, PlayerWeekRecord};
pub use snapshot::{
    MatchSnapshot, MemorySource, SnapshotSource, WeeklySnapshot, parse_match_snapshot,
    parse_player_snapshot,
};
pub use version::{SnapshotFileStamp, data_version};
pub use view::{
    FilterOptions, LeaderboardRow, SortColumn, SortDirection, ViewDefaults, ViewFilters,
    ViewRequest, ViewResult, apply_view,
};
pub use week::{WeekCode, WeekInfo};

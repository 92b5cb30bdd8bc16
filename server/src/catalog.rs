use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scouted_shared::error::{Result, ScoutedError, SnapshotKind};
use scouted_shared::{
    Gender, MatchSnapshot, SnapshotFileStamp, SnapshotSource, WeekCode, WeekInfo, WeeklySnapshot,
    data_version, parse_match_snapshot, parse_player_snapshot,
};

use crate::config::{MATCHES_DIR, PLAYERS_DIR};

const CSV_EXTENSION: &str = ".csv";
const MATCHES_PREFIX: &str = "matches_";

fn players_prefix(gender: Gender) -> &'static str {
    match gender {
        Gender::Men => "mens_players_",
        Gender::Women => "womens_players_",
    }
}

/// `{mens|womens}_players_{YYYYMMDD}.csv`
pub fn parse_player_file_name(file_name: &str) -> Option<(Gender, WeekCode)> {
    Gender::ALL.into_iter().find_map(|gender| {
        let code = file_name
            .strip_prefix(players_prefix(gender))?
            .strip_suffix(CSV_EXTENSION)?;
        code.parse().ok().map(|week| (gender, week))
    })
}

/// `matches_{YYYYMMDD}.csv`
pub fn parse_match_file_name(file_name: &str) -> Option<WeekCode> {
    file_name
        .strip_prefix(MATCHES_PREFIX)?
        .strip_suffix(CSV_EXTENSION)?
        .parse()
        .ok()
}

#[derive(Debug, Clone)]
struct SnapshotFile {
    path: PathBuf,
    stamp: SnapshotFileStamp,
}

/// Immutable listing of the snapshot files found under one data directory.
///
/// A rescan produces a new catalog; readers hold an `Arc` to whichever catalog was
/// current when their request started.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    players: BTreeMap<(Gender, WeekCode), SnapshotFile>,
    matches: BTreeMap<WeekCode, SnapshotFile>,
    version: u32,
    scanned_at: DateTime<Utc>,
}

impl Catalog {
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            players: BTreeMap::new(),
            matches: BTreeMap::new(),
            version: data_version(&[]),
            scanned_at: Utc::now(),
        }
    }

    /// Scan `root/Players` and `root/Matches`. Missing directories mean "no data yet".
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self> {
        let mut catalog = Self::empty(root);

        for file in list_csv_files(&catalog.root.join(PLAYERS_DIR))? {
            if let Some(key) = parse_player_file_name(&file.stamp.name) {
                catalog.players.insert(key, file);
            }
        }
        for file in list_csv_files(&catalog.root.join(MATCHES_DIR))? {
            if let Some(week) = parse_match_file_name(&file.stamp.name) {
                catalog.matches.insert(week, file);
            }
        }

        let stamps: Vec<SnapshotFileStamp> = catalog
            .players
            .values()
            .chain(catalog.matches.values())
            .map(|file| file.stamp.clone())
            .collect();
        catalog.version = data_version(&stamps);
        Ok(catalog)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    pub fn file_count(&self) -> usize {
        self.players.len() + self.matches.len()
    }

    /// Union of player weeks across genders, ascending.
    pub fn weeks(&self) -> Vec<WeekCode> {
        let weeks: BTreeSet<WeekCode> = self.players.keys().map(|(_, week)| *week).collect();
        weeks.into_iter().collect()
    }

    pub fn week_infos(&self) -> Vec<WeekInfo> {
        self.weeks().into_iter().map(WeekInfo::from).collect()
    }

    pub fn latest_week(&self) -> Option<WeekCode> {
        self.players.keys().map(|(_, week)| *week).max()
    }

    pub fn player_weeks(&self, gender: Gender) -> Vec<WeekCode> {
        self.players
            .keys()
            .filter(|(g, _)| *g == gender)
            .map(|(_, week)| *week)
            .collect()
    }

    pub fn match_weeks(&self) -> Vec<WeekCode> {
        self.matches.keys().copied().collect()
    }

    /// The gender's weeks up to and including `week`. Weeks with no file for that
    /// gender are skipped; `week` must be listed for at least one gender.
    pub fn cumulative_weeks(&self, gender: Gender, week: WeekCode) -> Result<Vec<WeekCode>> {
        if !self.players.keys().any(|(_, listed)| *listed == week) {
            return Err(ScoutedError::MissingSnapshot {
                kind: SnapshotKind::Players,
                week,
            });
        }
        Ok(self
            .player_weeks(gender)
            .into_iter()
            .filter(|candidate| *candidate <= week)
            .collect())
    }
}

impl SnapshotSource for Catalog {
    fn load_players(&self, gender: Gender, week: WeekCode) -> Result<WeeklySnapshot> {
        let file = self
            .players
            .get(&(gender, week))
            .ok_or(ScoutedError::MissingSnapshot {
                kind: SnapshotKind::Players,
                week,
            })?;
        let reader = open(&file.path)?;
        parse_player_snapshot(&file.stamp.name, gender, week, reader)
    }

    fn load_matches(&self, week: WeekCode) -> Result<MatchSnapshot> {
        let file = self.matches.get(&week).ok_or(ScoutedError::MissingSnapshot {
            kind: SnapshotKind::Matches,
            week,
        })?;
        let reader = open(&file.path)?;
        parse_match_snapshot(&file.stamp.name, week, reader)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ScoutedError {
    ScoutedError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| io_error(path, e))
}

fn list_csv_files(dir: &Path) -> Result<Vec<SnapshotFile>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.ends_with(CSV_EXTENSION) {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| io_error(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified_secs = metadata
            .modified()
            .map(|time| DateTime::<Utc>::from(time).timestamp())
            .unwrap_or(0);
        files.push(SnapshotFile {
            stamp: SnapshotFileStamp {
                name: name.to_owned(),
                len: metadata.len(),
                modified_secs,
            },
            path,
        });
    }
    Ok(files)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{seed, write_players};
    use super::*;

    fn week(raw: &str) -> WeekCode {
        raw.parse().expect("valid week code")
    }

    #[test]
    fn file_names_resolve_gender_and_week() {
        assert_eq!(
            parse_player_file_name("mens_players_20250817.csv"),
            Some((Gender::Men, week("20250817")))
        );
        assert_eq!(
            parse_player_file_name("womens_players_20250903.csv"),
            Some((Gender::Women, week("20250903")))
        );
        assert_eq!(parse_player_file_name("mens_players_latest.csv"), None);
        assert_eq!(parse_player_file_name("mens_players_20250817.txt"), None);
        assert_eq!(parse_match_file_name("matches_20250824.csv"), Some(week("20250824")));
        assert_eq!(parse_match_file_name("results_20250824.csv"), None);
    }

    #[test]
    fn scan_lists_union_of_player_weeks() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path());
        std::fs::write(dir.path().join(PLAYERS_DIR).join("notes.csv"), "x").expect("write");

        let catalog = Catalog::scan(dir.path()).expect("scan");

        assert_eq!(catalog.weeks(), vec![week("20250817"), week("20250824")]);
        assert_eq!(catalog.player_weeks(Gender::Women), vec![week("20250824")]);
        assert_eq!(catalog.match_weeks(), vec![week("20250824")]);
        assert_eq!(catalog.latest_week(), Some(week("20250824")));
        assert_eq!(catalog.file_count(), 4);
        assert_eq!(catalog.week_infos()[0].display, "Aug 17, 2025");
    }

    #[test]
    fn missing_directory_is_an_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = Catalog::scan(dir.path().join("absent")).expect("scan");
        assert!(catalog.weeks().is_empty());
        assert_eq!(catalog.version(), Catalog::empty("elsewhere").version());
    }

    #[test]
    fn loads_players_and_matches_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path());
        let catalog = Catalog::scan(dir.path()).expect("scan");

        let snapshot = catalog
            .load_players(Gender::Men, week("20250824"))
            .expect("player snapshot");
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.records[1].name, "Carol");

        let matches = catalog.load_matches(week("20250824")).expect("match snapshot");
        assert_eq!(matches.matches.len(), 3);
        assert_eq!(matches.matches[1].home_team_score, None);
    }

    #[test]
    fn absent_week_is_missing_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path());
        let catalog = Catalog::scan(dir.path()).expect("scan");

        let err = catalog
            .load_players(Gender::Women, week("20250817"))
            .expect_err("no women's file for that week");
        assert!(err.is_missing_snapshot());

        let err = catalog
            .cumulative_weeks(Gender::Women, week("20250907"))
            .expect_err("week not listed for any gender");
        assert!(err.is_missing_snapshot());
    }

    #[test]
    fn listed_week_without_gender_file_is_a_cutoff() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path());
        let catalog = Catalog::scan(dir.path()).expect("scan");

        assert!(
            catalog
                .cumulative_weeks(Gender::Women, week("20250817"))
                .expect("listed week")
                .is_empty()
        );
        assert_eq!(
            catalog
                .cumulative_weeks(Gender::Women, week("20250824"))
                .expect("listed week"),
            vec![week("20250824")]
        );
    }

    #[test]
    fn cumulative_weeks_stop_at_selected_week() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path());
        let catalog = Catalog::scan(dir.path()).expect("scan");

        assert_eq!(
            catalog
                .cumulative_weeks(Gender::Men, week("20250817"))
                .expect("weeks"),
            vec![week("20250817")]
        );
        assert_eq!(
            catalog
                .cumulative_weeks(Gender::Men, week("20250824"))
                .expect("weeks"),
            vec![week("20250817"), week("20250824")]
        );
    }

    #[test]
    fn malformed_file_surfaces_row_and_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_players(
            dir.path(),
            "mens_players_20250817.csv",
            &["Alice,TeamA,men,d1,1,90,one,0,2,1,0,0,0,0,0,F,Forward,2"],
        );
        let catalog = Catalog::scan(dir.path()).expect("scan");

        let err = catalog
            .load_players(Gender::Men, week("20250817"))
            .expect_err("goals cell is not a number");
        match err {
            ScoutedError::MalformedRecord {
                source_name,
                row,
                column,
                ..
            } => {
                assert_eq!(source_name, "mens_players_20250817.csv");
                assert_eq!(row, 2);
                assert_eq!(column, "Goals");
            }
            other => panic!("expected MalformedRecord, got {other}"),
        }
    }

    #[test]
    fn adding_a_file_changes_the_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path());
        let before = Catalog::scan(dir.path()).expect("scan").version();
        assert_eq!(Catalog::scan(dir.path()).expect("rescan").version(), before);

        write_players(
            dir.path(),
            "womens_players_20250831.csv",
            &["Dana,TeamD,women,d1,1,90,0,0,0,0,0,0,0,0,0,F,Forward,0"],
        );
        assert_ne!(Catalog::scan(dir.path()).expect("rescan").version(), before);
    }
}

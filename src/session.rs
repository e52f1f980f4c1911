//! Practice sessions: the solve list, its statistics, and the JSON file store.
//!
//! Session files live at `<sessions dir>/<name>.json`. Reading goes through an
//! all-optional raw record so that older files can be migrated and every
//! missing or malformed entry turns into a [`SessionLoadError`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SessionLoadError, StoreError, TimeFormatError};
use crate::scramble::CubeSize;
use crate::stats::{compute_statistics, Mutation, Statistics};
use crate::time_format::interpret_time;

/// Version written by this build. Files without a version are version 0.
pub const SESSION_FORMAT_VERSION: u32 = 1;

const SESSION_EXTENSION: &str = "json";

/// Date layout of version 0 files, e.g. `2020-09-17 18:03:11.482913`
const LEGACY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq)]
pub struct Solve {
    /// Two-decimal rendering as shown when the timer stopped
    pub time: String,
    /// Seconds, always derived from `time`
    pub raw_time: f64,
    pub scramble: String,
    pub date: DateTime<Local>,
}

impl Solve {
    pub fn new(
        time: impl Into<String>,
        scramble: impl Into<String>,
        date: DateTime<Local>,
    ) -> Result<Self, TimeFormatError> {
        let time = time.into();
        let raw_time = interpret_time(&time)?;
        Ok(Self {
            time,
            raw_time,
            scramble: scramble.into(),
            date,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    name: String,
    scramble_type: CubeSize,
    solves: Vec<Solve>,
    stats: Statistics,
}

impl SessionData {
    pub fn new(name: impl Into<String>, scramble_type: CubeSize) -> Self {
        Self::with_solves(name, scramble_type, Vec::new())
    }

    pub fn with_solves(name: impl Into<String>, scramble_type: CubeSize, solves: Vec<Solve>) -> Self {
        let mut session = Self {
            name: name.into(),
            scramble_type,
            solves,
            stats: Statistics::default(),
        };
        session.recompute(Mutation::Reload);
        session
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn scramble_type(&self) -> CubeSize {
        self.scramble_type
    }

    pub fn set_scramble_type(&mut self, scramble_type: CubeSize) {
        self.scramble_type = scramble_type;
    }

    pub fn solves(&self) -> &[Solve] {
        &self.solves
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn all_ao5(&self) -> &[f64] {
        &self.stats.all_ao5
    }

    pub fn all_ao12(&self) -> &[f64] {
        &self.stats.all_ao12
    }

    pub fn len(&self) -> usize {
        self.solves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solves.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.solves.iter().map(|s| s.raw_time).collect()
    }

    /// Append a solve. The returned statistics carry any new personal bests.
    pub fn push(&mut self, solve: Solve) -> &Statistics {
        self.solves.push(solve);
        self.recompute(Mutation::Append);
        &self.stats
    }

    pub fn remove_last(&mut self) -> Option<Solve> {
        let removed = self.solves.pop()?;
        self.recompute(Mutation::Removal);
        Some(removed)
    }

    pub fn remove(&mut self, index: usize) -> Option<Solve> {
        if index >= self.solves.len() {
            return None;
        }
        let removed = self.solves.remove(index);
        self.recompute(Mutation::Removal);
        Some(removed)
    }

    fn recompute(&mut self, mutation: Mutation) {
        self.stats = compute_statistics(&self.times(), mutation);
    }
}

/// On-disk shape written by this build
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub version: u32,
    pub name: String,
    pub scramble_type: CubeSize,
    pub solves: Vec<SolveRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolveRecord {
    pub time: String,
    pub scramble: String,
    pub date: String,
}

impl From<&SessionData> for SessionRecord {
    fn from(session: &SessionData) -> Self {
        Self {
            version: SESSION_FORMAT_VERSION,
            name: session.name.clone(),
            scramble_type: session.scramble_type,
            solves: session
                .solves
                .iter()
                .map(|solve| SolveRecord {
                    time: solve.time.clone(),
                    scramble: solve.scramble.clone(),
                    date: solve.date.to_rfc3339(),
                })
                .collect(),
        }
    }
}

// Everything optional so each gap gets its own error. Unknown keys, such as the
// cached bests of old files, are ignored.
#[derive(Debug, Deserialize)]
struct RawSessionRecord {
    version: Option<u32>,
    name: Option<String>,
    scramble_type: Option<String>,
    solves: Option<Vec<RawSolveRecord>>,
}

#[derive(Debug, Deserialize)]
struct RawSolveRecord {
    time: Option<String>,
    scramble: Option<String>,
    date: Option<String>,
}

pub fn encode_session(session: &SessionData) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(&SessionRecord::from(session))
}

pub fn decode_session(bytes: &[u8]) -> Result<SessionData, SessionLoadError> {
    let raw: RawSessionRecord = serde_json::from_slice(bytes)?;
    let record = migrate(raw)?;
    validate(record)
}

fn migrate(raw: RawSessionRecord) -> Result<SessionRecord, SessionLoadError> {
    let version = raw.version.unwrap_or(0);
    if version > SESSION_FORMAT_VERSION {
        return Err(SessionLoadError::UnsupportedVersion(version));
    }

    let name = raw.name.ok_or(SessionLoadError::MissingField("name"))?;
    let scramble_type = match (version, raw.scramble_type) {
        (_, Some(kind)) => kind.parse()?,
        // only 3x3x3 existed before the type was recorded
        (0, None) => CubeSize::Three,
        (_, None) => return Err(SessionLoadError::MissingField("scramble_type")),
    };

    let solves = raw
        .solves
        .ok_or(SessionLoadError::MissingField("solves"))?
        .into_iter()
        .map(|solve| {
            Ok(SolveRecord {
                time: solve.time.ok_or(SessionLoadError::MissingField("time"))?,
                scramble: solve.scramble.unwrap_or_default(),
                date: solve.date.ok_or(SessionLoadError::MissingField("date"))?,
            })
        })
        .collect::<Result<Vec<_>, SessionLoadError>>()?;

    Ok(SessionRecord {
        version: SESSION_FORMAT_VERSION,
        name,
        scramble_type,
        solves,
    })
}

fn validate(record: SessionRecord) -> Result<SessionData, SessionLoadError> {
    let solves = record
        .solves
        .into_iter()
        .enumerate()
        .map(|(index, solve)| {
            let date = parse_date(&solve.date).ok_or_else(|| SessionLoadError::InvalidDate {
                index,
                value: solve.date.clone(),
            })?;
            Solve::new(solve.time, solve.scramble, date)
                .map_err(|source| SessionLoadError::InvalidTime { index, source })
        })
        .collect::<Result<Vec<_>, SessionLoadError>>()?;

    Ok(SessionData::with_solves(
        record.name,
        record.scramble_type,
        solves,
    ))
}

fn parse_date(value: &str) -> Option<DateTime<Local>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(value, LEGACY_DATE_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Names end up as file names, so path separators and dot names are refused.
pub fn validate_session_name(name: &str) -> Result<(), StoreError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.chars().any(|c| c == '/' || c == '\\' || c.is_control());

    if invalid {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

pub trait SessionStore {
    /// Start an empty session. An existing one is only replaced with `overwrite`.
    fn create(
        &self,
        name: &str,
        scramble_type: CubeSize,
        overwrite: bool,
    ) -> Result<SessionData, StoreError>;
    fn load(&self, name: &str) -> Result<SessionData, StoreError>;
    fn save(&self, session: &SessionData) -> Result<(), StoreError>;
    fn exists(&self, name: &str) -> bool;
    fn rename(&self, from: &str, to: &str) -> Result<SessionData, StoreError>;
    fn delete(&self, name: &str) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        session_path(&self.dir, name)
    }
}

fn session_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{SESSION_EXTENSION}"))
}

fn write_session(dir: &Path, session: &SessionData) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = session_path(dir, session.name());
    let data = encode_session(session).map_err(StoreError::Encode)?;

    // a crash mid-write leaves the previous file intact
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, &path)?;
    Ok(path)
}

impl SessionStore for FileSessionStore {
    fn create(
        &self,
        name: &str,
        scramble_type: CubeSize,
        overwrite: bool,
    ) -> Result<SessionData, StoreError> {
        validate_session_name(name)?;
        if !overwrite && self.exists(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let session = SessionData::new(name, scramble_type);
        write_session(&self.dir, &session)?;
        info!(session = name, %scramble_type, "created session");
        Ok(session)
    }

    fn load(&self, name: &str) -> Result<SessionData, StoreError> {
        validate_session_name(name)?;
        let path = self.path_for(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut session =
            decode_session(&bytes).map_err(|source| StoreError::Load { path, source })?;
        // the file name wins over whatever name was stored inside
        if session.name() != name {
            session.set_name(name);
        }
        debug!(session = name, solves = session.len(), "loaded session");
        Ok(session)
    }

    fn save(&self, session: &SessionData) -> Result<(), StoreError> {
        validate_session_name(session.name())?;
        write_session(&self.dir, session).map(|_| ())
    }

    fn exists(&self, name: &str) -> bool {
        validate_session_name(name).is_ok() && self.path_for(name).is_file()
    }

    fn rename(&self, from: &str, to: &str) -> Result<SessionData, StoreError> {
        validate_session_name(to)?;
        if self.exists(to) {
            return Err(StoreError::AlreadyExists(to.to_string()));
        }

        let mut session = self.load(from)?;
        session.set_name(to);
        write_session(&self.dir, &session)?;
        fs::remove_file(self.path_for(from))?;
        info!(from, to, "renamed session");
        Ok(session)
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        if !self.exists(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        fs::remove_file(self.path_for(name))?;
        info!(session = name, "deleted session");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SESSION_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Copy the session into `dir` as `<name>.json`.
pub fn write_backup(session: &SessionData, dir: &Path) -> Result<PathBuf, StoreError> {
    let path = write_session(dir, session)?;
    info!(session = session.name(), path = %path.display(), "wrote backup");
    Ok(path)
}

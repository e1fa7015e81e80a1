use std::{
    fmt::Display,
    io::{self, BufReader, BufWriter},
    path::PathBuf,
};

use chrono::{DateTime, Utc};
use fs_err::File;
use log::{debug, info, warn};

use crate::{
    chrono_util::time_ago,
    credentials::PhoneNumber,
    schema::{AccountSnapshot, CachedSnapshot},
};

/// Keeps the last snapshot of each phone number between runs.
pub trait CacheStore {
    /// The previous snapshot, or `None` if there is no usable one.
    fn load(&self, phone: &PhoneNumber) -> Option<CachedSnapshot>;
    fn save(&self, phone: &PhoneNumber, cached: &CachedSnapshot) -> anyhow::Result<()>;
    fn remove(&self, phone: &PhoneNumber);
}

/// One `lycamobile-{phone}.json` per phone number.
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn path(&self, phone: &PhoneNumber) -> PathBuf {
        self.dir.join(format!("lycamobile-{phone}.json"))
    }

    pub fn try_load(&self, phone: &PhoneNumber) -> Result<CachedSnapshot, CacheLoadError> {
        let file = File::open(self.path(phone))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self, phone: &PhoneNumber) -> Option<CachedSnapshot> {
        match self.try_load(phone) {
            Ok(cached) => Some(cached),
            Err(CacheLoadError::NotFound) => {
                debug!("No previous data at {:?}", self.path(phone));
                None
            }
            Err(e) => {
                warn!("Ignoring previous data: {e}");
                None
            }
        }
    }

    fn save(&self, phone: &PhoneNumber, cached: &CachedSnapshot) -> anyhow::Result<()> {
        let writer = BufWriter::new(File::create(self.path(phone))?);
        serde_json::to_writer(writer, cached)?;
        Ok(())
    }

    fn remove(&self, phone: &PhoneNumber) {
        let path = self.path(phone);
        if fs_err::remove_file(&path).is_ok() {
            info!("Removed tracking data at {path:?}");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheLoadError {
    #[error("Previous data was not found.")]
    NotFound,
    #[error("An I/O error occurred when loading previous data: {0}")]
    Io(io::Error),
    #[error("The previous data is corrupted and could not be loaded: {0}")]
    Json(#[from] serde_json::Error),
}
impl From<io::Error> for CacheLoadError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io(e),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum UsageChange {
    /// Gigabytes consumed since the previous check.
    Consumed(f64),
    Unchanged,
}
impl Display for UsageChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consumed(delta) => write!(f, "-{delta}GB"),
            Self::Unchanged => f.write_str("no changes"),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct UsageAnnotation {
    pub change: UsageChange,
    /// Time since the previous check, e.g. `3 hours ago`.
    pub since: String,
}

/// Compares `snapshot` with the previous one of the same phone number and
/// stores `snapshot` as the new previous one.
pub fn track_usage<C: CacheStore>(
    cache: &C,
    phone: &PhoneNumber,
    snapshot: &AccountSnapshot,
    now: DateTime<Utc>,
) -> Option<UsageAnnotation> {
    let previous = cache.load(phone);
    let annotation = previous.and_then(|previous| compare_usage(&previous, snapshot, now));
    if let Err(e) = cache.save(phone, &CachedSnapshot::new(snapshot.clone(), now)) {
        warn!("Failed to save tracking data: {e:#}");
    }
    annotation
}

fn compare_usage(
    previous: &CachedSnapshot,
    current: &AccountSnapshot,
    now: DateTime<Utc>,
) -> Option<UsageAnnotation> {
    let old = parse_leading_float(previous.snapshot().internet())?;
    let new = parse_leading_float(current.internet())?;
    if new <= 0. {
        return None;
    }
    let delta = ((old - new) * 100.).round() / 100.;
    let change = if delta > 0. {
        UsageChange::Consumed(delta)
    } else {
        UsageChange::Unchanged
    };
    Some(UsageAnnotation {
        change,
        since: time_ago(*previous.checked(), now),
    })
}

/// The number at the start of `s`, like `12.5` in `12.5GB, 300 mins`.
fn parse_leading_float(s: &str) -> Option<f64> {
    regex!(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?")
        .find(s.trim_start())?
        .as_str()
        .parse()
        .ok()
}

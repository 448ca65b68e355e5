//! Durable player profile: coins, sign-in streak, skins, per-game records.
//!
//! Every public mutator persists before returning. A save writes a temp file next to the target,
//! syncs it, then renames it over the target, so a reader only ever sees the old or the new
//! record. When the primary location cannot be written the profile goes to a fixed file in the
//! user's home directory; when that fails too the state stays in memory and a warning is kept.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_SKIN: &str = "classic";
pub const PROFILE_FILE_NAME: &str = "player_profile.json";
pub const HOME_FALLBACK_FILE_NAME: &str = ".arcade_player_profile.json";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed profile {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlays {
    pub date: String,
    pub count: u32,
}

/// The on-disk record. Fields this build does not know about survive a load/save round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub coins: u64,
    pub sign_in_streak: u32,
    pub max_sign_in_streak: u32,
    pub last_signin_date: String,
    pub purchased_skins: BTreeSet<String>,
    pub equipped_skin: String,
    pub best_scores: BTreeMap<String, i64>,
    pub best_moves: BTreeMap<String, u32>,
    pub daily_plays: BTreeMap<String, DailyPlays>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ProfileRecord {
    fn default() -> Self {
        Self {
            coins: 0,
            sign_in_streak: 0,
            max_sign_in_streak: 0,
            last_signin_date: String::new(),
            purchased_skins: BTreeSet::from([DEFAULT_SKIN.to_string()]),
            equipped_skin: DEFAULT_SKIN.to_string(),
            best_scores: BTreeMap::new(),
            best_moves: BTreeMap::new(),
            daily_plays: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl ProfileRecord {
    pub fn sanitized(mut self) -> Self {
        self.purchased_skins.insert(DEFAULT_SKIN.to_string());
        if !self.purchased_skins.contains(&self.equipped_skin) {
            self.equipped_skin = DEFAULT_SKIN.to_string();
        }
        self.max_sign_in_streak = self.max_sign_in_streak.max(self.sign_in_streak);
        if !self.last_signin_date.is_empty() && parse_date(&self.last_signin_date).is_none() {
            self.last_signin_date.clear();
        }
        self
    }
}

/// Which direction counts as an improvement for a best-score record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    HigherIsBetter,
    LowerIsBetter,
}

impl Rank {
    fn improves(self, candidate: i64, current: i64) -> bool {
        match self {
            Rank::HigherIsBetter => candidate > current,
            Rank::LowerIsBetter => candidate < current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Primary,
    Fallback,
    /// Neither location could be written; the state lives in memory only.
    Failed,
    /// The profile has no backing file (tests, previews).
    Detached,
}

#[derive(Debug)]
pub struct PlayerProfile {
    record: ProfileRecord,
    primary: Option<PathBuf>,
    fallback: Option<PathBuf>,
    last_warning: Option<String>,
    last_save: SaveOutcome,
}

impl PlayerProfile {
    /// A profile that never touches the disk.
    pub fn detached(record: ProfileRecord) -> Self {
        Self {
            record: record.sanitized(),
            primary: None,
            fallback: None,
            last_warning: None,
            last_save: SaveOutcome::Detached,
        }
    }

    /// Loads the profile from whichever of `primary` and `fallback` was saved last, trying the
    /// other one when that read fails. On first run the default record is created and persisted.
    /// When no existing file parses, defaults are used in memory and the files stay untouched
    /// until the next successful save.
    pub fn open(primary: impl Into<PathBuf>, fallback: Option<PathBuf>) -> Self {
        let primary = primary.into();
        let mut profile = Self {
            record: ProfileRecord::default(),
            primary: Some(primary.clone()),
            fallback: fallback.clone(),
            last_warning: None,
            last_save: SaveOutcome::Detached,
        };

        let mut sources: Vec<PathBuf> = std::iter::once(primary)
            .chain(fallback)
            .filter(|p| p.exists())
            .collect();
        if sources.is_empty() {
            info!("no player profile found; creating a new one");
            profile.save();
            return profile;
        }
        // Newest first; the sort is stable, so the primary wins ties.
        sources.sort_by_key(|p| std::cmp::Reverse(modified(p)));

        for path in &sources {
            match read_record(path) {
                Ok(record) => {
                    profile.record = record;
                    return profile;
                }
                Err(err) => {
                    warn!("{err}");
                    profile.last_warning = Some(err.to_string());
                }
            }
        }
        warn!("no readable player profile; starting from a default profile");
        profile
    }

    /// The conventional pair: `<data_dir>/player_profile.json`, falling back to the home dir.
    pub fn open_in(data_dir: &Path) -> Self {
        Self::open(data_dir.join(PROFILE_FILE_NAME), home_fallback_path())
    }

    pub fn record(&self) -> &ProfileRecord {
        &self.record
    }

    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    pub fn last_save(&self) -> SaveOutcome {
        self.last_save
    }

    pub fn get_coins(&self) -> u64 {
        self.record.coins
    }

    pub fn add_coins(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        self.record.coins = self.record.coins.saturating_add(n);
        self.save();
    }

    /// Returns `false` without touching anything when the balance is short.
    pub fn spend_coins(&mut self, n: u64) -> bool {
        if self.record.coins < n {
            return false;
        }
        self.record.coins -= n;
        self.save();
        true
    }

    pub fn get_equipped_skin(&self) -> &str {
        &self.record.equipped_skin
    }

    pub fn owns_skin(&self, id: &str) -> bool {
        self.record.purchased_skins.contains(id)
    }

    /// No-op unless `id` was purchased.
    pub fn equip_skin(&mut self, id: &str) -> bool {
        if !self.owns_skin(id) {
            return false;
        }
        if self.record.equipped_skin != id {
            self.record.equipped_skin = id.to_string();
            self.save();
        }
        true
    }

    pub fn purchase_skin(&mut self, id: &str, price: u64) -> bool {
        if id.is_empty() || self.owns_skin(id) || self.record.coins < price {
            return false;
        }
        self.record.coins -= price;
        self.record.purchased_skins.insert(id.to_string());
        self.save();
        true
    }

    /// Daily sign-in. Consecutive days extend the streak, a gap restarts it at 1 and a second
    /// sign-in on the same day does nothing. Returns the coin reward granted.
    pub fn sign_in(&mut self, today: NaiveDate) -> Option<u64> {
        let last = parse_date(&self.record.last_signin_date);
        if last == Some(today) {
            return None;
        }
        let consecutive = last.is_some_and(|d| d.succ_opt() == Some(today));
        self.record.sign_in_streak = if consecutive {
            self.record.sign_in_streak.saturating_add(1)
        } else {
            1
        };
        self.record.max_sign_in_streak = self
            .record
            .max_sign_in_streak
            .max(self.record.sign_in_streak);
        self.record.last_signin_date = today.format(DATE_FORMAT).to_string();

        let reward = 10 * u64::from(self.record.sign_in_streak.min(7));
        self.record.coins = self.record.coins.saturating_add(reward);
        self.save();
        Some(reward)
    }

    pub fn best_score(&self, key: &str) -> Option<i64> {
        self.record.best_scores.get(key).copied()
    }

    /// Stores `value` if it beats the current record. Returns whether it did.
    pub fn record_best(&mut self, key: &str, value: i64, rank: Rank) -> bool {
        let improved = match self.record.best_scores.get(key) {
            Some(current) => rank.improves(value, *current),
            None => true,
        };
        if improved {
            self.record.best_scores.insert(key.to_string(), value);
            self.save();
        }
        improved
    }

    pub fn best_moves(&self, level: &str) -> Option<u32> {
        self.record.best_moves.get(level).copied()
    }

    pub fn record_best_moves(&mut self, level: &str, moves: u32) -> bool {
        let improved = self
            .record
            .best_moves
            .get(level)
            .is_none_or(|current| moves < *current);
        if improved {
            self.record.best_moves.insert(level.to_string(), moves);
            self.save();
        }
        improved
    }

    pub fn plays_today(&self, game: &str, today: NaiveDate) -> u32 {
        let date = today.format(DATE_FORMAT).to_string();
        self.record
            .daily_plays
            .get(game)
            .filter(|p| p.date == date)
            .map_or(0, |p| p.count)
    }

    /// Counts one play of `game` today, resetting the counter on a new day.
    pub fn record_play(&mut self, game: &str, today: NaiveDate) -> u32 {
        let date = today.format(DATE_FORMAT).to_string();
        let entry = self.record.daily_plays.entry(game.to_string()).or_default();
        if entry.date != date {
            entry.date = date;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);
        let count = entry.count;
        self.save();
        count
    }

    /// Persists the current record: primary first, then the fallback location.
    pub fn save(&mut self) -> SaveOutcome {
        let Some(primary) = self.primary.clone() else {
            self.last_save = SaveOutcome::Detached;
            return self.last_save;
        };
        let bytes = match serde_json::to_vec_pretty(&self.record) {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = ProfileError::Json {
                    path: primary,
                    source,
                };
                warn!("{err}");
                self.last_warning = Some(err.to_string());
                self.last_save = SaveOutcome::Failed;
                return self.last_save;
            }
        };

        match atomic_write(&primary, &bytes) {
            Ok(()) => {
                if let Some(fallback) = &self.fallback {
                    discard_stale(fallback);
                }
                self.last_save = SaveOutcome::Primary;
                return self.last_save;
            }
            Err(source) => {
                let err = ProfileError::Io {
                    path: primary.clone(),
                    source,
                };
                warn!("{err}; trying the fallback location");
                self.last_warning = Some(err.to_string());
            }
        }

        if let Some(fallback) = self.fallback.clone() {
            match atomic_write(&fallback, &bytes) {
                Ok(()) => {
                    discard_stale(&primary);
                    self.last_save = SaveOutcome::Fallback;
                    return self.last_save;
                }
                Err(source) => {
                    let err = ProfileError::Io {
                        path: fallback,
                        source,
                    };
                    warn!("{err}; keeping the profile in memory");
                    self.last_warning = Some(err.to_string());
                }
            }
        }
        self.last_save = SaveOutcome::Failed;
        self.last_save
    }
}

pub fn read_record(path: &Path) -> Result<ProfileRecord, ProfileError> {
    let bytes = fs::read(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record: ProfileRecord =
        serde_json::from_slice(&bytes).map_err(|source| ProfileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(record.sanitized())
}

pub fn home_fallback_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(HOME_FALLBACK_FILE_NAME))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Writes `bytes` to a sibling temp file, syncs it and renames it over `path`.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Removes a copy that a newer save elsewhere has superseded, so it cannot shadow that save.
fn discard_stale(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => debug!("removed stale profile {}", path.display()),
        Err(err) => debug!("could not remove stale profile {}: {err}", path.display()),
    }
}

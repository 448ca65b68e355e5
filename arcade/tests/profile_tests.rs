use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use arcade::profile::{
    PROFILE_FILE_NAME, PlayerProfile, ProfileRecord, SaveOutcome, atomic_write, read_record,
};

/// A fresh directory under the system temp dir, unique per test and process.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("arcade-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn tmp_of(path: &Path) -> PathBuf {
    path.with_extension("tmp")
}

#[test]
fn first_run_creates_the_file() {
    let dir = scratch("first-run");
    let path = dir.join(PROFILE_FILE_NAME);
    let profile = PlayerProfile::open(&path, None);
    assert!(path.exists());
    assert_eq!(profile.get_coins(), 0);
    assert_eq!(profile.last_save(), SaveOutcome::Primary);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn coins_survive_a_restart() {
    let dir = scratch("restart");
    let path = dir.join(PROFILE_FILE_NAME);
    let mut profile = PlayerProfile::open(&path, None);
    profile.add_coins(7);
    let before = profile.get_coins();
    profile.add_coins(50);
    drop(profile);

    let reopened = PlayerProfile::open(&path, None);
    assert_eq!(reopened.get_coins(), before + 50);
    assert!(!tmp_of(&path).exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn crash_before_rename_leaves_the_old_record() {
    let dir = scratch("crash");
    let path = dir.join(PROFILE_FILE_NAME);
    let mut profile = PlayerProfile::open(&path, None);
    profile.add_coins(30);
    drop(profile);

    // The next save died halfway through writing its temp file.
    let newer = {
        let mut record = read_record(&path).unwrap();
        record.coins = 999;
        serde_json::to_vec_pretty(&record).unwrap()
    };
    fs::write(tmp_of(&path), &newer[..newer.len() / 2]).unwrap();

    let reopened = PlayerProfile::open(&path, None);
    assert_eq!(reopened.get_coins(), 30);
    assert_eq!(reopened.last_warning(), None);

    // A complete temp file that was never renamed is ignored too.
    fs::write(tmp_of(&path), &newer).unwrap();
    let mut reopened = PlayerProfile::open(&path, None);
    assert_eq!(reopened.get_coins(), 30);

    // The next successful save replaces the leftover.
    reopened.add_coins(1);
    assert_eq!(read_record(&path).unwrap().coins, 31);
    assert!(!tmp_of(&path).exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn atomic_write_replaces_the_whole_file() {
    let dir = scratch("atomic");
    let path = dir.join("data.json");
    atomic_write(&path, b"{\"coins\": 12345678, \"equipped_skin\": \"classic\"}").unwrap();
    atomic_write(&path, b"{}").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"{}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_file_loads_defaults_and_is_kept_until_saved() {
    let dir = scratch("malformed");
    let path = dir.join(PROFILE_FILE_NAME);
    fs::write(&path, b"{ not json").unwrap();

    let mut profile = PlayerProfile::open(&path, None);
    assert_eq!(profile.get_coins(), 0);
    assert!(profile.last_warning().is_some());
    assert_eq!(fs::read(&path).unwrap(), b"{ not json");

    profile.add_coins(5);
    assert_eq!(read_record(&path).unwrap().coins, 5);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn fallback_is_used_when_the_primary_cannot_be_written() {
    let dir = scratch("fallback");
    // A regular file where the primary's parent directory should be.
    let blocker = dir.join("blocked");
    fs::write(&blocker, b"").unwrap();
    let primary = blocker.join(PROFILE_FILE_NAME);
    let fallback = dir.join("home_profile.json");

    let mut profile = PlayerProfile::open(&primary, Some(fallback.clone()));
    assert_eq!(profile.last_save(), SaveOutcome::Fallback);
    profile.add_coins(9);
    assert_eq!(read_record(&fallback).unwrap().coins, 9);

    let reopened = PlayerProfile::open(&primary, Some(fallback));
    assert_eq!(reopened.get_coins(), 9);
    let _ = fs::remove_dir_all(&dir);
}

fn write_coins(path: &Path, coins: u64) {
    let record = ProfileRecord {
        coins,
        ..ProfileRecord::default()
    };
    fs::write(path, serde_json::to_vec_pretty(&record).unwrap()).unwrap();
}

fn set_age(path: &Path, secs_after_epoch: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
        .unwrap();
}

#[test]
fn coins_saved_to_the_fallback_survive_a_restart() {
    let dir = scratch("primary-unwritable");
    let primary = dir.join(PROFILE_FILE_NAME);
    let fallback = dir.join("home_profile.json");
    let mut profile = PlayerProfile::open(&primary, Some(fallback.clone()));
    profile.add_coins(10);
    assert_eq!(profile.last_save(), SaveOutcome::Primary);

    // The temp file slot is taken by a directory, so the primary can no longer be written.
    fs::create_dir(tmp_of(&primary)).unwrap();
    profile.add_coins(50);
    assert_eq!(profile.last_save(), SaveOutcome::Fallback);
    drop(profile);

    let reopened = PlayerProfile::open(&primary, Some(fallback));
    assert_eq!(reopened.get_coins(), 60);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn newer_copy_wins_when_both_exist() {
    let dir = scratch("newest");
    let primary = dir.join(PROFILE_FILE_NAME);
    let fallback = dir.join("home_profile.json");
    write_coins(&primary, 10);
    write_coins(&fallback, 60);
    set_age(&primary, 1_000);
    set_age(&fallback, 2_000);
    assert_eq!(PlayerProfile::open(&primary, Some(fallback.clone())).get_coins(), 60);

    set_age(&primary, 3_000);
    assert_eq!(PlayerProfile::open(&primary, Some(fallback)).get_coins(), 10);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_primary_falls_back_to_a_readable_copy() {
    let dir = scratch("malformed-primary");
    let primary = dir.join(PROFILE_FILE_NAME);
    let fallback = dir.join("home_profile.json");
    write_coins(&fallback, 42);
    set_age(&fallback, 1_000);
    fs::write(&primary, b"{ not json").unwrap();

    let profile = PlayerProfile::open(&primary, Some(fallback));
    assert_eq!(profile.get_coins(), 42);
    assert!(profile.last_warning().is_some());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn failed_rename_leaves_the_target_alone() {
    let dir = scratch("rename-fails");
    // A non-empty directory cannot be replaced by a rename.
    let path = dir.join("data.json");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), b"x").unwrap();

    assert!(atomic_write(&path, b"{}").is_err());
    assert!(path.join("keep").exists());
    assert!(!tmp_of(&path).exists());
    let _ = fs::remove_dir_all(&dir);
}

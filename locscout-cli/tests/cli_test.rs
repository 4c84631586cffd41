use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const RETURN_FIRE: &str = "[M1_ReturnFire X2AbilityTemplate]\n\
                           +LocFriendlyName=\"Return Fire\"\n\
                           +LocLongDescription=\"Fires back automatically.\"\n";

fn create_mod(dir: &TempDir, mod_name: &str, content: &str) -> Result<PathBuf> {
    let loc = dir.path().join("mods").join(mod_name).join("Localization");
    fs::create_dir_all(&loc)?;
    let path = loc.join("XComGame.int");
    fs::write(&path, content)?;
    Ok(path)
}

fn locscout(dir: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("locscout-cli")?;
    cmd.current_dir(dir).env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_scan_reports_summary() -> Result<()> {
    let dir = tempdir()?;
    create_mod(&dir, "ReturnFire", RETURN_FIRE)?;
    create_mod(&dir, "Squadsight", "[Squadsight X2AbilityTemplate]\n")?;

    locscout(dir.path())?
        .args(["scan", "mods", "--db", "abilities.db"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"success\""))
        .stdout(predicate::str::contains("\"count\": 2"));

    assert!(dir.path().join("abilities.db").exists());
    Ok(())
}

#[test]
fn test_list_with_search() -> Result<()> {
    let dir = tempdir()?;
    create_mod(&dir, "ReturnFire", RETURN_FIRE)?;
    create_mod(
        &dir,
        "Shredder",
        "[Shredder X2AbilityTemplate]\n+LocFriendlyName=\"Shredder\"\n",
    )?;

    locscout(dir.path())?
        .args(["scan", "mods", "--db", "abilities.db"])
        .assert()
        .success();

    locscout(dir.path())?
        .args(["list", "return", "--db", "abilities.db"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M1_ReturnFire"))
        .stdout(predicate::str::contains("Fires back automatically."))
        .stdout(predicate::str::contains("Shredder").not());

    locscout(dir.path())?
        .args(["list", "return", "--db", "abilities.db", "--case-sensitive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("M1_ReturnFire").not());

    locscout(dir.path())?
        .args(["list", "--db", "abilities.db", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 abilities"));
    Ok(())
}

#[test]
fn test_rescan_keeps_one_row() -> Result<()> {
    let dir = tempdir()?;
    create_mod(&dir, "ReturnFire", RETURN_FIRE)?;

    for _ in 0..2 {
        locscout(dir.path())?
            .args(["scan", "mods", "--db", "abilities.db"])
            .assert()
            .success();
    }

    locscout(dir.path())?
        .args(["list", "--db", "abilities.db", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 abilities"));
    Ok(())
}

#[test]
fn test_parse_single_file() -> Result<()> {
    let dir = tempdir()?;
    let path = create_mod(&dir, "ReturnFire", RETURN_FIRE)?;

    locscout(dir.path())?
        .args(["parse", path.to_str().unwrap(), "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("template_name: M1_ReturnFire"))
        .stdout(predicate::str::contains("friendly_name: Return Fire"));

    assert!(!dir.path().join("xcom2_mods.db").exists());
    Ok(())
}

#[test]
fn test_scan_missing_root_fails() -> Result<()> {
    let dir = tempdir()?;

    locscout(dir.path())?
        .args(["scan", "does-not-exist", "--db", "abilities.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
    Ok(())
}

#[test]
fn test_file_name_selector() -> Result<()> {
    let dir = tempdir()?;
    create_mod(&dir, "ReturnFire", RETURN_FIRE)?;
    let other = dir.path().join("mods").join("ReturnFire").join("Localization");
    fs::write(
        other.join("XComStrategy.int"),
        "[Strategic X2AbilityTemplate]\n",
    )?;

    locscout(dir.path())?
        .args([
            "scan",
            "mods",
            "--db",
            "abilities.db",
            "--file-name",
            "XComGame.int",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 1"));
    Ok(())
}

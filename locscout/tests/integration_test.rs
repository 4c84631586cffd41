use anyhow::Result;
use locscout::{
    pipeline::{list, scan_and_store},
    scan::scan,
    AbilityStore, ScanConfig, ScanError,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_mod_file(root: &Path, mod_name: &str, file: &str, content: &[u8]) -> Result<PathBuf> {
    let loc = root.join(mod_name).join("Localization");
    fs::create_dir_all(&loc)?;
    let path = loc.join(file);
    fs::write(&path, content)?;
    Ok(path)
}

fn utf16_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

fn config_for(root: &Path) -> ScanConfig {
    ScanConfig {
        root_path: root.to_path_buf(),
        thread_count: NonZeroUsize::new(4).unwrap(),
        ..ScanConfig::default()
    }
}

#[test]
fn test_return_fire_end_to_end() -> Result<()> {
    let dir = tempdir()?;
    let path = write_mod_file(
        dir.path(),
        "ReturnFire",
        "XComGame.int",
        b"[M1_ReturnFire X2AbilityTemplate]\n\
          +LocFriendlyName=\"Return Fire\"\n\
          +LocLongDescription=\"Fires back automatically.\"\n",
    )?;

    let config = config_for(dir.path());
    let mut store = AbilityStore::open_in_memory()?;

    let summary = scan_and_store(&config, &mut store)?;
    assert!(summary.is_success());
    assert_eq!(summary.count, 1);

    // Scanning again merges onto the same row
    scan_and_store(&config, &mut store)?;
    let all = list(&store, None)?;
    assert_eq!(all.len(), 1);

    let record = &all[0].record;
    assert_eq!(record.template_name, "M1_ReturnFire");
    assert_eq!(record.friendly_name, "Return Fire");
    assert_eq!(record.description, "Fires back automatically.");
    assert_eq!(record.help_text, "");
    assert_eq!(record.promotion_text, "");
    assert_eq!(record.flyover_text, "");
    assert_eq!(
        record.source_file.file_name(),
        path.file_name(),
        "source file should be the scanned file"
    );
    Ok(())
}

#[test]
fn test_mixed_encodings() -> Result<()> {
    let dir = tempdir()?;
    write_mod_file(
        dir.path(),
        "Utf8Mod",
        "XComGame.int",
        "\u{FEFF}[Ability_Utf8 X2AbilityTemplate]\n+LocFriendlyName=\"Éclair\"\n".as_bytes(),
    )?;
    write_mod_file(
        dir.path(),
        "Utf16Mod",
        "XComGame.int",
        &utf16_with_bom("[Ability_Utf16 X2AbilityTemplate]\r\n+LocFriendlyName=\"Молния\"\r\n"),
    )?;
    write_mod_file(
        dir.path(),
        "LegacyMod",
        "XComGame.int",
        b"[Ability_Cp1252 X2AbilityTemplate]\n+LocFriendlyName=\"\x93Quoted\x94\"\n",
    )?;

    let output = scan(&config_for(dir.path()))?;
    assert_eq!(output.files_scanned, 3);
    assert_eq!(output.files_failed, 0);

    let friendly = |name: &str| {
        output
            .records
            .iter()
            .find(|r| r.template_name == name)
            .map(|r| r.friendly_name.clone())
    };
    assert_eq!(friendly("Ability_Utf8").as_deref(), Some("Éclair"));
    assert_eq!(friendly("Ability_Utf16").as_deref(), Some("Молния"));
    assert_eq!(
        friendly("Ability_Cp1252").as_deref(),
        Some("\u{201C}Quoted\u{201D}")
    );
    Ok(())
}

#[test]
fn test_partial_rescan_keeps_known_text() -> Result<()> {
    let dir = tempdir()?;
    let base = write_mod_file(
        dir.path(),
        "A_Base",
        "XComGame.int",
        b"[Shredder X2AbilityTemplate]\n\
          +LocFriendlyName=\"Shredder\"\n\
          +LocLongDescription=\"Shots shred armor.\"\n",
    )?;

    let config = config_for(dir.path());
    let mut store = AbilityStore::open_in_memory()?;
    scan_and_store(&config, &mut store)?;

    // A later patch only carries the help text
    fs::remove_file(&base)?;
    write_mod_file(
        dir.path(),
        "B_Patch",
        "XComGame.int",
        b"[Shredder X2AbilityTemplate]\n+LocHelpText=\"Removes armor.\"\n",
    )?;
    scan_and_store(&config, &mut store)?;

    let record = store.get("Shredder")?.expect("stored").record;
    assert_eq!(record.friendly_name, "Shredder");
    assert_eq!(record.description, "Shots shred armor.");
    assert_eq!(record.help_text, "Removes armor.");
    assert!(record.source_file.starts_with(
        locscout::errors::unify_path(dir.path()).join("B_Patch")
    ));
    Ok(())
}

#[test]
fn test_later_file_in_discovery_order_wins() -> Result<()> {
    let dir = tempdir()?;
    write_mod_file(
        dir.path(),
        "A_First",
        "XComGame.int",
        b"[Overwatch X2AbilityTemplate]\n+LocFriendlyName=\"Overwatch\"\n",
    )?;
    write_mod_file(
        dir.path(),
        "B_Second",
        "XComGame.int",
        b"[Overwatch X2AbilityTemplate]\n+LocFriendlyName=\"Better Overwatch\"\n",
    )?;
    write_mod_file(
        dir.path(),
        "C_Third",
        "XComGame.int",
        b"[Overwatch X2AbilityTemplate]\n",
    )?;

    let mut store = AbilityStore::open_in_memory()?;
    let summary = scan_and_store(&config_for(dir.path()), &mut store)?;
    assert_eq!(summary.count, 3);

    let record = store.get("Overwatch")?.expect("stored").record;
    assert_eq!(record.friendly_name, "Better Overwatch");
    assert!(record.source_file.to_string_lossy().contains("C_Third"));
    Ok(())
}

#[test]
fn test_matching_and_non_matching_files() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..5 {
        write_mod_file(
            dir.path(),
            &format!("Mod{i}"),
            "XComGame.int",
            format!("[Ability{i} X2AbilityTemplate]\n").as_bytes(),
        )?;
        write_mod_file(
            dir.path(),
            &format!("Mod{i}"),
            "XComGame.fra",
            format!("[Francais{i} X2AbilityTemplate]\n").as_bytes(),
        )?;
    }
    write_mod_file(dir.path(), "Mod0", "readme.txt", b"[Readme X2AbilityTemplate]\n")?;

    let output = scan(&config_for(dir.path()))?;
    assert_eq!(output.files_scanned, 5);
    assert_eq!(output.records.len(), 5);
    assert!(output
        .records
        .iter()
        .all(|r| r.template_name.starts_with("Ability")));
    Ok(())
}

#[test]
fn test_missing_root_is_distinct_from_empty_root() -> Result<()> {
    let dir = tempdir()?;
    let mut store = AbilityStore::open_in_memory()?;

    let empty = scan_and_store(&config_for(dir.path()), &mut store)?;
    assert!(empty.is_success());
    assert_eq!(empty.count, 0);

    let missing = scan_and_store(&config_for(&dir.path().join("nope")), &mut store);
    assert!(matches!(missing, Err(ScanError::DiscoveryFailed { .. })));
    Ok(())
}

#[test]
fn test_scan_is_deterministic() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..20 {
        write_mod_file(
            dir.path(),
            &format!("Mod{i:02}"),
            "XComGame.int",
            format!(
                "[Shared X2AbilityTemplate]\n+LocHelpText=\"{i}\"\n[Own{i} X2AbilityTemplate]\n"
            )
            .as_bytes(),
        )?;
    }

    let config = config_for(dir.path());
    let first = scan(&config)?;
    let second = scan(&config)?;
    assert_eq!(first.records, second.records);
    Ok(())
}

use chrono::{Local, NaiveDate, NaiveDateTime};
use oxidaily::{Error, Vault};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(7, 45, 0)
        .unwrap()
}

fn make_vault(daily_notes_json: Option<&str>) -> anyhow::Result<(tempfile::TempDir, Vault)> {
    let temp = tempfile::tempdir()?;
    let vault_root = temp.path().join("vault");
    std::fs::create_dir_all(vault_root.join(".obsidian"))?;
    if let Some(json) = daily_notes_json {
        std::fs::write(vault_root.join(".obsidian/daily-notes.json"), json)?;
    }
    let vault = Vault::open(&vault_root)?;
    Ok((temp, vault))
}

#[test]
fn second_call_finds_the_note_without_rewriting() -> anyhow::Result<()> {
    let (_temp, vault) = make_vault(None)?;

    let first = vault.daily_note(at(2024, 3, 5))?;
    assert!(first.created);
    let written = std::fs::read_to_string(&first.path)?;
    assert_eq!(first.content.as_deref(), Some(written.as_str()));

    let second = vault.daily_note(at(2024, 3, 5))?;
    assert!(!second.created);
    assert_eq!(second.content, None);
    assert_eq!(second.path, first.path);
    assert_eq!(std::fs::read_to_string(&second.path)?, written);
    Ok(())
}

#[test]
fn missing_config_creates_note_at_vault_root() -> anyhow::Result<()> {
    let (_temp, vault) = make_vault(None)?;

    let note = vault.daily_note(at(2024, 3, 5))?;
    assert_eq!(note.path, vault.root().join("2024-03-05.md"));
    assert_eq!(note.rel_path.as_str_lossy(), "2024-03-05.md");
    assert_eq!(
        std::fs::read_to_string(&note.path)?,
        "# 2024-03-05\n\n2024-03-05\n"
    );
    Ok(())
}

#[test]
fn configured_folder_is_created_with_parents() -> anyhow::Result<()> {
    let (_temp, vault) =
        make_vault(Some(r#"{"format": "MMM DD YYYY", "folder": "Journal/Daily"}"#))?;
    assert!(!vault.root().join("Journal").exists());

    let note = vault.daily_note(at(2024, 3, 5))?;
    assert!(note.created);
    assert_eq!(
        note.path,
        vault.root().join("Journal").join("Daily").join("Mar 05 2024.md")
    );
    assert!(note.path.is_file());
    Ok(())
}

#[test]
fn template_is_rendered_into_new_note() -> anyhow::Result<()> {
    let (_temp, vault) = make_vault(Some(
        r#"{"format": "YYYY-MM-DD", "folder": "Daily", "template": "Templates/Daily"}"#,
    ))?;
    std::fs::create_dir_all(vault.root().join("Templates"))?;
    std::fs::write(
        vault.root().join("Templates/Daily.md"),
        "# {{title}}\n{{title}} / {{date:YYYY}} / {{unknown}}\n<< {{yesterday}} | {{tomorrow}} >>\nLogged {{time}}\n",
    )?;

    let note = vault.daily_note(at(2024, 3, 5))?;
    assert_eq!(
        std::fs::read_to_string(&note.path)?,
        "# 2024-03-05\n2024-03-05 / 2024 / {{unknown}}\n<< 2024-03-04 | 2024-03-06 >>\nLogged 07:45\n"
    );
    Ok(())
}

#[test]
fn missing_template_falls_back_to_builtin_body() -> anyhow::Result<()> {
    let (_temp, vault) = make_vault(Some(r#"{"template": "Templates/Nope"}"#))?;

    let note = vault.daily_note(at(2024, 12, 31))?;
    assert!(note.created);
    assert_eq!(
        note.content.as_deref(),
        Some("# 2024-12-31\n\n2024-12-31\n")
    );
    Ok(())
}

#[test]
fn config_edits_apply_on_the_next_call() -> anyhow::Result<()> {
    let (_temp, vault) = make_vault(None)?;
    assert!(vault.daily_note(at(2024, 3, 5))?.created);

    std::fs::write(
        vault.root().join(".obsidian/daily-notes.json"),
        r#"{"format": "DD-MM-YYYY"}"#,
    )?;
    let note = vault.daily_note(at(2024, 3, 5))?;
    assert!(note.created);
    assert_eq!(note.rel_path.as_str_lossy(), "05-03-2024.md");
    Ok(())
}

#[test]
fn existing_note_content_is_preserved() -> anyhow::Result<()> {
    let (_temp, vault) = make_vault(Some(r#"{"folder": "Daily"}"#))?;
    std::fs::create_dir_all(vault.root().join("Daily"))?;
    std::fs::write(vault.root().join("Daily/2024-03-05.md"), "hand written\n")?;

    let note = vault.daily_note(at(2024, 3, 5))?;
    assert!(!note.created);
    assert_eq!(std::fs::read_to_string(&note.path)?, "hand written\n");
    Ok(())
}

#[cfg(unix)]
#[test]
fn unwritable_folder_is_a_storage_error() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, vault) = make_vault(Some(r#"{"folder": "Locked/Daily"}"#))?;
    let locked = vault.root().join("Locked");
    std::fs::create_dir_all(&locked)?;
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555))?;

    // Root ignores permission bits; nothing to assert in that case.
    if std::fs::create_dir(locked.join("writable")).is_ok() {
        return Ok(());
    }

    match vault.daily_note(at(2024, 3, 5)) {
        Err(Error::Storage { path, .. }) => assert!(path.starts_with(&locked)),
        other => anyhow::bail!("expected storage error; got {other:?}"),
    }
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[test]
fn today_uses_the_local_calendar_day() -> anyhow::Result<()> {
    let (_temp, vault) = make_vault(None)?;
    let before = Local::now().date_naive();
    let note = vault.today()?;
    let after = Local::now().date_naive();

    let name = note
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let expected = [before, after].map(|d| format!("{}.md", d.format("%Y-%m-%d")));
    assert!(expected.contains(&name), "unexpected note name {name}");
    assert!(note.path.is_file());
    Ok(())
}

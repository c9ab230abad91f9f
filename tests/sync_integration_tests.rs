//! End-to-end tests for the sync command: contribute, mirror and
//! two-way synchronize.

use ferry::commands::execute;
use ferry::config::{Config, Operation};
use ferry::context::{RunContext, RunStatus};
use ferry::types::{CompareSpec, ConflictPolicy, FerryError, SyncMode, SyncPreference};
use ferry::ui::{PreferenceAnswer, ScriptedPrompter};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tempfile::TempDir;

fn config_for(source: &Path, target: &Path, mode: SyncMode) -> Config {
    Config {
        operation: Operation::Sync,
        sources: vec![source.to_path_buf()],
        target: target.to_path_buf(),
        sync_mode: mode,
        ..Config::default()
    }
}

fn context(dry_run: bool) -> RunContext {
    RunContext::new(dry_run, Box::new(ScriptedPrompter::new()))
}

fn write_with_mtime(path: &Path, content: &[u8], unix_seconds: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write file");
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0))
        .expect("pin mtime");
}

fn list_relative(root: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            paths.push(path.strip_prefix(root).expect("under root").to_path_buf());
        }
    }
    paths.sort();
    paths
}

#[test]
fn test_contribute_adds_missing_file() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(&src).expect("create src");
    fs::create_dir_all(&dst).expect("create dst");
    fs::write(src.join("a.txt"), b"X").expect("write a");

    let mut config = config_for(&src, &dst, SyncMode::Contribute);
    config.compare = CompareSpec::none();

    let mut ctx = context(false);
    execute(&config, &mut ctx).expect("contribute should succeed");

    assert_eq!(fs::read(dst.join("a.txt")).expect("read a"), b"X");
    assert_eq!(ctx.telemetry.added, 1);
    assert_eq!(ctx.telemetry.deleted, 0);
}

#[test]
fn test_contribute_walks_directories_one_by_one() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("nested/deeper")).expect("create src tree");
    fs::write(src.join("nested/deeper/leaf.txt"), b"leaf").expect("write leaf");
    fs::create_dir_all(&dst).expect("create dst");
    fs::write(dst.join("extra.txt"), b"extra").expect("write extra");

    let mut ctx = context(false);
    execute(&config_for(&src, &dst, SyncMode::Contribute), &mut ctx)
        .expect("contribute should succeed");

    assert!(dst.join("nested/deeper/leaf.txt").is_file());
    assert!(dst.join("extra.txt").is_file());
    // nested, nested/deeper and the leaf are each added.
    assert_eq!(ctx.telemetry.added, 3);
}

#[test]
fn test_contribute_twice_changes_nothing_the_second_time() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("sub")).expect("create src");
    fs::write(src.join("one.txt"), b"one").expect("write one");
    fs::write(src.join("sub/two.txt"), b"two").expect("write two");

    let config = config_for(&src, &dst, SyncMode::Contribute);

    let mut first = context(false);
    execute(&config, &mut first).expect("first run should succeed");
    assert!(first.telemetry.has_changes());

    let mut second = context(false);
    execute(&config, &mut second).expect("second run should succeed");
    assert_eq!(second.telemetry.added, 0);
    assert_eq!(second.telemetry.updated, 0);
    assert_eq!(second.telemetry.deleted, 0);
    assert_eq!(second.status(), RunStatus::Success);
}

#[test]
fn test_mirror_deletes_orphan() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(&src).expect("create src");
    fs::create_dir_all(&dst).expect("create dst");
    fs::write(dst.join("orphan.txt"), b"orphan").expect("write orphan");

    let mut ctx = context(false);
    execute(&config_for(&src, &dst, SyncMode::Mirror), &mut ctx).expect("mirror should succeed");

    assert!(!dst.join("orphan.txt").exists());
    assert_eq!(ctx.telemetry.deleted, 1);
}

#[test]
fn test_mirror_deletes_exactly_what_source_lacks() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("keep")).expect("create src/keep");
    fs::write(src.join("a.txt"), b"a").expect("write a");
    fs::write(src.join("keep/b.txt"), b"b").expect("write b");

    fs::create_dir_all(dst.join("keep")).expect("create dst/keep");
    fs::create_dir_all(dst.join("stale/deep")).expect("create stale tree");
    fs::write(dst.join("stale/deep/c.txt"), b"c").expect("write c");
    fs::write(dst.join("keep/old.txt"), b"old").expect("write old");
    fs::write(dst.join("orphan.txt"), b"orphan").expect("write orphan");

    let mut config = config_for(&src, &dst, SyncMode::Mirror);
    config.conflict_policy = ConflictPolicy::Overwrite;

    let mut ctx = context(false);
    execute(&config, &mut ctx).expect("mirror should succeed");

    assert_eq!(list_relative(&dst), list_relative(&src));
    // stale (with its content), keep/old.txt and orphan.txt
    assert_eq!(ctx.telemetry.deleted, 3);
}

#[test]
fn test_mirror_keeps_entries_excluded_from_the_run() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(&src).expect("create src");
    fs::create_dir_all(&dst).expect("create dst");
    fs::write(src.join("build.log"), b"log").expect("write source log");
    fs::write(dst.join("build.log"), b"older log").expect("write target log");

    let mut config = config_for(&src, &dst, SyncMode::Mirror);
    config.exclude_patterns = vec!["*.log".to_string()];

    let mut ctx = context(false);
    execute(&config, &mut ctx).expect("mirror should succeed");

    // Not matched, but the source still has it.
    assert_eq!(fs::read(dst.join("build.log")).expect("read log"), b"older log");
    assert_eq!(ctx.telemetry.deleted, 0);
    assert_eq!(ctx.status(), RunStatus::NoMatch);
}

#[test]
fn test_mirror_dry_run_reports_without_deleting() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let run_once = |name: &str, dry_run: bool| {
        let src = temp_dir.path().join(format!("{name}-src"));
        let dst = temp_dir.path().join(format!("{name}-dst"));
        fs::create_dir_all(&src).expect("create src");
        fs::write(src.join("new.txt"), b"new").expect("write new");
        fs::create_dir_all(dst.join("gone/inner")).expect("create gone");
        fs::write(dst.join("gone/inner/x.txt"), b"x").expect("write x");
        fs::write(dst.join("orphan.txt"), b"orphan").expect("write orphan");

        let mut config = config_for(&src, &dst, SyncMode::Mirror);
        config.dry_run = dry_run;

        let mut ctx = context(dry_run);
        execute(&config, &mut ctx).expect("mirror should succeed");
        (ctx.telemetry.clone(), list_relative(&dst))
    };

    let (live, _) = run_once("live", false);
    let (dry, dry_listing) = run_once("dry", true);

    assert_eq!(live, dry);
    assert_eq!(dry.deleted, 2);
    assert_eq!(
        dry_listing,
        vec![
            PathBuf::from("gone"),
            PathBuf::from("gone/inner"),
            PathBuf::from("gone/inner/x.txt"),
            PathBuf::from("orphan.txt"),
        ]
    );
}

#[test]
fn test_synchronize_prefer_newer_source_wins() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_with_mtime(&src.join("f.txt"), b"edited in source", 1_700_000_100);
    write_with_mtime(&dst.join("f.txt"), b"edited in target", 1_700_000_000);

    let mut config = config_for(&src, &dst, SyncMode::Synchronize);
    config.prefer_newer = true;

    let prompter = ScriptedPrompter::new();
    let asked = prompter.asked();
    let mut ctx = RunContext::new(false, Box::new(prompter));
    execute(&config, &mut ctx).expect("synchronize should succeed");

    assert_eq!(fs::read(dst.join("f.txt")).expect("read target"), b"edited in source");
    assert_eq!(fs::read(src.join("f.txt")).expect("read source"), b"edited in source");
    assert_eq!(ctx.telemetry.updated, 1);
    assert_eq!(asked.load(Ordering::SeqCst), 0);
}

#[test]
fn test_synchronize_prefer_newer_target_wins() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_with_mtime(&src.join("f.txt"), b"stale", 1_700_000_000);
    write_with_mtime(&dst.join("f.txt"), b"fresh from target", 1_700_000_500);

    let mut config = config_for(&src, &dst, SyncMode::Synchronize);
    config.prefer_newer = true;

    let mut ctx = context(false);
    execute(&config, &mut ctx).expect("synchronize should succeed");

    assert_eq!(fs::read(src.join("f.txt")).expect("read source"), b"fresh from target");
    assert_eq!(ctx.telemetry.updated, 1);
}

#[test]
fn test_synchronize_copies_both_ways() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_with_mtime(&src.join("only-source.txt"), b"s", 1_700_000_000);
    write_with_mtime(&dst.join("only-target/t.txt"), b"t", 1_700_000_000);

    let mut ctx = context(false);
    execute(&config_for(&src, &dst, SyncMode::Synchronize), &mut ctx)
        .expect("synchronize should succeed");

    assert!(dst.join("only-source.txt").is_file());
    assert!(src.join("only-target/t.txt").is_file());
    assert_eq!(list_relative(&src), list_relative(&dst));
    assert_eq!(ctx.telemetry.added, 3);
}

#[test]
fn test_synchronize_always_target_escalates() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    for name in ["a.txt", "b.txt"] {
        write_with_mtime(&src.join(name), b"source side", 1_700_000_000);
        write_with_mtime(&dst.join(name), b"target", 1_700_000_000);
    }

    let mut config = config_for(&src, &dst, SyncMode::Synchronize);
    config.sync_preference = SyncPreference::Ask;

    let prompter = ScriptedPrompter::new().with_preferences([PreferenceAnswer::AlwaysTarget]);
    let asked = prompter.asked();
    let mut ctx = RunContext::new(false, Box::new(prompter));
    execute(&config, &mut ctx).expect("synchronize should succeed");

    assert_eq!(asked.load(Ordering::SeqCst), 1);
    for name in ["a.txt", "b.txt"] {
        assert_eq!(fs::read(src.join(name)).expect("read source"), b"target");
    }
}

#[test]
fn test_synchronize_unanswered_preference_changes_nothing() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_with_mtime(&src.join("a.txt"), b"source side", 1_700_000_000);
    write_with_mtime(&dst.join("a.txt"), b"target", 1_700_000_000);

    let mut ctx = context(false);
    execute(&config_for(&src, &dst, SyncMode::Synchronize), &mut ctx)
        .expect("synchronize should succeed");

    assert_eq!(fs::read(src.join("a.txt")).expect("read source"), b"source side");
    assert_eq!(fs::read(dst.join("a.txt")).expect("read target"), b"target");
    assert!(!ctx.telemetry.has_changes());
}

#[test]
fn test_sync_rejects_nested_roots_without_touching_anything() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    fs::create_dir_all(src.join("inner")).expect("create src");
    fs::write(src.join("a.txt"), b"a").expect("write a");
    let before = list_relative(&src);

    for (source, target) in [(src.clone(), src.join("inner")), (src.join("inner"), src.clone())] {
        let mut ctx = context(false);
        let result = execute(&config_for(&source, &target, SyncMode::Mirror), &mut ctx);
        assert!(matches!(result, Err(FerryError::Validation(_))));
    }

    assert_eq!(list_relative(&src), before);
}

#[test]
fn test_sync_rejects_flatten() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(&src).expect("create src");

    let mut config = config_for(&src, &dst, SyncMode::Contribute);
    config.flatten = true;

    let mut ctx = context(false);
    let result = execute(&config, &mut ctx);
    assert!(matches!(result, Err(FerryError::Validation(_))));
    assert!(!dst.exists());
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("set mode");
}

#[cfg(unix)]
fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).expect("stat").permissions().mode() & 0o7777
}

#[cfg(unix)]
#[test]
fn test_declined_directory_update_still_contributes_children() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("d")).expect("create src/d");
    fs::create_dir_all(dst.join("d")).expect("create dst/d");
    fs::write(src.join("d/new.txt"), b"new").expect("write new");
    set_mode(&src.join("d"), 0o755);
    set_mode(&dst.join("d"), 0o775);

    let mut config = config_for(&src, &dst, SyncMode::Contribute);
    config.conflict_policy = ConflictPolicy::Skip;

    let mut ctx = context(false);
    execute(&config, &mut ctx).expect("contribute should succeed");

    assert_eq!(fs::read(dst.join("d/new.txt")).expect("read new"), b"new");
    assert_eq!(mode_of(&dst.join("d")), 0o775);
    assert_eq!(ctx.telemetry.skipped, 1);
    assert_eq!(ctx.telemetry.added, 1);
    assert_eq!(ctx.status(), RunStatus::Success);
}

#[cfg(unix)]
#[test]
fn test_read_only_source_directory_is_contributed() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("ro")).expect("create src/ro");
    fs::create_dir_all(&dst).expect("create dst");
    fs::write(src.join("ro/f.txt"), b"f").expect("write f");
    set_mode(&src.join("ro"), 0o555);

    let mut ctx = context(false);
    let result = execute(&config_for(&src, &dst, SyncMode::Contribute), &mut ctx);

    let copied = fs::read(dst.join("ro/f.txt")).ok();
    let copied_mode = mode_of(&dst.join("ro"));
    set_mode(&src.join("ro"), 0o755);
    set_mode(&dst.join("ro"), 0o755);

    result.expect("contribute should succeed");
    assert_eq!(copied.as_deref(), Some(&b"f"[..]));
    assert_eq!(copied_mode, 0o555);
    assert_eq!(ctx.failures(), 0);
    assert_eq!(ctx.telemetry.added, 2);
}

#[cfg(unix)]
#[test]
fn test_dry_run_leaves_no_attribute_changes_behind() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("d")).expect("create src/d");
    fs::create_dir_all(dst.join("d")).expect("create dst/d");
    set_mode(&src.join("d"), 0o700);
    set_mode(&dst.join("d"), 0o755);

    let mut config = config_for(&src, &dst, SyncMode::Contribute);
    config.conflict_policy = ConflictPolicy::Overwrite;
    config.dry_run = true;

    let mut ctx = context(true);
    execute(&config, &mut ctx).expect("dry run should succeed");

    assert_eq!(mode_of(&dst.join("d")), 0o755);
    assert_eq!(ctx.telemetry.updated, 1);
}

#[cfg(unix)]
#[test]
fn test_mirror_cleanup_continues_past_unreadable_target_directory() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("locked")).expect("create src/locked");
    fs::create_dir_all(dst.join("locked")).expect("create dst/locked");
    fs::write(dst.join("locked/inner.txt"), b"i").expect("write inner");
    fs::write(dst.join("z_orphan.txt"), b"o").expect("write orphan");
    set_mode(&dst.join("locked"), 0o000);
    // Privileged users read through any mode bits.
    let unreadable = fs::read_dir(dst.join("locked")).is_err();

    let mut config = config_for(&src, &dst, SyncMode::Mirror);
    config.conflict_policy = ConflictPolicy::Skip;

    let mut ctx = context(false);
    let result = execute(&config, &mut ctx);
    set_mode(&dst.join("locked"), 0o755);

    result.expect("mirror should not abort");
    assert!(!dst.join("z_orphan.txt").exists());
    assert!(dst.join("locked").is_dir());
    assert_eq!(ctx.telemetry.deleted, if unreadable { 1 } else { 2 });
    if unreadable {
        assert_eq!(ctx.failures(), 1);
        assert_eq!(ctx.status(), RunStatus::Failed);
        assert!(dst.join("locked/inner.txt").is_file());
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_source_directory_fails_the_run() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(src.join("a_locked")).expect("create src/a_locked");
    fs::create_dir_all(&dst).expect("create dst");
    fs::write(src.join("a_locked/hidden.txt"), b"h").expect("write hidden");
    fs::write(src.join("b.txt"), b"b").expect("write b");
    set_mode(&src.join("a_locked"), 0o000);
    if fs::read_dir(src.join("a_locked")).is_ok() {
        set_mode(&src.join("a_locked"), 0o755);
        return;
    }

    let mut ctx = context(false);
    let result = execute(&config_for(&src, &dst, SyncMode::Contribute), &mut ctx);
    set_mode(&src.join("a_locked"), 0o755);
    if dst.join("a_locked").exists() {
        set_mode(&dst.join("a_locked"), 0o755);
    }

    result.expect("an unreadable subtree is not fatal");
    assert!(dst.join("b.txt").is_file());
    assert!(!dst.join("a_locked/hidden.txt").exists());
    assert_eq!(ctx.failures(), 1);
    assert_eq!(ctx.status(), RunStatus::Failed);
}

#[test]
fn test_reverse_pass_applies_flipped_preference() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    // The forward pass never sees x.txt, so only the reverse pass decides it.
    write_with_mtime(&src.join(".ferryignore"), b".ferryignore\nx.txt\n", 1_700_000_000);
    write_with_mtime(&src.join("x.txt"), b"source version", 1_700_000_000);
    write_with_mtime(&dst.join("x.txt"), b"tgt", 1_700_000_000);

    let mut config = config_for(&src, &dst, SyncMode::Synchronize);
    config.sync_preference = SyncPreference::Source;

    let prompter = ScriptedPrompter::new();
    let asked = prompter.asked();
    let mut ctx = RunContext::new(false, Box::new(prompter));
    execute(&config, &mut ctx).expect("synchronize should succeed");

    assert_eq!(asked.load(Ordering::SeqCst), 0);
    assert_eq!(fs::read(dst.join("x.txt")).expect("read target"), b"source version");
    assert_eq!(fs::read(src.join("x.txt")).expect("read source"), b"source version");
    assert!(!dst.join(".ferryignore").exists());
    assert_eq!(ctx.telemetry.updated, 1);
}

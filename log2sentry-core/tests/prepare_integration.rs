use std::fs;
use std::path::{Path, PathBuf};

use log2sentry_core::config::Options;
use log2sentry_core::contract::{Credentials, MockVersionProvider, StaticVersion};
use log2sentry_core::prepare::{prepare_all, prepare_file, PrepareContext};
use log2sentry_core::transcode::decode_unit;
use regex::Regex;
use tempfile::tempdir;

fn context(options: Options, temp_root: &Path) -> PrepareContext {
    PrepareContext::new(
        options,
        Credentials::new("AAA", "BBB"),
        &StaticVersion::new(Some("0.4.0")),
    )
    .with_temp_root(temp_root)
}

fn pattern(dir: &Path, glob: &str) -> Vec<String> {
    vec![dir.join(glob).to_string_lossy().into_owned()]
}

/// Sorted file names directly under `dir`.
fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn prefix_scenario_numbers_units_by_original_line() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("logs.json");
    fs::write(&input, "{\"a\":1}\n\n{\"b\":2}\n").unwrap();

    let options = Options {
        prefix: Some("out".into()),
        ..Options::default()
    };
    let ctx = context(options, tmp.path());
    let report = prepare_all(&pattern(tmp.path(), "*.json"), &ctx);

    assert_eq!(report.prepared.len(), 1);
    assert!(report.failed.is_empty());
    let file = &report.prepared[0];
    let lines: Vec<usize> = file.units.iter().map(|u| u.line_number).collect();
    assert_eq!(lines, vec![1, 3]);

    let ts = file.output_dir.file_name().unwrap().to_string_lossy().into_owned();
    assert!(Regex::new(r"^\d{20}$").unwrap().is_match(&ts), "bad timestamp {ts}");
    assert_eq!(
        names(&file.output_dir),
        vec![
            format!("out_{ts}000001.header"),
            format!("out_{ts}000001.json"),
            format!("out_{ts}000003.header"),
            format!("out_{ts}000003.json"),
        ]
    );
}

#[test]
fn data_files_round_trip_to_original_lines() {
    let tmp = tempdir().unwrap();
    let content = concat!(
        "{\"message\":\"first\"}\n",
        "   \n",
        "{\"message\":\"second\"}\r\n",
        "{\"message\":\"last\"}",
    );
    fs::write(tmp.path().join("app.json"), content).unwrap();

    let ctx = context(Options::default(), tmp.path());
    let report = prepare_all(&pattern(tmp.path(), "app.json"), &ctx);
    let units = &report.prepared[0].units;
    let expected: [&[u8]; 3] = [
        b"{\"message\":\"first\"}\n",
        b"{\"message\":\"second\"}\r\n",
        b"{\"message\":\"last\"}",
    ];

    assert_eq!(units.len(), 3);
    for (unit, raw) in units.iter().zip(expected) {
        let encoded = fs::read_to_string(&unit.data_file).unwrap();
        assert!(!encoded.ends_with('\n'));
        assert_eq!(decode_unit(&encoded).unwrap(), raw);
        assert!(unit.header_file.exists());
    }
    let decoded = decode_unit(&fs::read_to_string(&units[0].data_file).unwrap()).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(value["message"], "first");
}

#[test]
fn header_files_carry_credentials_and_client() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("logs.json"), "{}\n").unwrap();

    let mut version = MockVersionProvider::new();
    version.expect_version().return_const(None::<String>);
    let ctx = PrepareContext::new(Options::default(), "AAA:BBB".parse().unwrap(), &version)
        .with_temp_root(tmp.path());

    let report = prepare_all(&pattern(tmp.path(), "*.json"), &ctx);
    let header = fs::read_to_string(&report.prepared[0].units[0].header_file).unwrap();

    assert!(header.contains("sentry_key=AAA"));
    assert!(header.contains("sentry_secret=BBB"));
    assert!(Regex::new(r"sentry_client=log2sentry/[^,\s]+").unwrap().is_match(&header));
    assert!(header.contains("sentry_client=log2sentry/unknown"));
    assert_eq!(header.lines().count(), 3);
}

#[test]
fn staged_copy_removed_unless_preserved() {
    for preserve_backup in [false, true] {
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("logs.json");
        fs::write(&input, "{}\n").unwrap();

        let options = Options {
            preserve_backup,
            ..Options::default()
        };
        let report = prepare_file(&input, &context(options, tmp.path())).unwrap();

        assert!(!input.exists(), "input must be claimed");
        assert_eq!(report.staged_file.exists(), preserve_backup);
    }
}

#[test]
fn non_json_matches_are_skipped() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("notes.txt"), "hello\n").unwrap();

    let ctx = context(Options::default(), tmp.path());
    let report = prepare_all(&pattern(tmp.path(), "*"), &ctx);

    assert!(report.prepared.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(report.skipped, vec![tmp.path().join("notes.txt")]);
    assert_eq!(names(tmp.path()), vec!["notes.txt".to_string()]);
}

#[test]
fn out_dir_with_tmp_staging_leaves_no_staging_behind() {
    let input_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let temp_root = tempdir().unwrap();
    fs::write(input_dir.path().join("logs.json"), "{\"a\":1}\n{\"b\":2}\n").unwrap();

    let options = Options {
        out_dir: Some(out_dir.path().join("outbox")),
        use_tmp_dir: true,
        ..Options::default()
    };
    let report = prepare_all(
        &pattern(input_dir.path(), "*.json"),
        &context(options, temp_root.path()),
    );

    let file = &report.prepared[0];
    assert!(file.output_dir.starts_with(out_dir.path().join("outbox")));
    assert_eq!(names(&file.output_dir).len(), 4);
    for unit in &file.units {
        assert!(unit.data_file.exists());
    }
    assert!(names(input_dir.path()).is_empty());
    assert!(names(temp_root.path()).is_empty(), "dedicated staging dir must be removed");
}

#[test]
fn each_input_gets_its_own_timestamp() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a.json"), "{}\n").unwrap();
    fs::write(tmp.path().join("b.json"), "{}\n").unwrap();

    let ctx = context(Options::default(), tmp.path());
    let report = prepare_all(&pattern(tmp.path(), "*.json"), &ctx);

    let dirs: Vec<PathBuf> = report.prepared.iter().map(|f| f.output_dir.clone()).collect();
    assert_eq!(dirs.len(), 2);
    assert_ne!(dirs[0], dirs[1]);
}

#[test]
fn invalid_pattern_does_not_abort_batch() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("logs.json"), "{}\n").unwrap();

    let mut patterns = vec!["[".to_string()];
    patterns.extend(pattern(tmp.path(), "*.json"));
    let report = prepare_all(&patterns, &context(Options::default(), tmp.path()));

    assert_eq!(report.prepared.len(), 1);
}

#[test]
fn missing_input_is_reported_per_file() {
    let tmp = tempdir().unwrap();
    let ctx = context(Options::default(), tmp.path());
    let err = prepare_file(&tmp.path().join("gone.json"), &ctx).unwrap_err();
    assert!(err.to_string().contains("failed to stage"));
}

#[cfg(unix)]
#[test]
fn one_failing_file_does_not_stop_the_batch() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a.json"), "{\"a\":1}\n").unwrap();
    // Matches the glob, stages fine, then cannot be opened for transcoding.
    std::os::unix::fs::symlink(tmp.path().join("missing-target"), tmp.path().join("b.json"))
        .unwrap();
    fs::write(tmp.path().join("c.json"), "{\"c\":1}\n").unwrap();

    let ctx = context(Options::default(), tmp.path());
    let report = prepare_all(&pattern(tmp.path(), "*.json"), &ctx);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].input, tmp.path().join("b.json"));
    assert!(report.failed[0].error.contains("failed to read"));
    let prepared: Vec<PathBuf> = report.prepared.iter().map(|f| f.input.clone()).collect();
    assert_eq!(prepared, vec![tmp.path().join("a.json"), tmp.path().join("c.json")]);
    assert_eq!(report.unit_count(), 2);
}

#[test]
fn repeated_patterns_prepare_a_file_once() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("logs.json"), "{}\n").unwrap();

    let mut patterns = pattern(tmp.path(), "*.json");
    patterns.extend(pattern(tmp.path(), "logs.json"));
    let ctx = context(Options::default(), tmp.path());
    let report = prepare_all(&patterns, &ctx);

    assert_eq!(report.prepared.len(), 1);
    assert!(report.failed.is_empty());
}

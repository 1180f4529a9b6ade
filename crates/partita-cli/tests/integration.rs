//! Integration tests for partita-cli.
//!
//! Each test runs the `partita` binary against files in a temporary
//! directory, with the user config directory redirected there as well.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use hound::{SampleFormat, WavSpec, WavWriter};
use partita_core::{Address, Graph};
use partita_schema::keys::{audio_file, device};
use partita_schema::{BoxClass, DeviceCatalog, SCHEMA_VERSION, project, registry};
use tempfile::TempDir;

fn partita(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_partita"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("HOME", home)
        .env_remove("RUST_LOG");
    cmd
}

fn run_ok(cmd: &mut Command) -> String {
    let output = cmd.output().expect("failed to run partita");
    assert!(
        output.status.success(),
        "partita failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run partita")
}

fn info_json(home: &Path, file: &Path) -> serde_json::Value {
    let stdout = run_ok(partita(home).arg("info").arg(file).arg("--json"));
    serde_json::from_str(&stdout).expect("info --json is not JSON")
}

fn decode(path: &Path) -> Graph {
    Graph::from_binary(&std::fs::read(path).unwrap(), registry().unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// new / info / verify
// ---------------------------------------------------------------------------

#[test]
fn new_project_reports_units_and_version() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("song.partita");
    run_ok(partita(temp.path()).arg("new").arg(&file).args(["--name", "Song", "--units", "2"]));

    let info = info_json(temp.path(), &file);
    assert_eq!(info["name"], "Song");
    assert_eq!(info["schema_version"], SCHEMA_VERSION);
    assert_eq!(info["units"].as_array().unwrap().len(), 2);
    assert_eq!(info["units"][1]["name"], "Unit 2");
    assert_eq!(info["classes"]["AudioUnit"], 2);

    let text = run_ok(partita(temp.path()).arg("info").arg(&file));
    assert!(text.contains("Schema:      v3"), "got: {text}");
}

#[test]
fn new_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("song.partita");
    run_ok(partita(temp.path()).arg("new").arg(&file));
    assert!(!run(partita(temp.path()).arg("new").arg(&file)).status.success());
    run_ok(partita(temp.path()).arg("new").arg(&file).arg("--force"));
}

#[test]
fn verify_accepts_valid_and_rejects_garbage() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("good.partita");
    run_ok(partita(temp.path()).arg("new").arg(&good).args(["--units", "1"]));
    assert!(run_ok(partita(temp.path()).arg("verify").arg(&good)).contains("OK"));

    let bad = temp.path().join("bad.partita");
    std::fs::write(&bad, b"definitely not a project").unwrap();
    let output = run(partita(temp.path()).arg("verify").arg(&bad));
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// migrate
// ---------------------------------------------------------------------------

fn write_wav(path: &Path, seconds: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for _ in 0..spec.sample_rate * seconds {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// A v1 project whose compressor lacks two parameters and whose sample
/// length was never stored. The sample path points at another machine.
fn legacy_project(path: &Path) -> (partita_core::EntityId, partita_core::EntityId) {
    let catalog = DeviceCatalog::new();
    let (mut graph, root) = project::new_project(registry().unwrap()).unwrap();
    let ((compressor, file), _) = graph
        .transaction(|g| {
            let unit = project::add_audio_unit(g, root, "Vox")?;
            let compressor = project::add_device(g, unit, catalog.get("compressor").unwrap())?;
            let params = Address::compose(compressor).append(device::PARAMS);
            g.pop_element(&params)?;
            g.pop_element(&params)?;
            let track = project::add_track(g, unit)?;
            let file = project::add_audio_file(g, "/studio/old/take1.wav", 0.0)?;
            project::add_audio_region(g, track, file, 0, 960)?;
            Ok((compressor, file))
        })
        .unwrap();
    graph.set_schema_version(1);
    std::fs::write(path, graph.to_binary().unwrap()).unwrap();
    (compressor, file)
}

#[test]
fn migrate_with_media_dir_upgrades_fully() {
    let temp = TempDir::new().unwrap();
    let media = temp.path().join("media");
    std::fs::create_dir(&media).unwrap();
    write_wav(&media.join("take1.wav"), 2);
    let file = temp.path().join("old.partita");
    let out = temp.path().join("new.partita");
    let (compressor, audio) = legacy_project(&file);

    let stdout = run_ok(
        partita(temp.path())
            .arg("migrate")
            .arg(&file)
            .arg("--media")
            .arg(&media)
            .arg("--out")
            .arg(&out),
    );
    assert!(stdout.contains("from v1 to v3"), "got: {stdout}");

    let graph = decode(&out);
    assert_eq!(graph.schema_version(), SCHEMA_VERSION);
    let duration = graph
        .value(&Address::compose(audio).append(audio_file::DURATION))
        .and_then(|v| v.as_f32());
    assert_eq!(duration, Some(2.0));
    let slots = graph
        .field(&Address::compose(compressor).append(device::PARAMS))
        .and_then(|f| f.as_array())
        .map(|a| a.len());
    assert_eq!(slots, catalog_len("compressor"));

    // Input untouched.
    assert_eq!(decode(&file).schema_version(), 1);
    let again = run_ok(partita(temp.path()).arg("migrate").arg(&out));
    assert!(again.contains("already at schema v3"), "got: {again}");
}

fn catalog_len(kind: &str) -> Option<usize> {
    DeviceCatalog::new().get(kind).map(|d| d.params.len())
}

#[test]
fn migrate_without_media_is_partial_unless_strict() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("old.partita");
    legacy_project(&file);

    let strict = run(partita(temp.path()).arg("migrate").arg(&file).arg("--strict"));
    assert!(!strict.status.success());
    assert_eq!(decode(&file).schema_version(), 1);

    let stdout = run_ok(partita(temp.path()).arg("migrate").arg(&file));
    assert!(stdout.contains("Partially migrated"), "got: {stdout}");
    assert_eq!(decode(&file).schema_version(), 1);
    let verify = run_ok(partita(temp.path()).arg("verify").arg(&file));
    assert!(verify.contains("run `partita migrate`"), "got: {verify}");
}

// ---------------------------------------------------------------------------
// export / import
// ---------------------------------------------------------------------------

#[test]
fn export_then_import_copies_a_unit() {
    let temp = TempDir::new().unwrap();
    let presets: PathBuf = temp.path().join("presets");
    let source = temp.path().join("a.partita");
    let target = temp.path().join("b.partita");
    run_ok(partita(temp.path()).arg("new").arg(&source).args(["--units", "1"]));
    run_ok(partita(temp.path()).arg("new").arg(&target).args(["--units", "2"]));

    let unit = info_json(temp.path(), &source)["units"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    run_ok(
        partita(temp.path())
            .args(["export"])
            .arg(&source)
            .args(["--root", &unit, "--name", "strip"])
            .arg("--preset-dir")
            .arg(&presets),
    );
    assert!(presets.join("strip.preset").is_file());

    let stdout = run_ok(
        partita(temp.path())
            .arg("import")
            .arg(&target)
            .arg("strip")
            .arg("--preset-dir")
            .arg(&presets),
    );
    assert!(stdout.contains("Imported 1 node(s)"), "got: {stdout}");

    let info = info_json(temp.path(), &target);
    let units = info["units"].as_array().unwrap();
    assert_eq!(units.len(), 3);
    assert_ne!(units[2]["id"].as_str(), Some(unit.as_str()));
    run_ok(partita(temp.path()).arg("verify").arg(&target));
}

#[test]
fn preset_with_audio_region_imports_into_a_fresh_project() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("a.partita");
    let target = temp.path().join("b.partita");
    let preset = temp.path().join("drums.preset");

    let (mut graph, root) = project::new_project(registry().unwrap()).unwrap();
    let ((unit, file), _) = graph
        .transaction(|g| {
            let unit = project::add_audio_unit(g, root, "Drums")?;
            let track = project::add_track(g, unit)?;
            let file = project::add_audio_file(g, "/samples/loop.wav", 2.0)?;
            project::add_audio_region(g, track, file, 0, 960)?;
            Ok((unit, file))
        })
        .unwrap();
    std::fs::write(&source, graph.to_binary().unwrap()).unwrap();
    run_ok(partita(temp.path()).arg("new").arg(&target));

    run_ok(
        partita(temp.path())
            .arg("export")
            .arg(&source)
            .args(["--root", &unit.to_string()])
            .arg("--out")
            .arg(&preset),
    );
    run_ok(partita(temp.path()).arg("import").arg(&target).arg(&preset));
    run_ok(partita(temp.path()).arg("verify").arg(&target));

    let imported = decode(&target);
    assert_eq!(imported.nodes_of_class(BoxClass::AudioRegion.id()).count(), 1);
    let files: Vec<_> = imported
        .nodes_of_class(BoxClass::AudioFile.id())
        .map(|n| n.id())
        .collect();
    assert_eq!(files, vec![file]);
    assert_eq!(imported.incoming_to_node(file).len(), 1);
}

#[test]
fn presets_command_lists_and_deletes() {
    let temp = TempDir::new().unwrap();
    let presets = temp.path().join("presets");
    let source = temp.path().join("a.partita");
    run_ok(partita(temp.path()).arg("new").arg(&source).args(["--units", "1"]));
    let unit = info_json(temp.path(), &source)["units"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let listed = run_ok(partita(temp.path()).args(["presets", "list"]).arg("--preset-dir").arg(&presets));
    assert!(listed.contains("(none)"), "got: {listed}");

    run_ok(
        partita(temp.path())
            .arg("export")
            .arg(&source)
            .args(["--root", &unit, "--name", "strip"])
            .arg("--preset-dir")
            .arg(&presets),
    );
    let listed = run_ok(partita(temp.path()).args(["presets", "list"]).arg("--preset-dir").arg(&presets));
    assert!(listed.contains("strip"), "got: {listed}");
    assert!(listed.contains(&format!("v{SCHEMA_VERSION}")), "got: {listed}");

    run_ok(partita(temp.path()).args(["presets", "delete", "strip"]).arg("--preset-dir").arg(&presets));
    assert!(!presets.join("strip.preset").exists());
    let missing = run(partita(temp.path()).args(["presets", "delete", "strip"]).arg("--preset-dir").arg(&presets));
    assert!(!missing.status.success());

    // Without --preset-dir the user directory under the redirected config home is used.
    let paths = run_ok(partita(temp.path()).args(["presets", "paths"]));
    assert!(paths.contains("partita/presets"), "got: {paths}");
    assert!(paths.contains(&temp.path().join("config").display().to_string()), "got: {paths}");
}

#[test]
fn export_rejects_unknown_node() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("a.partita");
    run_ok(partita(temp.path()).arg("new").arg(&file));
    let output = run(
        partita(temp.path())
            .arg("export")
            .arg(&file)
            .args(["--root", "00000000-0000-0000-0000-000000000042"])
            .args(["--out", "x.preset"]),
    );
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_init_writes_defaults_once() {
    let temp = TempDir::new().unwrap();
    let shown = run_ok(partita(temp.path()).arg("config"));
    assert!(shown.contains("not found, using defaults"), "got: {shown}");
    assert!(shown.contains("max_undo = 100"), "got: {shown}");

    run_ok(partita(temp.path()).args(["config", "--init"]));
    assert!(temp.path().join("config/partita/config.toml").is_file());
    assert!(!run(partita(temp.path()).args(["config", "--init"])).status.success());

    let shown = run_ok(partita(temp.path()).arg("config"));
    assert!(!shown.contains("not found"));
}

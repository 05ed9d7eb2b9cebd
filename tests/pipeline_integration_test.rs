mod common;

use papyrus_headers::services::papyrus::parse;
use papyrus_headers::types::Provenance;
use papyrus_headers::{run, GeneratorConfig, RunContext};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config_for(root: &Path) -> GeneratorConfig {
    GeneratorConfig {
        base_dir: root.to_path_buf(),
        output_dir: root.join("Headers"),
        missing_log: root.join("missing_source.txt"),
        enable_archives: true,
        ..Default::default()
    }
}

/// A game folder with loose sources, two script archives and a compiled-only script.
fn game_fixture(root: &Path) {
    let data = root.join("Data");
    common::write_file(
        &data.join("Scripts/Source/Actor.psc"),
        "Scriptname Actor extends ObjectReference Hidden\n\
         ; loose copy wins\n\
         Function SetAV(String asValueName, Float afValue) native\n",
    );
    common::create_zip(
        &data.join("Skyrim - Scripts.zip"),
        &[
            (
                "scripts/source/actor.psc",
                "Scriptname Actor extends ObjectReference\nFunction Packed() native\n",
            ),
            (
                "Scripts/Source/ObjectReference.psc",
                "Scriptname ObjectReference extends Form Hidden\n\
                 {Anything in the world}\n\
                 Bool Function MoveTo(ObjectReference akTarget, \\\n\
                   Float afXOffset = 0.0, Float afYOffset = 0.0) native\n\
                 Event OnActivate(ObjectReference akActionRef)\nEndEvent\n",
            ),
        ],
    );
    common::create_zip(
        &data.join("Update.zip"),
        &[(
            "Scripts/Source/Form.psc",
            "Scriptname Form Hidden\nInt Function GetFormID() native\n",
        )],
    );
    common::write_file(&data.join("Scripts/UnknownQuest.pex"), "\u{FA}\u{57}\u{C0}\u{DE}");
}

#[test]
fn generates_headers_across_loose_and_archive_tiers() {
    common::init_logger();
    let dir = TempDir::new().expect("temp dir should be created");
    game_fixture(dir.path());

    let config = config_for(dir.path());
    let summary = run(&config).expect("run should succeed");

    let mut names: Vec<String> = summary.generated.iter().map(|h| h.name.to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["Actor", "Form", "ObjectReference"]);

    let actor = summary
        .generated
        .iter()
        .find(|h| h.name.as_str() == "Actor")
        .expect("Actor header should exist");
    assert_eq!(actor.provenance, Provenance::Loose);

    let object_reference = fs::read_to_string(dir.path().join("Headers/ObjectReference.psc"))
        .expect("ObjectReference header should be written");
    assert_eq!(
        object_reference,
        "Scriptname ObjectReference extends Form Hidden\n\n\
         Bool Function MoveTo(ObjectReference akTarget, Float afXOffset = 0.0, Float afYOffset = 0.0) native\n\n\
         Event OnActivate(ObjectReference akActionRef)\n"
    );

    let log = fs::read_to_string(&config.missing_log).expect("missing log should be written");
    assert_eq!(
        log,
        "UnknownQuest\tloose: not found; archive: not found in 2 containers; decompile: disabled\n"
    );
}

#[test]
fn headers_reparse_to_the_same_text() {
    let dir = TempDir::new().expect("temp dir should be created");
    game_fixture(dir.path());
    run(&config_for(dir.path())).expect("run should succeed");

    for entry in fs::read_dir(dir.path().join("Headers")).expect("headers dir should exist") {
        let path = entry.expect("entry should be readable").path();
        let text = fs::read_to_string(&path).expect("header should be readable");
        let model = parse(&text).expect("header should parse");
        assert_eq!(
            papyrus_headers::services::papyrus::synthesize(&model),
            text,
            "{} did not round-trip",
            path.display()
        );
    }
}

#[test]
fn corrupt_archive_does_not_stop_the_run() {
    common::init_logger();
    let dir = TempDir::new().expect("temp dir should be created");
    let data = dir.path().join("Data");
    for i in 0..5 {
        let path = data.join(format!("Pack{i}.zip"));
        if i == 2 {
            common::write_file(&path, "this is not a zip archive");
        } else {
            let entry = format!("Scripts/Source/Script{i}.psc");
            let body = format!("Scriptname Script{i}\n");
            common::create_zip(&path, &[(entry.as_str(), body.as_str())]);
        }
    }

    let summary = run(&config_for(dir.path())).expect("run should succeed");

    assert_eq!(summary.generated.len(), 4);
    assert_eq!(summary.corrupt_containers.len(), 1);
    assert!(summary.corrupt_containers[0].0.ends_with("Pack2.zip"));
}

#[test]
fn pattern_list_overrides_pattern() {
    let dir = TempDir::new().expect("temp dir should be created");
    game_fixture(dir.path());

    let mut config = config_for(dir.path());
    config.pattern = "*".to_string();
    config.pattern_list = Some("form,actor.pex".to_string());

    let context = RunContext::prepare(&config).expect("context should prepare");
    let summary = context.execute().expect("run should succeed");

    let mut names: Vec<String> = summary.generated.iter().map(|h| h.name.to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["Actor", "Form"]);
    assert!(!config.missing_log.exists());
}

#[test]
fn archives_disabled_leaves_packed_scripts_missing() {
    let dir = TempDir::new().expect("temp dir should be created");
    game_fixture(dir.path());

    let mut config = config_for(dir.path());
    config.enable_archives = false;
    let summary = run(&config).expect("run should succeed");

    let names: Vec<String> = summary.generated.iter().map(|h| h.name.to_string()).collect();
    assert_eq!(names, vec!["Actor"]);
    assert_eq!(summary.misses.len(), 1);
    assert_eq!(summary.misses[0].name.as_str(), "UnknownQuest");
}

#[test]
fn packed_scripts_resolve_from_bsa() {
    common::init_logger();
    let dir = TempDir::new().expect("temp dir should be created");
    let data = dir.path().join("Data");
    common::write_file(
        &data.join("Scripts/Source/Actor.psc"),
        "Scriptname Actor extends ObjectReference\n",
    );
    common::create_bsa(
        &data.join("Skyrim - Misc.bsa"),
        "scripts\\source",
        &[
            ("actor.psc", "Scriptname Actor extends Form\n"),
            (
                "objectreference.psc",
                "Scriptname ObjectReference extends Form Hidden\nFunction Enable() native\n",
            ),
        ],
    );

    let summary = run(&config_for(dir.path())).expect("run should succeed");

    let object_reference = summary
        .generated
        .iter()
        .find(|h| h.name.as_str().eq_ignore_ascii_case("ObjectReference"))
        .expect("ObjectReference header should exist");
    assert!(matches!(
        object_reference.provenance,
        Provenance::Archive { .. }
    ));
    assert_eq!(
        fs::read_to_string(&object_reference.header_path).expect("header should be readable"),
        "Scriptname ObjectReference extends Form Hidden\n\nFunction Enable() native\n"
    );

    let actor = summary
        .generated
        .iter()
        .find(|h| h.name.as_str() == "Actor")
        .expect("Actor header should exist");
    assert_eq!(actor.provenance, Provenance::Loose);
    assert!(summary.corrupt_containers.is_empty());
}

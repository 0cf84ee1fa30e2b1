use camflow::{Document, Environment, FlowInterpreter};
use camflow_core::{Boundary, Model, Process, Tool};
use serde_json::json;
use std::fs;

use crate::common::{job, run, with};

#[test]
fn test_malformed_entries_are_skipped() {
    let environment = Environment::default();
    let spec = with(
        job(),
        json!({
            "tools": {
                "good": {"shape": "flat_bottom", "radius": 1},
                "no_shape": {"radius": 1},
                "bad_radius": {"shape": "ball_nose", "radius": -1},
                "not_a_mapping": 3
            },
            "processes": {"nameless": {"step_down": 1}},
            "bounds": "not a mapping"
        }),
    );
    let report = run(&environment, &spec, std::path::Path::new("."));

    let core = environment.core();
    assert_eq!(core.collection::<Tool>().unwrap().names(), vec!["good"]);
    assert!(core.collection::<Process>().unwrap().is_empty());
    assert!(core.collection::<Boundary>().unwrap().is_empty());
    // tools x3, the process, the bounds section
    assert_eq!(report.skipped, 5);
    // the two tasks and the model
    assert_eq!(report.entities, 4);
}

#[test]
fn test_absent_sections_are_empty() {
    let environment = Environment::default();
    let report = run(&environment, &json!({}), std::path::Path::new("."));
    assert_eq!(report, Default::default());
}

#[test]
fn test_toml_document_with_stl_model() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("floor.stl"),
        "solid floor\n\
         facet normal 0 0 1\n\
         outer loop\n\
         vertex -5 -5 -1\n\
         vertex 20 -5 -1\n\
         vertex -5 20 -1\n\
         endloop\n\
         endfacet\n\
         endsolid floor\n",
    )
    .unwrap();
    let spec_path = dir.path().join("job.toml");
    fs::write(
        &spec_path,
        r#"
[tools.T1]
shape = "flat_bottom"
radius = 1.0

[processes.rough]
strategy = "slice"

[bounds.around]
reference_models = ["floor"]
lower = [0.0, 0.0, 1.0]

[tasks.job]
tool = "T1"
process = "rough"
bounds = "around"
collision_models = ["floor"]

[models.floor.source]
type = "file"
location = "floor.stl"

[toolpaths.tp1.source]
type = "task"
tasks = ["job"]

[[exports]]
source = { type = "toolpath", toolpaths = ["tp1"] }
target = { type = "file", location = "out.ngc" }
"#,
    )
    .unwrap();

    let environment = Environment::default();
    let document = Document::load(&spec_path).unwrap();
    let report = FlowInterpreter::for_environment(&environment).run(&document);

    assert_eq!(report.skipped, 0);
    assert_eq!(report.toolpaths, vec!["tp1"]);
    assert_eq!(
        environment.core().collection::<Model>().unwrap().names(),
        vec!["floor"]
    );
    let text = fs::read_to_string(dir.path().join("out.ngc")).unwrap();
    assert!(text.contains("G1"));
}

#[test]
fn test_missing_document() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Document::load(&dir.path().join("absent.json")).is_err());
}

#[test]
fn test_yaml_document_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let spec_path = dir.path().join("job.yml");
    fs::write(
        &spec_path,
        r#"
tools:
  T1:
    shape: flat_bottom
    radius: 1.0
processes:
  rough:
    strategy: slice
    step_down: 1.0
bounds:
  stock:
    specification: absolute
    lower: [0.0, 0.0, -2.0]
    upper: [6.0, 4.0, 0.0]
tasks:
  job:
    tool: T1
    process: rough
    bounds: stock
toolpaths:
  tp1:
    source:
      type: task
      tasks: [job]
exports:
  - source: {type: toolpath, toolpaths: [tp1]}
    target: {type: file, location: out.ngc}
"#,
    )
    .unwrap();

    let environment = Environment::default();
    let document = Document::load(&spec_path).unwrap();
    let report = FlowInterpreter::for_environment(&environment).run(&document);

    assert_eq!(report.skipped, 0);
    assert_eq!(report.entities, 4);
    assert_eq!(report.toolpaths, vec!["tp1"]);
    assert_eq!(report.exports, vec![dir.path().join("out.ngc")]);
    let text = fs::read_to_string(dir.path().join("out.ngc")).unwrap();
    assert!(text.contains("G1"));
}

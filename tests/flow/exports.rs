use camflow::Environment;
use serde_json::json;
use std::fs;

use crate::common::{job, run, with};

fn toolpaths() -> serde_json::Value {
    json!({"toolpaths": {
        "tp1": {"source": {"type": "task", "tasks": ["job"]}},
        "tp2": {"source": {"type": "task", "tasks": ["finish"]}}
    }})
}

#[test]
fn test_export_in_list_order_skipping_unknown_names() {
    let dir = tempfile::tempdir().unwrap();
    let environment = Environment::default();
    let spec = with(
        with(job(), toolpaths()),
        json!({"exports": [{
            "source": {"type": "toolpath", "toolpaths": ["tp2", "ghost", "tp1"]},
            "target": {"type": "file", "location": "out.ngc"}
        }]}),
    );
    let report = run(&environment, &spec, dir.path());

    let out = dir.path().join("out.ngc");
    assert_eq!(report.exports, vec![out.clone()]);
    let text = fs::read_to_string(&out).unwrap();
    let second_tool = text.find("T2 M6").unwrap();
    let first_tool = text.find("T1 M6").unwrap();
    assert!(second_tool < first_tool);
    assert!(text.trim_end().ends_with("M2"));
}

#[test]
fn test_broken_export_does_not_stop_the_next() {
    let dir = tempfile::tempdir().unwrap();
    let environment = Environment::default();
    let spec = with(
        with(job(), toolpaths()),
        json!({"exports": [
            {"source": {"type": "toolpath", "toolpaths": ["tp1"]}},
            {
                "source": {"type": "toolpath", "toolpaths": ["tp1"]},
                "target": {"type": "file"}
            },
            {
                "source": {"type": "toolpath", "toolpaths": ["tp1"]},
                "target": {"type": "file", "location": "missing/dir/out.ngc"}
            },
            {
                "source": {"type": "toolpath", "toolpaths": ["tp1"]},
                "target": {"type": "file", "location": "good.ngc"}
            }
        ]}),
    );
    let report = run(&environment, &spec, dir.path());

    assert_eq!(report.exports, vec![dir.path().join("good.ngc")]);
    assert_eq!(report.skipped, 3);
    let text = fs::read_to_string(dir.path().join("good.ngc")).unwrap();
    assert!(text.contains("T1 M6"));
    assert!(text.contains("G1"));
}

#[test]
fn test_exports_must_be_a_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let environment = Environment::default();
    let spec = with(
        job(),
        json!({"exports": {"out": {"target": {"type": "file", "location": "out.ngc"}}}}),
    );
    let report = run(&environment, &spec, dir.path());
    assert!(report.exports.is_empty());
    assert!(!dir.path().join("out.ngc").exists());
}

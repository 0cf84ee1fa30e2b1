use camflow::{Config, Environment};
use camflow_core::event_bus::TOOLPATH_GENERATED;
use camflow_core::{CollectionItem, EventHandler, EventPayload, MoveKind, Task, Toolpath};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

use crate::common::{job, run, with};

#[test]
fn test_task_toolpath_is_generated() {
    let environment = Environment::default();
    let generated = Rc::new(RefCell::new(Vec::new()));
    let sink = generated.clone();
    let handler: EventHandler = Rc::new(move |payload: &EventPayload| {
        sink.borrow_mut().push(payload.name().unwrap_or_default().to_string());
    });
    environment.core().events().subscribe(TOOLPATH_GENERATED, handler);

    let spec = with(
        job(),
        json!({"toolpaths": {"tp1": {"source": {"type": "task", "tasks": ["job"]}}}}),
    );
    let report = run(&environment, &spec, std::path::Path::new("."));

    assert_eq!(report.toolpaths, vec!["tp1"]);
    assert_eq!(report.skipped, 0);
    let toolpaths = environment.core().collection::<Toolpath>().unwrap();
    assert_eq!(toolpaths.len(), 1);
    let tp1 = toolpaths.get_by_name("tp1").unwrap();
    assert!(tp1.moves().iter().any(|m| m.kind == MoveKind::Cut));
    assert_eq!(tp1.tool().tool_id, 1);
    assert_eq!(*generated.borrow(), vec!["tp1".to_string()]);
}

#[test]
fn test_task_without_tool_produces_nothing() {
    let environment = Environment::default();
    let mut spec = with(
        job(),
        json!({"toolpaths": {"tp1": {"source": {"type": "task", "tasks": ["job"]}}}}),
    );
    spec["tasks"]["job"].as_object_mut().unwrap().remove("tool");
    let report = run(&environment, &spec, std::path::Path::new("."));

    assert!(report.toolpaths.is_empty());
    assert_eq!(report.skipped, 1);
    assert!(environment
        .core()
        .collection::<Toolpath>()
        .unwrap()
        .is_empty());
}

#[test]
fn test_last_task_result_is_kept() {
    let environment = Environment::default();
    let spec = with(
        job(),
        json!({"toolpaths": {"both": {"source": {"type": "task", "tasks": ["job", "finish"]}}}}),
    );
    run(&environment, &spec, std::path::Path::new("."));

    let toolpaths = environment.core().collection::<Toolpath>().unwrap();
    assert_eq!(toolpaths.len(), 1);
    assert_eq!(toolpaths.get_by_name("both").unwrap().tool().tool_id, 2);
}

#[test]
fn test_merging_task_results_of_one_tool() {
    let mut config = Config::default();
    config.generation.merge_task_results = true;
    let environment = Environment::new(&config);
    let mut spec = with(
        job(),
        json!({"toolpaths": {"both": {"source": {"type": "task", "tasks": ["job", "again", "finish"]}}}}),
    );
    spec["tasks"]["again"] = spec["tasks"]["job"].clone();
    run(&environment, &spec, std::path::Path::new("."));

    let core = environment.core();
    let task = core.collection::<Task>().unwrap().get_by_name("job").unwrap();
    let single = core.run_task(&task, None).unwrap();
    let merged = core
        .collection::<Toolpath>()
        .unwrap()
        .get_by_name("both")
        .unwrap();
    // the ball nose result uses another tool and stays out
    assert_eq!(merged.moves().len(), 2 * single.moves().len());
    assert_eq!(merged.tool().name(), "T1");
}

#[test]
fn test_unknown_task_and_source_type_are_skipped() {
    let environment = Environment::default();
    let spec = with(
        job(),
        json!({"toolpaths": {
            "ghost": {"source": {"type": "task", "tasks": ["missing"]}},
            "imported": {"source": {"type": "file", "location": "x.ngc"}},
            "no_source": {},
            "tp1": {"source": {"type": "task", "tasks": ["missing", "job"]}}
        }}),
    );
    let report = run(&environment, &spec, std::path::Path::new("."));
    assert_eq!(report.toolpaths, vec!["tp1"]);
    assert_eq!(report.skipped, 3);
}

#[test]
fn test_unloaded_slice_purges_task() {
    let mut environment = Environment::default();
    run(&environment, &job(), std::path::Path::new("."));
    assert_eq!(environment.core().collection::<Task>().unwrap().len(), 2);

    environment.plugins().unload("ProcessStrategySlice").unwrap();
    assert!(environment.core().collection::<Task>().unwrap().is_empty());
    // generation of what remains keeps working
    let spec = json!({"toolpaths": {"tp": {"source": {"type": "task", "tasks": ["job"]}}}});
    let report = run(&environment, &spec, std::path::Path::new("."));
    assert!(report.toolpaths.is_empty());
}

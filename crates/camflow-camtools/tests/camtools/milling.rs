use camflow_camtools::{builtin_plugins, ExportOptions, SliceDefaults};
use camflow_core::{
    collection_plugins, Boundary, Core, Mesh, Model, MoveKind, PluginManager, Point, Process, Task,
    Tool, ToolBoundary, ToolShape, ToolpathFilter, Triangle, PROCESS_KIND,
};
use serde_json::json;
use std::rc::Rc;

fn environment() -> (Rc<Core>, PluginManager) {
    let core = Rc::new(Core::new());
    let mut manager = PluginManager::new(core.clone());
    manager.load_all(collection_plugins());
    manager.load_all(builtin_plugins(
        SliceDefaults::default(),
        ExportOptions::default(),
    ));
    (core, manager)
}

fn populate(core: &Core) {
    core.collection::<Tool>()
        .unwrap()
        .add(Tool::new("T1", 1, ToolShape::FlatBottom, 1.0), None)
        .unwrap();
    core.collection::<Process>()
        .unwrap()
        .add(
            Process::new("rough", "slice").with_parameter("step_down", json!(1.0)),
            None,
        )
        .unwrap();
    core.collection::<Boundary>()
        .unwrap()
        .add(
            Boundary::absolute("stock", Point::new(0.0, 0.0, -2.0), Point::new(6.0, 4.0, 0.0)),
            None,
        )
        .unwrap();
    let ramp = Mesh::new(vec![Triangle::new(
        Point::new(-5.0, -5.0, -1.5),
        Point::new(20.0, -5.0, -1.5),
        Point::new(-5.0, 20.0, -1.5),
    )]);
    core.collection::<Model>()
        .unwrap()
        .add(Model::from_mesh("floor", ramp), None)
        .unwrap();
}

fn task(models: &[&str]) -> Task {
    let mut task = Task::new("job").bound_to("T1", "rough", "stock");
    task.collision_models = models.iter().map(|m| m.to_string()).collect();
    task
}

#[test]
fn test_milling_generates_toolpath() {
    let (core, _manager) = environment();
    populate(&core);
    let path = core.run_task(&task(&["floor"]), None).unwrap();

    assert!(path.cut_count() > 0);
    assert!(path
        .moves()
        .iter()
        .filter(|m| m.kind == MoveKind::Cut)
        .all(|m| m.position.z >= -1.5 - 1e-9 && m.position.z <= 0.0));
    assert_eq!(path.tool().tool_id, 1);
    assert_eq!(path.filters()[0], ToolpathFilter::SelectTool(1));
    assert!(path.filters().contains(&ToolpathFilter::SafetyHeight(25.0)));
}

#[test]
fn test_milling_without_models_still_generates() {
    let (core, _manager) = environment();
    populate(&core);
    let path = core.run_task(&task(&[]), None).unwrap();
    assert!(path
        .moves()
        .iter()
        .filter(|m| m.kind == MoveKind::Cut)
        .any(|m| m.position.z == -2.0));
}

#[test]
fn test_unbound_task_yields_nothing() {
    let (core, _manager) = environment();
    populate(&core);
    let mut unbound = task(&["floor"]);
    unbound.tool = None;
    assert!(core.run_task(&unbound, None).is_none());

    let mut dangling = task(&["floor"]);
    dangling.process = Some("missing".to_string());
    assert!(core.run_task(&dangling, None).is_none());
}

#[test]
fn test_invalid_bounds_yield_nothing() {
    let (core, _manager) = environment();
    populate(&core);
    let mut narrow = Boundary::absolute("narrow", Point::new(0.0, 0.0, -1.0), Point::new(1.0, 1.0, 0.0));
    narrow.tool_boundary = ToolBoundary::Inside;
    core.collection::<Boundary>()
        .unwrap()
        .add(narrow, None)
        .unwrap();
    let mut job = task(&["floor"]);
    job.bounds = Some("narrow".to_string());
    assert!(core.run_task(&job, None).is_none());
}

#[test]
fn test_margins_without_models_yield_nothing() {
    let (core, _manager) = environment();
    populate(&core);
    core.collection::<Boundary>()
        .unwrap()
        .add(
            Boundary::margins("around", Point::new(1.0, 1.0, 0.0), Point::new(1.0, 1.0, 0.0)),
            None,
        )
        .unwrap();
    let mut job = task(&[]);
    job.bounds = Some("around".to_string());
    assert!(core.run_task(&job, None).is_none());

    job.collision_models = vec!["floor".to_string()];
    assert!(core.run_task(&job, None).is_some());
}

#[test]
fn test_unloading_slice_purges_dependants() {
    let (core, mut manager) = environment();
    populate(&core);
    core.collection::<Task>()
        .unwrap()
        .add(task(&["floor"]), None)
        .unwrap();

    manager.unload("ProcessStrategySlice").unwrap();
    assert!(!core.strategies().contains(PROCESS_KIND, "slice"));
    assert!(core.collection::<Process>().unwrap().is_empty());
    assert!(core.collection::<Task>().unwrap().is_empty());
}

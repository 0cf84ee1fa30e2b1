use camflow_core::{
    collection_plugins, BoundBox, CollectionItem, Core, MotionGrid, PathGenerator, PluginManager,
    Process, ProcessStrategy, ProgressCallback, StrategyRecord, Task, TaskEnvironment, TaskRunner,
    Toolpath, PROCESS_KIND, TASK_KIND,
};
use std::rc::Rc;

struct Idle;

impl ProcessStrategy for Idle {
    fn plan(
        &self,
        _process: &Process,
        _tool_radius: f64,
        _bounds: &BoundBox,
    ) -> Option<(Box<dyn PathGenerator>, MotionGrid)> {
        None
    }
}

impl TaskRunner for Idle {
    fn run(
        &self,
        _core: &Core,
        _environment: &TaskEnvironment,
        _progress: Option<ProgressCallback>,
    ) -> Option<Toolpath> {
        None
    }
}

fn setup() -> (Rc<Core>, PluginManager) {
    let core = Rc::new(Core::new());
    let mut manager = PluginManager::new(core.clone());
    manager.load_all(collection_plugins());
    core.register_strategy(PROCESS_KIND, StrategyRecord::process("slice", "Slice", Rc::new(Idle)))
        .unwrap();
    core.register_strategy(PROCESS_KIND, StrategyRecord::process("engrave", "Engrave", Rc::new(Idle)))
        .unwrap();
    core.register_strategy(TASK_KIND, StrategyRecord::task("milling", "Milling", Rc::new(Idle)))
        .unwrap();
    (core, manager)
}

#[test]
fn test_processes_purged_when_strategy_disappears() {
    let (core, _manager) = setup();
    let processes = core.collection::<Process>().unwrap();
    processes.add(Process::new("rough", "slice"), None).unwrap();
    processes.add(Process::new("text", "engrave"), None).unwrap();
    processes.add(Process::new("finish", "slice"), None).unwrap();

    core.unregister_strategy(PROCESS_KIND, "slice").unwrap();
    assert_eq!(processes.names(), vec!["text"]);
}

#[test]
fn test_tasks_purged_with_their_strategy_or_process() {
    let (core, _manager) = setup();
    let processes = core.collection::<Process>().unwrap();
    processes.add(Process::new("rough", "slice"), None).unwrap();
    processes.add(Process::new("text", "engrave"), None).unwrap();
    let tasks = core.collection::<Task>().unwrap();
    tasks
        .add(Task::new("a").bound_to("T", "rough", "B"), None)
        .unwrap();
    tasks
        .add(Task::new("b").bound_to("T", "text", "B"), None)
        .unwrap();

    core.unregister_strategy(PROCESS_KIND, "slice").unwrap();
    assert_eq!(tasks.names(), vec!["b"]);

    core.unregister_strategy(TASK_KIND, "milling").unwrap();
    assert!(tasks.is_empty());
    assert!(tasks
        .get_all()
        .iter()
        .all(|t| core.strategies().contains(TASK_KIND, &t.task_type)));
    assert_eq!(processes.get_by_name("text").unwrap().name(), "text");
}

#[test]
fn test_strategies_listed_by_weight() {
    let core = Core::new();
    core.register_strategy(PROCESS_KIND, StrategyRecord::process("late", "Late", Rc::new(Idle)).with_weight(50))
        .unwrap();
    core.register_strategy(PROCESS_KIND, StrategyRecord::process("early", "Early", Rc::new(Idle)).with_weight(5))
        .unwrap();
    assert_eq!(core.strategies().names(PROCESS_KIND), vec!["early", "late"]);
}

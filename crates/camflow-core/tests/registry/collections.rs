use camflow_core::{
    collection_plugins, CollectionItem, Core, Model, PluginManager, Tool, ToolShape,
};
use std::rc::Rc;

fn loaded_core() -> (Rc<Core>, PluginManager) {
    let core = Rc::new(Core::new());
    let mut manager = PluginManager::new(core.clone());
    manager.load_all(collection_plugins());
    (core, manager)
}

#[test]
fn test_generated_name_skips_existing() {
    let (core, _manager) = loaded_core();
    let models = core.collection::<Model>().unwrap();
    models
        .add(Model::from_mesh("", Default::default()), Some("Model #1"))
        .unwrap();
    let name = models
        .add(Model::from_mesh("", Default::default()), None)
        .unwrap();
    assert_eq!(name, "Model #2");
}

#[test]
fn test_collections_are_shared_through_namespace() {
    let (core, _manager) = loaded_core();
    core.collection::<Tool>()
        .unwrap()
        .add(Tool::new("T1", 1, ToolShape::FlatBottom, 2.0), None)
        .unwrap();
    let again = core.collection::<Tool>().unwrap();
    assert_eq!(again.get_by_name("T1").unwrap().name(), "T1");
}

#[test]
fn test_unloading_removes_collection() {
    let (core, mut manager) = loaded_core();
    manager.unload("Toolpaths").unwrap();
    assert!(core.collection::<camflow_core::Toolpath>().is_err());
    assert!(core.collection::<Tool>().is_ok());
}

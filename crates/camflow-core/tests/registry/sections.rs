use camflow_core::{shared, shared_any, ContributionOptions, SectionRegistry, SharedAny};
use proptest::prelude::*;
use std::rc::Rc;

fn recording_section(registry: &SectionRegistry, name: &str) -> Rc<std::cell::RefCell<Vec<String>>> {
    let rendered = shared(Vec::new());
    let (add_sink, clear_sink) = (rendered.clone(), rendered.clone());
    registry.register_section(
        name,
        Rc::new(move |_: &SharedAny, label: &str, _: &ContributionOptions| {
            add_sink.borrow_mut().push(label.to_string())
        }),
        Rc::new(move || clear_sink.borrow_mut().clear()),
    );
    rendered
}

#[test]
fn test_rebuild_orders_by_weight_then_insertion() {
    let registry = SectionRegistry::new();
    let rendered = recording_section(&registry, "main");
    let contributions = [("a", 10), ("b", 5), ("c", 10)];
    for (label, weight) in contributions {
        registry
            .contribute("main", label, shared_any(label), weight, ContributionOptions::new())
            .unwrap();
    }
    assert_eq!(*rendered.borrow(), vec!["b", "a", "c"]);
}

#[test]
fn test_same_object_rejected() {
    let registry = SectionRegistry::new();
    let rendered = recording_section(&registry, "main");
    let object = shared_any(1u8);
    registry
        .contribute("main", "once", object.clone(), 1, ContributionOptions::new())
        .unwrap();
    assert!(registry
        .contribute("main", "twice", object.clone(), 2, ContributionOptions::new())
        .is_err());
    assert_eq!(*rendered.borrow(), vec!["once"]);

    assert_eq!(registry.withdraw("main", &object), 1);
    assert!(rendered.borrow().is_empty());
}

#[test]
fn test_late_registration_renders_earlier_contributions() {
    let registry = SectionRegistry::new();
    registry
        .contribute("late", "x", shared_any("x"), 3, ContributionOptions::new())
        .unwrap();
    registry
        .contribute("late", "y", shared_any("y"), 1, ContributionOptions::new())
        .unwrap();
    let rendered = recording_section(&registry, "late");
    assert_eq!(*rendered.borrow(), vec!["y", "x"]);
}

proptest! {
    #[test]
    fn prop_rebuild_is_stable_weight_sort(weights in proptest::collection::vec(-5i32..5, 0..24)) {
        let registry = SectionRegistry::new();
        let rendered = recording_section(&registry, "s");
        for (index, weight) in weights.iter().enumerate() {
            registry
                .contribute("s", index.to_string(), shared_any(index), *weight, ContributionOptions::new())
                .unwrap();
        }
        let mut expected: Vec<(i32, usize)> = weights.iter().copied().zip(0..).collect();
        expected.sort_by_key(|(weight, _)| *weight);
        let expected: Vec<String> = expected.iter().map(|(_, index)| index.to_string()).collect();
        prop_assert_eq!(rendered.borrow().clone(), expected);
    }
}

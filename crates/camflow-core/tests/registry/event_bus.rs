use camflow_core::{shared, EmitOutcome, EventBus, EventHandler, EventPayload};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[test]
fn test_reentrant_emission_is_dropped() {
    let bus = Rc::new(EventBus::new());
    let calls = shared(0usize);
    let inner_outcome = shared(None);

    let weak: Weak<EventBus> = Rc::downgrade(&bus);
    let (count, outcome) = (calls.clone(), inner_outcome.clone());
    let handler: EventHandler = Rc::new(move |_| {
        *count.borrow_mut() += 1;
        if let Some(bus) = weak.upgrade() {
            *outcome.borrow_mut() = Some(bus.emit("E"));
        }
    });
    bus.subscribe("E", handler);

    assert_eq!(bus.emit("E"), EmitOutcome::Delivered(1));
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(*inner_outcome.borrow(), Some(EmitOutcome::Blocked));
    assert!(!bus.is_blocked("E"));

    // a later emission runs again
    bus.emit("E");
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn test_transitive_reentrancy_is_dropped() {
    let bus = Rc::new(EventBus::new());
    let log = shared(Vec::new());

    let (weak, sink) = (Rc::downgrade(&bus), log.clone());
    let on_a: EventHandler = Rc::new(move |_| {
        sink.borrow_mut().push("a");
        if let Some(bus) = weak.upgrade() {
            bus.emit("B");
        }
    });
    let (weak, sink) = (Rc::downgrade(&bus), log.clone());
    let on_b: EventHandler = Rc::new(move |_| {
        sink.borrow_mut().push("b");
        if let Some(bus) = weak.upgrade() {
            bus.emit("A");
        }
    });
    bus.subscribe("A", on_a);
    bus.subscribe("B", on_b);

    bus.emit("A");
    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

#[test]
fn test_explicit_block_suppresses_until_unblocked() {
    let bus = EventBus::new();
    let calls = shared(0usize);
    let count = calls.clone();
    let handler: EventHandler = Rc::new(move |_| *count.borrow_mut() += 1);
    bus.subscribe("process-control-changed", handler);

    bus.block("process-control-changed");
    bus.block("process-control-changed");
    assert_eq!(bus.emit("process-control-changed"), EmitOutcome::Blocked);
    bus.unblock("process-control-changed");
    assert_eq!(bus.emit("process-control-changed"), EmitOutcome::Blocked);
    bus.unblock("process-control-changed");
    assert!(bus.emit("process-control-changed").is_delivered());
    assert_eq!(*calls.borrow(), 1);

    // extra unblocks and unknown events are harmless
    bus.unblock("process-control-changed");
    bus.unblock("never-subscribed");
    bus.block("never-subscribed");
    assert_eq!(bus.emit("never-subscribed"), EmitOutcome::Unregistered);
}

#[test]
fn test_handlers_run_in_registration_order_with_payload() {
    let bus = EventBus::new();
    let log: Rc<RefCell<Vec<String>>> = shared(Vec::new());
    for tag in ["first", "second", "third"] {
        let sink = log.clone();
        let handler: EventHandler = Rc::new(move |payload: &EventPayload| {
            sink.borrow_mut()
                .push(format!("{}:{}", tag, payload.name().unwrap_or("-")))
        });
        bus.subscribe("tool-changed", handler);
    }
    bus.emit_with("tool-changed", EventPayload::Name("T1".to_string()));
    assert_eq!(
        *log.borrow(),
        vec!["first:T1", "second:T1", "third:T1"]
    );
}

#[test]
fn test_handler_unsubscribing_during_emission() {
    let bus = Rc::new(EventBus::new());
    let calls = shared(0usize);
    let slot: Rc<RefCell<Option<EventHandler>>> = shared(None);

    let (weak, count, me) = (Rc::downgrade(&bus), calls.clone(), slot.clone());
    let handler: EventHandler = Rc::new(move |_| {
        *count.borrow_mut() += 1;
        if let (Some(bus), Some(handler)) = (weak.upgrade(), me.borrow().clone()) {
            bus.unsubscribe("once", &handler);
        }
    });
    *slot.borrow_mut() = Some(handler.clone());
    bus.subscribe("once", handler);

    bus.emit("once");
    bus.emit("once");
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(bus.subscriber_count("once"), 0);
    // break the handler's reference to itself
    slot.borrow_mut().take();
}

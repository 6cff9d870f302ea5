//! Integration tests for plain-listener dispatch.
//!
//! Covers:
//! - registration and queries
//! - priority ordering and tie-breaking
//! - halting, first-response and stop-propagation semantics
//! - parameter forwarding
//! - reentrant use of the dispatcher from inside a listener
//! - listener failures and custom event factories

use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tidings_dispatch::testing::{CallLog, MockListener};
use tidings_dispatch::{
    Callable, DispatchArgs, DispatchError, Dispatcher, DispatcherConfig, ErrorCode, Event,
    EventTarget, ForwardMode,
};

// =============================================================================
// Test Fixtures
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("tidings_dispatch=trace")
        .try_init();
}

fn returning(value: Value) -> Callable {
    Callable::on_event(move |_e: &mut Event| value.clone())
}

fn counting(counter: &Arc<AtomicUsize>, value: Value) -> Callable {
    let counter = Arc::clone(counter);
    Callable::on_event(move |_e: &mut Event| {
        counter.fetch_add(1, Ordering::SeqCst);
        value.clone()
    })
}

// =============================================================================
// Registration & Queries
// =============================================================================

mod registration {
    use super::*;

    #[test]
    fn has_listener_after_add() {
        let d = Dispatcher::new();
        assert!(!d.has_listener("test"));
        d.add_listener("test", returning(json!(1))).unwrap();
        assert!(d.has_listener("test"));
        assert!(!d.has_listener("other"));
    }

    #[test]
    fn listeners_for_event_in_registration_order() {
        let d = Dispatcher::new();
        let a = d.add_listener("test", returning(json!("a"))).unwrap();
        let b = d.add_listener_with_priority("test", returning(json!("b")), 50).unwrap();
        let ids: Vec<_> = d
            .listeners_for_event("test")
            .iter()
            .map(|desc| desc.listener_id())
            .collect();
        assert_eq!(ids, vec![a, b]);
        assert!(d.listeners_for_event("missing").is_empty());
    }

    #[test]
    fn descriptors_carry_type_and_priority() {
        let d = Dispatcher::new();
        d.add_listener_with_priority("test", returning(json!(1)), -3).unwrap();
        let desc = &d.listeners_for_event("test")[0];
        assert_eq!(desc.type_or_pattern(), "test");
        assert_eq!(desc.priority(), -3);
        assert!(desc.listener().as_callable().is_some());
    }

    #[test]
    fn all_listeners_flat_and_structured() {
        let d = Dispatcher::new();
        d.add_listener("b", returning(json!(1))).unwrap();
        d.add_listener("a", returning(json!(2))).unwrap();
        d.add_listener("b", returning(json!(3))).unwrap();

        let types: Vec<_> = d
            .all_listeners()
            .iter()
            .map(|desc| desc.type_or_pattern().to_string())
            .collect();
        assert_eq!(types, vec!["b", "b", "a"]);

        let structured = d.all_listeners_structured();
        assert_eq!(structured.len(), 2);
        assert_eq!(structured["b"].len(), 2);
        assert_eq!(structured["a"].len(), 1);
    }

    #[test]
    fn remove_listener_then_dispatch_is_none() {
        let d = Dispatcher::new();
        let listener = returning(json!("x"));
        d.add_listener("test", listener.clone()).unwrap();
        assert!(d.remove_listener("test", &listener).unwrap());
        assert_eq!(d.dispatch("test").unwrap(), None);
        assert!(!d.remove_listener("test", &listener).unwrap());
    }

    #[test]
    fn remove_listener_removes_every_registration_of_identity() {
        let d = Dispatcher::new();
        let listener = returning(json!("dup"));
        let other = returning(json!("other"));
        d.add_listener("test", listener.clone()).unwrap();
        d.add_listener_with_priority("test", listener.clone(), 9).unwrap();
        d.add_listener("test", other).unwrap();

        assert!(d.remove_listener("test", &listener).unwrap());
        assert_eq!(d.dispatch("test").unwrap(), Some(vec![json!("other")]));
    }

    #[test]
    fn remove_listeners_for_event_returns_count() {
        let d = Dispatcher::new();
        for i in 0..3 {
            d.add_listener("test", returning(json!(i))).unwrap();
        }
        d.add_listener("keep", returning(json!("k"))).unwrap();

        assert_eq!(d.remove_listeners_for_event("test"), 3);
        assert!(!d.has_listener("test"));
        assert!(d.has_listener("keep"));
        assert_eq!(d.remove_listeners_for_event("test"), 0);
    }

    #[test]
    fn remove_all_listeners_empties() {
        let d = Dispatcher::new();
        d.add_listener("a", returning(json!(1))).unwrap();
        d.add_listener("b", returning(json!(2))).unwrap();
        d.remove_all_listeners();
        assert!(d.is_empty());
        assert!(d.all_listeners().is_empty());
    }
}

// =============================================================================
// Dispatch & Ordering
// =============================================================================

mod ordering {
    use super::*;

    #[test]
    fn zero_listeners_is_none() {
        let d = Dispatcher::new();
        assert_eq!(d.dispatch("test").unwrap(), None);
        assert_eq!(d.dispatch_until("test").unwrap(), None);
        assert_eq!(d.dispatch_get_first("test").unwrap(), None);
    }

    #[test]
    fn two_default_listeners_two_responses() {
        let d = Dispatcher::new();
        d.add_listener("test", returning(json!("a"))).unwrap();
        d.add_listener("test", returning(json!("b"))).unwrap();
        assert_eq!(
            d.dispatch("test").unwrap(),
            Some(vec![json!("a"), json!("b")])
        );
    }

    #[test]
    fn higher_priority_first_regardless_of_registration() {
        for reversed in [false, true] {
            let d = Dispatcher::new();
            let mut entries = vec![(100, "high"), (-100, "low")];
            if reversed {
                entries.reverse();
            }
            for (priority, name) in entries {
                d.add_listener_with_priority("test", returning(json!(name)), priority)
                    .unwrap();
            }
            assert_eq!(
                d.dispatch("test").unwrap(),
                Some(vec![json!("high"), json!("low")])
            );
        }
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        init_tracing();
        let d = Dispatcher::new();
        let log = CallLog::new();
        let mocks = ["a", "b", "c"].map(|n| MockListener::returning(n, json!(n)).with_log(&log));
        for mock in &mocks {
            mock.register(&d, "test").unwrap();
        }
        d.dispatch("test").unwrap();
        assert_eq!(log.entries(), vec!["a", "b", "c"]);
    }

    #[test]
    fn get_first_runs_full_cycle() {
        let d = Dispatcher::new();
        let low = MockListener::returning("low", json!("low")).with_priority(-1);
        let high = MockListener::returning("high", json!(null)).with_priority(5);
        low.register(&d, "test").unwrap();
        high.register(&d, "test").unwrap();

        assert_eq!(d.dispatch_get_first("test").unwrap(), Some(json!(null)));
        assert_eq!(low.calls(), 1);
        assert_eq!(high.calls(), 1);
    }

    proptest! {
        #[test]
        fn dispatch_order_is_priority_descending_then_registration(
            priorities in proptest::collection::vec(-5i32..5, 1..12)
        ) {
            let d = Dispatcher::new();
            for (index, priority) in priorities.iter().enumerate() {
                d.add_listener_with_priority(
                    "test",
                    returning(json!([priority, index])),
                    *priority,
                )
                .unwrap();
            }

            let mut expected: Vec<(i32, usize)> =
                priorities.iter().copied().zip(0..).collect();
            expected.sort_by(|a, b| b.0.cmp(&a.0));
            let expected: Vec<Value> = expected
                .into_iter()
                .map(|(priority, index)| json!([priority, index]))
                .collect();

            prop_assert_eq!(d.dispatch("test").unwrap(), Some(expected));
        }
    }
}

// =============================================================================
// Halting & Propagation
// =============================================================================

mod halting {
    use super::*;

    #[test]
    fn until_stops_at_first_truthy_response() {
        let d = Dispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));
        d.add_listener_with_priority("test", counter_returning_null(&counter), 10)
            .unwrap();
        d.add_listener_with_priority("test", counting(&counter, json!("winner")), 5)
            .unwrap();
        let late = MockListener::returning("late", json!("late")).with_priority(1);
        late.register(&d, "test").unwrap();

        assert_eq!(d.dispatch_until("test").unwrap(), Some(json!("winner")));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(late.calls(), 0);
    }

    fn counter_returning_null(counter: &Arc<AtomicUsize>) -> Callable {
        counting(counter, Value::Null)
    }

    #[test]
    fn until_treats_zero_and_empty_string_as_responses() {
        let d = Dispatcher::new();
        d.add_listener("zero", returning(json!(0))).unwrap();
        assert_eq!(d.dispatch_until("zero").unwrap(), Some(json!(0)));

        d.add_listener("empty", returning(json!(""))).unwrap();
        assert_eq!(d.dispatch_until("empty").unwrap(), Some(json!("")));
    }

    #[test]
    fn stop_propagation_halts_cancelable_event() {
        let d = Dispatcher::new();
        let stopper = MockListener::stopper("stop", json!("stopped")).with_priority(10);
        let after = MockListener::returning("after", json!("after"));
        stopper.register(&d, "test").unwrap();
        after.register(&d, "test").unwrap();

        assert_eq!(d.dispatch("test").unwrap(), Some(vec![json!("stopped")]));
        assert_eq!(after.calls(), 0);
    }

    #[test]
    fn stop_propagation_ignored_when_not_cancelable() {
        let d = Dispatcher::new();
        let stopper = MockListener::stopper("stop", json!("stopped")).with_priority(10);
        let after = MockListener::returning("after", json!("after"));
        stopper.register(&d, "test").unwrap();
        after.register(&d, "test").unwrap();

        let event = Event::new("test").with_cancelable(false);
        assert_eq!(
            d.dispatch(event).unwrap(),
            Some(vec![json!("stopped"), json!("after")])
        );
        assert_eq!(after.calls(), 1);
    }

    #[test]
    fn pre_stopped_event_runs_nothing() {
        let d = Dispatcher::new();
        let mock = MockListener::returning("m", json!(1));
        mock.register(&d, "test").unwrap();

        let mut event = Event::new("test");
        event.stop_propagation();
        assert_eq!(d.dispatch_event(&mut event, ForwardMode::PassEvent).unwrap(), None);
        assert_eq!(mock.calls(), 0);
    }
}

// =============================================================================
// Event Resolution
// =============================================================================

mod resolution {
    use super::*;

    #[test]
    fn type_string_builds_bare_event() {
        let d = Dispatcher::new();
        d.add_listener(
            "test",
            Callable::on_event(|e: &mut Event| {
                json!({
                    "type": e.event_type(),
                    "has_target": e.target().is_some(),
                    "params": e.params(),
                })
            }),
        )
        .unwrap();
        assert_eq!(
            d.dispatch_get_first("test").unwrap(),
            Some(json!({"type": "test", "has_target": false, "params": null}))
        );
    }

    #[test]
    fn caller_event_is_passed_through() {
        struct Caller;
        let d = Dispatcher::new();
        d.add_listener(
            "test",
            Callable::on_event(|e: &mut Event| {
                json!([
                    e.target().and_then(|t| t.downcast_ref::<Caller>()).is_some(),
                    e.params(),
                    e.is_cancelable(),
                ])
            }),
        )
        .unwrap();

        let event = Event::new("test")
            .with_target(EventTarget::handle(Caller))
            .with_params(json!([1, 2]))
            .with_cancelable(false);
        assert_eq!(
            d.dispatch_get_first(event).unwrap(),
            Some(json!([true, [1, 2], false]))
        );
    }

    #[test]
    fn args_fill_target_and_params() {
        let d = Dispatcher::new();
        d.add_listener(
            "test",
            Callable::on_event(|e: &mut Event| {
                json!([e.target().and_then(EventTarget::as_name), e.param("user")])
            }),
        )
        .unwrap();

        let out = d
            .dispatch_get_first_with(
                "test",
                DispatchArgs::new()
                    .with_target("UserRepo::save")
                    .with_params(json!({"user": "ada"})),
            )
            .unwrap();
        assert_eq!(out, Some(json!(["UserRepo::save", "ada"])));
    }

    #[test]
    fn listeners_mutate_shared_event() {
        let d = Dispatcher::new();
        d.add_listener_with_priority(
            "test",
            Callable::try_on_event(|e: &mut Event| e.set_param("seen", true).map(|_| Value::Null)),
            10,
        )
        .unwrap();

        let mut event = Event::new("test").with_params(json!({}));
        d.dispatch_event(&mut event, ForwardMode::PassEvent).unwrap();
        assert_eq!(event.param("seen"), Some(&json!(true)));
    }

    #[test]
    fn custom_factory_stamps_metadata() {
        let d = Dispatcher::new();
        d.set_event_factory(|event_type: &str| {
            Event::new(event_type).with_metadata("factory", "audit")
        });
        d.add_listener(
            "test",
            Callable::on_event(|e: &mut Event| e.metadata().get("factory").cloned()),
        )
        .unwrap();

        assert_eq!(d.dispatch_get_first("test").unwrap(), Some(json!("audit")));

        // caller-built events bypass the factory
        let out = d.dispatch_get_first(Event::new("test")).unwrap();
        assert_eq!(out, Some(Value::Null));
    }

    #[test]
    fn empty_type_fails_fast() {
        let d = Dispatcher::new();
        let err = d.dispatch_until("").unwrap_err();
        assert_eq!(err.code(), "DISPATCH_INVALID_ARGUMENT");
    }
}

// =============================================================================
// Forwarding
// =============================================================================

mod forwarding {
    use super::*;

    #[test]
    fn params_listener_receives_unpacked_sequence() {
        let d = Dispatcher::new();
        d.add_listener(
            "sum",
            Callable::on_params(|args: &[Value]| args.iter().filter_map(Value::as_i64).sum::<i64>()),
        )
        .unwrap();
        let out = d
            .dispatch_get_first_with("sum", DispatchArgs::new().with_params(json!([1, 2, 3])))
            .unwrap();
        assert_eq!(out, Some(json!(6)));
    }

    #[test]
    fn params_mode_is_sticky_for_rest_of_cycle() {
        let d = Dispatcher::new();
        let events_seen = Arc::new(AtomicUsize::new(0));

        // runs first, in event mode
        d.add_listener_with_priority("test", counting(&events_seen, json!("event-1")), 30)
            .unwrap();
        // switches the cycle to params
        d.add_listener_with_priority(
            "test",
            Callable::on_params(|args: &[Value]| json!(args.len())),
            20,
        )
        .unwrap();
        // event-only listener after the switch still gets the event
        d.add_listener_with_priority("test", counting(&events_seen, json!("event-2")), 10)
            .unwrap();
        // raw listener observes the params it is handed
        d.add_listener_with_priority(
            "test",
            Callable::new(|args| match args {
                tidings_dispatch::Args::Params(p) => json!(["params", p.len()]),
                tidings_dispatch::Args::Event(_) => json!("event"),
            }),
            0,
        )
        .unwrap();

        let out = d
            .dispatch_with("test", DispatchArgs::new().with_params(json!(["a", "b"])))
            .unwrap();
        assert_eq!(
            out,
            Some(vec![
                json!("event-1"),
                json!(2),
                json!("event-2"),
                json!(["params", 2])
            ])
        );
        assert_eq!(events_seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn explicit_params_mode_runs_every_listener() {
        let d = Dispatcher::new();
        d.add_listener_with_priority("t", Callable::on_params(|args: &[Value]| args.len()), 10)
            .unwrap();
        d.add_listener("t", Callable::on_event(|e: &mut Event| e.param_or("1", 0)))
            .unwrap();
        let out = d
            .dispatch_with(
                "t",
                DispatchArgs::new()
                    .with_params(json!([1, 2]))
                    .with_forward(ForwardMode::PassParams),
            )
            .unwrap();
        assert_eq!(out, Some(vec![json!(2), json!(2)]));
    }

    #[test]
    fn configured_default_mode_applies() {
        let d = Dispatcher::with_config(DispatcherConfig {
            forward_mode: ForwardMode::PassParams,
            ..DispatcherConfig::default()
        });
        d.add_listener(
            "test",
            Callable::new(|args| matches!(args, tidings_dispatch::Args::Params(_))),
        )
        .unwrap();
        assert_eq!(d.dispatch_get_first("test").unwrap(), Some(json!(true)));

        let out = d
            .dispatch_get_first_with(
                "test",
                DispatchArgs::new().with_forward(ForwardMode::PassEvent),
            )
            .unwrap();
        assert_eq!(out, Some(json!(false)));
    }

    #[test]
    fn map_params_forward_as_single_value() {
        let d = Dispatcher::new();
        d.add_listener("test", Callable::on_params(|args: &[Value]| args.to_vec()))
            .unwrap();
        let out = d
            .dispatch_get_first_with("test", DispatchArgs::new().with_params(json!({"k": 1})))
            .unwrap();
        assert_eq!(out, Some(json!([{"k": 1}])));
    }
}

// =============================================================================
// Reentrancy
// =============================================================================

mod reentrancy {
    use super::*;

    #[test]
    fn registration_during_dispatch_applies_next_cycle() {
        let d = Arc::new(Dispatcher::new());
        let weak: Weak<Dispatcher> = Arc::downgrade(&d);
        d.add_listener(
            "test",
            Callable::on_event(move |_e: &mut Event| {
                if let Some(d) = weak.upgrade() {
                    d.add_listener("test", returning(json!("late"))).unwrap();
                }
                "registrar"
            }),
        )
        .unwrap();

        assert_eq!(d.dispatch("test").unwrap(), Some(vec![json!("registrar")]));
        assert_eq!(d.listeners_for_event("test").len(), 2);
        assert_eq!(
            d.dispatch("test").unwrap(),
            Some(vec![json!("registrar"), json!("late")])
        );
    }

    #[test]
    fn removal_during_dispatch_does_not_affect_running_cycle() {
        let d = Arc::new(Dispatcher::new());
        let victim = MockListener::returning("victim", json!("victim"));
        let weak = Arc::downgrade(&d);
        let victim_callable = victim.callable();
        d.add_listener_with_priority(
            "test",
            Callable::on_event(move |_e: &mut Event| {
                if let Some(d) = weak.upgrade() {
                    d.remove_listener("test", &victim_callable).unwrap();
                }
                "remover"
            }),
            10,
        )
        .unwrap();
        victim.register(&d, "test").unwrap();

        assert_eq!(
            d.dispatch("test").unwrap(),
            Some(vec![json!("remover"), json!("victim")])
        );
        assert_eq!(victim.calls(), 1);
        assert_eq!(d.dispatch("test").unwrap(), Some(vec![json!("remover")]));
    }

    #[test]
    fn nested_dispatch_from_listener() {
        let d = Arc::new(Dispatcher::new());
        d.add_listener("inner", returning(json!("inner"))).unwrap();
        let weak = Arc::downgrade(&d);
        d.add_listener(
            "outer",
            Callable::try_on_event(move |_e: &mut Event| {
                let d = weak.upgrade().ok_or("dispatcher dropped")?;
                let inner = d.dispatch_get_first("inner")?;
                Ok::<_, tidings_dispatch::BoxError>(json!({"nested": inner}))
            }),
        )
        .unwrap();

        assert_eq!(
            d.dispatch_get_first("outer").unwrap(),
            Some(json!({"nested": "inner"}))
        );
    }
}

// =============================================================================
// Failures
// =============================================================================

mod failures {
    use super::*;

    #[test]
    fn failing_listener_aborts_cycle() {
        let d = Dispatcher::new();
        let failing = MockListener::failing("bad", "database unavailable").with_priority(10);
        let after = MockListener::returning("after", json!("after"));
        let failing_id = failing.register(&d, "test").unwrap();
        after.register(&d, "test").unwrap();

        let err = d.dispatch("test").unwrap_err();
        match &err {
            DispatchError::ListenerFailed {
                event_type,
                listener,
                source,
            } => {
                assert_eq!(event_type, "test");
                assert_eq!(*listener, failing_id);
                assert_eq!(source.to_string(), "database unavailable");
            }
            other => panic!("expected ListenerFailed, got {other:?}"),
        }
        assert!(err.is_recoverable());
        assert_eq!(after.calls(), 0);
    }

    #[test]
    fn event_errors_inside_listener_propagate() {
        let d = Dispatcher::new();
        d.add_listener(
            "test",
            Callable::try_on_event(|e: &mut Event| e.set_param("k", 1).map(|_| Value::Null)),
        )
        .unwrap();
        let err = d.dispatch("test").unwrap_err();
        assert_eq!(err.code(), "DISPATCH_LISTENER_FAILED");
        assert!(err.to_string().contains("params not initialized"));
    }
}

#![no_main]

//! Fuzz target for the register / queue / init lifecycle
//!
//! Drives a container with an arbitrary mix of registrations, targets and
//! callbacks, then checks the init outcome against a simple model.

use arbitrary::Arbitrary;
use field_injector::{
    BoxError, BoxedSlot, Container, DiError, Field, Inject, SharedSlot, ValueSlot,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

trait Probe: Send + Sync {
    fn id(&self) -> u32;
}

#[derive(Clone, Debug, Default, PartialEq, Arbitrary)]
struct Payload {
    value: u32,
    data: Vec<u8>,
}

impl Probe for Payload {
    fn id(&self) -> u32 {
        self.value
    }
}

/// A target whose tags come from the fuzzer
#[derive(Default)]
struct Target {
    tags: [&'static str; 3],
    probe: Option<Arc<dyn Probe>>,
    payload: Option<Box<Payload>>,
    count: u32,
}

impl Inject for Target {
    fn fields(&mut self) -> Vec<Field<'_>> {
        let [probe, payload, count] = self.tags;
        vec![
            Field::new("probe", probe, SharedSlot::new(&mut self.probe)),
            Field::new("payload", payload, BoxedSlot::new(&mut self.payload)),
            Field::new("count", count, ValueSlot::new(&mut self.count)),
        ]
    }
}

const TAGS: [&str; 8] = ["api", "val", "key:a", "key:b", "key:", "key:a:b", "inject", ""];

#[derive(Debug, Arbitrary)]
enum Op {
    RegisterProbe(u32),
    RegisterPayload(Payload),
    RegisterCount(u32),
    RegisterToken(bool, u32),
    QueueTarget([u8; 3]),
    QueueValue,
    Callback(bool),
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    strict: bool,
    ops: Vec<Op>,
}

fuzz_target!(|scenario: Scenario| {
    let ops: Vec<Op> = scenario.ops.into_iter().take(64).collect();

    let mut targets: Vec<Target> = ops
        .iter()
        .filter_map(|op| match op {
            Op::QueueTarget(tags) => Some(Target {
                tags: tags.map(|t| TAGS[t as usize % TAGS.len()]),
                ..Target::default()
            }),
            _ => None,
        })
        .collect();
    let value_count = ops.iter().filter(|op| matches!(op, Op::QueueValue)).count();
    let mut values = vec![Payload::default(); value_count];
    let queued = targets.len() + value_count;

    let mut failing_callback = None;
    let mut callbacks = 0usize;

    let container = Container::builder().strict(scenario.strict).build();
    let mut targets_iter = targets.iter_mut();
    let mut values_iter = values.iter_mut();

    for op in &ops {
        match op {
            Op::RegisterProbe(id) => {
                container.register_api::<dyn Probe>(Arc::new(Payload {
                    value: *id,
                    data: Vec::new(),
                }));
            }
            Op::RegisterPayload(payload) => {
                container.register_value(payload.clone());
            }
            Op::RegisterCount(count) => {
                container.register_value(*count);
            }
            Op::RegisterToken(first, value) => {
                let token = if *first { "a" } else { "b" };
                container.register_token(token, *value);
            }
            Op::QueueTarget(_) => {
                if let Some(target) = targets_iter.next() {
                    container.resolve_fields(target);
                }
            }
            Op::QueueValue => {
                if let Some(value) = values_iter.next() {
                    container.resolve_value(value);
                }
            }
            Op::Callback(ok) => {
                let index = callbacks;
                callbacks += 1;
                if !ok && failing_callback.is_none() {
                    failing_callback = Some(index);
                }
                let ok = *ok;
                container.after_init(move || {
                    if ok {
                        Ok(())
                    } else {
                        Err::<(), BoxError>("callback failed".into())
                    }
                });
            }
        }
    }

    let pending = container.pending();
    assert_eq!(pending, queued);

    match container.init() {
        Ok(report) => {
            assert!(failing_callback.is_none());
            assert_eq!(report.callbacks, callbacks);
            assert!(!scenario.strict || report.is_complete());
            assert!(report.resolved + report.skipped + report.misses.len() <= pending * 3);
        }
        Err(DiError::Unresolved { misses }) => {
            assert!(scenario.strict);
            assert!(!misses.is_empty());
        }
        Err(DiError::AfterInit { index, .. }) => {
            assert_eq!(Some(index), failing_callback);
        }
        Err(other) => panic!("unexpected error: {other}"),
    }

    for target in &targets {
        if let Some(probe) = &target.probe {
            let _ = probe.id();
        }
    }
});

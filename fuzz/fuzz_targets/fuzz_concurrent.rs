#![no_main]

//! Fuzz target for concurrent registration and queueing
//!
//! Several threads register tokens and queue value targets against one
//! container; every registration must survive and every target must be
//! resolved by the single init.

use arbitrary::Arbitrary;
use field_injector::Container;
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;
use std::thread;

#[derive(Debug, Clone, Arbitrary)]
enum ThreadOp {
    RegisterToken(u8, u64),
    RegisterValue(u64),
    Queue,
    Contains(u8),
}

#[derive(Debug, Arbitrary)]
struct ConcurrentScenario {
    // Clamped to 1-8
    thread_count: u8,
    ops: Vec<ThreadOp>,
}

fuzz_target!(|scenario: ConcurrentScenario| {
    let thread_count = (scenario.thread_count % 8).max(1) as usize;
    let ops: Vec<ThreadOp> = scenario.ops.into_iter().take(32).collect();

    let queue_ops = ops.iter().filter(|op| matches!(op, ThreadOp::Queue)).count();
    let total = queue_ops * thread_count;
    let mut targets = vec![u64::MAX; total];
    let tokens: HashSet<u8> = ops
        .iter()
        .filter_map(|op| match op {
            ThreadOp::RegisterToken(token, _) => Some(*token),
            _ => None,
        })
        .collect();
    let registers_value = ops.iter().any(|op| matches!(op, ThreadOp::RegisterValue(_)));

    let container = Container::new();
    thread::scope(|s| {
        let mut chunks = targets.chunks_mut(queue_ops.max(1));
        for _ in 0..thread_count {
            let chunk = chunks.next().unwrap_or_default();
            let container = &container;
            let ops = &ops;
            s.spawn(move || {
                let mut slots = chunk.iter_mut();
                for op in ops {
                    match op {
                        ThreadOp::RegisterToken(token, value) => {
                            container.register_token(token.to_string(), *value);
                        }
                        ThreadOp::RegisterValue(value) => {
                            container.register_value(*value);
                        }
                        ThreadOp::Queue => {
                            if let Some(slot) = slots.next() {
                                container.resolve_value(slot);
                            }
                        }
                        ThreadOp::Contains(token) => {
                            let _ = container.contains_token(&token.to_string());
                        }
                    }
                }
            });
        }
    });

    assert_eq!(container.len(), tokens.len() + usize::from(registers_value));
    assert_eq!(container.pending(), total);
    for token in &tokens {
        assert!(container.contains_token(&token.to_string()));
    }

    let report = container.init().expect("lenient init without callbacks succeeds");
    if registers_value {
        assert_eq!(report.resolved, total);
    } else {
        assert_eq!(report.misses.len(), total);
    }

    if !registers_value {
        assert!(targets.iter().all(|&t| t == u64::MAX));
    }
});

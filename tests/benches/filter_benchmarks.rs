//! # Sieve Filter Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Redaction, 50-token body | < 10µs |
//! | Schema-tagged decode | < 5µs |
//! | Filter evaluate (decode + lookup + join) | < 20µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_bus::{InMemoryLog, Record};
use shared_types::topics::MESSAGES_BY_SENDER;
use shared_types::{CensorState, Message, RelationshipState, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use sv_01_event_codec::{Codec, SchemaTaggedCodec};
use sv_04_message_filter::{redact, MessageFilter};

const VOCABULARY: [&str; 8] = ["some", "text", "another", "test", "words", "bad", "ugly", "fine"];

fn random_body(tokens: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..tokens)
        .map(|_| VOCABULARY[rng.gen_range(0..VOCABULARY.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_redaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("sv-04-redaction");
    let denied: HashMap<&str, bool> = [("bad", true), ("ugly", true)].into_iter().collect();

    for tokens in [5, 50, 500] {
        let body = random_body(tokens);
        group.throughput(Throughput::Elements(tokens as u64));
        group.bench_with_input(BenchmarkId::from_parameter(tokens), &body, |b, body| {
            b.iter(|| redact(black_box(body), |w| denied.get(w).copied().unwrap_or(false)))
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let codec = SchemaTaggedCodec::<Message>::new(1);
    let message = Message::new(UserId(1), UserId(2), random_body(20));
    let bytes = codec.encode(&message).unwrap();

    c.bench_function("sv-01-schema-tagged-decode", |b| {
        b.iter(|| codec.decode(black_box(&bytes)).unwrap())
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let mut relationships: HashMap<String, RelationshipState> = HashMap::new();
    for actor in 1..=100i64 {
        let state = relationships.entry(actor.to_string()).or_default();
        state.blocked.insert(UserId(actor + 1));
    }
    let censor: HashMap<String, CensorState> = [("bad", true), ("ugly", true), ("fine", false)]
        .into_iter()
        .map(|(w, denied)| (w.to_string(), CensorState { denied }))
        .collect();

    let codec = SchemaTaggedCodec::<Message>::new(1);
    let filter = MessageFilter::new(
        Arc::new(InMemoryLog::new()),
        Arc::new(relationships),
        Arc::new(censor),
        Arc::new(codec.clone()),
    );
    let message = Message::new(UserId(1), UserId(3), random_body(30));
    let record = Record {
        topic: MESSAGES_BY_SENDER.to_string(),
        partition: 0,
        offset: 0,
        key: "1".to_string(),
        value: codec.encode(&message).unwrap(),
    };

    c.bench_function("sv-04-evaluate", |b| b.iter(|| filter.evaluate(black_box(&record))));
}

criterion_group!(benches, bench_redaction, bench_codec, bench_evaluate);
criterion_main!(benches);

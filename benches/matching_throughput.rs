use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use limit_engine_core::prelude::*;

fn place_request(uid: u64, order_id: u64, price: i64, size: i64, action: Action, kind: OrderKind) -> Vec<u8> {
    let mut buf = vec![CommandOpcode::Place as u8];
    buf.extend(uid.to_be_bytes());
    buf.extend(order_id.to_be_bytes());
    buf.extend(price.to_be_bytes());
    buf.extend(0i64.to_be_bytes());
    buf.extend(size.to_be_bytes());
    buf.extend(0u32.to_be_bytes());
    buf.push(action as u8);
    buf.push(kind as u8);
    buf
}

fn seed_book(engine: &MatchingEngine, levels: u64) {
    let mut out = [0u8; 64];
    for i in 0..levels {
        let req = place_request(1, i + 1, 1000 + i as i64, 10, Action::Ask, OrderKind::Gtc);
        dispatch(engine, &req, 0, i as i64, &mut out, 0).unwrap();
    }
}

fn bench_crossing_gtc(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossing_gtc");
    for levels in [10u64, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            b.iter_batched(
                || {
                    let engine = MatchingEngine::new(SymbolSpec::new("XYZ", false));
                    seed_book(&engine, levels);
                    engine
                },
                |engine| {
                    let req = place_request(2, 999_999, 1000 + levels as i64, 5, Action::Bid, OrderKind::Gtc);
                    let mut out = [0u8; 256];
                    dispatch(&engine, &req, 0, 0, &mut out, 0).unwrap();
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_crossing_gtc);
criterion_main!(benches);

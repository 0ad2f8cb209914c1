use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sigslot_core::{
    Args, Config, Construct, Emitter, PairRegistry, Publisher, Receiver, SignalDeclarations, Signals,
    SlotDeclarations, Value,
};

struct Person {
    signals: Signals<Person>,
    emitter: Emitter<Person>,
}

impl Publisher for Person {
    fn declare_signals(decl: &mut SignalDeclarations<Self>) {
        decl.signal("ready");
    }
}

#[derive(Default)]
struct Car {
    opened: AtomicUsize,
}

impl Receiver for Car {
    fn declare_slots(decl: &mut SlotDeclarations<Self>) {
        decl.slot("open_door", |car, args| {
            car.opened.fetch_add(args.len(), Ordering::Relaxed);
        });
    }
}

impl Construct for Car {
    fn construct(_config: &Config) -> Self {
        Car::default()
    }
}

fn arguments(arity: usize) -> Args {
    (0..arity).map(|i| Value::from(i as u64)).collect()
}

fn bench_live_fan_out(c: &mut Criterion) {
    let (signals, emitter) = Signals::new().unwrap();
    let person = Person { signals, emitter };

    // 100 receivers on one signal
    let cars: Vec<_> = (0..100).map(|_| Arc::new(Car::default())).collect();
    for car in &cars {
        person.signals.connect("ready", car, "open_door").unwrap();
    }

    let mut group = c.benchmark_group("Live fan-out (100 slots)");
    for arity in [0, 3, 6, 12] {
        let args = arguments(arity);
        group.bench_with_input(BenchmarkId::from_parameter(arity), &args, |b, args| {
            b.iter(|| {
                let emission = person.signals.emit(&person.emitter, "ready", args.clone()).unwrap();
                black_box(emission);
            });
        });
    }
    group.finish();
}

fn bench_lazy_construction(c: &mut Criterion) {
    let (signals, emitter) = Signals::new().unwrap();
    let person = Person { signals, emitter };
    for _ in 0..10 {
        person.signals.connect_lazy::<Car>("ready", "open_door", Config::new()).unwrap();
    }

    let mut group = c.benchmark_group("Lazy receivers (10 slots)");
    group.bench_function("construct per delivery", |b| {
        b.iter(|| {
            let emission = person.signals.emit(&person.emitter, "ready", arguments(3)).unwrap();
            black_box(emission);
        });
    });
    group.finish();
}

struct Rock;

impl Publisher for Rock {
    fn declare_signals(decl: &mut SignalDeclarations<Self>) {
        decl.signal("thrown");
    }
}

fn bench_registry(c: &mut Criterion) {
    let registry = PairRegistry::new();

    // Many publishers so lookups are not trivially the first entry
    let rocks: Vec<_> = (0..1_000).map(|_| Arc::new(Rock)).collect();
    let cars: Vec<_> = (0..10).map(|_| Arc::new(Car::default())).collect();
    for rock in &rocks {
        for car in &cars {
            registry.connect(rock, "thrown", car, "open_door").unwrap();
        }
    }
    let target = &rocks[rocks.len() / 2];

    let mut group = c.benchmark_group("Pair registry (10 slots)");
    for arity in [0, 3, 6, 12] {
        let args = arguments(arity);
        group.bench_with_input(BenchmarkId::from_parameter(arity), &args, |b, args| {
            b.iter(|| {
                let emission = registry.emit(&**target, "thrown", args.clone()).unwrap();
                black_box(emission);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_live_fan_out, bench_lazy_construction, bench_registry);
criterion_main!(benches);

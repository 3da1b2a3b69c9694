use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use slotwatch_core::{identity_of, MonitoredTarget, QueryDescriptor, RawSlot};
use slotwatch_engine::diff;
use slotwatch_store::DedupStore;
use std::hint::black_box;
use tempfile::TempDir;

fn target() -> MonitoredTarget {
    MonitoredTarget {
        display_name: "Dr Bench".to_string(),
        query: QueryDescriptor::from_url(
            "Dr Bench",
            "https://partners.doctolib.fr/availabilities.json?visit_motive_ids=1&agenda_ids=2&practice_ids=3",
        )
        .unwrap(),
    }
}

/// 100 days of half-hourly slots, 8 per day
fn snapshot() -> Vec<RawSlot> {
    let start = Utc::now().date_naive();
    (0..100u64)
        .flat_map(|day| {
            let date = start + chrono::Days::new(day);
            (0..8).map(move |slot| {
                RawSlot::new(format!("{}T{:02}:{:02}:00+02:00", date, 9 + slot / 2, (slot % 2) * 30))
            })
        })
        .collect()
}

fn bench_identity_of(c: &mut Criterion) {
    let target = target();
    let slot = RawSlot::new("2025-06-10T10:00:00.000+02:00").with_sub_id("42");

    c.bench_function("identity_of", |b| {
        b.iter(|| identity_of(black_box(&target), black_box(&slot)));
    });
}

fn bench_diff_empty_store(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let store = DedupStore::open(&temp.path().join("slots.db")).unwrap();
    let target = target();
    let snapshot = snapshot();

    c.bench_function("diff_800_slots_empty_store", |b| {
        b.iter(|| diff(&store, black_box(&target), black_box(&snapshot)).unwrap());
    });
}

fn bench_diff_all_seen(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    let store = DedupStore::open(&temp.path().join("slots.db")).unwrap();
    let target = target();
    let snapshot = snapshot();
    let now = Utc::now();
    for slot in &snapshot {
        let identity = identity_of(&target, slot).unwrap();
        store.record(&identity, target.name(), now).unwrap();
    }

    c.bench_function("diff_800_slots_all_seen", |b| {
        b.iter(|| diff(&store, black_box(&target), black_box(&snapshot)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_identity_of,
    bench_diff_empty_store,
    bench_diff_all_seen
);
criterion_main!(benches);

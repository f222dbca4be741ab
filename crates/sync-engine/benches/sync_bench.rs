use chrono::NaiveDate;
use common::{CityId, GuestId, HostId, Money, PropertyId, ReservationId};
use criterion::{Criterion, criterion_group, criterion_main};
use projection_store::InMemoryProjectionStore;
use sync_engine::{SyncConfig, SyncExecutor, SyncOrchestrator};

fn bench_create_week(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = {
        let _guard = rt.enter();
        SyncOrchestrator::new(InMemoryProjectionStore::new(), SyncConfig::default())
    };
    let check_in = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let check_out = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();

    c.bench_function("sync/create_7_nights", |b| {
        b.iter(|| {
            rt.block_on(async {
                orchestrator
                    .sync_reservation_created(
                        CityId::new(1),
                        HostId::new(1),
                        PropertyId::new(1),
                        GuestId::new(1),
                        ReservationId::new(1),
                        check_in,
                        check_out,
                        Money::from_cents(70_000),
                    )
                    .await
                    .unwrap()
            })
        });
    });
}

fn bench_onboarding_year(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let executor = SyncExecutor::new(InMemoryProjectionStore::new(), 8);
    let event = domain::ReservationLifecycleEvent::availability_generated(
        domain::AvailabilityGenerated {
            city_id: CityId::new(1),
            property_id: PropertyId::new(2),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            num_days: 365,
        },
    )
    .unwrap();

    c.bench_function("sync/onboard_365_nights", |b| {
        b.iter(|| rt.block_on(executor.execute(&event)));
    });
}

fn bench_concurrency_levels(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let check_in = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    let check_out = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
    let mut group = c.benchmark_group("sync/create_30_nights");

    for concurrency in [1, 8, 32] {
        let config = SyncConfig {
            max_concurrency: concurrency,
            ..SyncConfig::default()
        };
        let orchestrator = {
            let _guard = rt.enter();
            SyncOrchestrator::new(InMemoryProjectionStore::new(), config)
        };
        group.bench_function(format!("concurrency_{concurrency}"), |b| {
            b.iter(|| {
                rt.block_on(orchestrator.sync_reservation_cancelled(
                    CityId::new(1),
                    HostId::new(1),
                    PropertyId::new(1),
                    ReservationId::new(1),
                    check_in,
                    check_out,
                ))
                .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_create_week,
    bench_onboarding_year,
    bench_concurrency_levels
);
criterion_main!(benches);

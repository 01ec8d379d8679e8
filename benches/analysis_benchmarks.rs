use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tracklab::{
    ActivityAnalyzer, AthleteSettings, EngineConstants, RawSample, RawTrace, TraceIngestor,
    ZoneAnalyzer, ZoneCalculator, ZoneMethod,
};

/// Performance benchmarks for the analysis pipeline
///
/// Traces are sampled once per second, so a size of 3600 is an hour-long
/// activity.

fn create_raw_trace(samples: usize) -> RawTrace {
    RawTrace {
        id: Some(format!("bench_{}", samples)),
        name: Some("Benchmark".to_string()),
        samples: (0..samples)
            .map(|i| RawSample {
                time: Some((1_717_221_600 + i as i64).to_string()),
                latitude: Some(format!("{:.6}", 47.37 + i as f64 * 1e-5)),
                longitude: Some("8.54".to_string()),
                altitude: Some(format!("{:.1}", 400.0 + (i as f64 / 60.0).sin() * 25.0)),
                distance: Some(format!("{:.1}", i as f64 * 3.1)),
                heart_rate: Some((130 + (i / 120) % 50).to_string()),
            })
            .collect(),
    }
}

fn athlete() -> AthleteSettings {
    AthleteSettings {
        max_hr: 190,
        resting_hr: 55,
        method: ZoneMethod::Karvonen,
    }
}

fn bench_ingestion(c: &mut Criterion) {
    let ingestor = TraceIngestor::default();
    let mut group = c.benchmark_group("Ingestion");

    for &size in &[600, 3600, 14_400] {
        let raw = create_raw_trace(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("ingest", size), &raw, |b, raw| {
            b.iter(|| ingestor.ingest(black_box(raw.clone())))
        });
    }

    group.finish();
}

fn bench_zone_classification(c: &mut Criterion) {
    let ingestor = TraceIngestor::default();
    let zones = match ZoneCalculator::calculate_heart_rate_zones(&athlete()) {
        Ok(zones) => zones,
        Err(e) => panic!("benchmark athlete is invalid: {}", e),
    };
    let mut group = c.benchmark_group("Zone Classification");

    for &size in &[600, 3600, 14_400] {
        let trace = match ingestor.ingest(create_raw_trace(size)) {
            Ok(trace) => trace,
            Err(e) => panic!("benchmark trace failed to ingest: {}", e),
        };

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("analyze_trace", size), &trace, |b, trace| {
            b.iter(|| ZoneAnalyzer::analyze_trace(black_box(trace), &zones, 30.0))
        });
    }

    group.finish();
}

fn bench_full_analysis(c: &mut Criterion) {
    let analyzer = ActivityAnalyzer::new(athlete(), EngineConstants::default());
    let raw = create_raw_trace(3600);

    c.bench_function("analyze_one_hour", |b| {
        b.iter(|| analyzer.analyze(black_box(raw.clone())))
    });
}

criterion_group!(
    benches,
    bench_ingestion,
    bench_zone_classification,
    bench_full_analysis
);
criterion_main!(benches);

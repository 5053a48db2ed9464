// Criterion benchmarks for Artisan Algo

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use artisan_algo::core::{normalize_query, HeuristicMatcher, ScoringEngine};
use artisan_algo::models::{
    CandidateProfile, MatchSource, PerformanceMetrics, ProfessionMatch, SortPreference,
};

fn create_candidate(id: usize) -> CandidateProfile {
    CandidateProfile {
        id: id.to_string(),
        name: format!("Artisan {}", id),
        profession: "pottery".to_string(),
        description: None,
        location: Some("Fes".to_string()),
        performance: if id % 5 == 0 {
            None
        } else {
            Some(PerformanceMetrics {
                customer_satisfaction: 3.0 + (id % 3) as f64,
                completion_rate: 0.7 + (id % 4) as f64 * 0.05,
                total_orders: (id % 200) as u32,
            })
        },
    }
}

fn pottery_match() -> ProfessionMatch {
    ProfessionMatch {
        profession: "pottery".to_string(),
        confidence: 0.84,
        matched_keywords: vec!["pottery".to_string(), "traditional".to_string()],
        source: MatchSource::Heuristic,
    }
}

fn bench_normalize_query(c: &mut Criterion) {
    c.bench_function("normalize_query", |b| {
        b.iter(|| {
            normalize_query(black_box(
                "I need Traditional POTTERY, hand-thrown, for my restaurant!",
            ))
        });
    });
}

fn bench_heuristic_detect(c: &mut Criterion) {
    let matcher = HeuristicMatcher::new();

    c.bench_function("heuristic_detect", |b| {
        b.iter(|| matcher.detect(black_box("I need traditional pottery for my restaurant")));
    });

    c.bench_function("heuristic_detect_unmatched", |b| {
        b.iter(|| matcher.detect(black_box("recommend a good accountant in town")));
    });
}

fn bench_scoring(c: &mut Criterion) {
    let engine = ScoringEngine::new();
    let analysis = pottery_match();

    let mut group = c.benchmark_group("score_candidates");
    for size in [10usize, 100, 1000] {
        let candidates: Vec<CandidateProfile> = (0..size).map(create_candidate).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &candidates, |b, input| {
            b.iter(|| {
                engine.score(
                    black_box(input.clone()),
                    black_box(&analysis),
                    SortPreference::Relevance,
                )
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_normalize_query,
    bench_heuristic_detect,
    bench_scoring
);
criterion_main!(benches);

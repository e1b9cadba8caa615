use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sheetmark_core::pattern::{PatternGrid, QuestionField};
use sheetmark_core::rules::ChoiceRuleSet;
use sheetmark_core::scoring::{entered_total, estimated_total};

fn make_pattern(questions: u32, block: u32) -> (PatternGrid, ChoiceRuleSet) {
    let mut grid = PatternGrid::generate(i64::from(questions)).unwrap();
    for q_no in 1..=questions {
        grid.set_field(q_no, QuestionField::MaxMarks(q_no % 7 + 2)).unwrap();
    }
    let mut rules = ChoiceRuleSet::new();
    let mut from = 1;
    while from + block - 1 <= questions {
        rules
            .add_rule(Some(from), Some(from + block - 1), Some(block / 2))
            .unwrap();
        from += block;
    }
    (grid, rules)
}

fn bench_estimated_total(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimated_total");

    group.bench_function("q=15,no_rules", |b| {
        let grid = PatternGrid::generate(15).unwrap();
        let rules = ChoiceRuleSet::new();
        b.iter(|| estimated_total(black_box(&grid), black_box(&rules)))
    });

    group.bench_function("q=20,blocks_of_4", |b| {
        let (grid, rules) = make_pattern(20, 4);
        b.iter(|| estimated_total(black_box(&grid), black_box(&rules)))
    });

    group.bench_function("q=200,blocks_of_10", |b| {
        let (grid, rules) = make_pattern(200, 10);
        b.iter(|| estimated_total(black_box(&grid), black_box(&rules)))
    });

    group.finish();
}

fn bench_entered_total(c: &mut Criterion) {
    let marks: BTreeMap<String, i64> = (1..=40u32)
        .flat_map(|q| ["a", "b", "c"].map(|p| (format!("{q}_{p}"), i64::from(q % 5))))
        .collect();

    c.bench_function("entered_total/120_keys", |b| {
        b.iter(|| entered_total(black_box(&marks)))
    });
}

criterion_group!(benches, bench_estimated_total, bench_entered_total);
criterion_main!(benches);

//! Benchmarks for folr parsing, clausification and inference

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use folr::prover::StandardizeApart;
use folr::reasoning::kb_library::{
    abc_equality_knowledge_base, kings_knowledge_base, loves_animal_knowledge_base,
    weapons_knowledge_base, LOVES_ANIMAL, WEAPONS,
};
use folr::{
    parse_sentence, BackwardChaining, CnfConverter, ForwardChaining, InferenceProcedure,
    KnowledgeBase, ModelElimination, OtterProver, ResolutionClosure,
};

fn parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("sentence", "weapons"), &WEAPONS[0], |b, input| {
        b.iter(|| black_box(parse_sentence(input).unwrap()));
    });

    group.bench_with_input(
        BenchmarkId::new("sentence", "loves-animal"),
        &LOVES_ANIMAL[0],
        |b, input| {
            b.iter(|| black_box(parse_sentence(input).unwrap()));
        },
    );

    group.finish();
}

fn cnf_benchmark(c: &mut Criterion) {
    let sentences: Vec<_> = LOVES_ANIMAL
        .iter()
        .map(|text| parse_sentence(text).unwrap())
        .collect();

    c.bench_function("cnf_loves_animal", |b| {
        b.iter(|| {
            let mut ctx = StandardizeApart::for_knowledge_base();
            for sentence in &sentences {
                black_box(CnfConverter::convert(sentence, &mut ctx));
            }
        });
    });
}

fn procedures() -> Vec<(&'static str, fn() -> Box<dyn InferenceProcedure>)> {
    vec![
        ("fc", || Box::new(ForwardChaining::default())),
        ("bc", || Box::new(BackwardChaining::default())),
        ("otter", || Box::new(OtterProver::default())),
        ("me", || Box::new(ModelElimination::default())),
        ("closure", || Box::new(ResolutionClosure::default())),
    ]
}

fn horn_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("weapons_criminal");

    for (name, build) in procedures() {
        let mut kb = weapons_knowledge_base();
        kb.set_procedure(build());
        group.bench_function(name, |b| {
            b.iter(|| black_box(kb.ask_text("Criminal(x)").unwrap()));
        });
    }

    group.finish();
}

fn refutation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("refutation");
    let cases: [(&str, fn() -> KnowledgeBase, &str); 3] = [
        ("kings", kings_knowledge_base, "Evil(x)"),
        ("loves-animal", loves_animal_knowledge_base, "Kills(Curiosity, Tuna)"),
        ("abc-equality", || abc_equality_knowledge_base(false), "A = C"),
    ];

    for (name, build, query) in cases {
        let kb = build();
        group.bench_with_input(BenchmarkId::new("otter", name), &query, |b, query| {
            b.iter(|| black_box(kb.ask_text(query).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    parse_benchmark,
    cnf_benchmark,
    horn_benchmark,
    refutation_benchmark,
);

criterion_main!(benches);

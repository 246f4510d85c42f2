//! Performance benchmarks for the taint rule compiler & runtime
//!
//! - Rule-set compilation (atoms -> sorted RuleSet)
//! - Tiered index build per batch size
//! - Execution with a warm index cache
//! - Wildcard matching through the compiled-pattern cache

use codegraph_trcr::{
    ArgConstraint, AtomKind, AtomSpec, CallSite, Entity, MatchRule, PropertyRead, TaintRuleCompiler,
    TaintRuleExecutor, TieredIndex, ValidatedConfig, WildcardMatcher,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// ============================================================================
// Fixtures
// ============================================================================

const DRIVERS: &[&str] = &["sqlite3", "psycopg2", "pymysql", "cx_Oracle", "pyodbc"];

fn atoms(n: usize) -> Vec<AtomSpec> {
    (0..n)
        .map(|i| {
            let driver = DRIVERS[i % DRIVERS.len()];
            AtomSpec::new(format!("sink.sql.{}{}", driver, i), AtomKind::Sink)
                .with_rule(MatchRule::call(Some(format!("{}.Cursor", driver).as_str()), "execute"))
                .with_rule(
                    MatchRule::call(Some("*.Cursor"), &format!("execute{}", i % 3))
                        .with_arg(ArgConstraint::not_const(0)),
                )
                .with_rule(MatchRule::call(None, &format!("{}.*", driver)))
                .with_tags(["sql_injection"])
        })
        .chain(std::iter::once(
            AtomSpec::new("source.flask.request", AtomKind::Source)
                .with_rule(MatchRule::read(Some("flask.Request"), "args")),
        ))
        .collect()
}

fn entities(n: usize) -> Vec<Entity> {
    (0..n)
        .map(|i| {
            let driver = DRIVERS[i % DRIVERS.len()];
            if i % 4 == 0 {
                PropertyRead::new(format!("e{}", i), "args")
                    .with_base_type("flask.Request")
                    .into()
            } else {
                CallSite::new(format!("e{}", i), format!("execute{}", i % 3))
                    .with_base_type(format!("{}.Cursor", driver))
                    .with_qualified_call(format!("{}.Cursor.execute{}", driver, i % 3))
                    .with_arg("query", if i % 2 == 0 { Some(false) } else { None })
                    .into()
            }
        })
        .collect()
}

// ============================================================================
// Compilation
// ============================================================================

fn bench_compile_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_all");

    for size in [10, 100, 1_000] {
        let atoms = atoms(size);
        group.throughput(Throughput::Elements(atoms.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &atoms, |b, atoms| {
            let compiler = TaintRuleCompiler::default();
            b.iter(|| black_box(compiler.compile_all(black_box(atoms))));
        });
    }

    group.finish();
}

// ============================================================================
// Index + execution
// ============================================================================

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for size in [1_000, 10_000, 100_000] {
        let batch = entities(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| black_box(TieredIndex::build(batch.clone(), false)));
        });
    }

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");
    let config = ValidatedConfig::default();
    let rules = TaintRuleCompiler::new(config.clone())
        .compile_all(&atoms(100))
        .rules;
    let executor = TaintRuleExecutor::new(rules, config);

    for size in [1_000, 10_000] {
        let batch = entities(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("warm_cache", size), &batch, |b, batch| {
            b.iter(|| black_box(executor.execute(black_box(batch))));
        });
    }

    group.finish();
}

fn bench_wildcard_match(c: &mut Criterion) {
    let matcher = WildcardMatcher::default();
    let texts = ["sqlite3.Cursor", "psycopg2.extensions.Cursor", "flask.Request", "os.system"];

    c.bench_function("wildcard_match_cached", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(matcher.wildcard_match("*.Cursor", text, false));
                black_box(matcher.wildcard_match("os.*sys*", text, false));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_compile_all,
    bench_index_build,
    bench_execute,
    bench_wildcard_match
);
criterion_main!(benches);

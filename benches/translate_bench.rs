use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cmdx::translator::lexer::tokenize;
use cmdx::{CommandTranslator, Linter, ShellCapability};

const LINES: &[(&str, &str)] = &[
    ("generic", "rm -rf build"),
    ("pipeline", "cat access.log | grep -i error | sort | uniq | head -20"),
    ("connectors", "mkdir -p out && cp -r src out || echo failed"),
    ("nested", "sudo find . -name '*.tmp' -exec rm -f {} \\;"),
    ("passthrough", "git log --oneline --graph --decorate --all"),
];

/// Benchmark full-line translation per shape
fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    let modern = CommandTranslator::new(true, ShellCapability::modern(Some(7)));
    let legacy = CommandTranslator::new(true, ShellCapability::console_legacy());

    for (name, line) in LINES {
        group.bench_with_input(BenchmarkId::new("modern", name), line, |b, line| {
            b.iter(|| modern.translate(black_box(line)));
        });
        group.bench_with_input(BenchmarkId::new("legacy", name), line, |b, line| {
            b.iter(|| legacy.translate(black_box(line)));
        });
    }

    group.finish();
}

/// Benchmark lexing of long lines
fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for repeat in &[1usize, 16, 128] {
        let line = vec!["grep -n \"a b\" file.txt | wc -l"; *repeat].join(" && ");
        group.bench_with_input(BenchmarkId::from_parameter(repeat), &line, |b, line| {
            b.iter(|| tokenize(black_box(line)));
        });
    }

    group.finish();
}

fn bench_lint(c: &mut Criterion) {
    let rules = cmdx::translator::rules::RuleTable::builtin();
    let linter = Linter::new(&rules);

    c.bench_function("lint_typos", |b| {
        b.iter(|| linter.lint(black_box("gerp -z foo | srot -q | hed -5")));
    });
}

criterion_group!(benches, bench_translate, bench_tokenize, bench_lint);
criterion_main!(benches);

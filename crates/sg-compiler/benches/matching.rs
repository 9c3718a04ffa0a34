use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sg_compiler::parse_ruleset;
use sg_core::{find_match, MatchProps, Matcher};

fn build_rules(count: usize) -> String {
    let mut text = String::from("# generated\n");
    for i in 0..count {
        match i % 5 {
            0 => text.push_str(&format!("site{i}.example.com/*\n")),
            1 => text.push_str(&format!("@@site{i}.example.com/allowed/*\n")),
            2 => text.push_str(&format!("/tracker{i}\\.(js|gif)$/i\n")),
            3 => text.push_str(&format!("@2 *.news{i}.com/* @if (title*=i\"sponsored\")\n")),
            _ => text.push_str(&format!("*://cdn{i}.net/*/ads/*\n")),
        }
    }
    text
}

fn bench_matching(c: &mut Criterion) {
    let ruleset = parse_ruleset(&build_rules(500));
    let matcher = Matcher::new(&ruleset);
    let inputs = [
        MatchProps::new("https://site250.example.com/page"),
        MatchProps::new("https://www.news253.com/story").with_title("Sponsored content"),
        MatchProps::new("https://static.example.org/tracker2.gif"),
        MatchProps::new("https://nothing.test/"),
    ];

    let mut group = c.benchmark_group("matching");

    group.bench_function("find_match", |b| {
        b.iter(|| {
            for props in &inputs {
                black_box(find_match(&ruleset, black_box(props)));
            }
        })
    });

    group.bench_function("matcher", |b| {
        b.iter(|| {
            for props in &inputs {
                black_box(matcher.find_match(black_box(props)));
            }
        })
    });

    group.bench_function("matcher_build", |b| {
        b.iter(|| black_box(Matcher::new(black_box(&ruleset))))
    });

    group.finish();
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);

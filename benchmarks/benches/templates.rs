use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ministache::syntax::parse;
use ministache::{context, Renderer};

const PAGE: &str = include_str!("../inputs/page.mustache");

fn partials() -> BTreeMap<&'static str, &'static str> {
    let mut rv = BTreeMap::new();
    rv.insert("item", include_str!("../inputs/item.mustache"));
    rv.insert("footer", include_str!("../inputs/footer.mustache"));
    rv
}

fn do_parse() {
    parse(black_box(PAGE)).unwrap();
}

fn do_render(renderer: &Renderer, partials: &BTreeMap<&'static str, &'static str>) {
    renderer
        .render_with_partials(
            PAGE,
            context! {
                title => "Index",
                site => context! {
                    name => "Example",
                    copyright => 2024,
                    nav => vec![
                        context!{url => "/", is_active => true, title => "Index"},
                        context!{url => "/doc", is_active => false, title => "Docs"},
                        context!{url => "/help", is_active => false, title => "Help"},
                    ]
                },
                items => (0..200).map(|x| format!("<item {x}>")).collect::<Vec<_>>(),
            },
            partials,
        )
        .unwrap();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("parse", |b| b.iter(do_parse));
    c.bench_function("render", |b| {
        let renderer = Renderer::new();
        let partials = partials();
        b.iter(|| do_render(&renderer, &partials));
    });
    c.bench_function("render_uncached", |b| {
        let partials = partials();
        b.iter(|| do_render(&Renderer::new(), &partials));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

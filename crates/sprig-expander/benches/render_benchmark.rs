//! Rendering benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sprig_expander::{ComponentBuilder, Markup, RawAttributes, Registry};
use sprig_parser::parse_fragment;

const PAGE: &str = r#"<!DOCTYPE html><html><head><title>Items</title></head><body>
<main><section class="list"><row label="one" count="1"></row><row label="two" count="2"></row>
<row label="three" count="3" highlighted /></section><script>if (a < b) { run('<row>'); }</script></main>
</body></html>"#;

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            ComponentBuilder::new("row")
                .style("row", "{ display: flex; }")
                .style("active", ".active:hover { color: red; }")
                .render(|props, _, classes| {
                    let mut row = Markup::element("div").class(classes.class("row")?);
                    if props.boolean("highlighted", false) {
                        row = row.class(classes.class("active")?);
                    }
                    Ok(row
                        .child(Markup::element("span").text(props.string("label", "")))
                        .child(Markup::element("badge").attr("count", props.number("count", 0.0)))
                        .into())
                })
                .build(),
        )
        .expect("valid name");
    registry
        .register(
            ComponentBuilder::new("badge")
                .render(|props, _, _| Ok(Markup::element("b").text(props.number("count", 0.0)).into()))
                .build(),
        )
        .expect("valid name");
    registry
        .register(
            ComponentBuilder::new("page")
                .render(|_, _, _| Ok(Markup::raw(PAGE)))
                .build(),
        )
        .expect("valid name");
    registry
}

fn parse_page(c: &mut Criterion) {
    c.bench_function("parse_page", |b| b.iter(|| parse_fragment(black_box(PAGE)).len()));
}

fn render_page(c: &mut Criterion) {
    let registry = registry();
    let attributes = RawAttributes::new();
    registry.compile_all().expect("components compile");
    c.bench_function("render_page", |b| {
        b.iter(|| registry.render(black_box("page"), &attributes))
    });
}

criterion_group!(benches, parse_page, render_page);
criterion_main!(benches);

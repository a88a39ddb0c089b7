use chitalka::pipeline::rewrite;
use chitalka::tokenizer::tokenize;
use criterion::{criterion_group, criterion_main, Criterion};

const TEXT: &str = "Все счастливые семьи похожи друг на друга, каждая несчастливая семья несчастлива по-своему. \
Всё смешалось в доме Облонских. Жена узнала, что муж был в связи с бывшею в их доме француженкою-гувернанткой, \
и объявила мужу, что не может жить с ним в одном доме.";

fn bench_tokenize(c: &mut Criterion) {
    let text = TEXT.repeat(50);
    c.bench_function("tokenize_prose", |b| b.iter(|| tokenize(&text)));

    let html = format!("<article><p>{}</p></article>", TEXT).repeat(50);
    c.bench_function("rewrite_html", |b| b.iter(|| rewrite(&html)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);

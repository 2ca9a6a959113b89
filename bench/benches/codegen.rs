use cern::{
    codegen::{self, Backend},
    session::{Options, Session},
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

static INPUT: &str = include_str!("../big.ce");

fn criterion_benchmark(c: &mut Criterion) {
    let mut session = Session::new(Options::default());
    let tokens = session.lex(INPUT).unwrap();
    let program = session.parse(&tokens).unwrap();

    for &backend in Backend::ALL {
        c.bench_function(&format!("codegen_{backend}"), |b| {
            b.iter(|| {
                let out = codegen::generate(backend, &program, session.ast(), session.idents());
                black_box(out.unwrap());
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

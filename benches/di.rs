use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ferric_ioc::metadata::{injectable, singleton};
use ferric_ioc::{ContainerPool, CtorArgs, DiResult, Injectable, Token, TypeDeclaration};
use std::sync::Arc;

struct Engine;

impl Injectable for Engine {
    fn construct(_args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Engine)
    }
}

struct Car {
    _engine: Arc<Engine>,
}

impl Injectable for Car {
    fn declare(decl: &mut TypeDeclaration<Self>) {
        decl.param::<Engine>("engine");
    }
    fn construct(args: &mut CtorArgs) -> DiResult<Self> {
        Ok(Car {
            _engine: args.take::<Engine>()?,
        })
    }
}

fn bench_singleton_get(c: &mut Criterion) {
    let pool = ContainerPool::new();
    let root = pool.root();
    singleton().apply::<Engine>(pool.metadata(), &[]);
    root.register::<Engine>().unwrap();
    root.get_type::<Engine>().unwrap();

    c.bench_function("get_singleton", |b| {
        b.iter(|| black_box(root.get_type::<Engine>().unwrap()))
    });
}

fn bench_transient_with_dependency(c: &mut Criterion) {
    let pool = ContainerPool::new();
    let root = pool.root();
    singleton().apply::<Engine>(pool.metadata(), &[]);
    injectable().apply::<Car>(pool.metadata(), &[]);
    root.register::<Engine>().unwrap();
    root.register::<Car>().unwrap();

    c.bench_function("get_transient_with_dependency", |b| {
        b.iter(|| black_box(root.get_type::<Car>().unwrap()))
    });
}

fn bench_parent_delegation(c: &mut Criterion) {
    let pool = ContainerPool::new();
    let root = pool.root();
    let child = pool.create_child();
    root.bind_value(&Token::string("leaf"), 42usize);

    c.bench_function("resolve_via_parent", |b| {
        b.iter(|| black_box(child.resolve::<usize>(&Token::string("leaf")).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_singleton_get,
    bench_transient_with_dependency,
    bench_parent_delegation
);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use avl_core::Tree;

const N: usize = 100_000;

pub fn benchmarks(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let values: Vec<i32> = (1..=N).map(|_| rng.gen()).collect();

    c.bench_function("tree_insert", |b| {
        b.iter(|| {
            let mut tree = Tree::new();
            for value in &values {
                tree.insert(*value);
            }
            tree
        })
    });

    let tree: Tree<i32> = values.iter().copied().collect();

    c.bench_function("tree_find", |b| {
        b.iter(|| {
            for value in &values {
                black_box(tree.find(value));
            }
        })
    });

    c.bench_function("tree_inorder", |b| b.iter(|| black_box(tree.inorder().len())));

    c.bench_function("tree_remove", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| {
                for value in &values {
                    tree.remove(value);
                }
                tree
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);

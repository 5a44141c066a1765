use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use keysmith::{KeyPair, MemoryStore, SecureStore};

const KEY_SIZES: [usize; 2] = [1024, 2048];

fn generation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("rsa_generation");
    // Generation is slow and highly variable
    group.sample_size(10);

    for bits in KEY_SIZES.iter() {
        group.bench_with_input(BenchmarkId::new("key_generation", bits), bits, |b, &bits| {
            b.iter(|| KeyPair::generate(None, bits))
        });
    }

    group.finish();
}

fn operation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("rsa_operations");
    let message = b"benchmark payload";

    for bits in KEY_SIZES.iter() {
        let key_pair = KeyPair::generate(Some("bench"), *bits).unwrap();
        key_pair.register().unwrap();

        // Benchmark encryption
        group.bench_with_input(BenchmarkId::new("encrypt", bits), bits, |b, _| {
            b.iter(|| key_pair.encrypt(message))
        });

        // Benchmark decryption
        let ciphertext = key_pair.encrypt(message).unwrap();
        group.bench_with_input(BenchmarkId::new("decrypt", bits), bits, |b, _| {
            b.iter(|| key_pair.decrypt(&ciphertext))
        });

        // Benchmark signing
        group.bench_with_input(BenchmarkId::new("sign", bits), bits, |b, _| {
            b.iter(|| key_pair.sign(message))
        });

        // Benchmark verification
        let signature = key_pair.sign(message).unwrap();
        group.bench_with_input(BenchmarkId::new("verify", bits), bits, |b, _| {
            b.iter(|| key_pair.verify(&signature, message))
        });

        // Benchmark first use of raw material
        group.bench_with_input(BenchmarkId::new("register_raw", bits), bits, |b, &bits| {
            b.iter(|| {
                let raw = KeyPair::from_raw_material(
                    None,
                    key_pair.private_key_data(),
                    key_pair.public_key_data(),
                    bits,
                )
                .unwrap();
                raw.register()
            })
        });
    }

    group.finish();
}

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    let store = MemoryStore::new();
    let key_pair = KeyPair::generate(Some("bench"), 2048).unwrap();

    group.bench_function("save_memory", |b| b.iter(|| key_pair.save_to_store(&store)));

    key_pair.save_to_store(&store).unwrap();
    group.bench_function("load_memory", |b| {
        b.iter(|| KeyPair::load_from_store(&store, "bench"))
    });
    group.bench_function("exists_memory", |b| b.iter(|| store.exists("bench")));

    group.finish();
}

criterion_group!(
    benches,
    generation_benchmarks,
    operation_benchmarks,
    store_benchmarks
);
criterion_main!(benches);

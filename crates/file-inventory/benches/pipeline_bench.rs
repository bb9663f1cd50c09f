//! 파일 무결성 파이프라인 벤치마크
//!
//! 다이제스트 계산, 디렉토리 탐색, 전체 스캔 처리량을 측정합니다.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tokio_util::sync::CancellationToken;

use sbomkit_core::platform::{OsFamily, Platform, StaticPlatform};
use sbomkit_file_inventory::{
    DigestProvider, DirectoryWalker, FileIdentity, FileIntegrityPipelineBuilder,
    FileInventoryConfigBuilder, HashAlgorithm, IntegrityProvider, IntegrityProviderRegistry,
    ScanConfiguration, ScanFilter,
};

fn platform() -> Arc<dyn Platform> {
    Arc::new(StaticPlatform::new(OsFamily::Linux))
}

/// `dirs` x `files_per_dir` 개의 4 KiB 파일 트리를 만듭니다.
fn build_tree(root: &Path, dirs: usize, files_per_dir: usize) {
    for d in 0..dirs {
        let sub = root.join(format!("d{d:03}"));
        fs::create_dir_all(&sub).unwrap();
        for f in 0..files_per_dir {
            let content: Vec<u8> = (0..4096).map(|i| ((i + d + f) % 256) as u8).collect();
            fs::write(sub.join(format!("f{f:03}.bin")), content).unwrap();
        }
    }
}

fn bench_digest_algorithms(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob.bin");
    fs::write(&path, vec![0xA5u8; 1024 * 1024]).unwrap();
    let file = FileIdentity::new(&path, "blob.bin");
    let platform = platform();

    let mut group = c.benchmark_group("digest_1mib");
    group.throughput(Throughput::Bytes(1024 * 1024));

    for algorithm in [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ] {
        let provider = DigestProvider::single(algorithm);
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm.as_str()),
            &provider,
            |b, provider| b.iter(|| provider.compute(black_box(&file), platform.as_ref()).unwrap()),
        );
    }

    // 한 번의 읽기로 두 알고리즘
    let combined = DigestProvider::new([HashAlgorithm::Sha1, HashAlgorithm::Sha256]);
    group.bench_function("sha1+sha256_single_pass", |b| {
        b.iter(|| combined.compute(black_box(&file), platform.as_ref()).unwrap())
    });

    group.finish();
}

fn bench_directory_walk(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    build_tree(dir.path(), 20, 50);

    let walker =
        DirectoryWalker::new(dir.path(), dir.path(), ScanFilter::allow_all(), platform()).unwrap();

    let mut group = c.benchmark_group("directory_walk");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("walk_1000_files", |b| {
        b.iter(|| walker.iter(CancellationToken::new()).count())
    });
    group.finish();
}

fn bench_pipeline_scan(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    build_tree(dir.path(), 10, 50);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("pipeline_scan");
    group.throughput(Throughput::Elements(500));
    group.sample_size(20);

    for workers in [1usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            b.iter(|| {
                let config = FileInventoryConfigBuilder::new()
                    .base_path(dir.path().to_string_lossy())
                    .worker_count(workers)
                    .build()
                    .unwrap();
                let mut pipeline = FileIntegrityPipelineBuilder::new()
                    .config(config)
                    .platform(platform())
                    .build()
                    .unwrap();
                let registry = IntegrityProviderRegistry::default()
                    .with_provider(Arc::new(DigestProvider::single(HashAlgorithm::Sha256)));
                let scan = ScanConfiguration::new(dir.path(), registry);
                runtime
                    .block_on(pipeline.start(scan, CancellationToken::new()))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_digest_algorithms,
    bench_directory_walk,
    bench_pipeline_scan
);
criterion_main!(benches);

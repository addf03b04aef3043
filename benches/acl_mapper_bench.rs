use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mailbox_acl::acl::{codec, AclCommand, EntryKey, MailboxAcl, Rights};
use mailbox_acl::config::RetryBackoffStrategy;
use mailbox_acl::events::RecordingListener;
use mailbox_acl::storage::{InMemoryRightsIndex, InMemoryRowStore};
use mailbox_acl::types::MailboxId;
use mailbox_acl::{AclMapper, Config};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn acl_with_entries(count: usize) -> MailboxAcl {
    MailboxAcl::from_entries((0..count).map(|i| {
        (
            EntryKey::for_user(format!("user{}", i)).unwrap(),
            "lrs".parse::<Rights>().unwrap(),
        )
    }))
}

fn create_mapper() -> AclMapper {
    let mut config = Config::default();
    config.mapper.max_retries = 1_000;
    config.mapper.jitter_ms = 0;
    config.mapper.retry_backoff = RetryBackoffStrategy::Fixed { delay_ms: 0 };
    AclMapper::new(
        &config,
        Arc::new(InMemoryRowStore::new()),
        Arc::new(InMemoryRightsIndex::new()),
        Arc::new(RecordingListener::new()),
    )
}

// Blob encode/decode cost as the ACL grows
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("acl_codec");

    for &entries in &[1, 10, 100] {
        let acl = acl_with_entries(entries);
        let blob = codec::serialize(&acl).unwrap();
        group.throughput(Throughput::Bytes(blob.len() as u64));

        group.bench_with_input(BenchmarkId::new("serialize", entries), &acl, |b, acl| {
            b.iter(|| codec::serialize(acl).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("deserialize", entries), &blob, |b, blob| {
            b.iter(|| codec::deserialize_tolerant(blob));
        });
    }
    group.finish();
}

// Uncontended read-modify-write cycles
fn bench_sequential_updates(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mapper = create_mapper();
    let id = MailboxId::new();
    let command = AclCommand::parse("bob", "lr", "add").unwrap();

    c.bench_function("update_acl_uncontended", |b| {
        b.to_async(&rt)
            .iter(|| async { mapper.update_acl(id, &command).await.unwrap() });
    });
}

// Many writers racing on one mailbox
fn bench_contended_updates(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("update_acl_contended");

    for &writers in &[2, 8, 32] {
        group.throughput(Throughput::Elements(writers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(writers), &writers, |b, &writers| {
            b.to_async(&rt).iter(|| async move {
                let mapper = Arc::new(create_mapper());
                let id = MailboxId::new();
                let handles: Vec<_> = (0..writers)
                    .map(|i| {
                        let mapper = mapper.clone();
                        tokio::spawn(async move {
                            let command =
                                AclCommand::parse(&format!("user{}", i), "r", "add").unwrap();
                            mapper.update_acl(id, &command).await.unwrap();
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.await.unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_codec,
    bench_sequential_updates,
    bench_contended_updates
);
criterion_main!(benches);

//! Performance benchmarks for permission merging and cache lookups.
//!
//! Run with: cargo bench -p permstore-domain
//!
//! These benchmarks measure:
//! - Merging permission vectors across many groups
//! - Merged cache lookups with and without the role overlay
//! - Finding the groups that hold a bit on one object

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use permstore_domain::model::object_type;
use permstore_domain::{CacheConfig, PermissionCache, Permissions};
use permstore_storage::{MemoryPermissionSource, PermissionSource};

const FOLDERS: i32 = 200;

// =============================================================================
// Helper functions
// =============================================================================

/// Builds a bit string with every `step`-th bit set, offset by `seed`.
fn pattern(seed: usize, step: usize) -> String {
    (0..32)
        .map(|i| if (i + seed) % step == 0 { '1' } else { '0' })
        .collect()
}

/// A cache over `groups` groups, each with a row on every folder.
fn populated_cache(groups: i32, role_permissions: bool) -> PermissionCache {
    let source = MemoryPermissionSource::new_shared();
    for group_id in 1..=groups {
        for folder_id in 1..=FOLDERS {
            let bits = pattern((group_id + folder_id) as usize, 5);
            source
                .set_permission(group_id, object_type::FOLDER, folder_id, &bits)
                .expect("write row");
        }
    }
    source
        .set_role_permission(1, object_type::CONTENT_LANGUAGE, 2, &pattern(0, 3))
        .expect("write role row");
    for group_id in 1..=groups {
        source
            .assign_role(group_id, 1, object_type::FOLDER, 1)
            .expect("assign role");
    }

    let cache = PermissionCache::new(
        source as Arc<dyn PermissionSource>,
        CacheConfig::default().with_role_permissions(role_permissions),
    );
    cache.initialize(false).expect("initialize cache");
    cache
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for size in [1usize, 8, 64, 512] {
        let vectors: Vec<Option<Permissions>> = (0..size)
            .map(|i| Permissions::parse(&pattern(i, 7)).expect("valid pattern"))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &vectors, |b, vectors| {
            b.iter(|| Permissions::merge(black_box(vectors.iter().copied())))
        });
    }
    group.finish();
}

fn bench_merged_permissions(c: &mut Criterion) {
    let mut group = c.benchmark_group("merged_permissions");
    for groups in [1i32, 10, 50] {
        let group_ids: Vec<i32> = (1..=groups).collect();

        let cache = populated_cache(groups, false);
        group.bench_with_input(
            BenchmarkId::new("folder", groups),
            &group_ids,
            |b, group_ids| {
                b.iter(|| {
                    cache.merged_permissions(
                        black_box(group_ids),
                        object_type::FOLDER,
                        black_box(17),
                        object_type::FOLDER,
                        0,
                    )
                })
            },
        );

        let cache = populated_cache(groups, true);
        group.bench_with_input(
            BenchmarkId::new("page_with_roles", groups),
            &group_ids,
            |b, group_ids| {
                b.iter(|| {
                    cache.merged_permissions(
                        black_box(group_ids),
                        object_type::FOLDER,
                        black_box(1),
                        object_type::PAGE,
                        2,
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_groups_with_perm(c: &mut Criterion) {
    let cache = populated_cache(50, true);
    c.bench_function("groups_with_perm/50_groups", |b| {
        b.iter(|| {
            cache.groups_with_perm(
                object_type::FOLDER,
                black_box(1),
                Some(0),
                Some(0),
                object_type::PAGE,
                2,
            )
        })
    });
}

criterion_group!(
    benches,
    bench_merge,
    bench_merged_permissions,
    bench_groups_with_perm
);
criterion_main!(benches);

use proptest::prelude::*;
use sevash::{
    build_dataset, cache_size_for_epoch, dataset_size_for_epoch,
    hashimoto_full, hashimoto_light, is_prime, seed_hash, Cache, Dataset,
    Params, EPOCH_LENGTH, H256, HASH_BYTES, MIX_BYTES,
};
use std::sync::OnceLock;

fn fixture() -> &'static (Cache, Dataset) {
    static FIXTURE: OnceLock<(Cache, Dataset)> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let cache = Cache::with_sizes(64 * 127, 128 * 509, H256::repeat_byte(7)).unwrap();
        let dataset = build_dataset(&cache, 128 * 509, None).unwrap();
        (cache, dataset)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn light_equals_full(header in any::<[u8; 32]>(), nonce in any::<u64>()) {
        let (cache, dataset) = fixture();
        let header = H256(header);
        prop_assert_eq!(
            hashimoto_light(cache, header, nonce),
            hashimoto_full(dataset, header, nonce)
        );
    }

    #[test]
    fn sizes_grow_with_epochs(epoch in 0u64..4096) {
        let (cache, next_cache) = (cache_size_for_epoch(epoch), cache_size_for_epoch(epoch + 1));
        prop_assert!(next_cache.unwrap() >= cache.unwrap());
        let (dataset, next_dataset) =
            (dataset_size_for_epoch(epoch), dataset_size_for_epoch(epoch + 1));
        prop_assert!(next_dataset.unwrap() >= dataset.unwrap());
        let ethash = Params::ETHASH;
        prop_assert!(ethash.cache_size(epoch + 1).unwrap() >= ethash.cache_size(epoch).unwrap());
    }

    #[test]
    fn sizes_are_whole_items(epoch in 0u64..4096) {
        let cache = cache_size_for_epoch(epoch).unwrap();
        let dataset = dataset_size_for_epoch(epoch).unwrap();
        prop_assert_eq!(cache % HASH_BYTES as u64, 0);
        prop_assert_eq!(dataset % HASH_BYTES as u64, 0);
        prop_assert!(is_prime(cache / HASH_BYTES as u64));
        prop_assert!(is_prime(dataset / MIX_BYTES as u64));
    }

    #[test]
    fn seed_is_constant_within_an_epoch(epoch in 0u64..64, offset in 0u64..EPOCH_LENGTH) {
        prop_assert_eq!(seed_hash(epoch * EPOCH_LENGTH + offset), seed_hash(epoch * EPOCH_LENGTH));
    }
}

#[test]
fn consecutive_epochs_have_distinct_seeds() {
    let seeds: Vec<_> = (0..16).map(|e| seed_hash(e * EPOCH_LENGTH)).collect();
    for (i, a) in seeds.iter().enumerate() {
        for b in &seeds[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

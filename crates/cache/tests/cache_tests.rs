use limitboard_cache::mem::MemCache;
use limitboard_core::cache::port::{Cache, CacheExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestItem {
    symbol: String,
    close: f64,
}

#[test]
fn test_mem_cache_raw_ops() {
    let cache = MemCache::new();
    let key = "raw_key";
    let value = vec![1, 2, 3, 4];

    // 测试存取
    cache.set_raw(key, value.clone()).unwrap();
    let result = cache.get_raw(key).unwrap().unwrap();
    assert_eq!(result, value);

    // 同名键覆盖
    cache.set_raw(key, vec![9]).unwrap();
    assert_eq!(cache.get_raw(key).unwrap(), Some(vec![9]));
    assert!(cache.get_raw("missing").unwrap().is_none());
}

#[test]
fn test_mem_cache_typed_ops() {
    let cache = MemCache::new();
    let key = "date:2024-01-02";
    let items = vec![
        TestItem {
            symbol: "600000".to_string(),
            close: 11.0,
        },
        TestItem {
            symbol: "300750".to_string(),
            close: 187.35,
        },
    ];

    cache.set(key, &items).unwrap();

    let result: Vec<TestItem> = cache.get(key).unwrap().unwrap();
    assert_eq!(result, items);
}

#[test]
fn test_mem_cache_clear_evicts_everything() {
    let cache = MemCache::new();
    cache.set("a", &1u32).unwrap();
    cache.set("b", &2u32).unwrap();
    assert_eq!(cache.get::<u32>("b").unwrap(), Some(2));

    cache.clear().unwrap();
    assert!(cache.get::<u32>("a").unwrap().is_none());
    assert!(cache.get::<u32>("b").unwrap().is_none());
}

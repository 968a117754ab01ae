use dashmap::DashMap;
use limitboard_core::cache::error::CacheError;
use limitboard_core::cache::port::Cache;
use tracing::debug;

/// # Summary
/// 基于 DashMap 的内存缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 不提供自动过期或容量限制，失效完全由持有者调用 `clear` 驱动。
pub struct MemCache {
    // 线程安全的 KV 存储容器
    storage: DashMap<String, Vec<u8>>,
}

impl MemCache {
    /// # Summary
    /// 创建一个新的 MemCache 实例。
    ///
    /// # Returns
    /// * `Self` - 初始化的空缓存。
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemCache {
    /// # Summary
    /// 设置原始字节数据。
    ///
    /// # Logic
    /// 将 Key 转换为 String 后与 Value 一并插入哈希表。若存在同名 Key 则覆盖。
    fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.storage.insert(key.to_string(), value);
        Ok(())
    }

    /// # Summary
    /// 获取原始字节数据。
    ///
    /// # Logic
    /// 从哈希表中检索 Key 对应的引用，并将其克隆为独立的所有权对象返回。
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.storage.get(key).map(|v| v.value().clone()))
    }

    /// # Summary
    /// 清空全部缓存项。
    ///
    /// # Logic
    /// 逐项移除哈希表内容，并记录本次失效的条目数。
    fn clear(&self) -> Result<(), CacheError> {
        let evicted = self.storage.len();
        self.storage.clear();
        debug!("MemCache cleared, {} entries evicted", evicted);
        Ok(())
    }
}

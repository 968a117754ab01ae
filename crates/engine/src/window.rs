/// # Summary
/// 固定容量的滚动环形缓冲区，保存单只证券最近 N 行的数值。
///
/// # Invariants
/// - 内存空间在初始化时一次性分配，后续不再扩容。
/// - 始终保持最近 N 个元素；未满时保存全部已推入元素（即最小周期为 1）。
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    // 内部存储容器
    data: Vec<T>,
    // 最大容量
    capacity: usize,
    // 已满后下一次覆盖的位置
    cursor: usize,
}

impl<T: Copy> RollingWindow<T> {
    /// # Summary
    /// 创建一个新的滚动窗口。
    ///
    /// # Arguments
    /// * `capacity`: 窗口长度，至少为 1。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// # Summary
    /// 向窗口推送新元素。
    ///
    /// # Logic
    /// 1. 未满时直接 push。
    /// 2. 已满时覆盖 cursor 处最旧的元素，并递增（取模）cursor。
    pub fn push(&mut self, item: T) {
        if self.data.len() < self.capacity {
            self.data.push(item);
        } else {
            self.data[self.cursor] = item;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }
}

impl RollingWindow<f64> {
    /// 窗口内数值的算术平均；空窗口返回 None。
    pub fn mean(&self) -> Option<f64> {
        let (sum, n) = self
            .data
            .iter()
            .fold((0.0, 0.0), |(sum, n), x| (sum + x, n + 1.0));
        if n > 0.0 { Some(sum / n) } else { None }
    }
}

impl RollingWindow<bool> {
    /// 窗口内为 true 的元素个数。
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|b| **b).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_keeps_latest_items() {
        let mut w = RollingWindow::new(3);
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            w.push(x);
        }
        // 最近三个: 3, 4, 5
        assert_eq!(w.mean(), Some(4.0));
        w.push(9.0);
        assert_eq!(w.mean(), Some(6.0));
    }

    #[test]
    fn test_window_min_period_one() {
        let mut w = RollingWindow::new(5);
        assert_eq!(w.mean(), None);
        w.push(10.0);
        assert_eq!(w.mean(), Some(10.0));
        w.push(20.0);
        assert_eq!(w.mean(), Some(15.0));
    }

    #[test]
    fn test_count_true() {
        let mut w = RollingWindow::new(3);
        for b in [true, true, false, true, false] {
            w.push(b);
        }
        // 最近三个: false, true, false
        assert_eq!(w.count_true(), 1);
    }
}

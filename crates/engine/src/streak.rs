use crate::window::RollingWindow;
use limitboard_core::market::entity::BoardLabel;

/// 连板链允许的最大行间隔：相邻两次涨停之间至多相隔 5 行。
pub const CHAIN_GAP: usize = 5;

/// 单行的连板结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakMark {
    pub streak_len: u32,
    pub board_label: BoardLabel,
}

/// # Summary
/// 单只证券的连板链状态机。
///
/// # Invariants
/// - `InStreak` 中 `anchor <= last_hit`，且 `count` 为 [anchor, last_hit] 内的涨停行数。
/// - 链内相邻两次涨停的行距不超过 `CHAIN_GAP`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    NoStreak,
    InStreak {
        // 链内涨停次数 (B)
        count: u32,
        // 链上最早一次涨停的行号
        anchor: usize,
        // 链上最近一次涨停的行号
        last_hit: usize,
    },
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// # Summary
/// 按日期顺序计算单只证券每行的连续涨停数与 "D天B板" 标签。
///
/// # Logic
/// 1. `streak_len`：以当前行结尾的连续涨停行数，非涨停行归零。
/// 2. 标签：从当前涨停行向前回溯，只要前方 `CHAIN_GAP` 行内存在涨停就跳到最近的那一行继续，
///    直到窗口内找不到涨停为止。回溯总是停在最近的一次涨停，因此等价于：
///    上一次涨停距今不超过 `CHAIN_GAP` 行则延长上一条链，否则另起一条新链。
/// 3. 维护 "当前行 + 前 `CHAIN_GAP` 行" 的滚动涨停计数；计数 ≤ 1 时直接判定为 `1天1板`。
///
/// # Arguments
/// * `limit_up`: 按日期升序排列的涨停标记。
///
/// # Returns
/// 与输入等长的结果序列。
pub fn compute_streaks(limit_up: &[bool]) -> Vec<StreakMark> {
    let mut marks = Vec::with_capacity(limit_up.len());
    let mut window = RollingWindow::new(CHAIN_GAP + 1);
    let mut state = ChainState::NoStreak;
    let mut run: u32 = 0;

    for (i, &is_up) in limit_up.iter().enumerate() {
        window.push(is_up);
        if !is_up {
            run = 0;
            marks.push(StreakMark {
                streak_len: 0,
                board_label: BoardLabel::NONE,
            });
            continue;
        }
        run = run.saturating_add(1);

        let (count, anchor) = match state {
            ChainState::InStreak {
                count,
                anchor,
                last_hit,
            } if window.count_true() > 1 && i - last_hit <= CHAIN_GAP => {
                (count.saturating_add(1), anchor)
            }
            _ => (1, i),
        };
        state = ChainState::InStreak {
            count,
            anchor,
            last_hit: i,
        };
        let board_label = BoardLabel::new(to_u32(i - anchor + 1), count);
        marks.push(StreakMark {
            streak_len: run,
            board_label,
        });
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(flags: &[bool]) -> Vec<String> {
        compute_streaks(flags)
            .iter()
            .map(|m| m.board_label.to_string())
            .collect()
    }

    #[test]
    fn test_gap_within_window_extends_chain() {
        let l = labels(&[true, false, false, false, true]);
        assert_eq!(l[4], "5天2板");
    }

    #[test]
    fn test_gap_beyond_window_starts_new_chain() {
        let l = labels(&[true, false, false, false, false, false, false, true]);
        assert_eq!(l[7], "1天1板");
    }

    #[test]
    fn test_gap_of_exactly_five_rows_chains() {
        // 第 0 行与第 5 行相距 5 行，仍在回溯窗口内
        let l = labels(&[true, false, false, false, false, true]);
        assert_eq!(l[5], "6天2板");
        let l = labels(&[true, false, false, false, false, false, true]);
        assert_eq!(l[6], "1天1板");
    }

    #[test]
    fn test_consecutive_run() {
        let marks = compute_streaks(&[true, true, true, false, true]);
        let lens: Vec<u32> = marks.iter().map(|m| m.streak_len).collect();
        assert_eq!(lens, vec![1, 2, 3, 0, 1]);
        assert_eq!(marks[2].board_label, BoardLabel::new(3, 3));
        assert_eq!(marks[3].board_label, BoardLabel::NONE);
        assert_eq!(marks[4].board_label, BoardLabel::new(5, 4));
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_streaks(&[]).is_empty());
    }
}

//! # Progress Reporting
//!
//! バッチ処理の進捗通知

/// 進捗の通知先
///
/// 各行の処理完了後に、完了行数 / 全行数の割合（0.0-1.0）で呼び出される
pub trait ProgressSink: Send + Sync {
    fn report(&self, fraction: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, fraction: f64) {
        self(fraction)
    }
}

/// 進捗を通知しない
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f64) {}
}

/// 完了数と全体数から割合を計算（全体が0なら完了扱い）
pub fn fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    }
}

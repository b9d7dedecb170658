//! 時刻ポート

/// 時刻取得
pub trait Clock: Send + Sync {
    /// エポックミリ秒
    fn now_ms(&self) -> u64;

    /// ISO8601（UTC）
    fn now_iso8601(&self) -> String;

    /// 単調増加のミリ秒（起点は任意）。壁時計の巻き戻しの影響を受けない
    fn monotonic_ms(&self) -> u64;
}

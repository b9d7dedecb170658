//! 低レベル入力フィルタのホストポート

use crate::error::HookError;
use crate::model::HookHandle;

/// OSのグローバル入力フックを登録/解除する
///
/// フックの判定は `service::filter_decision` に委譲すること。
pub trait InputFilterHost: Send + Sync {
    /// フィルタを登録
    fn install(&self) -> Result<HookHandle, HookError>;

    /// フィルタを解除
    fn remove(&self, handle: HookHandle) -> Result<(), HookError>;

    /// これまでにブロックした組み合わせの数
    fn blocked_count(&self) -> u64;
}

//! 修飾キー状態ポート

use crate::model::Modifiers;

/// 現在押下中の修飾キーを返す
///
/// 低レベルフックのコールバック内から呼ばれる。ブロッキング禁止。
pub trait ModifierState: Send + Sync {
    fn snapshot(&self) -> Modifiers;
}

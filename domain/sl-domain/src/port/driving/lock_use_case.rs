//! ロック開始ユースケースポート

use crate::error::DomainError;
use crate::model::{LockRequest, LockSessionReport};

/// ロックセッションの開始から終了まで
pub trait LockUseCase {
    /// 処理内容:
    /// 1. 設定読込（警告はログへ）
    /// 2. エンジン構築（フック/ポリシー）
    /// 3. ロック画面表示（解除まで戻らない）
    /// 4. 証拠ワーカー停止とセッション集計
    fn start(&self, request: LockRequest) -> Result<LockSessionReport, DomainError>;
}

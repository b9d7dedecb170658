//! 発火デバウンサー
//!
//! 違反イベント列をクールダウン窓でレート制限し、発火シグナルに変換する。

use sl_domain::model::{FireSignal, ViolationEvent};
use std::sync::Mutex;

/// 直近の発火時刻（単調時計, 壁時計）
#[derive(Debug, Clone, Copy)]
struct LastFire {
    monotonic_ms: u64,
    wall_ms: u64,
}

pub struct TriggerDebouncer {
    cooldown_ms: u64,
    /// 比較と更新を同じロック内で行う。証拠取得中は保持しない。
    last_fire: Mutex<Option<LastFire>>,
}

impl TriggerDebouncer {
    pub fn new(cooldown_seconds: u64) -> Self {
        Self {
            cooldown_ms: cooldown_seconds.saturating_mul(1_000),
            last_fire: Mutex::new(None),
        }
    }

    /// クールダウン内なら None（`last_capture_at` は更新しない）
    ///
    /// 窓の判定は単調時計だけで行う。壁時計はシグナルの時刻に使う。
    pub fn on_violation(&self, event: &ViolationEvent) -> Option<FireSignal> {
        let mut last = self
            .last_fire
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(prev) = *last {
            if event.monotonic_ms.saturating_sub(prev.monotonic_ms) < self.cooldown_ms {
                return None;
            }
        }
        *last = Some(LastFire {
            monotonic_ms: event.monotonic_ms,
            wall_ms: event.observed_at,
        });
        Some(FireSignal {
            reason: event.reason.clone(),
            when: event.observed_at,
        })
    }

    /// 直近の発火の壁時計（エポックミリ秒）
    pub fn last_capture_at(&self) -> Option<u64> {
        self.last_fire
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .map(|fire| fire.wall_ms)
    }
}

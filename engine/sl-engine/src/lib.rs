//! sl-engine: ロック状態機械、システムフック管理、発火デバウンス、証拠パイプライン、
//! 通知、証拠ワーカーを実装する層。ドメイン（sl-domain）のポートにのみ依存する。

mod activity;
mod debouncer;
mod dispatcher;
mod evidence;
mod hooks;
mod lock;
mod notifier;

#[cfg(test)]
mod test_support;

pub use debouncer::TriggerDebouncer;
pub use dispatcher::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, EvidenceDispatcher};
pub use evidence::{EvidencePipeline, EvidencePorts};
pub use hooks::SystemHookManager;
pub use lock::{EngineOptions, EnginePorts, LockEngine};
pub use notifier::{NotifyOutcome, Notifier};

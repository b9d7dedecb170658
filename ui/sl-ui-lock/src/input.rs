//! ロック画面の入力状態（プラットフォーム非依存）
//!
//! ウィンドウプロシージャとコンソール代替の両方がここを通してエンジンに入力を渡す。

use sl_domain::model::{Action, KeyId, LockState, PointerKind, UnlockMode};
use sl_domain::port::driven::LockView;
use sl_domain::port::driving::LockController;
use sl_ui_common::i18n::{Translations, banner_lines, get_translations};

/// パスコード入力欄の上限
pub const PASSCODE_MAX_CHARS: usize = 64;

const BULLET: char = '●';

/// 入力処理後に画面がすべきこと
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Nothing,
    Redraw,
    /// 解除済み。ウィンドウを破棄する
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    WrongInput,
    WrongPasscode,
}

pub struct SurfaceState {
    view: LockView,
    buffer: String,
    status: Status,
    last_pointer: Option<(i32, i32)>,
    finished: bool,
}

impl SurfaceState {
    pub fn new(view: LockView) -> Self {
        Self {
            view,
            buffer: String::new(),
            status: Status::Idle,
            last_pointer: None,
            finished: false,
        }
    }

    pub fn view(&self) -> &LockView {
        &self.view
    }

    fn tr(&self) -> &'static dyn Translations {
        get_translations(self.view.language)
    }

    fn passcode_mode(&self) -> bool {
        self.view.mode == UnlockMode::Passcode
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// ウィンドウを閉じてよいか（Locked の間は拒否）
    pub fn may_close(&self, controller: &dyn LockController) -> bool {
        self.finished || controller.state() != LockState::Locked
    }

    /// キー押下
    pub fn on_key(&mut self, controller: &mut dyn LockController, vk: u16, is_repeat: bool) -> Effect {
        if self.finished {
            return Effect::Nothing;
        }
        let key = KeyId::from_vk(vk);
        let action = controller.classify_key(key, is_repeat);
        if action != Action::Ignore || !self.passcode_mode() || is_repeat {
            return self.apply(controller, action, Status::WrongInput);
        }
        match key {
            KeyId::ENTER => {
                let text = std::mem::take(&mut self.buffer);
                let action = controller.submit_passcode(&text);
                match self.apply(controller, action, Status::WrongPasscode) {
                    Effect::Nothing => Effect::Redraw,
                    effect => effect,
                }
            }
            KeyId::BACKSPACE => {
                if self.buffer.pop().is_some() {
                    Effect::Redraw
                } else {
                    Effect::Nothing
                }
            }
            _ => Effect::Nothing,
        }
    }

    /// 文字入力（パスコードモードのみ蓄積）
    pub fn on_char(&mut self, ch: char) -> Effect {
        if self.finished || !self.passcode_mode() || ch.is_control() {
            return Effect::Nothing;
        }
        if self.buffer.chars().count() >= PASSCODE_MAX_CHARS {
            return Effect::Nothing;
        }
        self.buffer.push(ch);
        if self.status == Status::WrongPasscode {
            self.status = Status::Idle;
        }
        Effect::Redraw
    }

    /// ポインタ操作（同じ位置への移動通知は無視）
    pub fn on_pointer(
        &mut self,
        controller: &mut dyn LockController,
        kind: PointerKind,
        position: Option<(i32, i32)>,
    ) -> Effect {
        if self.finished {
            return Effect::Nothing;
        }
        if kind == PointerKind::Move {
            if position.is_some() && position == self.last_pointer {
                return Effect::Nothing;
            }
            let first = self.last_pointer.is_none();
            self.last_pointer = position;
            // 表示直後に届く初回の位置通知は移動ではない
            if first && position.is_some() {
                return Effect::Nothing;
            }
        }
        let action = controller.classify_pointer(kind);
        self.apply(controller, action, Status::WrongInput)
    }

    fn apply(&mut self, controller: &mut dyn LockController, action: Action, on_violation: Status) -> Effect {
        match action {
            Action::Unlock => {
                controller.unlock();
                self.finished = true;
                self.buffer.clear();
                Effect::Close
            }
            Action::Violation(_) => {
                self.status = on_violation;
                Effect::Redraw
            }
            Action::Ignore => Effect::Nothing,
        }
    }

    /// 案内文
    pub fn banner(&self) -> Vec<String> {
        banner_lines(
            self.tr(),
            self.passcode_mode(),
            self.view.unlock_key_name.as_deref(),
            self.view.safe_key_name.as_deref(),
            self.view.show_consent_banner,
        )
    }

    /// 伏せ字のパスコード（パスコードモード以外は None）
    pub fn masked_passcode(&self) -> Option<String> {
        if !self.passcode_mode() {
            return None;
        }
        Some(std::iter::repeat_n(BULLET, self.buffer.chars().count()).collect())
    }

    /// 直近の入力結果の表示文
    pub fn status_line(&self) -> Option<&'static str> {
        match self.status {
            Status::Idle => None,
            Status::WrongInput => Some(self.tr().lock_wrong_input()),
            Status::WrongPasscode => Some(self.tr().lock_wrong_passcode()),
        }
    }

    pub fn title(&self) -> &'static str {
        self.tr().lock_title()
    }
}

//! 低レベルキーボードフィルタの判定
//!
//! OSフックのコールバックから同期的に呼ばれる。I/O・ロック・割り当てを行わない O(1) 判定。
//! ロック状態機械の分類とは独立した、OSレベルの第二防御線。

use crate::model::{FilterDecision, KeyEvent, KeyId, Modifiers};

/// 遮断する組み合わせ（修飾キー条件 + キー）
///
/// 修飾キーは「少なくともこれが押されている」の意味で、余分な修飾キーは問わない。
pub const BLOCKED_COMBINATIONS: &[(&str, Modifiers, KeyId)] = &[
    ("Ctrl+Alt+Del", mods(true, true), KeyId::DELETE),
    ("Alt+Tab", mods(false, true), KeyId::TAB),
    ("Alt+Esc", mods(false, true), KeyId::ESCAPE),
    ("Alt+F4", mods(false, true), KeyId::F4),
    ("Ctrl+Esc", mods(true, false), KeyId::ESCAPE),
    ("LWin", mods(false, false), KeyId::LWIN),
    ("RWin", mods(false, false), KeyId::RWIN),
];

const fn mods(ctrl: bool, alt: bool) -> Modifiers {
    Modifiers {
        ctrl,
        alt,
        shift: false,
        win: false,
    }
}

/// フィルタ判定
pub fn filter_decision(event: &KeyEvent) -> FilterDecision {
    let m = event.modifiers;
    let blocked = match event.key {
        // OSキーは修飾キーに関わらず遮断（Win+D 等のデスクトップ切替も含む）
        KeyId::LWIN | KeyId::RWIN => true,
        KeyId::DELETE => m.ctrl && m.alt,
        KeyId::TAB | KeyId::F4 => m.alt,
        KeyId::ESCAPE => m.ctrl || m.alt,
        _ => m.win,
    };
    if blocked {
        FilterDecision::Block
    } else {
        FilterDecision::PassThrough
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_combination_is_blocked() {
        for (name, modifiers, key) in BLOCKED_COMBINATIONS {
            let event = KeyEvent::new(*key, *modifiers);
            assert_eq!(filter_decision(&event), FilterDecision::Block, "{name}");
        }
    }

    #[test]
    fn extra_modifiers_still_block() {
        // Ctrl+Shift+Esc（タスクマネージャー直接起動）
        let event = KeyEvent::new(
            KeyId::ESCAPE,
            Modifiers {
                ctrl: true,
                shift: true,
                ..Modifiers::default()
            },
        );
        assert_eq!(filter_decision(&event), FilterDecision::Block);
    }

    #[test]
    fn unrelated_keys_pass_through() {
        for name in ["A", "F12", "ENTER", "ESC", "TAB", "SPACE"] {
            let event = KeyEvent::plain(KeyId::from_name(name).unwrap());
            assert_eq!(filter_decision(&event), FilterDecision::PassThrough, "{name}");
        }
        let ctrl_c = KeyEvent::new(
            KeyId::from_name("C").unwrap(),
            Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        );
        assert_eq!(filter_decision(&ctrl_c), FilterDecision::PassThrough);
    }

    #[test]
    fn delete_needs_both_ctrl_and_alt() {
        let ctrl_only = KeyEvent::new(KeyId::DELETE, mods(true, false));
        assert_eq!(filter_decision(&ctrl_only), FilterDecision::PassThrough);
    }

    #[test]
    fn win_held_blocks_any_key() {
        let win_d = KeyEvent::new(
            KeyId::from_name("D").unwrap(),
            Modifiers {
                win: true,
                ..Modifiers::default()
            },
        );
        assert_eq!(filter_decision(&win_d), FilterDecision::Block);
    }
}

pub mod i18n;
pub mod message_box;

pub mod action;
pub mod models;
pub mod update;

/// Telegram caps a single text message at this many characters.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Upper bound for every free-text section of an experience.
pub const MAX_TEXT_LENGTH: usize = 1000;

/// Upper bound for registry item names.
pub const MAX_NAME_LENGTH: usize = 255;

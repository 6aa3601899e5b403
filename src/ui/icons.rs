//! Shared UI icons.

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static PAUSE: Emoji<'_, '_> = Emoji("⏸️  ", "[PAUSE]");
pub static REVIEW: Emoji<'_, '_> = Emoji("🔍 ", "[R]");
pub static PIVOT: Emoji<'_, '_> = Emoji("🔄 ", "[PIVOT]");
pub static SPEECH: Emoji<'_, '_> = Emoji("💬 ", ">");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");

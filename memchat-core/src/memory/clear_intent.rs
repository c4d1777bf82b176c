//! Detection of explicit "erase my memories" requests
//!
//! A keyword heuristic, not a classifier. It matches broadly on purpose: a
//! missed erase request leaves memories the user asked to drop, while a false
//! positive only costs a review of the full memory set in that turn.

/// Keywords signalling a bulk-erasure request, lowercase
///
/// Chinese entries cover the dialogue's working language, the rest are the
/// English equivalents.
pub const CLEAR_INTENT_KEYWORDS: &[&str] = &[
    // Chinese
    "清空",
    "清除",
    "删除",
    "删掉",
    "忘记",
    "忘掉",
    "忘了",
    "重置",
    "抹去",
    "擦除",
    // English
    "forget",
    "erase",
    "reset",
    "delete",
    "clear",
    "wipe",
    "remove all",
];

/// Whether `input` asks to erase stored memories
///
/// Case-insensitive substring match against [`CLEAR_INTENT_KEYWORDS`].
pub fn is_clear_intent(input: &str) -> bool {
    let lowered = input.to_lowercase();
    CLEAR_INTENT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

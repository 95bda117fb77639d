//! Trigger-phrase detection.
//!
//! Three independent lists: one scanned over the assistant reply, two over
//! the user message. Matching is substring/regex on raw text and is
//! brittle by nature; the state machine decides which list wins.

use std::sync::LazyLock;
use regex::Regex;

/// Assistant asks whether it may generate the design
const ASKING_PATTERNS: &[&str] = &[
    "是否需要我立即生成",
    "是否生成",
    "需要生成",
    "生成可下载",
    "生成设计方案",
    "是否需要.*生成",
    "可以为您生成",
];

/// User tells the assistant to go ahead
pub const GENERATION_PHRASES: &[&str] = &[
    "生成", "下载", "好的，生成", "是的", "需要", "要", "开始生成",
    "生成方案", "下载方案", "好的生成吧", "可以生成", "请生成",
    "立即生成", "马上生成", "现在生成",
];

/// User accepts the summarized parameters
pub const CONFIRMATION_PHRASES: &[&str] = &[
    "确认", "没问题", "可以", "好的", "对的", "正确", "ok", "OK", "就这样", "开始设计",
];

static ASKING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ASKING_PATTERNS
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                log::error!("[triggers] bad pattern {:?}: {}", p, e);
                None
            }
        })
        .collect()
});

pub fn is_asking_for_generation(reply: &str) -> bool {
    ASKING.iter().any(|re| re.is_match(reply))
}

pub fn wants_generation(user_text: &str) -> bool {
    GENERATION_PHRASES.iter().any(|p| user_text.contains(p))
}

pub fn is_confirmation(user_text: &str) -> bool {
    CONFIRMATION_PHRASES.iter().any(|p| user_text.contains(p))
}

//! Strip Markdown from assistant replies so they render as plain text.

use std::sync::LazyLock;
use regex::Regex;

struct Rewrite {
    re: Regex,
    with: &'static str,
}

static REWRITES: LazyLock<Vec<Rewrite>> = LazyLock::new(|| {
    // Fences go before inline code so their backticks are not paired up.
    [
        (r"(?s)```.*?```", ""),
        (r"(?m)^#{1,6}[ \t]*", ""),
        (r"\*\*([^*\n]+)\*\*", "$1"),
        (r"\*([^*\n]+)\*", "$1"),
        (r"(?m)^[-*][ \t]+", "· "),
        (r"`([^`]+)`", "$1"),
    ]
    .into_iter()
    .filter_map(|(pattern, with)| match Regex::new(pattern) {
        Ok(re) => Some(Rewrite { re, with }),
        Err(e) => {
            log::error!("[markdown] bad pattern {:?}: {}", pattern, e);
            None
        }
    })
    .collect()
});

pub fn clean_markdown(text: &str) -> String {
    let mut out = text.to_string();
    for rewrite in REWRITES.iter() {
        out = rewrite.re.replace_all(&out, rewrite.with).into_owned();
    }
    out.trim().to_string()
}

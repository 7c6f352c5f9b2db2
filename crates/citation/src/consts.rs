use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Default lower bound on the length of a citation's context window.
pub const DEFAULT_MIN_CONTEXT: usize = 50;
/// Default upper bound on the length of a citation's context window.
pub const DEFAULT_MAX_CONTEXT: usize = 300;

// `[[N]](URL)`
regex!(DOUBLE_WITH_URL_REGEX, r"\[\[(\d+)\]\]\(([^)]+)\)");
// `[N](URL)`
regex!(SINGLE_WITH_URL_REGEX, r"\[(\d+)\]\(([^)]+)\)");
// `[[N]]`
regex!(DOUBLE_BARE_REGEX, r"\[\[(\d+)\]\]");

// Both URL-bearing dialects in a single left-to-right pass. The double-bracket
// alternative is tried first, so `[[1]](url)` is never also reported as `[1]`.
regex!(
    WITH_URL_REGEX,
    format!("{}|{}", DOUBLE_WITH_URL_REGEX.as_str(), SINGLE_WITH_URL_REGEX.as_str()).as_str()
);
// Any marker at all, URL or not.
regex!(ANY_MARKER_REGEX, r"\[\[(\d+)\]\]|\[(\d+)\]");

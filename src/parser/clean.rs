use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<script\b.*?>.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<style\b.*?>.*?</style\s*>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->\n?").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<.*?>").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

/// Strip markup from an HTML fragment, keeping its line structure.
///
/// Scripts, styles and comments vanish with their content; every other tag
/// becomes a single space.
pub fn clean_html(html: &str) -> String {
    let cleaned = SCRIPT_RE.replace_all(html.trim(), "");
    let cleaned = STYLE_RE.replace_all(&cleaned, "");
    let cleaned = COMMENT_RE.replace_all(&cleaned, "");
    let cleaned = TAG_RE.replace_all(&cleaned, " ");
    let cleaned = cleaned.replace("&nbsp;", " ");
    SPACES_RE.replace_all(&cleaned, " ").trim().to_string()
}

//! Recovering a website domain from a browser window title.
//!
//! Browsers only expose the page title of the focused tab, so the domain has
//! to be guessed: first from anything in the title that looks like a domain,
//! then from a small table of well-known site names.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Browser chrome appended to page titles, checked in order; only the first match is removed.
const BROWSER_SUFFIXES: &[&str] = &[
    " - google chrome",
    " \u{2014} google chrome",
    " \u{2013} google chrome",
    " - microsoft edge",
    " - firefox",
    " - mozilla firefox",
    " - brave",
    " - opera",
    " - chromium",
    " - chrome",
];

/// Site names that show up in titles without a domain. First hit wins, so
/// `youtube` shadows `youtube music`.
const KEYWORD_DOMAINS: &[(&str, &str)] = &[
    ("youtube", "youtube.com"),
    ("stack overflow", "stackoverflow.com"),
    ("stackoverflow", "stackoverflow.com"),
    ("github", "github.com"),
    ("gitlab", "gitlab.com"),
    ("gmail", "mail.google.com"),
    ("reddit", "reddit.com"),
    ("twitter", "twitter.com"),
    ("linkedin", "linkedin.com"),
    ("medium", "medium.com"),
    ("google drive", "drive.google.com"),
    ("notion", "notion.so"),
    ("discord", "discord.com"),
    ("zoom", "zoom.us"),
    ("coursera", "coursera.org"),
    ("udemy", "udemy.com"),
    ("amazon", "amazon.com"),
    ("youtube music", "music.youtube.com"),
];

/// Executable-name fragments that identify a browser family.
const BROWSER_FAMILIES: &[&str] = &["chrome", "edge", "firefox", "brave", "opera", "chromium"];

/// Anything shaped like `name.tld`. Word characters are ASCII only.
static RE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9_.-]+\.[A-Za-z]{2,6})").expect("domain pattern is valid"));

/// Trim spaces and ASCII control characters only; other Unicode whitespace is kept.
fn trim_ascii_space(s: &str) -> &str {
    s.trim_matches(|c: char| c <= ' ')
}

/// True when the executable belongs to one of the known browser families.
pub fn is_browser(executable: &str) -> bool {
    let name = executable.to_lowercase();
    BROWSER_FAMILIES.iter().any(|family| name.contains(family))
}

/// Guess the website shown in a browser window from its title.
///
/// Returns `None` when the title carries neither a domain-like token nor a
/// known site name; the caller then treats the window as a plain application.
pub fn extract_domain(title: &str) -> Option<String> {
    let lowered = trim_ascii_space(title).to_lowercase();
    let mut text = lowered.as_str();

    if let Some(stripped) = BROWSER_SUFFIXES
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
    {
        text = trim_ascii_space(stripped);
    }

    if let Some(m) = RE_DOMAIN.find(text) {
        let domain = m.as_str().to_lowercase();
        return Some(domain.strip_prefix("www.").unwrap_or(&domain).to_string());
    }

    KEYWORD_DOMAINS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, domain)| (*domain).to_string())
}

/// Canonical form used as a website label: lowercase, no scheme, no `www.`,
/// at most one trailing slash removed.
pub fn normalize_domain(domain: &str) -> String {
    let lowered = trim_ascii_space(domain).to_lowercase();
    let mut d = lowered.as_str();
    if let Some(rest) = d.strip_prefix("http://") {
        d = rest;
    }
    if let Some(rest) = d.strip_prefix("https://") {
        d = rest;
    }
    if let Some(rest) = d.strip_prefix("www.") {
        d = rest;
    }
    if let Some(rest) = d.strip_suffix('/') {
        d = rest;
    }
    d.to_string()
}

/// Reduce a URL or bare domain to its normalized host, dropping any path.
pub fn host_of(input: &str) -> String {
    let trimmed = trim_ascii_space(input);
    if trimmed.contains("://") {
        if let Some(host) = Url::parse(trimmed).ok().as_ref().and_then(Url::host_str) {
            return normalize_domain(host);
        }
    }

    let normalized = normalize_domain(trimmed);
    normalized
        .split(['/', '?', '#'])
        .next()
        .map(str::to_string)
        .unwrap_or_default()
}

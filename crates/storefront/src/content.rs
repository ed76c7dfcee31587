//! Content helpers for blog posts and product pages.
//!
//! - [`slugify`] turns a (possibly Vietnamese) title into a URL slug
//! - [`ContentPolicy`] decides whether stored HTML is rendered as-is or run
//!   through an allow-list sanitizer first

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Runs of anything that is not an ASCII lowercase letter or digit.
static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex"));

/// Derive a URL slug from a title.
///
/// Diacritics are stripped via NFD decomposition (`đ`/`Đ` become `d`, which
/// NFD does not decompose), the result is lowercased, and every run of
/// non-alphanumeric characters becomes a single `-`.
///
/// ```
/// use template_shop_storefront::content::slugify;
///
/// assert_eq!(slugify("Hướng dẫn Đặt hàng"), "huong-dan-dat-hang");
/// ```
#[must_use]
pub fn slugify(title: &str) -> String {
    let folded: String = title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' | 'Đ' => 'd',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();

    NON_SLUG_RE
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// How stored HTML is treated when rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentPolicy {
    /// Render HTML exactly as stored.
    #[default]
    Trusted,
    /// Strip scripts, event handlers and other non-allow-listed markup.
    Sanitized,
}

impl ContentPolicy {
    /// Apply the policy to an HTML fragment.
    #[must_use]
    pub fn render<'a>(self, html: &'a str) -> Cow<'a, str> {
        match self {
            Self::Trusted => Cow::Borrowed(html),
            Self::Sanitized => Cow::Owned(ammonia::clean(html)),
        }
    }
}

impl fmt::Display for ContentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trusted => "trusted",
            Self::Sanitized => "sanitized",
        })
    }
}

impl FromStr for ContentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trusted" => Ok(Self::Trusted),
            "sanitized" => Ok(Self::Sanitized),
            other => Err(format!("unknown content policy: {other}")),
        }
    }
}

//! Heuristic split of free-text video titles into artist and track name.
//!
//! Video platforms expose only a title on playlist items, so the artist has
//! to be guessed. The result is best effort: "Artist - Song" style titles
//! split cleanly, anything else falls back to the [`UNKNOWN_ARTIST`] sentinel
//! and a title with common production boilerplate removed.

use std::sync::LazyLock;

use regex::Regex;

/// Artist used when a title carries no recognisable artist part.
pub const UNKNOWN_ARTIST: &str = "unknown";

/// Tried in order; the first one present in the title wins.
const SEPARATORS: [&str; 6] = [" - ", " – ", " — ", " | ", ": ", " by "];

static PARENTHESES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*?\)").expect("valid regex"));
static BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[.*?\]").expect("valid regex"));
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*\b(official|music|video|lyric|audio|hd|4k|mv|live|acoustic|cover|remix)\b\s*(video|audio|version)?.*$",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleParts {
    pub artist: String,
    pub name: String,
}

pub fn normalize(title: &str) -> TitleParts {
    for separator in SEPARATORS {
        if let Some((artist, rest)) = title.split_once(separator) {
            return TitleParts {
                artist: artist.trim().to_string(),
                name: rest.trim().to_string(),
            };
        }
    }

    let cleaned = PARENTHESES.replace_all(title, "");
    let cleaned = BRACKETS.replace_all(&cleaned, "");
    let cleaned = BOILERPLATE.replace(&cleaned, "");
    let cleaned = cleaned.trim();

    TitleParts {
        artist: UNKNOWN_ARTIST.to_string(),
        name: if cleaned.is_empty() {
            title.to_string()
        } else {
            cleaned.to_string()
        },
    }
}

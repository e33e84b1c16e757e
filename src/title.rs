use std::sync::LazyLock;

use regex::Regex;

static TRAILING_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\s+\((\d{4})\)\s*$").expect("trailing year pattern is valid")
});

/// Splits a catalog title such as `"Toy Story (1995)"` into its bare title and
/// release year.
///
/// The year is only recognised as a parenthesised four digit group at the very
/// end of the trimmed string, separated from the title by whitespace. Anything
/// else comes back trimmed with no year.
pub fn parse_title_and_year(raw: &str) -> (&str, Option<i32>) {
    let trimmed = raw.trim();
    let Some(caps) = TRAILING_YEAR.captures(trimmed) else {
        return (trimmed, None);
    };

    let (Some(title), Some(year)) = (caps.get(1), caps.get(2)) else {
        return (trimmed, None);
    };

    match year.as_str().parse() {
        Ok(year) => (title.as_str().trim(), Some(year)),
        Err(_) => (trimmed, None),
    }
}

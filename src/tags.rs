use std::collections::BTreeSet;

const DELIMITER: char = '#';

/// Decides which `#`-separated pieces of a title count as tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagRule {
    /// Text between consecutive `#` markers is a tag, anything before the
    /// first `#` is prose.
    #[default]
    Delimited,
    /// Titles starting with `#` take the pieces at even split indices,
    /// all others the pieces at odd indices. Kept for compatibility with
    /// calendars tagged against the older parser.
    LegacyParity,
}

impl TagRule {
    pub fn extract(self, title: &str) -> BTreeSet<String> {
        let first = match self {
            TagRule::LegacyParity if title.starts_with(DELIMITER) => 0,
            _ => 1,
        };

        title
            .split(DELIMITER)
            .skip(first)
            .step_by(2)
            .map(str::to_owned)
            .collect()
    }
}

/// Extracts the tags of a title with the default [`TagRule::Delimited`] rule.
///
/// ```
/// use holiday_counter::tags::extract_tags;
///
/// let tags = extract_tags("Vacation #holiday#beach trip");
/// assert_eq!(tags.into_iter().collect::<Vec<_>>(), ["holiday"]);
/// ```
pub fn extract_tags(title: &str) -> BTreeSet<String> {
    TagRule::Delimited.extract(title)
}

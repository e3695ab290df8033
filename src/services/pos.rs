/// Dictionary part-of-speech abbreviations mapped to full tags. Unknown
/// tags pass through verbatim (dots stripped).
const POS_TABLE: &[(&str, &str)] = &[
    ("n", "noun"),
    ("v", "verb"),
    ("adj", "adjective"),
    ("adv", "adverb"),
    ("prep", "preposition"),
    ("conj", "conjunction"),
    ("pron", "pronoun"),
    ("int", "interjection"),
    ("vt", "verb"),
    ("vi", "verb"),
    ("aux", "verb"),
];

pub fn normalize_pos(tag: &str) -> String {
    let key: String = tag.trim().chars().filter(|c| *c != '.').collect();
    POS_TABLE
        .iter()
        .find(|(abbr, _)| *abbr == key)
        .map(|(_, full)| full.to_string())
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_abbreviations() {
        assert_eq!(normalize_pos("n."), "noun");
        assert_eq!(normalize_pos("vt"), "verb");
        assert_eq!(normalize_pos("adj."), "adjective");
    }

    #[test]
    fn unknown_tags_pass_through_without_dots() {
        assert_eq!(normalize_pos("phr."), "phr");
        assert_eq!(normalize_pos("noun"), "noun");
        assert_eq!(normalize_pos(""), "");
    }
}

use std::collections::BTreeMap;

/// Separator used by a free-text list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Newline,
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Newline => '\n',
        }
    }
}

/// Normalised tags of one free-text field.
///
/// Keys are trimmed and lower-cased. The first spelling seen for a key is
/// kept so chips and reasons can show what the user actually typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeMap<String, String>,
}

impl TagSet {
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(&tag.trim().to_lowercase())
    }

    /// Normalised tags in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Original spellings, in the same order as [`TagSet::keys`].
    pub fn display(&self) -> impl Iterator<Item = &str> {
        self.tags.values().map(String::as_str)
    }

    /// Normalised tags present in both sets, sorted.
    pub fn intersection<'a>(&'a self, other: &'a TagSet) -> impl Iterator<Item = &'a str> {
        self.keys().filter(|tag| other.tags.contains_key(*tag))
    }
}

pub fn parse_tags(raw: Option<&str>, delimiter: Delimiter) -> TagSet {
    let mut tags = BTreeMap::new();
    for piece in raw.unwrap_or_default().split(delimiter.as_char()) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        tags.entry(piece.to_lowercase())
            .or_insert_with(|| piece.to_owned());
    }
    TagSet { tags }
}

use super::tags::{parse_tags, Delimiter, TagSet};

pub const CATEGORY_POINTS: u32 = 50;
pub const TAG_POINTS: u32 = 20;

/// What the matcher compares: a primary category plus a tag set.
#[derive(Debug, Clone, Default)]
pub struct InterestProfile {
    category: Option<String>,
    tags: TagSet,
}

impl InterestProfile {
    pub fn new(category: Option<&str>, tags: Option<&str>) -> Self {
        let category = category
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(str::to_owned);
        Self {
            category,
            tags: parse_tags(tags, Delimiter::Comma),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchScore {
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Either category contains the other, ignoring case.
///
/// Short names match loosely: "art" matches "digital art".
fn category_overlap(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    a.contains(&b) || b.contains(&a)
}

pub fn score(reference: &InterestProfile, candidate: &InterestProfile) -> MatchScore {
    let mut result = MatchScore::default();

    if let (Some(ours), Some(theirs)) = (reference.category(), candidate.category()) {
        if category_overlap(ours, theirs) {
            result.score += CATEGORY_POINTS;
            result.reasons.push(format!("Similar category: {theirs}"));
        }
    }

    let shared: Vec<&str> = reference.tags().intersection(candidate.tags()).collect();
    if !shared.is_empty() {
        result.score += TAG_POINTS * shared.len() as u32;
        result.reasons.push(format!("Shared interests: {}", shared.join(", ")));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(category: &str, tags: &str) -> InterestProfile {
        InterestProfile::new(Some(category), Some(tags))
    }

    #[test]
    fn category_substring_scores_fifty() {
        let m = score(&profile("Illustrator", ""), &profile("Digital Illustrator", ""));
        assert_eq!(m.score, 50);
        assert_eq!(m.reasons.len(), 1);
        assert!(m.reasons[0].contains("Digital Illustrator"));
    }

    #[test]
    fn one_shared_tag_scores_twenty() {
        let m = score(&profile("", "fantasy,portrait"), &profile("", "portrait,scifi"));
        assert_eq!(m.score, 20);
        assert_eq!(m.reasons, vec!["Shared interests: portrait".to_owned()]);
    }

    #[test]
    fn unrelated_profiles_score_zero() {
        let m = score(&profile("Photographer", "nature"), &profile("Sculptor", "abstract"));
        assert_eq!(m, MatchScore::default());
    }

    #[test]
    fn short_category_matches_loosely() {
        let m = score(&profile("art", ""), &profile("Digital Art", ""));
        assert_eq!(m.score, CATEGORY_POINTS);
    }

    #[test]
    fn category_and_tags_add_up_with_one_tag_reason() {
        let m = score(
            &profile("painter", "Fantasy, Portrait, Nature"),
            &profile("Oil Painter", "portrait,fantasy"),
        );
        assert_eq!(m.score, 50 + 2 * 20);
        assert_eq!(m.reasons.len(), 2);
        assert_eq!(m.reasons[1], "Shared interests: fantasy, portrait");
    }

    #[test]
    fn blank_profile_never_matches() {
        let blank = InterestProfile::new(None, None);
        let blank_ws = profile("   ", " , ");
        let full = profile("Illustrator", "fantasy");
        assert_eq!(score(&blank, &full).score, 0);
        assert_eq!(score(&full, &blank).score, 0);
        assert_eq!(score(&blank_ws, &blank_ws).score, 0);
    }

    #[test]
    fn score_is_symmetric() {
        let profiles = [
            profile("Illustrator", "fantasy,portrait"),
            profile("Digital Illustrator", "Portrait, scifi"),
            profile("art", "nature"),
            profile("Concept Art", "scifi,nature,fantasy"),
            profile("", "FANTASY"),
            InterestProfile::new(None, None),
        ];
        for a in &profiles {
            for b in &profiles {
                assert_eq!(score(a, b).score, score(b, a).score);
            }
        }
    }
}

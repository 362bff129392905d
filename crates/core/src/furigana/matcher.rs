use super::pattern::AlignmentPattern;
use super::script::ScriptClass;
use super::{COMBINATOR, FuriganaOptions, SEPARATOR};

/// One base substring with its reading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignedSegment {
    /// Base text (usually a single character).
    pub base: String,
    /// Annotation for `base`.
    pub annotation: String,
}

impl AlignedSegment {
    /// Creates a segment.
    pub fn new(base: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            annotation: annotation.into(),
        }
    }
}

/// Maps configured separator/combinator synonyms to the canonical markers.
pub fn clean_annotation(annotation: &str, options: &FuriganaOptions) -> String {
    annotation
        .chars()
        .map(|c| {
            let c = if options.extra_separators.contains(c) {
                SEPARATOR
            } else {
                c
            };
            if options.extra_combinators.contains(c) {
                COMBINATOR
            } else {
                c
            }
        })
        .collect()
}

/// Aligns `annotation` against `base`.
///
/// Falls back to a single whole-run segment when `base` has no kana or
/// ideographs, or when the annotation does not fit the base.
pub fn match_furigana(base: &str, annotation: &str, options: &FuriganaOptions) -> Vec<AlignedSegment> {
    let whole = || vec![AlignedSegment::new(base, annotation)];

    let Some(pattern) = AlignmentPattern::build(base) else {
        return whole();
    };
    let cleaned = clean_annotation(annotation, options);
    let Some(captures) = pattern.captures(&cleaned) else {
        log::trace!("furigana `{annotation}` does not fit `{base}`");
        return whole();
    };

    let segments = reduce(base, &captures);
    if segments.is_empty() { whole() } else { segments }
}

/// Turns per-group captures into segments.
///
/// Characters outside the alignable classes join the base of the segment
/// before them (or the first segment, when leading). A capture holding a
/// combinator is split and its parts go to the current and following
/// alignable characters; each following character's own capture is kept
/// after its part, and parts left over once the base runs out are appended
/// to the last paired annotation.
fn reduce(base: &str, captures: &[&str]) -> Vec<AlignedSegment> {
    let mut segments: Vec<AlignedSegment> = Vec::new();
    let mut leading = String::new();
    let mut groups = captures.iter().copied();
    let mut chars = base.chars().peekable();

    while let Some(c) = chars.next() {
        if !ScriptClass::of(c).is_alignable() {
            match segments.last_mut() {
                Some(last) => last.base.push(c),
                None => leading.push(c),
            }
            continue;
        }

        let captured = groups.next().unwrap_or_default();
        // Captures from the built pattern (`[^・+]*?`) never hold a
        // combinator; only hand-built captures reach the split below.
        let mut parts = captured.split(COMBINATOR);
        let first = parts.next().unwrap_or_default();
        segments.push(AlignedSegment::new(c, first));

        for part in parts {
            while let Some(&other) = chars.peek() {
                if ScriptClass::of(other).is_alignable() {
                    break;
                }
                if let Some(last) = segments.last_mut() {
                    last.base.push(other);
                }
                chars.next();
            }
            match chars.next() {
                Some(next) => {
                    let own = groups.next().unwrap_or_default();
                    segments.push(AlignedSegment::new(next, format!("{part}{own}")));
                }
                None => {
                    if let Some(last) = segments.last_mut() {
                        last.annotation.push_str(part);
                    }
                }
            }
        }
    }

    if let Some(first) = segments.first_mut() {
        first.base.insert_str(0, &leading);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(segments: &[AlignedSegment]) -> Vec<(&str, &str)> {
        segments
            .iter()
            .map(|s| (s.base.as_str(), s.annotation.as_str()))
            .collect()
    }

    fn joined(segments: &[AlignedSegment]) -> (String, String) {
        (
            segments.iter().map(|s| s.base.as_str()).collect(),
            segments.iter().map(|s| s.annotation.as_str()).collect(),
        )
    }

    #[test]
    fn ambiguous_reading_still_aligns() {
        let segments = match_furigana("可愛い犬", "かわいいいぬ", &FuriganaOptions::default());
        assert_eq!(segments.len(), 4);
        assert_eq!(joined(&segments), ("可愛い犬".to_string(), "かわいいいぬ".to_string()));
        assert_eq!(segments[2], AlignedSegment::new("い", "い"));
    }

    #[test]
    fn separators_resolve_ambiguity() {
        let segments = match_furigana("可愛い犬", "か・わい・い・いぬ", &FuriganaOptions::default());
        assert_eq!(
            pairs(&segments),
            [("可", "か"), ("愛", "わい"), ("い", "い"), ("犬", "いぬ")]
        );
    }

    #[test]
    fn combinators_keep_per_character_segments() {
        let segments = match_furigana("可愛い犬", "か+わい・い・いぬ", &FuriganaOptions::default());
        assert_eq!(
            pairs(&segments),
            [("可", "か"), ("愛", "わい"), ("い", "い"), ("犬", "いぬ")]
        );
    }

    #[test]
    fn extra_markers_are_normalized() {
        let options = FuriganaOptions {
            extra_separators: ".。".to_string(),
            extra_combinators: "-".to_string(),
            ..FuriganaOptions::default()
        };
        assert_eq!(clean_annotation("か-わい.い。いぬ", &options), "か+わい・い・いぬ");
        let segments = match_furigana("可愛い犬", "か-わい.い.いぬ", &options);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[1], AlignedSegment::new("愛", "わい"));
    }

    #[test]
    fn cleaning_canonical_text_is_identity() {
        let options = FuriganaOptions {
            extra_separators: ".".to_string(),
            extra_combinators: "-".to_string(),
            ..FuriganaOptions::default()
        };
        assert_eq!(clean_annotation("か+わい・い", &options), "か+わい・い");
    }

    #[test]
    fn no_alignable_characters_pairs_whole_run() {
        let options = FuriganaOptions::default();
        assert_eq!(match_furigana("", "よみ", &options), [AlignedSegment::new("", "よみ")]);
        assert_eq!(
            match_furigana("Ruby", "ルビー", &options),
            [AlignedSegment::new("Ruby", "ルビー")]
        );
    }

    #[test]
    fn mismatch_pairs_whole_run() {
        let segments = match_furigana("食べる", "たべた", &FuriganaOptions::default());
        assert_eq!(segments, [AlignedSegment::new("食べる", "たべた")]);
    }

    #[test]
    fn other_characters_stay_in_the_base() {
        let segments = match_furigana("A漢字!", "かん・じ", &FuriganaOptions::default());
        assert_eq!(pairs(&segments), [("A漢", "かん"), ("字!", "じ")]);

        let segments = match_furigana("漢・字", "かんじ", &FuriganaOptions::default());
        assert_eq!(joined(&segments), ("漢・字".to_string(), "かんじ".to_string()));
    }

    #[test]
    fn kana_reading_matches_one_to_one() {
        let segments = match_furigana("ひらがな", "ひらがな", &FuriganaOptions::default());
        assert_eq!(segments.len(), 4);
        assert_eq!(joined(&segments).1, "ひらがな");
    }

    #[test]
    fn combinator_parts_spread_over_following_characters() {
        let segments = reduce("漢字", &["かん+じ", ""]);
        assert_eq!(pairs(&segments), [("漢", "かん"), ("字", "じ")]);
    }

    #[test]
    fn surplus_combinator_parts_join_the_last_segment() {
        let segments = reduce("漢", &["か+ん+じ"]);
        assert_eq!(pairs(&segments), [("漢", "かんじ")]);
    }
}

//! Heading slugs, compatible with github-slugger.
//!
//! Lowercase, drop everything that is not a letter, digit, `-`, `_`,
//! combining mark or space, then turn spaces into hyphens. Hyphen runs are
//! neither collapsed nor trimmed. Repeated slugs get `-1`, `-2`, ...

use std::collections::HashMap;

/// Per-document slug generator that keeps slugs unique.
#[derive(Debug, Default, Clone)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    /// Creates an empty slugger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a unique slug for `text`.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut candidate = base.clone();
        while self.seen.contains_key(&candidate) {
            let count = self.seen.entry(base.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }

    /// Marks `slug` as used without producing it.
    pub fn reserve(&mut self, slug: &str) {
        self.seen.entry(slug.to_string()).or_insert(0);
    }

    /// Forgets every slug handed out so far.
    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

/// Slugifies `text` without deduplication.
///
/// ```
/// use multimark_core::slug::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("ふりがな の 書き方"), "ふりがな-の-書き方");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            ' ' => slug.push('-'),
            '-' | '_' => slug.push(ch),
            c if c.is_ascii_alphanumeric() => slug.push(c.to_ascii_lowercase()),
            c if !c.is_ascii() && (c.is_alphanumeric() || is_combining_mark(c)) => {
                slug.extend(c.to_lowercase());
            }
            _ => {}
        }
    }
    if slug.is_empty() {
        slug.push_str("heading");
    }
    slug
}

/// Combining marks that github-slugger keeps (nonspacing and spacing marks
/// of the common scripts, plus the kana voicing marks).
fn is_combining_mark(ch: char) -> bool {
    matches!(
        ch as u32,
        0x0300..=0x036F
            | 0x0591..=0x05BD
            | 0x05BF
            | 0x05C1..=0x05C2
            | 0x05C4..=0x05C5
            | 0x05C7
            | 0x0610..=0x061A
            | 0x064B..=0x065F
            | 0x0670
            | 0x0900..=0x0903
            | 0x093A..=0x094F
            | 0x0951..=0x0957
            | 0x0962..=0x0963
            | 0x0980..=0x0983
            | 0x09BC..=0x09CD
            | 0x0A01..=0x0A03
            | 0x0A3C..=0x0A4D
            | 0x0A81..=0x0A83
            | 0x0ABC..=0x0ACD
            | 0x0B01..=0x0B03
            | 0x0BBE..=0x0BCD
            | 0x0E31..=0x0E3A
            | 0x0E47..=0x0E4E
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x302A..=0x302F
            | 0x3099..=0x309A
            | 0xFE20..=0xFE2F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_dropped() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("render(markdown, config)"), "rendermarkdown-config");
        assert_eq!(slugify("TypeScript & JSX"), "typescript--jsx");
        assert_eq!(slugify("<ruby> tags"), "ruby-tags");
    }

    #[test]
    fn hyphens_are_not_collapsed() {
        assert_eq!(slugify("  a---b  "), "--a---b--");
    }

    #[test]
    fn japanese_is_kept() {
        assert_eq!(slugify("可愛い犬"), "可愛い犬");
        assert_eq!(slugify("ルビ・ふりがな"), "ルビふりがな");
        assert_eq!(slugify("が"), "が");
    }

    #[test]
    fn combining_marks_survive() {
        assert_eq!(slugify("स्लॉट्स"), "स्लॉट्स");
        assert_eq!(slugify("Héllo Wörld"), "héllo-wörld");
    }

    #[test]
    fn empty_falls_back() {
        assert_eq!(slugify("!!!"), "heading");
    }

    #[test]
    fn duplicates_get_counters() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Notes"), "notes");
        assert_eq!(slugger.slug("Notes"), "notes-1");
        assert_eq!(slugger.slug("notes"), "notes-2");
    }

    #[test]
    fn counters_skip_taken_slugs() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Step 1"), "step-1");
        assert_eq!(slugger.slug("Step"), "step");
        assert_eq!(slugger.slug("Step"), "step-2");
    }

    #[test]
    fn reserve_and_reset() {
        let mut slugger = Slugger::new();
        slugger.reserve("intro");
        assert_eq!(slugger.slug("Intro"), "intro-1");
        slugger.reset();
        assert_eq!(slugger.slug("Intro"), "intro");
    }
}

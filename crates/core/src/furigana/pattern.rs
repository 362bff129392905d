use regex::Regex;

use super::script::ScriptClass;
use super::{COMBINATOR, SEPARATOR};

/// Anchored matcher built from a base run.
///
/// Every kana or ideograph of the base becomes one capture group. Ideographs
/// capture the shortest run of non-marker characters, kana capture
/// themselves. Neighbouring groups are joined by an optional separator or
/// combinator.
#[derive(Debug, Clone)]
pub struct AlignmentPattern {
    regex: Regex,
}

impl AlignmentPattern {
    /// Builds the pattern, or `None` when `base` has nothing to align.
    pub fn build(base: &str) -> Option<Self> {
        let marker = format!("[{SEPARATOR}{}]", regex::escape(&COMBINATOR.to_string()));
        let mut expr = String::from("^");
        let mut previous = ScriptClass::Other;
        let mut groups = 0usize;

        for c in base.chars() {
            let class = ScriptClass::of(c);
            if class.is_alignable() {
                if previous.is_alignable() {
                    expr.push_str(&marker);
                    expr.push('?');
                }
                match class {
                    ScriptClass::Ideograph => {
                        expr.push_str("([^");
                        expr.push_str(&marker[1..marker.len() - 1]);
                        expr.push_str("]*?)");
                    }
                    _ => {
                        expr.push('(');
                        expr.push_str(&regex::escape(&c.to_string()));
                        expr.push(')');
                    }
                }
                groups += 1;
            }
            previous = class;
        }

        if groups == 0 {
            return None;
        }
        expr.push('$');

        match Regex::new(&expr) {
            Ok(regex) => Some(Self { regex }),
            Err(err) => {
                log::warn!("furigana pattern `{expr}` failed to compile: {err}");
                None
            }
        }
    }

    /// Number of capture groups (one per kana/ideograph of the base).
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Matches the whole annotation, returning the captured text per group.
    pub fn captures<'a>(&self, annotation: &'a str) -> Option<Vec<&'a str>> {
        let caps = self.regex.captures(annotation)?;
        Some(
            (1..caps.len())
                .map(|i| caps.get(i).map_or("", |m| m.as_str()))
                .collect(),
        )
    }

    /// The underlying expression, for diagnostics.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_alignable_characters() {
        assert!(AlignmentPattern::build("").is_none());
        assert!(AlignmentPattern::build("ABC 123").is_none());
    }

    #[test]
    fn one_group_per_kana_or_ideograph() {
        let pattern = AlignmentPattern::build("可愛い犬").unwrap();
        assert_eq!(pattern.group_count(), 4);
        assert_eq!(
            pattern.as_str(),
            r"^([^・\+]*?)[・\+]?([^・\+]*?)[・\+]?(い)[・\+]?([^・\+]*?)$"
        );
    }

    #[test]
    fn other_characters_break_marker_runs() {
        let pattern = AlignmentPattern::build("漢A字").unwrap();
        assert_eq!(pattern.group_count(), 2);
        assert_eq!(pattern.as_str(), r"^([^・\+]*?)([^・\+]*?)$");
    }

    #[test]
    fn kana_must_appear_literally() {
        let pattern = AlignmentPattern::build("美味しい").unwrap();
        assert!(pattern.captures("おいしい").is_some());
        assert!(pattern.captures("おいし・い").is_some());
        assert!(pattern.captures("おいしか").is_none());
    }

    #[test]
    fn captures_are_lazy_and_anchored() {
        let pattern = AlignmentPattern::build("可愛い犬").unwrap();
        let caps = pattern.captures("か・わい・い・いぬ").unwrap();
        assert_eq!(caps, ["か", "わい", "い", "いぬ"]);
    }
}

/// Script class of a single character, as far as alignment cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    /// Hiragana, katakana (full and half width) and the prolonged sound mark.
    Kana,
    /// CJK ideographs, including extension A.
    Ideograph,
    /// Anything else; ignored by the pattern builder.
    Other,
}

impl ScriptClass {
    /// Classifies `c` by fixed code point ranges.
    pub fn of(c: char) -> Self {
        match c {
            '\u{3040}'..='\u{3096}' | '\u{30A1}'..='\u{30FA}' | '\u{FF66}'..='\u{FF9F}' | '\u{30FC}' => {
                ScriptClass::Kana
            }
            '\u{3400}'..='\u{9FAF}' => ScriptClass::Ideograph,
            _ => ScriptClass::Other,
        }
    }

    /// Kana and ideographs take part in alignment.
    pub fn is_alignable(self) -> bool {
        !matches!(self, ScriptClass::Other)
    }
}

use super::matcher::AlignedSegment;

/// Pairs base and annotation code point by code point.
///
/// The shorter side is padded with empty strings, so no character of the
/// longer side is lost.
pub fn rubify_every_character(base: &str, annotation: &str) -> Vec<AlignedSegment> {
    let mut base_chars = base.chars();
    let mut annotation_chars = annotation.chars();
    let mut segments = Vec::new();
    loop {
        let b = base_chars.next();
        let a = annotation_chars.next();
        if b.is_none() && a.is_none() {
            break;
        }
        segments.push(AlignedSegment {
            base: b.map(String::from).unwrap_or_default(),
            annotation: a.map(String::from).unwrap_or_default(),
        });
    }
    segments
}

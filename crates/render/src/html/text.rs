//! Text runs of rendered HTML.

use multimark_core::mask;

/// Rebuilds `html`, handing every run of text to `edit` along with the
/// output buffer. Tags, comments and markers are copied unchanged, as is
/// everything inside code, pre, script and style elements.
pub(crate) fn map_text(html: &str, mut edit: impl FnMut(&str, &mut String)) -> String {
    let mut out = String::with_capacity(html.len());
    let mut code_depth = 0usize;
    let mut rest = html;
    while !rest.is_empty() {
        if rest.starts_with('<') {
            let end = if rest.starts_with("<!--") {
                rest.find("-->").map_or(rest.len(), |at| at + 3)
            } else {
                rest.find('>').map_or(rest.len(), |at| at + 1)
            };
            track_code(&rest[..end], &mut code_depth);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }
        let end = rest.find('<').unwrap_or(rest.len());
        if code_depth > 0 {
            out.push_str(&rest[..end]);
        } else {
            map_unmasked(&rest[..end], &mut out, &mut edit);
        }
        rest = &rest[end..];
    }
    out
}

fn track_code(tag: &str, depth: &mut usize) {
    let lower = tag.to_ascii_lowercase();
    let name = lower
        .trim_start_matches('<')
        .trim_start_matches('/')
        .split(|c: char| !c.is_ascii_alphanumeric())
        .next()
        .unwrap_or("");
    if matches!(name, "code" | "pre" | "script" | "style") {
        if lower.starts_with("</") {
            *depth = depth.saturating_sub(1);
        } else {
            *depth += 1;
        }
    }
}

/// Runs `edit` on the parts of `text` outside markers. A marker opens and
/// closes with a reserved code point.
fn map_unmasked(text: &str, out: &mut String, edit: &mut impl FnMut(&str, &mut String)) {
    let mut rest = text;
    while let Some(start) = rest.find(mask::is_reserved) {
        if start > 0 {
            edit(&rest[..start], out);
        }
        let marker = &rest[start..];
        let open_len = marker.chars().next().map_or(0, char::len_utf8);
        let end = marker[open_len..]
            .find(mask::is_reserved)
            .map_or(marker.len(), |at| {
                let close = open_len + at;
                close + marker[close..].chars().next().map_or(0, char::len_utf8)
            });
        out.push_str(&marker[..end]);
        rest = &marker[end..];
    }
    if !rest.is_empty() {
        edit(rest, out);
    }
}

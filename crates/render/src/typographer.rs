//! Smart quotes and typographic replacements over rendered HTML.

use std::iter::Peekable;
use std::str::Chars;

const DEFAULT_QUOTES: [char; 4] = ['\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Applies quote and symbol replacements to text outside tags, skipping
/// code/pre/script/style content.
///
/// `quotes` holds double open, double close, single open and single close
/// quote characters; missing ones fall back to curly quotes.
pub fn apply(input: &str, quotes: &str) -> String {
    if !input.contains(['"', '\'', '-', '.', '(', '+']) {
        return input.to_string();
    }

    let mut set = DEFAULT_QUOTES;
    for (slot, ch) in set.iter_mut().zip(quotes.chars()) {
        *slot = ch;
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut code_depth = 0usize;

    while let Some(c) = chars.next() {
        if c == '<' {
            consume_html_tag(&mut chars, &mut out, &mut code_depth);
            continue;
        }
        if code_depth > 0 {
            out.push(c);
            continue;
        }
        replace(c, &mut chars, &mut out, &set);
    }

    out
}

/// Consumes an HTML tag from the character stream, tracking code/pre/script/style depth.
fn consume_html_tag(chars: &mut Peekable<Chars<'_>>, out: &mut String, code_depth: &mut usize) {
    let mut tag = String::from("<");
    for n in chars.by_ref() {
        tag.push(n);
        if n == '>' {
            break;
        }
    }
    let lower = tag.to_ascii_lowercase();
    let name = lower
        .trim_start_matches('<')
        .trim_start_matches('/')
        .split(|c: char| !c.is_ascii_alphanumeric())
        .next()
        .unwrap_or("");
    if matches!(name, "code" | "pre" | "script" | "style") {
        if lower.starts_with("</") {
            *code_depth = code_depth.saturating_sub(1);
        } else {
            *code_depth += 1;
        }
    }
    out.push_str(&tag);
}

fn is_opening(out: &str) -> bool {
    out.is_empty() || out.ends_with(|c: char| c.is_whitespace() || "([{\"'>\u{201c}\u{2018}".contains(c))
}

/// Case-insensitive `(c)`, `(r)`, `(tm)` after an already consumed `(`.
fn symbol(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let mut ahead = chars.clone();
    let first = ahead.next()?.to_ascii_lowercase();
    let second = ahead.next()?.to_ascii_lowercase();
    let (symbol, len) = match (first, second) {
        ('c', ')') => ('\u{a9}', 2),
        ('r', ')') => ('\u{ae}', 2),
        ('t', 'm') if ahead.next() == Some(')') => ('\u{2122}', 3),
        _ => return None,
    };
    for _ in 0..len {
        chars.next();
    }
    Some(symbol)
}

/// `---` becomes an em dash. `--` becomes an en dash when it has
/// whitespace on both sides or on neither; text boundaries count as both.
fn dash(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    let mut run = 1;
    while chars.peek() == Some(&'-') {
        chars.next();
        run += 1;
    }
    let prev = out.chars().last().filter(|c| *c != '>');
    let next = chars.peek().copied().filter(|c| *c != '<');
    let blank = |c: Option<char>| c.is_none_or(char::is_whitespace);
    let solid = |c: Option<char>| c.is_none_or(|c| !c.is_whitespace());
    match run {
        3 => out.push('\u{2014}'),
        2 if (blank(prev) && blank(next)) || (solid(prev) && solid(next)) => out.push('\u{2013}'),
        _ => out.extend(std::iter::repeat_n('-', run)),
    }
}

fn replace(c: char, chars: &mut Peekable<Chars<'_>>, out: &mut String, quotes: &[char; 4]) {
    match c {
        '-' => dash(chars, out),
        '.' if chars.clone().take(2).eq(['.', '.']) => {
            chars.next();
            chars.next();
            out.push('\u{2026}');
        }
        '+' if chars.peek() == Some(&'-') => {
            chars.next();
            out.push('\u{b1}');
        }
        '(' => match symbol(chars) {
            Some(symbol) => out.push(symbol),
            None => out.push('('),
        },
        '"' => out.push(if is_opening(out) { quotes[0] } else { quotes[1] }),
        '\'' => out.push(if is_opening(out) { quotes[2] } else { quotes[3] }),
        _ => out.push(c),
    }
}

//! Text helpers: entity decoding and Markdown escaping.
//!
//! `tl` hands out raw source bytes, so character references are still
//! encoded when they reach the translator.

/// Decode the character references that show up in real-world markup.
/// Unknown references are left untouched.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_reference(&candidate[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        "hellip" => Some('…'),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        _ => None,
    }
}

/// Collapse whitespace and escape Markdown in one pass.
///
/// Characters that are only special at the start of a line are escaped when
/// `line_start` is set and they open the run.
pub(crate) fn collapse_and_escape(s: &str, line_start: bool) -> String {
    const NEEDS_ESCAPE: [bool; 128] = {
        let mut table = [false; 128];
        table[b'\\' as usize] = true;
        table[b'*' as usize] = true;
        table[b'_' as usize] = true;
        table[b'[' as usize] = true;
        table[b']' as usize] = true;
        table[b'`' as usize] = true;
        table
    };

    let mut result = String::with_capacity(s.len());
    let mut prev_ws = false;

    for c in s.chars() {
        if c.is_whitespace() && c != '\u{a0}' {
            if !prev_ws {
                result.push(' ');
                prev_ws = true;
            }
            continue;
        }
        prev_ws = false;

        let at_line_start = line_start && result.trim_start().is_empty();
        let special = match c as u32 {
            b if b < 128 => NEEDS_ESCAPE[b as usize],
            _ => false,
        } || (at_line_start && matches!(c, '#' | '-' | '+' | '>'));

        if special {
            result.push('\\');
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&nbsp;"), "\u{a0}");
    }

    #[test]
    fn test_decode_leaves_unknown_references() {
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_entities("tail &"), "tail &");
    }

    #[test]
    fn test_collapse_and_escape() {
        assert_eq!(collapse_and_escape("a  *b*\n c", true), "a \\*b\\* c");
        assert_eq!(collapse_and_escape("# not a heading", true), "\\# not a heading");
        assert_eq!(collapse_and_escape("- mid sentence", false), "- mid sentence");
        assert_eq!(collapse_and_escape("well-known", true), "well-known");
    }
}

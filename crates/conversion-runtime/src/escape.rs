//! Escaping for embedding text into script command strings.
//!
//! One pure function per literal style. Evaluating the escaped literal yields
//! the input back unchanged for any string.

/// Escape for a double-quoted string literal
pub fn escape_double_quoted(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// Escape for a backtick template literal
pub fn escape_template_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' => out.push_str("\\$"),
            // Raw carriage returns in template literals are normalized to \n
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::native::NativeHost;
    use crate::script::{ContextFactory, ScriptContext, ScriptValue};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_double_quoted_table() {
        let cases = [
            ("plain", "plain"),
            ("a\\b", "a\\\\b"),
            ("say \"hi\"", "say \\\"hi\\\""),
            ("l1\nl2", "l1\\nl2"),
            ("cr\r", "cr\\r"),
            ("tab\t", "tab\\t"),
            ("`$`", "`$`"),
            ("sep\u{2028}", "sep\\u2028"),
        ];
        for (input, expected) in cases {
            assert_eq!(escape_double_quoted(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_template_literal_table() {
        let cases = [
            ("plain", "plain"),
            ("a\\b", "a\\\\b"),
            ("`code`", "\\`code\\`"),
            ("${x}", "\\${x}"),
            ("line\nbreak \"q\"", "line\nbreak \"q\""),
            ("crlf\r\n", "crlf\\r\n"),
        ];
        for (input, expected) in cases {
            assert_eq!(escape_template_literal(input), expected, "input {input:?}");
        }
    }

    fn evaluate(source: &str) -> ScriptValue {
        let mut context = NativeHost::new().create_context().unwrap();
        context.evaluate(source).unwrap()
    }

    proptest! {
        #[test]
        fn prop_double_quoted_survives_evaluation(s in any::<String>()) {
            let source = format!("\"{}\"", escape_double_quoted(&s));
            prop_assert_eq!(evaluate(&source), ScriptValue::String(s));
        }

        #[test]
        fn prop_template_literal_survives_evaluation(s in any::<String>()) {
            let source = format!("`{}`", escape_template_literal(&s));
            prop_assert_eq!(evaluate(&source), ScriptValue::String(s));
        }
    }
}

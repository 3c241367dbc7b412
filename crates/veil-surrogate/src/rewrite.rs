//! Position-preserving rewrite of the private-contract source language down
//! to the subset its host-language back-end can type-check directly.
//!
//! Every substitution keeps the output the same length as its input slice:
//! non-newline characters become spaces, newlines are left untouched. This
//! keeps line/column positions from any host-compiler diagnostic aligned
//! with the original source, at the cost of discarding every privacy
//! feature the host compiler would not understand anyway.
//!
//! `regex` has no lookaround, so every pattern below is written to consume
//! its boundary context (word boundaries, the `=>` after a mapping key)
//! rather than assert it without consuming — capture groups pick out the
//! sub-range that actually gets blanked.

use once_cell::sync::Lazy;
use regex::Regex;

const ME_DECL: &str = " address private me = msg.sender;";

const WS: &str = r"[ \t\r\n\x0C]";
const ID: &str = r"[a-zA-Z$_][a-zA-Z0-9$_]*";
const BASIC_TYPE: &str = r"(?:address|bool|uint)";

static STRING_OR_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?s)(?P<line>//[^\r\n]*)",
        r"|(?P<block>/\*.*?\*/)",
        r"|'(?P<squote>(?:[^'\r\n\\]|\\.)*)'",
        r#"|"(?P<dquote>(?:[^"\r\n\\]|\\.)*)""#,
    ))
    .expect("static regex is valid")
});

static FINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfinal\b").expect("static regex is valid"));

/// Only used to assert no bare `all` literal survived rewriting — the
/// rewrite never strips this word itself, so a match here would indicate a
/// bug in one of the earlier passes.
static ALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\ball\b").expect("static regex is valid"));

static ANNOTATED_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{BASIC_TYPE}\b{WS}*(?P<owner>@{WS}*{ID})")).expect("static regex is valid")
});

static MAPPING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\bmapping\b{WS}*\({WS}*\baddress\b{WS}*(?P<tag>!{WS}*{ID}){WS}*=>"))
        .expect("static regex is valid")
});

static REVEAL_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\breveal\b{WS}*\(")).expect("static regex is valid"));

static CONTRACT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\bcontract\b{WS}*{ID}{WS}*\{{[^\n]*\n")).expect("static regex is valid")
});

/// Replaces every non-newline byte of `text[start..end]` with a space.
fn blank_range(text: &mut [u8], start: usize, end: usize) {
    for b in &mut text[start..end] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

/// Blanks line comments, block comments, and the interior of string
/// literals (the surrounding quotes are left in place).
fn strip_comments_and_strings(code: &str) -> String {
    let mut bytes = code.as_bytes().to_vec();
    for caps in STRING_OR_COMMENT.captures_iter(code) {
        if let Some(m) = caps.name("line").or_else(|| caps.name("block")) {
            blank_range(&mut bytes, m.start(), m.end());
        } else if let Some(m) = caps.name("squote").or_else(|| caps.name("dquote")) {
            blank_range(&mut bytes, m.start(), m.end());
        }
    }
    String::from_utf8(bytes).expect("blanking never introduces invalid UTF-8")
}

fn blank_whole_matches(code: &str, pattern: &Regex) -> String {
    let mut bytes = code.as_bytes().to_vec();
    for m in pattern.find_iter(code) {
        blank_range(&mut bytes, m.start(), m.end());
    }
    String::from_utf8(bytes).expect("blanking never introduces invalid UTF-8")
}

/// Strips `@owner` from every `address@owner`/`bool@owner`/`uint@owner`
/// annotation, leaving the underlying type name untouched.
fn strip_annotated_types(code: &str) -> String {
    let mut bytes = code.as_bytes().to_vec();
    for caps in ANNOTATED_TYPE.captures_iter(code) {
        let owner = caps.name("owner").expect("capture group always present on a match");
        blank_range(&mut bytes, owner.start(), owner.end());
    }
    String::from_utf8(bytes).expect("blanking never introduces invalid UTF-8")
}

/// Strips `!tag` from `mapping(address!tag => ...)`, leaving `mapping(address`
/// and the following `=>` untouched.
fn strip_mapping_tags(code: &str) -> String {
    let mut bytes = code.as_bytes().to_vec();
    for caps in MAPPING_TAG.captures_iter(code) {
        let tag = caps.name("tag").expect("capture group always present on a match");
        blank_range(&mut bytes, tag.start(), tag.end());
    }
    String::from_utf8(bytes).expect("blanking never introduces invalid UTF-8")
}

/// Strips every `reveal(expr, owner)` call down to `expr`, padding the
/// `reveal(` token, the trailing `, owner`, and the closing paren with
/// spaces. Reveals can nest (`reveal(reveal(x, me), bob)`), so the matching
/// close paren is found by a bracket-balance scan rather than a second
/// regex — a regex alone cannot express "the paren that matches this one"
/// once nesting is possible.
fn strip_reveals(code: &str) -> String {
    let mut bytes = code.as_bytes().to_vec();

    for start_match in REVEAL_OPEN.find_iter(code) {
        let reveal_begin = start_match.start();
        let open_paren = start_match.end() - 1;

        let mut depth = 1i32;
        let mut close_paren = open_paren;
        for (offset, c) in code[open_paren + 1..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                close_paren = open_paren + 1 + offset;
                break;
            }
        }

        let last_comma = code[..close_paren].rfind(',').expect("reveal always has an owner argument");

        blank_range(&mut bytes, reveal_begin, open_paren + 1);
        blank_range(&mut bytes, last_comma, close_paren);
    }

    String::from_utf8(bytes).expect("blanking never introduces invalid UTF-8")
}

/// Splices a constant-length `me` declaration as the first statement of
/// every contract body, appending it to the header line in place of the
/// newline that ends it, so later source positions never shift. Skips
/// headers that already end in the declaration, which makes the rewrite
/// idempotent on its own output.
fn inject_me_declarations(code: &str) -> String {
    let mut out = String::with_capacity(code.len() + 64);
    let mut rest = code;

    while let Some(m) = CONTRACT_HEADER.find(rest) {
        out.push_str(&rest[..m.start()]);
        let header_line = &m.as_str()[..m.as_str().len() - 1];
        if header_line.ends_with(ME_DECL) {
            out.push_str(m.as_str());
        } else {
            out.push_str(header_line);
            out.push_str(ME_DECL);
            out.push('\n');
        }
        rest = &rest[m.end()..];
    }
    out.push_str(rest);
    out
}

/// Rewrites `code` to the equivalent host-language-only source: comments
/// and string-literal contents gone, `final`/`@owner`/`!tag` gone,
/// `reveal(expr, owner)` replaced by `expr`, and a `me` declaration injected
/// into every contract body. Every position before the first contract
/// header keeps its exact byte offset; the header line itself only grows by
/// the constant length of the injected declaration, and only once.
pub fn rewrite(code: &str) -> String {
    let code = strip_comments_and_strings(code);
    let code = blank_whole_matches(&code, &FINAL);
    let code = strip_annotated_types(&code);
    let code = strip_mapping_tags(&code);
    let code = strip_reveals(&code);
    debug_assert!(ALL.find(&code).is_none(), "rewrite left an `all` literal in place");
    inject_me_declarations(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_and_block_comments_preserving_length() {
        let src = "uint x; // a secret\nuint y; /* block\ncomment */ uint z;";
        let out = rewrite(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("secret"));
        assert!(!out.contains("block"));
    }

    #[test]
    fn strips_string_literal_contents_but_keeps_quotes() {
        let src = r#"string memory s = "top secret value";"#;
        let out = rewrite(src);
        assert_eq!(out.len(), src.len());
        assert!(out.contains('"'));
        assert!(!out.contains("secret"));
    }

    #[test]
    fn strips_final_keyword() {
        let src = "final uint x = 1;";
        let out = rewrite(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("final"));
        assert!(out.trim_start().starts_with("uint"));
    }

    #[test]
    fn strips_ownership_annotation_keeping_base_type() {
        let src = "uint@alice balance = 0;";
        let out = rewrite(src);
        assert_eq!(out.len(), src.len());
        assert!(out.starts_with("uint"));
        assert!(!out.contains('@'));
    }

    #[test]
    fn strips_mapping_key_tag() {
        let src = "mapping(address!owner => uint) balances;";
        let out = rewrite(src);
        assert_eq!(out.len(), src.len());
        assert!(out.contains("mapping(address"));
        assert!(out.contains("=>"));
        assert!(!out.contains('!'));
    }

    #[test]
    fn strips_reveal_keeping_inner_expression() {
        let src = "require(reveal(x == y, me));";
        let out = rewrite(src);
        assert_eq!(out.len(), src.len());
        assert!(out.contains("x == y"));
        assert!(!out.contains("reveal"));
        assert!(!out.contains("me"));
    }

    #[test]
    fn strips_nested_reveal_expressions() {
        let src = "uint r = reveal(reveal(x + y, me) * 2, bob);";
        let out = rewrite(src);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("reveal"));
        assert!(out.contains("x + y"));
        assert!(out.contains('2'));
    }

    #[test]
    fn preserves_newline_positions_around_a_reveal() {
        let src = "uint a;\nuint b = reveal(c, me);\nuint d;";
        let out = rewrite(src);
        let src_lines: Vec<&str> = src.split('\n').collect();
        let out_lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(src_lines.len(), out_lines.len());
    }

    #[test]
    fn injects_me_declaration_after_contract_header() {
        let src = "contract C {\n    uint x;\n}\n";
        let out = rewrite(src);
        assert!(out.contains("address private me = msg.sender;"));
        assert!(out.contains("contract C {"));
    }

    #[test]
    fn rewrite_is_idempotent_on_its_own_output() {
        let src = "contract C {\nuint@alice x = reveal(final y, me);\n}\n";
        let once = rewrite(src);
        let twice = rewrite(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn does_not_touch_source_outside_any_recognized_construct() {
        let src = "function f(uint x) public returns (uint) { return x; }";
        let out = rewrite(src);
        assert_eq!(out, src);
    }
}

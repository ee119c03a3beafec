//! Regex façade over a pattern AST
//!
//! Generated code describes patterns as a [`RegexNode`] tree. [`format`]
//! serializes the tree to the `regex` crate dialect and [`compile`] builds a
//! [`CompiledRegex`] that remembers capture names in pre-order.
//!
//! All indices that cross this API (`find`'s begin, group bounds) are
//! UTF-16 code unit indices, matching `weft_core::string_ops`.
//!
//! # Examples
//!
//! ```
//! use weft_runtime::regex::{RegexNode, compile};
//!
//! let pattern = RegexNode::Sequence(vec![
//!     RegexNode::capture("key", RegexNode::plus(RegexNode::Word)),
//!     RegexNode::code_points("="),
//!     RegexNode::capture("value", RegexNode::plus(RegexNode::Digit)),
//! ]);
//! let regex = compile(&pattern).unwrap();
//! let found = regex.find("x=12", 0).unwrap();
//! assert_eq!(found.full.value, "x=12");
//! ```

use regex::{Captures, Regex};
use std::fmt::{self, Write as _};
use weft_core::error::{Error, Result, bubble};
use weft_core::list_ops::List;
use weft_core::map_ops::Map;
use weft_core::string_ops::{byte_offset, utf16_index};

/// Pattern AST
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexNode {
    /// Start of input
    Begin,
    /// End of input
    End,
    /// Any code point but `\n`
    Dot,
    /// ASCII digit
    Digit,
    /// ASCII whitespace
    Space,
    /// ASCII word character
    Word,
    WordBoundary,
    /// Literal text
    CodePoints { value: String },
    CodeRange { min: char, max: char },
    CodeSet { items: Vec<SetItem>, negated: bool },
    Capture { name: String, item: Box<RegexNode> },
    Or(Vec<RegexNode>),
    Repeat {
        item: Box<RegexNode>,
        min: u32,
        max: Option<u32>,
        reluctant: bool,
    },
    Sequence(Vec<RegexNode>),
}

/// Member of a [`RegexNode::CodeSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetItem {
    CodePoints(String),
    Range { min: char, max: char },
    Digit,
    Space,
    Word,
}

impl RegexNode {
    pub fn code_points(value: impl Into<String>) -> Self {
        RegexNode::CodePoints {
            value: value.into(),
        }
    }

    pub fn capture(name: impl Into<String>, item: RegexNode) -> Self {
        RegexNode::Capture {
            name: name.into(),
            item: Box::new(item),
        }
    }

    pub fn repeat(item: RegexNode, min: u32, max: Option<u32>, reluctant: bool) -> Self {
        RegexNode::Repeat {
            item: Box::new(item),
            min,
            max,
            reluctant,
        }
    }

    /// `item*`
    pub fn star(item: RegexNode) -> Self {
        RegexNode::repeat(item, 0, None, false)
    }

    /// `item+`
    pub fn plus(item: RegexNode) -> Self {
        RegexNode::repeat(item, 1, None, false)
    }

    /// `item?`
    pub fn optional(item: RegexNode) -> Self {
        RegexNode::repeat(item, 0, Some(1), false)
    }

    pub fn compile(&self) -> Result<CompiledRegex> {
        compile(self)
    }
}

impl fmt::Display for RegexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Matches nothing
const NEVER: &str = r"[^\x00-\u{10ffff}]";
/// Matches any code point
const ANY: &str = r"[\x00-\u{10ffff}]";

/// Serialize `node` in the `regex` crate dialect
pub fn format(node: &RegexNode) -> String {
    let mut out = String::new();
    push_node(&mut out, node);
    out
}

fn push_node(out: &mut String, node: &RegexNode) {
    match node {
        RegexNode::Begin => out.push('^'),
        RegexNode::End => out.push('$'),
        RegexNode::Dot => out.push('.'),
        RegexNode::WordBoundary => out.push_str(r"\b"),
        RegexNode::Digit | RegexNode::Space | RegexNode::Word => {
            out.push('[');
            push_class_body(out, node);
            out.push(']');
        }
        RegexNode::CodePoints { value } => {
            for c in value.chars() {
                push_code_point(out, c, false);
            }
        }
        RegexNode::CodeRange { min, max } => {
            out.push('[');
            push_code_point(out, *min, true);
            out.push('-');
            push_code_point(out, *max, true);
            out.push(']');
        }
        RegexNode::CodeSet { items, negated } => push_set(out, items, *negated),
        RegexNode::Capture { name, item } => {
            out.push_str("(?P<");
            out.push_str(name);
            out.push('>');
            push_node(out, item);
            out.push(')');
        }
        RegexNode::Or(items) => {
            if items.is_empty() {
                out.push_str(NEVER);
            }
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                push_node(out, item);
            }
        }
        RegexNode::Repeat {
            item,
            min,
            max,
            reluctant,
        } => {
            if is_atomic(item) {
                push_node(out, item);
            } else {
                push_group(out, item);
            }
            match (*min, *max) {
                (0, None) => out.push('*'),
                (1, None) => out.push('+'),
                (0, Some(1)) => out.push('?'),
                (m, None) => {
                    let _ = write!(out, "{{{},}}", m);
                }
                (m, Some(n)) if m == n => {
                    let _ = write!(out, "{{{}}}", m);
                }
                (m, Some(n)) => {
                    let _ = write!(out, "{{{},{}}}", m, n);
                }
            }
            if *reluctant {
                out.push('?');
            }
        }
        RegexNode::Sequence(items) => {
            if items.is_empty() {
                out.push_str("(?:)");
            }
            for item in items {
                if matches!(item, RegexNode::Or(_)) {
                    push_group(out, item);
                } else {
                    push_node(out, item);
                }
            }
        }
    }
}

fn push_group(out: &mut String, node: &RegexNode) {
    out.push_str("(?:");
    push_node(out, node);
    out.push(')');
}

/// Whether a quantifier can follow `node` without a group
fn is_atomic(node: &RegexNode) -> bool {
    match node {
        RegexNode::CodePoints { value } => value.chars().count() == 1,
        RegexNode::Dot
        | RegexNode::Digit
        | RegexNode::Space
        | RegexNode::Word
        | RegexNode::CodeRange { .. }
        | RegexNode::CodeSet { .. }
        | RegexNode::Capture { .. } => true,
        RegexNode::Sequence(items) => items.len() == 1 && is_atomic(&items[0]),
        _ => false,
    }
}

fn push_set(out: &mut String, items: &[SetItem], negated: bool) {
    if items.is_empty() {
        out.push_str(if negated { ANY } else { NEVER });
        return;
    }
    out.push('[');
    if negated {
        out.push('^');
    }
    for item in items {
        match item {
            SetItem::CodePoints(value) => {
                for c in value.chars() {
                    push_code_point(out, c, true);
                }
            }
            SetItem::Range { min, max } => {
                push_code_point(out, *min, true);
                out.push('-');
                push_code_point(out, *max, true);
            }
            SetItem::Digit => push_class_body(out, &RegexNode::Digit),
            SetItem::Space => push_class_body(out, &RegexNode::Space),
            SetItem::Word => push_class_body(out, &RegexNode::Word),
        }
    }
    out.push(']');
}

fn push_class_body(out: &mut String, node: &RegexNode) {
    match node {
        RegexNode::Digit => out.push_str("0-9"),
        RegexNode::Space => out.push_str(r"\x09-\x0d "),
        RegexNode::Word => out.push_str("0-9A-Z_a-z"),
        _ => {}
    }
}

/// Emit one code point
///
/// Control and Latin-1 code points use `\xhh`, printable ASCII is literal
/// (escaped when it is a metacharacter), everything else uses `\u{h..}`.
fn push_code_point(out: &mut String, c: char, in_set: bool) {
    let code = c as u32;
    match code {
        0x20..=0x7e => {
            if is_meta(c, in_set) {
                out.push('\\');
            }
            out.push(c);
        }
        0..=0xff => {
            let _ = write!(out, "\\x{:02x}", code);
        }
        _ => {
            let _ = write!(out, "\\u{{{:x}}}", code);
        }
    }
}

fn is_meta(c: char, in_set: bool) -> bool {
    if in_set {
        matches!(c, '\\' | '-' | '&' | '~' | '[' | ']' | '^')
    } else {
        matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        )
    }
}

// ============================================================================
// Compiled patterns
// ============================================================================

/// A matched span; bounds are UTF-16 indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub value: String,
    pub begin: usize,
    pub end: usize,
}

/// A successful match
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Whole match, named `full`
    pub full: Group,
    /// Participating captures in pattern order
    pub groups: Map<String, Group>,
}

#[derive(Debug, Clone)]
pub struct CompiledRegex {
    regex: Regex,
    groups: Vec<String>,
}

/// Format and compile `node`
///
/// A pattern the engine rejects (bad repeat bounds, duplicate or invalid
/// group names, an inverted range) is an invalid-argument error.
pub fn compile(node: &RegexNode) -> Result<CompiledRegex> {
    let pattern = format(node);
    let regex = Regex::new(&pattern)
        .map_err(|e| Error::invalid_argument(format!("bad regex {:?}: {}", pattern, e)))?;
    let mut groups = Vec::new();
    collect_group_names(node, &mut groups);
    Ok(CompiledRegex { regex, groups })
}

fn collect_group_names(node: &RegexNode, names: &mut Vec<String>) {
    match node {
        RegexNode::Capture { name, item } => {
            names.push(name.clone());
            collect_group_names(item, names);
        }
        RegexNode::Repeat { item, .. } => collect_group_names(item, names),
        RegexNode::Or(items) | RegexNode::Sequence(items) => {
            for item in items {
                collect_group_names(item, names);
            }
        }
        _ => {}
    }
}

impl CompiledRegex {
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Capture names in pre-order
    pub fn group_names(&self) -> &[String] {
        &self.groups
    }

    pub fn found(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// First match at or after UTF-16 index `begin`; bubbles if none
    pub fn find(&self, text: &str, begin: usize) -> Result<Match> {
        let start = byte_offset(text, begin);
        let caps = self.regex.captures_at(text, start).ok_or_else(bubble)?;
        let whole = caps.get(0).ok_or_else(bubble)?;
        Ok(self.to_match(text, &caps, whole))
    }

    /// Replace every non-overlapping match with `f`'s result
    ///
    /// A match whose replacement fails is dropped from the output.
    pub fn replace(&self, text: &str, mut f: impl FnMut(&Match) -> Result<String>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in self.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            if let Ok(replacement) = f(&self.to_match(text, &caps, whole)) {
                out.push_str(&replacement);
            }
            last = whole.end();
        }
        out.push_str(&text[last..]);
        out
    }

    pub fn split(&self, text: &str) -> List<String> {
        self.regex.split(text).map(str::to_string).collect()
    }

    fn to_match(&self, text: &str, caps: &Captures<'_>, whole: regex::Match<'_>) -> Match {
        let groups = self
            .groups
            .iter()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.clone(), make_group(name, text, m)))
            })
            .collect();
        Match {
            full: make_group("full", text, whole),
            groups,
        }
    }
}

fn make_group(name: &str, text: &str, m: regex::Match<'_>) -> Group {
    Group {
        name: name.to_string(),
        value: m.as_str().to_string(),
        begin: utf16_index(text, m.start()),
        end: utf16_index(text, m.end()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::list_ops::Listed;
    use weft_core::map_ops::Mapped;

    fn key_value() -> RegexNode {
        RegexNode::Sequence(vec![
            RegexNode::capture("key", RegexNode::plus(RegexNode::Word)),
            RegexNode::code_points("="),
            RegexNode::capture("value", RegexNode::plus(RegexNode::Digit)),
        ])
    }

    #[test]
    fn test_format_sequence_and_repeats() {
        let node = RegexNode::Sequence(vec![
            RegexNode::code_points("a.b"),
            RegexNode::plus(RegexNode::Digit),
            RegexNode::repeat(RegexNode::code_points("xy"), 2, Some(3), true),
            RegexNode::repeat(RegexNode::Dot, 2, Some(2), false),
            RegexNode::repeat(RegexNode::Word, 1, Some(4), false),
            RegexNode::repeat(RegexNode::Space, 5, None, false),
        ]);
        assert_eq!(
            format(&node),
            r"a\.b[0-9]+(?:xy){2,3}?.{2}[0-9A-Z_a-z]{1,4}[\x09-\x0d ]{5,}"
        );
    }

    #[test]
    fn test_format_code_point_table() {
        let node = RegexNode::code_points("\u{1} ~\u{7f}\u{e9}\u{1f642}");
        assert_eq!(format(&node), r"\x01 ~\x7f\xe9\u{1f642}");
    }

    #[test]
    fn test_format_groups_and_alternation() {
        let node = RegexNode::Sequence(vec![
            RegexNode::Or(vec![RegexNode::code_points("a"), RegexNode::code_points("b")]),
            RegexNode::capture("c", RegexNode::optional(RegexNode::code_points("c"))),
        ]);
        assert_eq!(format(&node), "(?:a|b)(?P<c>c?)");
    }

    #[test]
    fn test_format_sets() {
        let node = RegexNode::CodeSet {
            items: vec![
                SetItem::CodePoints("-^]".to_string()),
                SetItem::Range { min: 'a', max: 'f' },
                SetItem::Digit,
            ],
            negated: true,
        };
        assert_eq!(format(&node), r"[^\-\^\]a-f0-9]");
    }

    #[test]
    fn test_empty_set_never_matches() {
        let never = compile(&RegexNode::CodeSet {
            items: vec![],
            negated: false,
        })
        .unwrap();
        assert!(!never.found("anything"));
        let any = compile(&RegexNode::CodeSet {
            items: vec![],
            negated: true,
        })
        .unwrap();
        assert!(any.found("x"));
    }

    #[test]
    fn test_group_names_preorder() {
        let node = RegexNode::capture(
            "outer",
            RegexNode::Sequence(vec![
                RegexNode::capture("first", RegexNode::Dot),
                RegexNode::star(RegexNode::capture("second", RegexNode::Digit)),
            ]),
        );
        let regex = compile(&node).unwrap();
        assert_eq!(regex.group_names(), ["outer", "first", "second"]);
    }

    #[test]
    fn test_find_groups() {
        let regex = compile(&key_value()).unwrap();
        let m = regex.find("--x=12--", 0).unwrap();
        assert_eq!(m.full.name, "full");
        assert_eq!(m.full.value, "x=12");
        assert_eq!((m.full.begin, m.full.end), (2, 6));
        assert_eq!(m.groups.keys().as_slice(), ["key", "value"]);
        assert_eq!(m.groups.get(&"value".to_string()).unwrap().value, "12");
    }

    #[test]
    fn test_find_uses_utf16_indices() {
        let regex = compile(&RegexNode::code_points("ab")).unwrap();
        let m = regex.find("\u{1f642}ab", 0).unwrap();
        assert_eq!((m.full.begin, m.full.end), (2, 4));
    }

    #[test]
    fn test_find_from_begin() {
        let regex = compile(&RegexNode::code_points("ab")).unwrap();
        assert_eq!(regex.find("abab", 1).unwrap().full.begin, 2);
        assert_eq!(regex.find("abab", 3), Err(Error::Bubble));
        assert_eq!(regex.find("abab", 100), Err(Error::Bubble));
    }

    #[test]
    fn test_non_participating_group_omitted() {
        let node = RegexNode::Sequence(vec![
            RegexNode::code_points("a"),
            RegexNode::optional(RegexNode::capture("b", RegexNode::code_points("b"))),
        ]);
        let regex = compile(&node).unwrap();
        assert!(regex.find("a", 0).unwrap().groups.is_empty());
        assert!(regex.find("ab", 0).unwrap().groups.has(&"b".to_string()));
    }

    #[test]
    fn test_replace_elides_failed_matches() {
        let regex = compile(&RegexNode::Digit).unwrap();
        let out = regex.replace("a1b2c3", |m| {
            if m.full.value == "2" {
                Err(Error::Bubble)
            } else {
                Ok(format!("<{}>", m.full.value))
            }
        });
        assert_eq!(out, "a<1>bc<3>");
    }

    #[test]
    fn test_replace_without_matches_copies() {
        let regex = compile(&RegexNode::Digit).unwrap();
        assert_eq!(regex.replace("abc", |_| Ok("!".to_string())), "abc");
    }

    #[test]
    fn test_split_and_found() {
        let regex = compile(&RegexNode::plus(RegexNode::Digit)).unwrap();
        assert_eq!(regex.split("a1b22c").as_slice(), ["a", "b", "c"]);
        assert!(regex.found("x9"));
        assert!(!regex.found("xyz"));
    }

    #[test]
    fn test_reluctant_repeat() {
        let node = RegexNode::repeat(RegexNode::code_points("a"), 1, None, true);
        let regex = compile(&node).unwrap();
        assert_eq!(regex.find("aaa", 0).unwrap().full.value, "a");
    }

    #[test]
    fn test_compile_errors_are_invalid_argument() {
        let bad_bounds = RegexNode::repeat(RegexNode::Dot, 3, Some(1), false);
        assert!(matches!(compile(&bad_bounds), Err(Error::InvalidArgument(_))));

        let duplicate = RegexNode::Sequence(vec![
            RegexNode::capture("x", RegexNode::Dot),
            RegexNode::capture("x", RegexNode::Dot),
        ]);
        assert!(matches!(compile(&duplicate), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_metacharacters_match_literally() {
        let regex = compile(&RegexNode::code_points("1+1=(2)?")).unwrap();
        assert!(regex.found("is 1+1=(2)? yes"));
        assert!(!regex.found("11=2"));
    }
}

//! HTML tokenizer: a flat stream of open / text / close events.
//!
//! No tree is built and nothing is validated: tags come out exactly in the
//! order they appear, which is all the extractor needs.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"^<(/?)([A-Za-z][A-Za-z0-9:-]*)"#,
        r#"((?:\s+[^\s"'/>=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)"#,
        r#"\s*(/?)>"#
    ))
    .unwrap()
});

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

// -- Tokens -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Open { name: String, offset: usize },
    Text { text: Cow<'a, str>, offset: usize },
    Close { name: String, offset: usize },
}

impl Token<'_> {
    pub fn offset(&self) -> usize {
        match self {
            Token::Open { offset, .. } | Token::Text { offset, .. } | Token::Close { offset, .. } => {
                *offset
            }
        }
    }
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Close event owed by a self-closing tag
    pending: Option<Token<'a>>,
    /// Set after opening a raw-text element; its content is skipped
    raw_text: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            pending: None,
            raw_text: None,
        }
    }

    /// Advance past the content of a raw-text element, up to its closing tag.
    fn skip_raw_text(&mut self, name: &str) {
        let rest = self.input[self.pos..].to_ascii_lowercase();
        match rest.find(&format!("</{}", name)) {
            Some(i) => self.pos += i,
            None => self.pos = self.input.len(),
        }
    }

    /// Advance past a construct ending in `terminator`, or to end of input.
    fn skip_past(&mut self, terminator: &str) {
        match self.input[self.pos..].find(terminator) {
            Some(i) => self.pos += i + terminator.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn tag(&mut self, rest: &str) -> Option<Token<'a>> {
        let caps = RE_TAG.captures(rest)?;
        let offset = self.pos;
        self.pos += caps[0].len();

        let name = caps[2].to_ascii_lowercase();
        if !caps[1].is_empty() {
            return Some(Token::Close { name, offset });
        }

        if VOID_ELEMENTS.contains(&name.as_str()) {
            return Some(Token::Open { name, offset });
        }
        if !caps[4].is_empty() {
            self.pending = Some(Token::Close {
                name: name.clone(),
                offset,
            });
        } else if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text = Some(name.clone());
        }
        Some(Token::Open { name, offset })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        if let Some(name) = self.raw_text.take() {
            self.skip_raw_text(&name);
        }

        let input = self.input;
        loop {
            if self.pos >= input.len() {
                return None;
            }
            let rest = &input[self.pos..];

            if rest.starts_with("<!--") {
                self.skip_past("-->");
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">");
                continue;
            }
            if rest.starts_with('<') {
                if let Some(token) = self.tag(rest) {
                    return Some(token);
                }
            }

            // Text runs to the next '<'; a '<' that starts no tag is text too
            let skip = usize::from(rest.starts_with('<'));
            let end = rest[skip..]
                .find('<')
                .map(|i| i + skip)
                .unwrap_or(rest.len());
            let offset = self.pos;
            self.pos += end;
            return Some(Token::Text {
                text: html_escape::decode_html_entities(&rest[..end]),
                offset,
            });
        }
    }
}

/// Tokenize a whole document.
pub fn tokenize(input: &str) -> Tokenizer<'_> {
    Tokenizer::new(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<String> {
        tokenize(input)
            .map(|t| match t {
                Token::Open { name, .. } => format!("<{}>", name),
                Token::Text { text, .. } => text.into_owned(),
                Token::Close { name, .. } => format!("</{}>", name),
            })
            .collect()
    }

    #[test]
    fn open_text_close() {
        assert_eq!(
            kinds("<dl><dt>size</dt></dl>"),
            vec!["<dl>", "<dt>", "size", "</dt>", "</dl>"]
        );
    }

    #[test]
    fn tag_names_are_lowercased() {
        assert_eq!(kinds("<H3 class=\"x\">a</H3>"), vec!["<h3>", "a", "</h3>"]);
    }

    #[test]
    fn attributes_with_gt_in_quotes() {
        assert_eq!(
            kinds(r#"<a title="a > b" href='#x'>t</a>"#),
            vec!["<a>", "t", "</a>"]
        );
    }

    #[test]
    fn comments_and_doctype_skipped() {
        assert_eq!(
            kinds("<!DOCTYPE html><!-- <h3>no</h3> --><p>yes</p>"),
            vec!["<p>", "yes", "</p>"]
        );
    }

    #[test]
    fn processing_instructions_skipped() {
        assert_eq!(
            kinds("<?xml version=\"1.0\" encoding=\"utf-8\"?><h3>a</h3><?php echo 1; ?>b"),
            vec!["<h3>", "a", "</h3>", "b"]
        );
    }

    #[test]
    fn script_content_skipped() {
        assert_eq!(
            kinds("<script>if (a < b) { x = '<h3>'; }</script>done"),
            vec!["<script>", "</script>", "done"]
        );
    }

    #[test]
    fn self_closing_and_void() {
        assert_eq!(
            kinds("a<br>b<span/>c"),
            vec!["a", "<br>", "b", "<span>", "</span>", "c"]
        );
    }

    #[test]
    fn entities_decoded() {
        assert_eq!(kinds("a &lt;b&gt; &amp; &#39;c&#39;"), vec!["a <b> & 'c'"]);
    }

    #[test]
    fn stray_lt_is_text() {
        assert_eq!(kinds("x < 3 <b>y</b>"), vec!["x ", "< 3 ", "<b>", "y", "</b>"]);
    }

    #[test]
    fn offsets_point_at_tokens() {
        let offsets: Vec<usize> = tokenize("ab<i>c</i>").map(|t| t.offset()).collect();
        assert_eq!(offsets, vec![0, 2, 5, 6]);
    }
}

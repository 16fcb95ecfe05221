//! Lexical scanner for template sources.
//!
//! This is not a conforming CSS or HTML parser. It recognises exactly enough
//! structure to find class tokens and inline `style` attributes with their
//! byte ranges:
//!
//! - **CSS**: class selectors in rule preludes (`.a`, `.a.b`, `.a > .b`,
//!   `:not(.a)`), including rules nested in `@media`-like blocks and rules
//!   nested inside other rules. Declarations, at-rule preludes, attribute
//!   selectors, strings and comments never produce tokens.
//! - **HTML**: the first `class` attribute of every element (split on
//!   whitespace), the first `style` attribute (captured whole), and the
//!   selectors of embedded `<style>` elements.
//!
//! Malformed input (unbalanced braces, unterminated tags, comments or
//! strings) is reported as [`EngineError::Parse`] with the offending offset.
//! There is no partial recovery.

use crate::engine::error::EngineError;
use std::borrow::Cow;
use std::ops::Range;

/// Where a [`ClassToken`] was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenContext {
    CssSelector,
    HtmlClassAttribute,
    HtmlInlineStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassToken {
    /// Decoded class name, or the trimmed declaration block for inline styles.
    pub name: String,
    /// Bytes to replace when rewriting. For selectors this is the raw
    /// identifier after the dot, for inline styles the whole attribute
    /// including its leading whitespace.
    pub span: Range<usize>,
    pub context: TokenContext,
    /// Index into [`HtmlScan::elements`] for HTML attribute tokens.
    pub element: Option<usize>,
}

/// Start tag of an element, as far as the rewriter needs to know it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    /// Offset of the `<`.
    pub start: usize,
    /// Offset right after the tag name, where a new attribute can go.
    pub name_end: usize,
    /// Value of the first `class` attribute, without quotes.
    pub class_value: Option<Range<usize>>,
    pub class_quoted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlScan {
    pub tokens: Vec<ClassToken>,
    pub elements: Vec<ElementSpan>,
}

/// At-rules whose block holds rules rather than declarations.
const NESTING_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "container",
    "layer",
    "document",
    "scope",
    "starting-style",
    "keyframes",
    "-webkit-keyframes",
    "-moz-keyframes",
];

pub fn scan_css(css: &str) -> Result<Vec<ClassToken>, EngineError> {
    let mut scanner = CssScanner::new(css, 0);
    scanner.rule_list(None)?;
    Ok(scanner.tokens)
}

pub fn scan_html(html: &str) -> Result<HtmlScan, EngineError> {
    HtmlScanner::new(html).run()
}

struct CssScanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Added to every reported offset; non-zero for `<style>` bodies.
    base: usize,
    tokens: Vec<ClassToken>,
}

impl<'a> CssScanner<'a> {
    fn new(src: &'a str, base: usize) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            base,
            tokens: Vec::new(),
        }
    }

    fn error(&self, reason: &str, at: usize) -> EngineError {
        EngineError::parse(reason, self.base + at)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_comment(&self) -> bool {
        self.bytes[self.pos..].starts_with(b"/*")
    }

    fn skip_comment(&mut self) -> Result<(), EngineError> {
        let start = self.pos;
        match self.src[start + 2..].find("*/") {
            Some(rel) => {
                self.pos = start + 2 + rel + 2;
                Ok(())
            }
            None => Err(self.error("unterminated comment", start)),
        }
    }

    fn skip_string(&mut self) -> Result<(), EngineError> {
        let start = self.pos;
        let quote = self.bytes[start];
        self.pos += 1;
        while let Some(b) = self.peek() {
            match b {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                _ if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(self.error("unterminated string", start))
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), EngineError> {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if self.at_comment() {
                self.skip_comment()?;
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Rules until end of input (top level) or the `}` closing `open`.
    fn rule_list(&mut self, open: Option<usize>) -> Result<(), EngineError> {
        loop {
            self.skip_whitespace_and_comments()?;
            match self.peek() {
                None => {
                    return match open {
                        Some(at) => Err(self.error("unclosed '{'", at)),
                        None => Ok(()),
                    }
                }
                Some(b'}') => {
                    if open.is_some() {
                        self.pos += 1;
                        return Ok(());
                    }
                    return Err(self.error("unexpected '}'", self.pos));
                }
                Some(b'@') => self.at_rule()?,
                Some(_) => self.qualified_rule()?,
            }
        }
    }

    fn at_rule(&mut self) -> Result<(), EngineError> {
        self.pos += 1;
        let name_start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = self.src[name_start..self.pos].to_ascii_lowercase();

        // The prelude (`(min-width: 1.5em)`, `url(a.css)`) never holds classes.
        loop {
            match self.peek() {
                None => return Ok(()),
                Some(b';') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'}') => return Ok(()),
                Some(b'{') => {
                    let open = self.pos;
                    self.pos += 1;
                    return if NESTING_AT_RULES.contains(&name.as_str()) {
                        self.rule_list(Some(open))
                    } else {
                        self.declaration_block(open)
                    };
                }
                Some(b'"') | Some(b'\'') => self.skip_string()?,
                Some(b'/') if self.at_comment() => self.skip_comment()?,
                Some(_) => self.pos += 1,
            }
        }
    }

    fn qualified_rule(&mut self) -> Result<(), EngineError> {
        let rule_start = self.pos;
        loop {
            match self.peek() {
                None | Some(b'}') => {
                    return Err(self.error("expected '{' after selector", rule_start));
                }
                Some(b'{') => {
                    let open = self.pos;
                    self.pos += 1;
                    return self.declaration_block(open);
                }
                Some(b'.') if self.ident_starts_at(self.pos + 1) => self.class_selector(),
                Some(b'[') => self.skip_attribute_selector()?,
                Some(b'"') | Some(b'\'') => self.skip_string()?,
                Some(b'/') if self.at_comment() => self.skip_comment()?,
                Some(b'\\') => self.pos = self.ident_end(self.pos),
                Some(_) => self.pos += 1,
            }
        }
    }

    fn class_selector(&mut self) {
        let start = self.pos + 1;
        let end = self.ident_end(start);
        let raw = &self.src[start..end];
        self.tokens.push(ClassToken {
            name: decode_ident(raw),
            span: self.base + start..self.base + end,
            context: TokenContext::CssSelector,
            element: None,
        });
        self.pos = end;
    }

    fn skip_attribute_selector(&mut self) -> Result<(), EngineError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None => return Err(self.error("unclosed '['", start)),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'"') | Some(b'\'') => self.skip_string()?,
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Skips a `{ ... }` block of declarations. A statement that opens a
    /// block of its own is a nested rule (`.a { &.b { } .c { } }`): its
    /// selector is scanned and its body is a declaration block again.
    fn declaration_block(&mut self, open: usize) -> Result<(), EngineError> {
        let mut statement = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error("unclosed '{'", open)),
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b';') => {
                    self.pos += 1;
                    statement = self.pos;
                }
                Some(b'{') => {
                    let nested = self.pos;
                    self.nested_selector(statement, nested)?;
                    self.pos = nested + 1;
                    self.declaration_block(nested)?;
                    statement = self.pos;
                }
                Some(b'"') | Some(b'\'') => self.skip_string()?,
                Some(b'/') if self.at_comment() => self.skip_comment()?,
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Class tokens of a nested rule's selector in `from..to`. Nested at-rule
    /// preludes are skipped like top-level ones.
    fn nested_selector(&mut self, from: usize, to: usize) -> Result<(), EngineError> {
        self.pos = from;
        self.skip_whitespace_and_comments()?;
        if self.peek() == Some(b'@') {
            return Ok(());
        }
        while self.pos < to {
            match self.peek() {
                Some(b'.') if self.ident_starts_at(self.pos + 1) => self.class_selector(),
                Some(b'[') => self.skip_attribute_selector()?,
                Some(b'"') | Some(b'\'') => self.skip_string()?,
                Some(b'/') if self.at_comment() => self.skip_comment()?,
                Some(b'\\') => self.pos = self.ident_end(self.pos),
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    fn ident_starts_at(&self, at: usize) -> bool {
        match self.bytes.get(at) {
            Some(&b) if is_name_start(b) || b == b'\\' => true,
            Some(b'-') => matches!(
                self.bytes.get(at + 1),
                Some(&b) if is_name_start(b) || b == b'-' || b == b'\\'
            ),
            _ => false,
        }
    }

    fn ident_end(&self, from: usize) -> usize {
        let mut at = from;
        while let Some(&b) = self.bytes.get(at) {
            if is_name_char(b) {
                at += 1;
            } else if b == b'\\' && at + 1 < self.bytes.len() {
                at += 1 + escape_len(&self.src[at + 1..]);
            } else {
                break;
            }
        }
        at
    }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-'
}

/// Bytes consumed by an escape body (everything after the backslash).
fn escape_len(rest: &str) -> usize {
    let hex = rest
        .bytes()
        .take(6)
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if hex > 0 {
        let trailing_space = rest[hex..]
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_whitespace());
        return hex + usize::from(trailing_space);
    }
    rest.chars().next().map_or(0, char::len_utf8)
}

/// Resolves CSS escapes: `sm\:flex` is the class `sm:flex`, `\31 0` is `10`.
pub fn decode_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        let body = &rest[idx + 1..];
        let len = escape_len(body);
        let hex: String = body[..len]
            .chars()
            .take_while(char::is_ascii_hexdigit)
            .collect();
        if hex.is_empty() {
            out.push_str(&body[..len]);
        } else {
            let decoded = u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            out.push(decoded);
        }
        rest = &body[len..];
    }
    out.push_str(rest);
    out
}

/// Serializes a class name as a CSS identifier, the inverse of
/// [`decode_ident`]. Names that are already identifier-safe come back
/// unchanged.
pub fn escape_ident(name: &str) -> Cow<'_, str> {
    let plain = |(i, c): (usize, char)| {
        c.is_ascii_alphabetic()
            || c == '_'
            || !c.is_ascii()
            || (c == '-' && name.len() > 1)
            || (c.is_ascii_digit() && i > 0 && !(i == 1 && name.starts_with('-')))
    };
    if !name.is_empty() && name.char_indices().all(plain) {
        return Cow::Borrowed(name);
    }

    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.char_indices() {
        match c {
            '\0' => out.push(char::REPLACEMENT_CHARACTER),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", c as u32)),
            '0'..='9' if i == 0 || (i == 1 && name.starts_with('-')) => {
                out.push_str(&format!("\\{:x} ", c as u32))
            }
            '-' if name.len() == 1 => out.push_str("\\-"),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => {
                out.push(c)
            }
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    Cow::Owned(out)
}

struct HtmlScanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    scan: HtmlScan,
}

impl<'a> HtmlScanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            scan: HtmlScan::default(),
        }
    }

    fn run(mut self) -> Result<HtmlScan, EngineError> {
        while self.pos < self.bytes.len() {
            let Some(rel) = self.src[self.pos..].find('<') else {
                break;
            };
            let start = self.pos + rel;
            let rest = &self.bytes[start..];

            if rest.starts_with(b"<!--") {
                let end = self.src[start + 4..]
                    .find("-->")
                    .ok_or_else(|| EngineError::parse("unterminated comment", start))?;
                self.pos = start + 4 + end + 3;
            } else if matches!(rest.get(1), Some(b'!') | Some(b'?') | Some(b'/')) {
                let end = self.src[start..]
                    .find('>')
                    .ok_or_else(|| EngineError::parse("unterminated tag", start))?;
                self.pos = start + end + 1;
            } else if rest.get(1).is_some_and(u8::is_ascii_alphabetic) {
                self.start_tag(start)?;
            } else {
                self.pos = start + 1;
            }
        }
        Ok(self.scan)
    }

    fn start_tag(&mut self, start: usize) -> Result<(), EngineError> {
        self.pos = start + 1;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b':' || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name_end = self.pos;
        let tag_name = self.src[start + 1..name_end].to_ascii_lowercase();

        let element = self.scan.elements.len();
        self.scan.elements.push(ElementSpan {
            start,
            name_end,
            class_value: None,
            class_quoted: false,
        });
        let mut seen_style = false;

        loop {
            let attr_lead = self.pos;
            self.skip_whitespace();
            let Some(&b) = self.bytes.get(self.pos) else {
                return Err(EngineError::parse("unterminated tag", start));
            };
            match b {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' | b'"' | b'\'' | b'=' => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = self.pos;
            while let Some(&b) = self.bytes.get(self.pos) {
                if b.is_ascii_whitespace() || matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'') {
                    break;
                }
                self.pos += 1;
            }
            let attr_name = self.src[name_start..self.pos].to_ascii_lowercase();
            let after_name = self.pos;

            self.skip_whitespace();
            if self.bytes.get(self.pos) != Some(&b'=') {
                self.pos = after_name;
                continue;
            }
            self.pos += 1;
            self.skip_whitespace();
            let (value, quoted) = self.attribute_value(start)?;
            let attr_end = self.pos;

            match attr_name.as_str() {
                "class" if self.scan.elements[element].class_value.is_none() => {
                    self.class_attribute(element, value.clone());
                    let span = &mut self.scan.elements[element];
                    span.class_value = Some(value);
                    span.class_quoted = quoted;
                }
                "style" if !seen_style => {
                    seen_style = true;
                    self.style_attribute(element, value, attr_lead..attr_end)?;
                }
                _ => {}
            }
        }

        match tag_name.as_str() {
            "script" => {
                self.pos = self.raw_text_end("</script").unwrap_or(self.bytes.len());
            }
            "style" => {
                let body_start = self.pos;
                let body_end = self.raw_text_end("</style").unwrap_or(self.bytes.len());
                let mut css = CssScanner::new(&self.src[body_start..body_end], body_start);
                css.rule_list(None)?;
                self.scan.tokens.extend(css.tokens);
                self.pos = body_end;
            }
            _ => {}
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(u8::is_ascii_whitespace)
        {
            self.pos += 1;
        }
    }

    fn attribute_value(&mut self, tag_start: usize) -> Result<(Range<usize>, bool), EngineError> {
        match self.bytes.get(self.pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let value_start = self.pos + 1;
                let close = self.bytes[value_start..]
                    .iter()
                    .position(|&b| b == quote)
                    .ok_or_else(|| EngineError::parse("unterminated tag", tag_start))?;
                self.pos = value_start + close + 1;
                Ok((value_start..value_start + close, true))
            }
            Some(_) => {
                let value_start = self.pos;
                while let Some(&b) = self.bytes.get(self.pos) {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                Ok((value_start..self.pos, false))
            }
            None => Err(EngineError::parse("unterminated tag", tag_start)),
        }
    }

    fn class_attribute(&mut self, element: usize, value: Range<usize>) {
        let text = &self.src[value.clone()];
        let mut offset = 0;
        for word in text.split_ascii_whitespace() {
            // `split_ascii_whitespace` yields subslices in order, so the next
            // occurrence after `offset` is this word.
            let rel = text[offset..].find(word).map_or(offset, |r| offset + r);
            let begin = value.start + rel;
            self.scan.tokens.push(ClassToken {
                name: word.to_string(),
                span: begin..begin + word.len(),
                context: TokenContext::HtmlClassAttribute,
                element: Some(element),
            });
            offset = rel + word.len();
        }
    }

    fn style_attribute(
        &mut self,
        element: usize,
        value: Range<usize>,
        attribute: Range<usize>,
    ) -> Result<(), EngineError> {
        let text = &self.src[value.clone()];
        if let Some(bad) = text.find(['{', '}', '<']) {
            return Err(EngineError::parse(
                "inline style cannot contain '{', '}' or '<'",
                value.start + bad,
            ));
        }
        let declarations = text.trim();
        if declarations.is_empty() {
            return Ok(());
        }
        self.scan.tokens.push(ClassToken {
            name: declarations.to_string(),
            span: attribute,
            context: TokenContext::HtmlInlineStyle,
            element: Some(element),
        });
        Ok(())
    }

    /// Offset of the closing tag that ends a raw text element.
    fn raw_text_end(&self, closing: &str) -> Option<usize> {
        let needle = closing.as_bytes();
        self.bytes[self.pos..]
            .windows(needle.len())
            .position(|window| window.eq_ignore_ascii_case(needle))
            .map(|rel| self.pos + rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn css_names(css: &str) -> Vec<String> {
        scan_css(css)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect()
    }

    fn parse_offset(result: Result<impl std::fmt::Debug, EngineError>) -> (String, usize) {
        match result {
            Err(EngineError::Parse {
                reason,
                byte_offset,
            }) => (reason, byte_offset),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn compound_and_combinator_selectors() {
        assert_eq!(
            css_names(".a.b > .c, .d .e:hover {}"),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn spans_cover_identifier_without_dot() {
        let css = ".card { color: red }";
        let tokens = scan_css(css).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(&css[tokens[0].span.clone()], "card");
        assert_eq!(tokens[0].context, TokenContext::CssSelector);
    }

    #[test]
    fn declarations_never_produce_tokens() {
        let css = ".box { width: 1.5em; background: url(img/a.png); content: '.x'; }";
        assert_eq!(css_names(css), vec!["box"]);
    }

    #[test]
    fn at_rule_preludes_are_skipped_and_media_blocks_nested() {
        let css = "@import url(theme.css);\n\
                   @media (min-width: 40.5em) { .wide { display: flex } }\n\
                   @font-face { font-family: x; src: url(f.woff2) }\n\
                   @keyframes pulse { 0% { opacity: 0 } 50.5% { opacity: .5 } }";
        assert_eq!(css_names(css), vec!["wide"]);
    }

    #[test]
    fn pseudo_class_arguments_count_but_attribute_selectors_do_not() {
        let css = "li:not(.done)[data-x='.y'] { }";
        assert_eq!(css_names(css), vec!["done"]);
    }

    #[test]
    fn comments_and_strings_are_opaque() {
        let css = "/* .ghost {} */ .real { content: \"}\" }";
        assert_eq!(css_names(css), vec!["real"]);
    }

    #[test]
    fn escapes_are_decoded_but_span_stays_raw() {
        let css = r".sm\:flex { } .\31 0col { }";
        let tokens = scan_css(css).unwrap();
        assert_eq!(tokens[0].name, "sm:flex");
        assert_eq!(&css[tokens[0].span.clone()], r"sm\:flex");
        assert_eq!(tokens[1].name, "10col");
    }

    #[test]
    fn numbers_after_dots_are_not_classes() {
        assert_eq!(css_names(".a .5 { }"), vec!["a"]);
    }

    #[test]
    fn unclosed_brace_reports_its_offset() {
        let (reason, offset) = parse_offset(scan_css(".a { color: red; .b { }"));
        // `.b { }` closes the inner brace; the first `{` never closes.
        assert_eq!(reason, "unclosed '{'");
        assert_eq!(offset, 3);
    }

    #[test]
    fn stray_closing_brace_reports_its_offset() {
        let (reason, offset) = parse_offset(scan_css(".a { } }"));
        assert_eq!(reason, "unexpected '}'");
        assert_eq!(offset, 7);
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let (reason, offset) = parse_offset(scan_css(".a {} /* never ends"));
        assert_eq!(reason, "unterminated comment");
        assert_eq!(offset, 6);
    }

    #[test]
    fn html_class_attribute_splits_on_whitespace() {
        let html = r#"<div class="card  active">x</div>"#;
        let scan = scan_html(html).unwrap();
        let words: Vec<&str> = scan.tokens.iter().map(|t| &html[t.span.clone()]).collect();
        assert_eq!(words, vec!["card", "active"]);
        assert!(scan
            .tokens
            .iter()
            .all(|t| t.context == TokenContext::HtmlClassAttribute && t.element == Some(0)));
        assert_eq!(scan.elements[0].class_value, Some(12..24));
        assert!(scan.elements[0].class_quoted);
    }

    #[test]
    fn html_quoting_styles() {
        let html = "<p class='a'></p><p class=b id=x></p><p CLASS=\"c\"></p>";
        let scan = scan_html(html).unwrap();
        let names: Vec<&str> = scan.tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!scan.elements[1].class_quoted);
    }

    #[test]
    fn only_first_class_attribute_counts() {
        let scan = scan_html(r#"<i class="a" class="b"></i>"#).unwrap();
        assert_eq!(scan.tokens.len(), 1);
        assert_eq!(scan.tokens[0].name, "a");
    }

    #[test]
    fn inline_style_captured_whole_with_leading_whitespace() {
        let html = r#"<div id="x" style=" color: red; margin: 0 ">hi</div>"#;
        let scan = scan_html(html).unwrap();
        assert_eq!(scan.tokens.len(), 1);
        let token = &scan.tokens[0];
        assert_eq!(token.context, TokenContext::HtmlInlineStyle);
        assert_eq!(token.name, "color: red; margin: 0");
        assert_eq!(&html[token.span.clone()], r#" style=" color: red; margin: 0 ""#);
        assert_eq!(scan.elements[0].name_end, 4);
    }

    #[test]
    fn empty_inline_style_is_ignored() {
        let scan = scan_html(r#"<div style="  "></div>"#).unwrap();
        assert!(scan.tokens.is_empty());
    }

    #[test]
    fn inline_style_with_braces_is_rejected() {
        let (_, offset) = parse_offset(scan_html(r#"<a style="x}y">"#));
        assert_eq!(offset, 11);
    }

    #[test]
    fn comments_scripts_and_end_tags_are_skipped() {
        let html = "<!-- <b class=\"no\"> --><!DOCTYPE html><script>if (a<b) { x.className = 'no' }</script><b class=\"yes\"></b>";
        let scan = scan_html(html).unwrap();
        let names: Vec<&str> = scan.tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["yes"]);
    }

    #[test]
    fn embedded_style_elements_yield_selector_tokens_with_html_offsets() {
        let html = "<style>.hero { color: red }</style><div class=\"hero\"></div>";
        let scan = scan_html(html).unwrap();
        assert_eq!(scan.tokens[0].context, TokenContext::CssSelector);
        assert_eq!(&html[scan.tokens[0].span.clone()], "hero");
        assert_eq!(scan.tokens[0].span.start, 8);
        assert_eq!(scan.tokens[1].context, TokenContext::HtmlClassAttribute);
    }

    #[test]
    fn unterminated_tag_reports_tag_start() {
        let (reason, offset) = parse_offset(scan_html("<p>ok</p><div class=\"a\""));
        assert_eq!(reason, "unterminated tag");
        assert_eq!(offset, 9);
    }

    #[test]
    fn stray_less_than_is_text() {
        let scan = scan_html("<p>1 < 2</p>").unwrap();
        assert!(scan.tokens.is_empty());
        assert_eq!(scan.elements.len(), 1);
    }

    #[test]
    fn escaping_inverts_decoding() {
        assert!(matches!(escape_ident("tpl7-ab12cd34-card"), Cow::Borrowed(_)));
        assert_eq!(escape_ident("sm:flex"), r"sm\:flex");
        assert_eq!(escape_ident("w-1/2"), r"w-1\/2");
        assert_eq!(escape_ident("1col"), r"\31 col");
        assert_eq!(escape_ident("-2"), r"-\32 ");
        assert_eq!(escape_ident("-"), r"\-");

        for name in ["sm:flex", "w-1/2", "1col", "-2", "a.b", "hover:bg-[#fff]"] {
            let css = format!(".{} {{}}", escape_ident(name));
            assert_eq!(css_names(&css), vec![name]);
        }
    }

    #[test]
    fn rules_nested_in_rules_are_scanned() {
        let css = ".a { color: red; &.b { margin: 0 } .c > .d { .e {} } @media (min-width: 1.5em) { .f {} } }";
        assert_eq!(css_names(css), vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(css_names(".a { width: 1.5em; background: url(x.png) }"), vec!["a"]);
        assert_eq!(parse_offset(scan_css(".a { .b { }")).1, 3);
    }
}

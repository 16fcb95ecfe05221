//! Turns scanner output into the ordered vocabularies the generator names.

use crate::engine::scanner::{ClassToken, TokenContext};
use std::collections::HashSet;

/// Distinct class names in first-seen order: stylesheet selectors first,
/// then the markup (class attributes and embedded `<style>` selectors).
pub fn extract_classes(css_tokens: &[ClassToken], html_tokens: &[ClassToken]) -> Vec<String> {
    let mut seen = HashSet::new();
    css_tokens
        .iter()
        .chain(html_tokens)
        .filter(|token| token.context != TokenContext::HtmlInlineStyle)
        .filter(|&token| seen.insert(token.name.as_str()))
        .map(|token| token.name.clone())
        .collect()
}

/// Distinct inline declaration blocks in first-seen order. Elements with the
/// same block end up sharing one synthetic class.
pub fn extract_styles(html_tokens: &[ClassToken]) -> Vec<String> {
    let mut seen = HashSet::new();
    html_tokens
        .iter()
        .filter(|token| token.context == TokenContext::HtmlInlineStyle)
        .filter(|&token| seen.insert(token.name.as_str()))
        .map(|token| token.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scanner::{scan_css, scan_html};
    use pretty_assertions::assert_eq;

    #[test]
    fn css_first_then_html_without_duplicates() {
        let css = scan_css(".card .title {} .card:hover {} .footer {}").unwrap();
        let html = scan_html(r#"<div class="wrapper card"><b class="title extra"></b></div>"#)
            .unwrap();

        assert_eq!(
            extract_classes(&css, &html.tokens),
            vec!["card", "title", "footer", "wrapper", "extra"]
        );
    }

    #[test]
    fn identical_vocabularies_give_identical_order() {
        let first = scan_css(".b {} .a {} .b .c {}").unwrap();
        let second = scan_css(".b{}\n.a{}\n.b>.c{}").unwrap();
        assert_eq!(
            extract_classes(&first, &[]),
            extract_classes(&second, &[])
        );
    }

    #[test]
    fn inline_styles_are_not_classes() {
        let html = scan_html(
            r#"<p style="color: red" class="a"></p><p style="color: red"></p><p style="margin: 0"></p>"#,
        )
        .unwrap();

        assert_eq!(extract_classes(&[], &html.tokens), vec!["a"]);
        assert_eq!(
            extract_styles(&html.tokens),
            vec!["color: red", "margin: 0"]
        );
    }
}

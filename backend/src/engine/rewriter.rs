//! Applies finalized mappings to template sources.
//!
//! Both sources are re-scanned and only token ranges are replaced, so `.card`
//! never matches inside `.cardHeader` and neighbouring class tokens are
//! rewritten independently.
//!
//! Names written into selectors are CSS-escaped, so rewriting with an
//! inverse mapping restores names such as `sm:flex` as `sm\:flex`.
//!
//! Selectors without a mapping entry are left as they are. A class used in
//! markup without one means the mapping was not built from this template,
//! which is an [`EngineError::InternalConsistency`].

use crate::engine::error::EngineError;
use crate::engine::scanner::{escape_ident, scan_css, scan_html, ClassToken, TokenContext};
use common::model::mapping::{ClassMapping, StyleMapping};
use log::error;
use std::collections::BTreeMap;
use std::ops::Range;

#[derive(Debug)]
struct Edit {
    range: Range<usize>,
    text: String,
}

impl Edit {
    fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

pub fn rewrite_css(css: &str, classes: &ClassMapping) -> Result<String, EngineError> {
    let edits = scan_css(css)?
        .into_iter()
        .filter_map(|token| {
            classes
                .get(&token.name)
                .map(|unique| Edit::replace(token.span, escape_ident(unique)))
        })
        .collect();
    apply_edits(css, edits)
}

/// Rewrites class tokens, then moves every non-empty inline `style` into the
/// element's `class` attribute as its synthetic class.
pub fn rewrite_html(
    html: &str,
    classes: &ClassMapping,
    styles: &StyleMapping,
) -> Result<String, EngineError> {
    let scan = scan_html(html)?;
    let mut edits = Vec::with_capacity(scan.tokens.len());
    let mut synthetic_by_element = BTreeMap::new();

    for token in &scan.tokens {
        match token.context {
            TokenContext::CssSelector => {
                if let Some(unique) = classes.get(&token.name) {
                    edits.push(Edit::replace(token.span.clone(), escape_ident(unique)));
                }
            }
            TokenContext::HtmlClassAttribute => {
                edits.push(Edit::replace(token.span.clone(), unique_name(classes, token)?));
            }
            TokenContext::HtmlInlineStyle => {
                let synthetic = styles.class_for(&token.name).ok_or_else(|| {
                    consistency_error(format!(
                        "inline style `{}` has no synthetic class",
                        token.name
                    ))
                })?;
                let element = token.element.ok_or_else(|| {
                    consistency_error("inline style token without an element".to_string())
                })?;
                edits.push(Edit::replace(token.span.clone(), ""));
                synthetic_by_element.insert(element, synthetic);
            }
        }
    }

    for (element, synthetic) in synthetic_by_element {
        let span = &scan.elements[element];
        match &span.class_value {
            None => edits.push(Edit::insert(
                span.name_end,
                format!(" class=\"{synthetic}\""),
            )),
            Some(value) if html[value.clone()].trim().is_empty() => {
                let text = if span.class_quoted {
                    synthetic.to_string()
                } else {
                    format!("\"{synthetic}\"")
                };
                edits.push(Edit::replace(value.clone(), text));
            }
            Some(value) if span.class_quoted => {
                edits.push(Edit::insert(value.end, format!(" {synthetic}")));
            }
            Some(value) => {
                edits.push(Edit::insert(value.start, "\""));
                edits.push(Edit::insert(value.end, format!(" {synthetic}\"")));
            }
        }
    }

    apply_edits(html, edits)
}

/// One `.class { declarations }` rule per extracted inline style.
pub fn synthetic_stylesheet(styles: &StyleMapping) -> String {
    styles
        .iter()
        .map(|(class, declarations)| {
            let declarations = declarations.trim();
            if declarations.ends_with(';') {
                format!(".{class} {{ {declarations} }}")
            } else {
                format!(".{class} {{ {declarations}; }}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The stylesheet handed to deployment: rewritten CSS followed by the
/// synthetic rules.
pub fn compose_custom_css(rewritten_css: &str, styles: &StyleMapping) -> String {
    let synthetic = synthetic_stylesheet(styles);
    if synthetic.is_empty() {
        return rewritten_css.to_string();
    }
    if rewritten_css.is_empty() {
        return synthetic;
    }
    let separator = if rewritten_css.ends_with('\n') { "" } else { "\n" };
    format!("{rewritten_css}{separator}{synthetic}")
}

fn unique_name<'m>(classes: &'m ClassMapping, token: &ClassToken) -> Result<&'m str, EngineError> {
    classes
        .get(&token.name)
        .ok_or_else(|| consistency_error(format!("class `{}` has no mapping entry", token.name)))
}

fn consistency_error(message: String) -> EngineError {
    error!("rewriter: {}", message);
    EngineError::InternalConsistency(message)
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, EngineError> {
    edits.sort_by_key(|edit| (edit.range.start, edit.range.end));
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor {
            return Err(consistency_error(format!(
                "overlapping rewrite at byte {}",
                edit.range.start
            )));
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

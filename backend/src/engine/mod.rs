//! # Template Uniqueness Engine
//!
//! Rewrites a template's class names (and inline styles) into identifiers
//! scoped to one site, so that many tenants can render the same template side
//! by side without class collisions.
//!
//! ## Pipeline
//!
//! 1.  **Scanner** (`scanner`): locates class tokens and inline styles in the
//!     template's CSS and HTML, failing on malformed input.
//! 2.  **Extractor** (`extractor`): builds the ordered, de-duplicated class and
//!     inline-style vocabularies.
//! 3.  **Generator** (`generator`): derives a collision-free identifier for
//!     every entry, seeded by `template_id:site_id`.
//! 4.  **Rewriter** (`rewriter`): re-scans both sources and replaces tokens,
//!     moving inline styles into a synthetic stylesheet.
//!
//! The engine is pure: it never touches storage. An [`AbortHandle`] is checked
//! between stages so a caller can give up early without anything having been
//! persisted.

pub mod error;
pub mod extractor;
pub mod generator;
pub mod rewriter;
pub mod scanner;

use crate::engine::error::EngineError;
use crate::engine::generator::{
    build_class_mapping, build_style_mapping, sanitize, template_seed, IdentifierGenerator,
};
use common::model::mapping::{ClassMapping, StyleMapping};
use common::model::template::Template;
use common::responses::GenerateUniqueTemplateResponse;
use log::debug;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Identifier prefix; the sanitized site id is appended to it.
    pub template_prefix: String,
    /// Extra seed material for a fresh namespace. `None` keeps generation
    /// deterministic for a `(template, site)` pair.
    pub salt: Option<String>,
}

/// Everything one run produces for a `(template, site)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub template_id: String,
    pub site_id: String,
    pub namespace_tag: String,
    pub class_mapping: ClassMapping,
    pub style_mapping: StyleMapping,
    pub processed_content: String,
    pub custom_css: String,
}

impl From<Generation> for GenerateUniqueTemplateResponse {
    fn from(generation: Generation) -> Self {
        Self {
            success: true,
            total_classes: generation.class_mapping.len(),
            total_styles: generation.style_mapping.len(),
            template_id: generation.template_id,
            site_id: generation.site_id,
            unique_classes: generation.class_mapping,
            unique_styles: generation.style_mapping,
            processed_content: generation.processed_content,
            custom_css: generation.custom_css,
            error: None,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a running
/// generation.
///
/// The handle moves from running to either cancelled or finished exactly
/// once, so a late cancel can tell whether it still reached the work.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    state: Arc<AtomicU8>,
}

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const FINISHED: u8 = 2;

impl AbortHandle {
    pub fn cancel(&self) {
        self.try_cancel();
    }

    /// Requests cancellation. Returns `false` when the work had already
    /// finished, in which case the request has no effect.
    pub fn try_cancel(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(current) => current == CANCELLED,
        }
    }

    /// Marks the work as done. Returns `false` when a cancel got there first.
    pub fn finish(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, FINISHED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    pub fn checkpoint(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Cancels the handle when the returned guard is dropped. Held by request
    /// handlers so that a dropped request stops its generation.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop(self.clone())
    }
}

pub struct CancelOnDrop(AbortHandle);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

pub fn generate(
    template: &Template,
    site_id: &str,
    options: &GenerationOptions,
    abort: &AbortHandle,
) -> Result<Generation, EngineError> {
    abort.checkpoint()?;
    let css_tokens = scanner::scan_css(&template.css_content)?;
    let html = scanner::scan_html(&template.html_content)?;
    debug!(
        "template {}: {} css tokens, {} html tokens, {} elements",
        template.id,
        css_tokens.len(),
        html.tokens.len(),
        html.elements.len()
    );

    abort.checkpoint()?;
    let classes = extractor::extract_classes(&css_tokens, &html.tokens);
    let styles = extractor::extract_styles(&html.tokens);

    abort.checkpoint()?;
    let prefix = format!("{}{}", options.template_prefix, sanitize(site_id));
    let seed = template_seed(&template.id, site_id, options.salt.as_deref());
    let mut generator = IdentifierGenerator::new(&prefix, &seed)?;
    let class_mapping = build_class_mapping(&mut generator, &classes)?;
    let style_mapping = build_style_mapping(&mut generator, &styles)?;
    debug!(
        "template {} for site {}: {} classes, {} inline styles, tag {}",
        template.id,
        site_id,
        class_mapping.len(),
        style_mapping.len(),
        generator.tag()
    );

    abort.checkpoint()?;
    let rewritten_css = rewriter::rewrite_css(&template.css_content, &class_mapping)?;
    let processed_content =
        rewriter::rewrite_html(&template.html_content, &class_mapping, &style_mapping)?;
    let custom_css = rewriter::compose_custom_css(&rewritten_css, &style_mapping);

    abort.checkpoint()?;
    Ok(Generation {
        template_id: template.id.clone(),
        site_id: site_id.to_string(),
        namespace_tag: generator.tag().to_string(),
        class_mapping,
        style_mapping,
        processed_content,
        custom_css,
    })
}

//! Identifier generation.
//!
//! Every identifier is `{prefix}-{tag}-{body}` where `tag` is derived from a
//! namespace seed (`template_id:site_id`, or `site_id:list_name` for Class
//! Lists). The body is the sanitized original class name, `style-{n}` for
//! extracted inline styles, or a zero-padded ordinal for Class Lists.
//!
//! Collisions inside one generator (two originals that sanitize to the same
//! body) are resolved first-come-first-served with `-2`, `-3`, ... suffixes.

use crate::engine::error::EngineError;
use common::model::mapping::{ClassMapping, StyleMapping};
use std::collections::HashSet;

/// Attempts before giving up on a free suffix.
pub const MAX_SUFFIX_ATTEMPTS: usize = 10_000;

/// Hex digits of the seed digest kept in every identifier.
pub const TAG_LEN: usize = 8;

/// Upper bound on a single Class List.
pub const MAX_LIST_SIZE: usize = 10_000;

pub struct IdentifierGenerator {
    prefix: String,
    tag: String,
    used: HashSet<String>,
    styles: usize,
}

impl IdentifierGenerator {
    pub fn new(prefix: &str, seed: &str) -> Result<Self, EngineError> {
        if !is_valid_identifier(prefix) {
            return Err(EngineError::InvalidInput(format!(
                "`{prefix}` cannot start a CSS identifier"
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            tag: namespace_tag(seed),
            used: HashSet::new(),
            styles: 0,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Identifier for an original class name, unique within this generator.
    pub fn identifier_for(&mut self, original: &str) -> Result<String, EngineError> {
        let base = format!("{}-{}-{}", self.prefix, self.tag, sanitize(original));
        self.reserve(base)
    }

    /// Next synthetic class for an extracted inline style.
    pub fn style_identifier(&mut self) -> Result<String, EngineError> {
        self.styles += 1;
        let base = format!("{}-{}-style-{}", self.prefix, self.tag, self.styles);
        self.reserve(base)
    }

    pub fn ordinal_identifier(&mut self, ordinal: usize, width: usize) -> Result<String, EngineError> {
        let base = format!("{}-{}-{:0width$}", self.prefix, self.tag, ordinal);
        self.reserve(base)
    }

    fn reserve(&mut self, base: String) -> Result<String, EngineError> {
        if !self.used.contains(&base) {
            self.used.insert(base.clone());
            return Ok(base);
        }
        for suffix in 2..MAX_SUFFIX_ATTEMPTS + 2 {
            let candidate = format!("{base}-{suffix}");
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return Ok(candidate);
            }
        }
        Err(EngineError::CollisionExhausted {
            candidate: base,
            attempts: MAX_SUFFIX_ATTEMPTS,
        })
    }
}

/// Short, stable digest of a namespace seed.
pub fn namespace_tag(seed: &str) -> String {
    let mut hasher = md5::Context::new();
    hasher.consume(seed.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..TAG_LEN].to_string()
}

pub fn template_seed(template_id: &str, site_id: &str, salt: Option<&str>) -> String {
    match salt {
        Some(salt) => format!("{template_id}:{site_id}:{salt}"),
        None => format!("{template_id}:{site_id}"),
    }
}

pub fn list_seed(site_id: &str, list_name: &str, salt: Option<&str>) -> String {
    match salt {
        Some(salt) => format!("{site_id}:{list_name}:{salt}"),
        None => format!("{site_id}:{list_name}"),
    }
}

/// Maps a name onto `[a-zA-Z0-9_-]`. Each run of other characters becomes a
/// single `-`; an empty result becomes `c`.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut replacing = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
            replacing = false;
        } else if !replacing {
            out.push('-');
            replacing = true;
        }
    }
    if out.is_empty() {
        out.push('c');
    }
    out
}

/// `^[a-zA-Z_-][a-zA-Z0-9_-]*$`
pub fn is_valid_identifier(candidate: &str) -> bool {
    let mut bytes = candidate.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' || first == b'-' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub fn build_class_mapping(
    generator: &mut IdentifierGenerator,
    classes: &[String],
) -> Result<ClassMapping, EngineError> {
    let mut mapping = ClassMapping::new();
    for original in classes {
        let unique = generator.identifier_for(original)?;
        mapping.insert(original.as_str(), unique)?;
    }
    Ok(mapping)
}

pub fn build_style_mapping(
    generator: &mut IdentifierGenerator,
    styles: &[String],
) -> Result<StyleMapping, EngineError> {
    let mut mapping = StyleMapping::new();
    for declarations in styles {
        let synthetic = generator.style_identifier()?;
        mapping.insert(synthetic, declarations.as_str())?;
    }
    Ok(mapping)
}

/// `count` fresh identifiers for a Class List.
pub fn list_identifiers(prefix: &str, seed: &str, count: usize) -> Result<Vec<String>, EngineError> {
    if count == 0 || count > MAX_LIST_SIZE {
        return Err(EngineError::InvalidInput(format!(
            "list size must be between 1 and {MAX_LIST_SIZE}, got {count}"
        )));
    }
    let width = count.to_string().len().max(4);
    let mut generator = IdentifierGenerator::new(prefix, seed)?;
    (1..=count)
        .map(|ordinal| generator.ordinal_identifier(ordinal, width))
        .collect()
}

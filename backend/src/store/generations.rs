use crate::engine::error::EngineError;
use crate::engine::{self, AbortHandle, Generation, GenerationOptions};
use crate::store::{require, unix_now, MappingStore};
use common::model::mapping::{ClassMapping, StyleMapping};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

impl MappingStore {
    /// Generates the site-scoped rewrite of a template and replaces whatever
    /// was stored for the pair.
    ///
    /// Without `force_new` the result is a pure function of the template
    /// content and the pair, so regenerating an unchanged template yields the
    /// same identifiers. `force_new` mixes a random salt into the seed.
    pub fn generate_or_replace(
        &self,
        template_id: &str,
        site_id: &str,
        force_new: bool,
        abort: &AbortHandle,
    ) -> Result<Generation, EngineError> {
        require(template_id, "template id")?;
        require(site_id, "site id")?;
        let template = self.get_template(template_id)?;
        self.require_site(site_id)?;

        let options = GenerationOptions {
            template_prefix: self.inner.template_prefix.clone(),
            salt: force_new.then(|| Uuid::new_v4().simple().to_string()),
        };

        let _guard = self
            .inner
            .generation_locks
            .lock((template_id.to_string(), site_id.to_string()));
        let generation = engine::generate(&template, site_id, &options, abort)?;
        abort.checkpoint()?;

        let mut conn = self.connect()?;
        persist_generation(&mut conn, &generation)?;
        info!(
            "stored generation for template {} site {}: {} classes, {} styles, tag {}",
            template_id,
            site_id,
            generation.class_mapping.len(),
            generation.style_mapping.len(),
            generation.namespace_tag
        );
        Ok(generation)
    }

    /// The last stored generation for a pair.
    ///
    /// All rows are read inside one transaction so the header and the
    /// mappings always come from the same stored run.
    pub fn find_generation(&self, template_id: &str, site_id: &str) -> Result<Generation, EngineError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let header = tx
            .query_row(
                "SELECT namespace_tag, processed_content, custom_css
                 FROM generations WHERE template_id = ?1 AND site_id = ?2",
                params![template_id, site_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let (namespace_tag, processed_content, custom_css) = header.ok_or_else(|| {
            EngineError::NotFound(format!(
                "generation for template `{template_id}` and site `{site_id}`"
            ))
        })?;

        let class_mapping = load_class_mapping(&tx, template_id, site_id)?;
        let style_mapping = load_style_mapping(&tx, template_id, site_id)?;
        tx.commit()?;

        Ok(Generation {
            template_id: template_id.to_string(),
            site_id: site_id.to_string(),
            namespace_tag,
            class_mapping,
            style_mapping,
            processed_content,
            custom_css,
        })
    }
}

fn persist_generation(conn: &mut Connection, generation: &Generation) -> Result<(), EngineError> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM class_mappings WHERE template_id = ?1 AND site_id = ?2",
        params![generation.template_id, generation.site_id],
    )?;
    tx.execute(
        "DELETE FROM style_mappings WHERE template_id = ?1 AND site_id = ?2",
        params![generation.template_id, generation.site_id],
    )?;
    tx.execute(
        "INSERT INTO generations
             (template_id, site_id, namespace_tag, processed_content, custom_css, generated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(template_id, site_id) DO UPDATE SET
             namespace_tag = excluded.namespace_tag,
             processed_content = excluded.processed_content,
             custom_css = excluded.custom_css,
             generated_at = excluded.generated_at",
        params![
            generation.template_id,
            generation.site_id,
            generation.namespace_tag,
            generation.processed_content,
            generation.custom_css,
            unix_now()
        ],
    )?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO class_mappings (template_id, site_id, ordinal, original_class, unique_class)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (ordinal, (original, unique)) in generation.class_mapping.iter().enumerate() {
            insert.execute(params![
                generation.template_id,
                generation.site_id,
                ordinal as i64,
                original,
                unique
            ])?;
        }
        let mut insert = tx.prepare(
            "INSERT INTO style_mappings (template_id, site_id, ordinal, synthetic_class, declarations)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (ordinal, (synthetic, declarations)) in generation.style_mapping.iter().enumerate() {
            insert.execute(params![
                generation.template_id,
                generation.site_id,
                ordinal as i64,
                synthetic,
                declarations
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn load_class_mapping(
    conn: &Connection,
    template_id: &str,
    site_id: &str,
) -> Result<ClassMapping, EngineError> {
    let mut stmt = conn.prepare(
        "SELECT original_class, unique_class FROM class_mappings
         WHERE template_id = ?1 AND site_id = ?2 ORDER BY ordinal",
    )?;
    let rows = stmt.query_map(params![template_id, site_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut mapping = ClassMapping::new();
    for row in rows {
        let (original, unique) = row?;
        mapping.insert(original, unique)?;
    }
    Ok(mapping)
}

fn load_style_mapping(
    conn: &Connection,
    template_id: &str,
    site_id: &str,
) -> Result<StyleMapping, EngineError> {
    let mut stmt = conn.prepare(
        "SELECT synthetic_class, declarations FROM style_mappings
         WHERE template_id = ?1 AND site_id = ?2 ORDER BY ordinal",
    )?;
    let rows = stmt.query_map(params![template_id, site_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut mapping = StyleMapping::new();
    for row in rows {
        let (synthetic, declarations) = row?;
        mapping.insert(synthetic, declarations)?;
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use crate::engine::error::EngineError;
    use crate::engine::AbortHandle;
    use crate::store::test_support::{seed, temp_store};
    use common::model::template::Template;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    const HTML: &str = r#"<div class="card"><h2 class="card-title" style="margin: 0">x</h2></div>"#;
    const CSS: &str = ".card { padding: 1rem } .card-title { font-weight: bold }";

    #[test]
    fn stores_and_finds_a_generation() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", HTML, CSS, &["7"]);

        let generated = store
            .generate_or_replace("t1", "7", false, &AbortHandle::default())
            .unwrap();
        assert_eq!(generated.class_mapping.len(), 2);
        assert_eq!(generated.style_mapping.len(), 1);

        let found = store.find_generation("t1", "7").unwrap();
        assert_eq!(found, generated);
    }

    #[test]
    fn regeneration_is_deterministic_unless_forced() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", HTML, CSS, &["7"]);
        let abort = AbortHandle::default();

        let first = store.generate_or_replace("t1", "7", false, &abort).unwrap();
        let second = store.generate_or_replace("t1", "7", false, &abort).unwrap();
        assert_eq!(first, second);

        let fresh = store.generate_or_replace("t1", "7", true, &abort).unwrap();
        assert_ne!(fresh.namespace_tag, first.namespace_tag);
        assert_eq!(store.find_generation("t1", "7").unwrap(), fresh);
    }

    #[test]
    fn parse_failure_keeps_the_previous_generation() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", HTML, CSS, &["7"]);
        let abort = AbortHandle::default();
        let stored = store.generate_or_replace("t1", "7", false, &abort).unwrap();

        store
            .save_template(&Template {
                id: "t1".to_string(),
                html_content: HTML.to_string(),
                css_content: ".card { padding: 1rem".to_string(),
                js_content: None,
            })
            .unwrap();
        let err = store.generate_or_replace("t1", "7", false, &abort).unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
        assert_eq!(store.find_generation("t1", "7").unwrap(), stored);
    }

    #[test]
    fn cancelled_generation_persists_nothing() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", HTML, CSS, &["7"]);
        let abort = AbortHandle::default();
        abort.cancel();

        assert!(matches!(
            store.generate_or_replace("t1", "7", false, &abort),
            Err(EngineError::Cancelled)
        ));
        assert!(matches!(
            store.find_generation("t1", "7"),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn unknown_template_or_site_is_not_found() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", HTML, CSS, &["7"]);
        let abort = AbortHandle::default();

        assert!(matches!(
            store.generate_or_replace("missing", "7", false, &abort),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            store.generate_or_replace("t1", "8", false, &abort),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            store.generate_or_replace("", "7", false, &abort),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn pairs_are_independent() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", HTML, CSS, &["7", "8"]);
        let abort = AbortHandle::default();

        let seven = store.generate_or_replace("t1", "7", false, &abort).unwrap();
        let eight = store.generate_or_replace("t1", "8", false, &abort).unwrap();
        assert_ne!(seven.namespace_tag, eight.namespace_tag);
        assert_eq!(store.find_generation("t1", "7").unwrap(), seven);
    }

    #[test]
    fn concurrent_regenerations_never_interleave() {
        let (_dir, store) = temp_store();
        seed(&store, "t1", HTML, CSS, &["7"]);

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    store
                        .generate_or_replace("t1", "7", true, &AbortHandle::default())
                        .unwrap()
                })
            })
            .collect();
        let tags: HashSet<String> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().namespace_tag)
            .collect();

        let stored = store.find_generation("t1", "7").unwrap();
        assert!(tags.contains(&stored.namespace_tag));
        assert_eq!(stored.class_mapping.len(), 2);
        assert_eq!(stored.style_mapping.len(), 1);
        // Every stored identifier comes from the same run.
        assert!(stored
            .class_mapping
            .iter()
            .all(|(_, unique)| unique.contains(&stored.namespace_tag)));
        assert!(stored
            .style_mapping
            .iter()
            .all(|(synthetic, _)| synthetic.contains(&stored.namespace_tag)));
        assert!(stored.custom_css.contains(&stored.namespace_tag));
    }

    #[test]
    fn reads_during_regeneration_see_one_whole_run() {
        let (_dir, store) = temp_store();
        let css: String = (0..200).map(|n| format!(".c{n} {{ margin: 0 }}\n")).collect();
        seed(&store, "t1", "<div></div>", &css, &["7"]);
        store
            .generate_or_replace("t1", "7", true, &AbortHandle::default())
            .unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let writer = {
            let store = store.clone();
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    store
                        .generate_or_replace("t1", "7", true, &AbortHandle::default())
                        .unwrap();
                }
            })
        };

        let mut mixed = 0;
        for _ in 0..500 {
            let found = store.find_generation("t1", "7").unwrap();
            let whole = found.class_mapping.len() == 200
                && found
                    .class_mapping
                    .iter()
                    .all(|(_, unique)| unique.contains(&found.namespace_tag))
                && found.custom_css.contains(&found.namespace_tag);
            if !whole {
                mixed += 1;
            }
        }
        stop.store(true, Ordering::SeqCst);
        writer.join().unwrap();

        assert_eq!(mixed, 0);
    }
}

//! Template and site catalog.
//!
//! The catalogs are owned by the surrounding product; the store keeps a copy
//! so generation has something to read. Saving replaces the whole record.

use crate::engine::error::EngineError;
use crate::store::{require, MappingStore};
use common::model::site::Site;
use common::model::template::Template;
use log::info;
use rusqlite::{params, OptionalExtension};

impl MappingStore {
    pub fn save_template(&self, template: &Template) -> Result<(), EngineError> {
        require(&template.id, "template id")?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO templates (id, html_content, css_content, js_content)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 html_content = excluded.html_content,
                 css_content = excluded.css_content,
                 js_content = excluded.js_content",
            params![
                template.id,
                template.html_content,
                template.css_content,
                template.js_content
            ],
        )?;
        info!(
            "saved template {} ({} bytes html, {} bytes css)",
            template.id,
            template.html_content.len(),
            template.css_content.len()
        );
        Ok(())
    }

    pub fn get_template(&self, template_id: &str) -> Result<Template, EngineError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, html_content, css_content, js_content FROM templates WHERE id = ?1",
            params![template_id],
            |row| {
                Ok(Template {
                    id: row.get(0)?,
                    html_content: row.get(1)?,
                    css_content: row.get(2)?,
                    js_content: row.get(3)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| EngineError::NotFound(format!("template `{template_id}`")))
    }

    pub fn save_site(&self, site: &Site) -> Result<(), EngineError> {
        require(&site.id, "site id")?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO sites (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![site.id, site.name],
        )?;
        info!("saved site {}", site.id);
        Ok(())
    }

    pub fn site_exists(&self, site_id: &str) -> Result<bool, EngineError> {
        let conn = self.connect()?;
        let found = conn
            .query_row("SELECT 1 FROM sites WHERE id = ?1", params![site_id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    pub(crate) fn require_site(&self, site_id: &str) -> Result<(), EngineError> {
        if self.site_exists(site_id)? {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("site `{site_id}`")))
        }
    }
}

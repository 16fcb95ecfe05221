//! Named Class Lists.
//!
//! A list belongs to one site and is identified by `(site_id, name)`. Its
//! identifiers come from the same generator as template rewrites, seeded with
//! `site_id:name`, so two lists never share a namespace tag unless they share
//! a key.

use crate::engine::error::EngineError;
use crate::engine::generator::{is_valid_identifier, list_identifiers, list_seed};
use crate::store::{require, unix_now, MappingStore};
use common::model::class_list::ClassList;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use uuid::Uuid;

impl MappingStore {
    /// Creates `count` fresh identifiers under `name`, replacing the entries
    /// of an existing list with that name. The creation time of a replaced
    /// list is kept.
    pub fn generate_list(
        &self,
        site_id: &str,
        name: &str,
        count: Option<usize>,
        force_new: bool,
    ) -> Result<ClassList, EngineError> {
        require(site_id, "site id")?;
        require(name, "list name")?;
        self.require_site(site_id)?;

        let count = count.unwrap_or(self.inner.default_list_size);
        let salt = force_new.then(|| Uuid::new_v4().simple().to_string());
        let seed = list_seed(site_id, name, salt.as_deref());
        let classes = list_identifiers(&self.inner.list_prefix, &seed, count)?;

        let _guard = self
            .inner
            .list_locks
            .lock((site_id.to_string(), name.to_string()));
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = unix_now();
        let created_at = list_created_at(&tx, site_id, name)?.unwrap_or(now);
        tx.execute(
            "INSERT INTO class_lists (site_id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(site_id, name) DO UPDATE SET updated_at = excluded.updated_at",
            params![site_id, name, created_at, now],
        )?;
        replace_entries(&tx, site_id, name, &classes)?;
        tx.commit()?;

        info!(
            "generated class list {} for site {} with {} classes",
            name,
            site_id,
            classes.len()
        );
        Ok(ClassList {
            name: name.to_string(),
            site_id: site_id.to_string(),
            classes,
            created_at,
            updated_at: now,
        })
    }

    /// Replaces the identifiers of an existing list. Every entry must be a
    /// valid CSS identifier and appear only once.
    pub fn update_list(
        &self,
        site_id: &str,
        name: &str,
        classes: Vec<String>,
    ) -> Result<ClassList, EngineError> {
        require(site_id, "site id")?;
        require(name, "list name")?;
        validate_entries(&classes)?;

        let _guard = self
            .inner
            .list_locks
            .lock((site_id.to_string(), name.to_string()));
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let created_at = list_created_at(&tx, site_id, name)?
            .ok_or_else(|| list_not_found(site_id, name))?;
        let now = unix_now();
        tx.execute(
            "UPDATE class_lists SET updated_at = ?3 WHERE site_id = ?1 AND name = ?2",
            params![site_id, name, now],
        )?;
        replace_entries(&tx, site_id, name, &classes)?;
        tx.commit()?;

        info!(
            "updated class list {} for site {} to {} classes",
            name,
            site_id,
            classes.len()
        );
        Ok(ClassList {
            name: name.to_string(),
            site_id: site_id.to_string(),
            classes,
            created_at,
            updated_at: now,
        })
    }

    pub fn delete_list(&self, site_id: &str, name: &str) -> Result<(), EngineError> {
        let _guard = self
            .inner
            .list_locks
            .lock((site_id.to_string(), name.to_string()));
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM class_lists WHERE site_id = ?1 AND name = ?2",
            params![site_id, name],
        )?;
        if removed == 0 {
            return Err(list_not_found(site_id, name));
        }
        tx.execute(
            "DELETE FROM class_list_entries WHERE site_id = ?1 AND name = ?2",
            params![site_id, name],
        )?;
        tx.commit()?;
        info!("deleted class list {} for site {}", name, site_id);
        Ok(())
    }

    pub fn get_list(&self, site_id: &str, name: &str) -> Result<ClassList, EngineError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let (created_at, updated_at) = tx
            .query_row(
                "SELECT created_at, updated_at FROM class_lists WHERE site_id = ?1 AND name = ?2",
                params![site_id, name],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?
            .ok_or_else(|| list_not_found(site_id, name))?;
        let classes = load_entries(&tx, site_id, name)?;
        tx.commit()?;

        Ok(ClassList {
            name: name.to_string(),
            site_id: site_id.to_string(),
            classes,
            created_at,
            updated_at,
        })
    }

    /// Every list owned by `site_id`, ordered by name.
    pub fn lists_for_site(&self, site_id: &str) -> Result<Vec<ClassList>, EngineError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let headers = {
            let mut stmt = tx.prepare(
                "SELECT name, created_at, updated_at FROM class_lists
                 WHERE site_id = ?1 ORDER BY name",
            )?;
            let rows = stmt
                .query_map(params![site_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let lists = headers
            .into_iter()
            .map(|(name, created_at, updated_at)| {
                Ok::<_, EngineError>(ClassList {
                    classes: load_entries(&tx, site_id, &name)?,
                    name,
                    site_id: site_id.to_string(),
                    created_at,
                    updated_at,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        Ok(lists)
    }
}

fn list_not_found(site_id: &str, name: &str) -> EngineError {
    EngineError::NotFound(format!("class list `{name}` for site `{site_id}`"))
}

fn validate_entries(classes: &[String]) -> Result<(), EngineError> {
    let mut seen = HashSet::with_capacity(classes.len());
    for class in classes {
        if !is_valid_identifier(class) {
            return Err(EngineError::InvalidInput(format!(
                "`{class}` is not a valid CSS identifier"
            )));
        }
        if !seen.insert(class.as_str()) {
            return Err(EngineError::InvalidInput(format!(
                "`{class}` appears more than once"
            )));
        }
    }
    Ok(())
}

fn list_created_at(conn: &Connection, site_id: &str, name: &str) -> Result<Option<i64>, EngineError> {
    Ok(conn
        .query_row(
            "SELECT created_at FROM class_lists WHERE site_id = ?1 AND name = ?2",
            params![site_id, name],
            |row| row.get(0),
        )
        .optional()?)
}

fn replace_entries(
    tx: &Transaction<'_>,
    site_id: &str,
    name: &str,
    classes: &[String],
) -> Result<(), EngineError> {
    tx.execute(
        "DELETE FROM class_list_entries WHERE site_id = ?1 AND name = ?2",
        params![site_id, name],
    )?;
    let mut insert = tx.prepare(
        "INSERT INTO class_list_entries (site_id, name, ordinal, class_name) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (ordinal, class) in classes.iter().enumerate() {
        insert.execute(params![site_id, name, ordinal as i64, class])?;
    }
    Ok(())
}

fn load_entries(conn: &Connection, site_id: &str, name: &str) -> Result<Vec<String>, EngineError> {
    let mut stmt = conn.prepare(
        "SELECT class_name FROM class_list_entries
         WHERE site_id = ?1 AND name = ?2 ORDER BY ordinal",
    )?;
    let classes = stmt
        .query_map(params![site_id, name], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(classes)
}

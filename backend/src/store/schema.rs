use rusqlite::Connection;

/// Creates every table the store uses. Safe to run on every start-up.
pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS templates (
            id           TEXT PRIMARY KEY,
            html_content TEXT NOT NULL,
            css_content  TEXT NOT NULL,
            js_content   TEXT
        );

        CREATE TABLE IF NOT EXISTS sites (
            id   TEXT PRIMARY KEY,
            name TEXT
        );

        CREATE TABLE IF NOT EXISTS generations (
            template_id       TEXT NOT NULL,
            site_id           TEXT NOT NULL,
            namespace_tag     TEXT NOT NULL,
            processed_content TEXT NOT NULL,
            custom_css        TEXT NOT NULL,
            generated_at      INTEGER NOT NULL,
            PRIMARY KEY (template_id, site_id)
        );

        CREATE TABLE IF NOT EXISTS class_mappings (
            template_id    TEXT NOT NULL,
            site_id        TEXT NOT NULL,
            ordinal        INTEGER NOT NULL,
            original_class TEXT NOT NULL,
            unique_class   TEXT NOT NULL,
            PRIMARY KEY (template_id, site_id, original_class),
            UNIQUE (template_id, site_id, unique_class)
        );

        CREATE TABLE IF NOT EXISTS style_mappings (
            template_id     TEXT NOT NULL,
            site_id         TEXT NOT NULL,
            ordinal         INTEGER NOT NULL,
            synthetic_class TEXT NOT NULL,
            declarations    TEXT NOT NULL,
            PRIMARY KEY (template_id, site_id, synthetic_class)
        );

        CREATE TABLE IF NOT EXISTS class_lists (
            site_id    TEXT NOT NULL,
            name       TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (site_id, name)
        );

        CREATE TABLE IF NOT EXISTS class_list_entries (
            site_id    TEXT NOT NULL,
            name       TEXT NOT NULL,
            ordinal    INTEGER NOT NULL,
            class_name TEXT NOT NULL,
            PRIMARY KEY (site_id, name, ordinal),
            UNIQUE (site_id, name, class_name)
        );
        ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 7);
    }

    #[test]
    fn unique_class_names_are_enforced_per_pair() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO class_mappings VALUES ('t', 's', 0, 'a', 'x')",
            [],
        )
        .unwrap();
        assert!(conn
            .execute("INSERT INTO class_mappings VALUES ('t', 's', 1, 'b', 'x')", [])
            .is_err());
        conn.execute(
            "INSERT INTO class_mappings VALUES ('t', 'other', 0, 'b', 'x')",
            [],
        )
        .unwrap();
    }
}

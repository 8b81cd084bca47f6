//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD persistence for the `projects` table.
//! - Provide the ordering primitives the order manager builds on: partition
//!   max, partition scan, partition move and atomic order-sequence writes.
//!
//! # Invariants
//! - Partition scans are deterministic: `display_order ASC, rowid ASC`, so
//!   ties fall back to insertion order.
//! - Payload updates never touch `featured` or `display_order`.
//! - `write_order_sequence` either applies every position or none.
//! - `rebalance_partition` scans and renumbers inside one write transaction,
//!   so members created concurrently are either fully included or wait.

use crate::db::{begin_immediate, ensure_table_ready};
use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectStatus};
use crate::repo::{
    bool_to_int, decode_json, encode_json, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    image,
    technologies,
    github_url,
    url,
    status,
    featured,
    display_order,
    created_at,
    updated_at
FROM projects";

const PROJECT_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "image",
    "technologies",
    "github_url",
    "url",
    "status",
    "featured",
    "display_order",
    "created_at",
    "updated_at",
];

/// Query options for listing projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    /// Restrict to one partition.
    pub featured: Option<bool>,
    pub status: Option<ProjectStatus>,
}

/// Counts reported by one partition renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRenumber {
    pub members: usize,
    /// Rows whose order value actually changed.
    pub reassigned: usize,
}

/// Repository interface for project persistence and ordering primitives.
pub trait ProjectRepository {
    /// Inserts a fully built record and returns it as stored.
    fn insert_project(&self, project: &Project) -> RepoResult<Project>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists projects sorted by display order.
    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
    /// Replaces payload fields of an existing project.
    fn update_project_payload(&self, id: ProjectId, draft: &ProjectDraft) -> RepoResult<Project>;
    /// Removes a project and returns the removed record, if it existed.
    fn delete_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Highest display order in one partition, `None` when empty.
    fn max_display_order(&self, featured: bool) -> RepoResult<Option<i64>>;
    /// Partition member ids in current display order.
    fn list_partition_ids(&self, featured: bool) -> RepoResult<Vec<ProjectId>>;
    /// Moves one project into `featured` at `display_order`.
    fn move_to_partition(
        &self,
        id: ProjectId,
        featured: bool,
        display_order: i64,
    ) -> RepoResult<()>;
    /// Assigns `index + 1` to each id in one transaction.
    ///
    /// Returns how many rows actually changed value. Fails without writing
    /// anything when `ids` is not exactly the current partition membership.
    fn write_order_sequence(&self, featured: bool, ids: &[ProjectId]) -> RepoResult<usize>;
    /// Renumbers `featured` to `1..=N` in current order, scanning and
    /// writing in one transaction.
    fn rebalance_partition(&self, featured: bool) -> RepoResult<PartitionRenumber>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "projects", PROJECT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn insert_project(&self, project: &Project) -> RepoResult<Project> {
        self.conn.execute(
            "INSERT INTO projects (
                id,
                title,
                description,
                image,
                technologies,
                github_url,
                url,
                status,
                featured,
                display_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                project.id.to_string(),
                project.title.as_str(),
                project.description.as_str(),
                project.image.as_str(),
                encode_json(&project.technologies, "projects.technologies")?,
                project.github_url.as_str(),
                project.url.as_str(),
                project.status.as_str(),
                bool_to_int(project.featured),
                project.display_order,
            ],
        )?;
        load_required_project(self.conn, project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(featured) = query.featured {
            sql.push_str(" AND featured = ?");
            bind_values.push(Value::Integer(bool_to_int(featured)));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        sql.push_str(" ORDER BY display_order ASC, featured DESC, rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn update_project_payload(&self, id: ProjectId, draft: &ProjectDraft) -> RepoResult<Project> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                title = ?2,
                description = ?3,
                image = ?4,
                technologies = ?5,
                github_url = ?6,
                url = ?7,
                status = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                draft.title.as_str(),
                draft.description.as_str(),
                draft.image.as_str(),
                encode_json(&draft.technologies, "projects.technologies")?,
                draft.github_url.as_str(),
                draft.url.as_str(),
                draft.status.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        load_required_project(self.conn, id)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let tx = begin_immediate(self.conn)?;
        let existing = {
            let mut stmt = tx.prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id.to_string()])?;
            match rows.next()? {
                Some(row) => Some(parse_project_row(row)?),
                None => None,
            }
        };
        if existing.is_some() {
            tx.execute("DELETE FROM projects WHERE id = ?1;", [id.to_string()])?;
        }
        tx.commit()?;
        Ok(existing)
    }

    fn max_display_order(&self, featured: bool) -> RepoResult<Option<i64>> {
        let max = self.conn.query_row(
            "SELECT MAX(display_order)
             FROM projects
             WHERE featured = ?1;",
            [bool_to_int(featured)],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(max)
    }

    fn list_partition_ids(&self, featured: bool) -> RepoResult<Vec<ProjectId>> {
        list_partition_ids(self.conn, featured)
    }

    fn move_to_partition(
        &self,
        id: ProjectId,
        featured: bool,
        display_order: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET featured = ?2,
                 display_order = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), bool_to_int(featured), display_order],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn write_order_sequence(&self, featured: bool, ids: &[ProjectId]) -> RepoResult<usize> {
        let tx = begin_immediate(self.conn)?;

        let actual: i64 = tx.query_row(
            "SELECT COUNT(*) FROM projects WHERE featured = ?1;",
            [bool_to_int(featured)],
            |row| row.get(0),
        )?;
        if actual as usize != ids.len() {
            return Err(RepoError::PartitionChanged {
                featured,
                expected: ids.len(),
                actual: actual as usize,
            });
        }

        let reassigned = renumber_in_tx(&tx, featured, ids)?;
        tx.commit()?;
        Ok(reassigned)
    }

    fn rebalance_partition(&self, featured: bool) -> RepoResult<PartitionRenumber> {
        let tx = begin_immediate(self.conn)?;
        let ids = list_partition_ids(&tx, featured)?;
        let reassigned = renumber_in_tx(&tx, featured, &ids)?;
        tx.commit()?;
        Ok(PartitionRenumber {
            members: ids.len(),
            reassigned,
        })
    }
}

/// Writes `index + 1` to each id, skipping rows already in place.
fn renumber_in_tx(tx: &Transaction<'_>, featured: bool, ids: &[ProjectId]) -> RepoResult<usize> {
    let mut reassigned = 0;
    for (index, id) in ids.iter().enumerate() {
        let target = index as i64 + 1;
        let current: Option<i64> = tx
            .query_row(
                "SELECT display_order
                 FROM projects
                 WHERE id = ?1
                   AND featured = ?2;",
                params![id.to_string(), bool_to_int(featured)],
                |row| row.get(0),
            )
            .optional()?;
        match current {
            None => return Err(RepoError::NotFound(*id)),
            Some(value) if value == target => continue,
            Some(_) => {}
        }

        tx.execute(
            "UPDATE projects
             SET display_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), target],
        )?;
        reassigned += 1;
    }
    Ok(reassigned)
}

fn list_partition_ids(conn: &Connection, featured: bool) -> RepoResult<Vec<ProjectId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM projects
         WHERE featured = ?1
         ORDER BY display_order ASC, rowid ASC;",
    )?;
    let mut rows = stmt.query([bool_to_int(featured)])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "projects.id")?);
    }
    Ok(ids)
}

fn load_required_project(conn: &Connection, id: ProjectId) -> RepoResult<Project> {
    let mut stmt = conn.prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_project_row(row);
    }
    Err(RepoError::NotFound(id))
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = ProjectStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid project status `{status_text}` in projects.status"
        ))
    })?;
    let technologies_text: String = row.get("technologies")?;

    Ok(Project {
        id: parse_uuid(&id_text, "projects.id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        image: row.get("image")?,
        technologies: decode_json(&technologies_text, "projects.technologies")?,
        github_url: row.get("github_url")?,
        url: row.get("url")?,
        status,
        featured: int_to_bool(row.get("featured")?, "projects.featured")?,
        display_order: row.get("display_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

//! Work experience repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing order is `start_date DESC, created_at DESC`; start dates are
//!   stored as caller-supplied strings, so ISO-like values sort correctly.

use crate::db::ensure_table_ready;
use crate::model::experience::{Experience, ExperienceDraft, ExperienceId};
use crate::repo::{
    bool_to_int, decode_json, encode_json, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const EXPERIENCE_SELECT_SQL: &str = "SELECT
    id,
    job_title,
    company_name,
    start_date,
    end_date,
    is_current,
    description,
    created_at,
    updated_at
FROM work_experiences";

pub trait ExperienceRepository {
    fn create_experience(&self, draft: &ExperienceDraft) -> RepoResult<Experience>;
    fn get_experience(&self, id: ExperienceId) -> RepoResult<Option<Experience>>;
    fn list_experiences(&self) -> RepoResult<Vec<Experience>>;
    fn update_experience(
        &self,
        id: ExperienceId,
        draft: &ExperienceDraft,
    ) -> RepoResult<Experience>;
    fn delete_experience(&self, id: ExperienceId) -> RepoResult<()>;
}

pub struct SqliteExperienceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExperienceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "work_experiences",
            &["id", "job_title", "company_name", "start_date", "description"],
        )?;
        Ok(Self { conn })
    }

    fn load_required(&self, id: ExperienceId) -> RepoResult<Experience> {
        self.get_experience(id)?.ok_or(RepoError::NotFound(id))
    }
}

impl ExperienceRepository for SqliteExperienceRepository<'_> {
    fn create_experience(&self, draft: &ExperienceDraft) -> RepoResult<Experience> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO work_experiences (
                id,
                job_title,
                company_name,
                start_date,
                end_date,
                is_current,
                description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                draft.job_title.as_str(),
                draft.company_name.as_str(),
                draft.start_date.as_str(),
                draft.end_date.as_str(),
                bool_to_int(draft.is_current),
                encode_json(&draft.description, "work_experiences.description")?,
            ],
        )?;
        self.load_required(id)
    }

    fn get_experience(&self, id: ExperienceId) -> RepoResult<Option<Experience>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EXPERIENCE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_experience_row(row)?));
        }
        Ok(None)
    }

    fn list_experiences(&self) -> RepoResult<Vec<Experience>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EXPERIENCE_SELECT_SQL} ORDER BY start_date DESC, created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_experience_row(row)?);
        }
        Ok(items)
    }

    fn update_experience(
        &self,
        id: ExperienceId,
        draft: &ExperienceDraft,
    ) -> RepoResult<Experience> {
        let changed = self.conn.execute(
            "UPDATE work_experiences
             SET
                job_title = ?2,
                company_name = ?3,
                start_date = ?4,
                end_date = ?5,
                is_current = ?6,
                description = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                draft.job_title.as_str(),
                draft.company_name.as_str(),
                draft.start_date.as_str(),
                draft.end_date.as_str(),
                bool_to_int(draft.is_current),
                encode_json(&draft.description, "work_experiences.description")?,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        self.load_required(id)
    }

    fn delete_experience(&self, id: ExperienceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM work_experiences WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_experience_row(row: &Row<'_>) -> RepoResult<Experience> {
    let id_text: String = row.get("id")?;
    let description_text: String = row.get("description")?;
    Ok(Experience {
        id: parse_uuid(&id_text, "work_experiences.id")?,
        job_title: row.get("job_title")?,
        company_name: row.get("company_name")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        is_current: int_to_bool(row.get("is_current")?, "work_experiences.is_current")?,
        description: decode_json(&description_text, "work_experiences.description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

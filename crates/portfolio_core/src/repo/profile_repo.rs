//! Profile repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Nested education/certification lists are stored as JSON arrays and are
//!   replaced wholesale on update.

use crate::db::ensure_table_ready;
use crate::model::profile::{Profile, ProfileDraft, ProfileId};
use crate::repo::{decode_json, encode_json, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    profile_picture_url,
    headline,
    biography,
    skills,
    education,
    certifications,
    created_at,
    updated_at
FROM profiles";

pub trait ProfileRepository {
    fn create_profile(&self, draft: &ProfileDraft) -> RepoResult<Profile>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    /// Lists profiles newest first.
    fn list_profiles(&self) -> RepoResult<Vec<Profile>>;
    fn update_profile(&self, id: ProfileId, draft: &ProfileDraft) -> RepoResult<Profile>;
    fn delete_profile(&self, id: ProfileId) -> RepoResult<()>;
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "profiles",
            &["id", "headline", "biography", "skills", "education", "certifications"],
        )?;
        Ok(Self { conn })
    }

    fn load_required(&self, id: ProfileId) -> RepoResult<Profile> {
        self.get_profile(id)?.ok_or(RepoError::NotFound(id))
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&self, draft: &ProfileDraft) -> RepoResult<Profile> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO profiles (
                id,
                profile_picture_url,
                headline,
                biography,
                skills,
                education,
                certifications
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                draft.profile_picture_url.as_deref(),
                draft.headline.as_str(),
                draft.biography.as_str(),
                encode_json(&draft.skills, "profiles.skills")?,
                encode_json(&draft.education, "profiles.education")?,
                encode_json(&draft.certifications, "profiles.certifications")?,
            ],
        )?;
        self.load_required(id)
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn list_profiles(&self) -> RepoResult<Vec<Profile>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_profile_row(row)?);
        }
        Ok(items)
    }

    fn update_profile(&self, id: ProfileId, draft: &ProfileDraft) -> RepoResult<Profile> {
        let changed = self.conn.execute(
            "UPDATE profiles
             SET
                profile_picture_url = ?2,
                headline = ?3,
                biography = ?4,
                skills = ?5,
                education = ?6,
                certifications = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                draft.profile_picture_url.as_deref(),
                draft.headline.as_str(),
                draft.biography.as_str(),
                encode_json(&draft.skills, "profiles.skills")?,
                encode_json(&draft.education, "profiles.education")?,
                encode_json(&draft.certifications, "profiles.certifications")?,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        self.load_required(id)
    }

    fn delete_profile(&self, id: ProfileId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let skills: String = row.get("skills")?;
    let education: String = row.get("education")?;
    let certifications: String = row.get("certifications")?;
    Ok(Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        profile_picture_url: row.get("profile_picture_url")?,
        headline: row.get("headline")?,
        biography: row.get("biography")?,
        skills: decode_json(&skills, "profiles.skills")?,
        education: decode_json(&education, "profiles.education")?,
        certifications: decode_json(&certifications, "profiles.certifications")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

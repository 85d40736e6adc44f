use crate::codegen::CodeLanguage;
use crate::constants::{SYSTEM_JAVA_TEMPLATE, SYSTEM_KOTLIN_TEMPLATE, SYSTEM_WEB_TEMPLATE};
use crate::db::models::TemplateRow;
use crate::errors::Error;
use crate::schema::templates;
use crate::templates::{ensure_valid, CodeTemplate, NewTemplate, TemplateChanges};
use crate::utils::now_timestamp;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;
use uuid::Uuid;

#[derive(AsChangeset)]
#[diesel(table_name = templates)]
struct TemplateChangeset<'c> {
    name: Option<&'c str>,
    language: Option<&'static str>,
    content: Option<&'c str>,
    updated_at: String,
}

/// Repository for code templates
pub struct TemplateRepository<'a> {
    pub conn: &'a mut SqliteConnection,
}

impl<'a> TemplateRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        TemplateRepository { conn }
    }

    /// Stores a new template after checking its placeholders
    ///
    /// # Errors
    ///
    /// * `Error::Validation` if the name is blank
    /// * `Error::MissingPlaceholders` if the body lacks a required placeholder
    pub fn insert_template(&mut self, new_template: NewTemplate) -> Result<CodeTemplate, Error> {
        if new_template.name.trim().is_empty() {
            return Err(Error::validation("Template name cannot be empty"));
        }
        ensure_valid(&new_template.content)?;

        let now = now_timestamp();
        let row = TemplateRow {
            id: Uuid::new_v4().to_string(),
            name: new_template.name.trim().to_string(),
            language: new_template.language.as_str().to_string(),
            content: new_template.content,
            is_system: new_template.is_system,
            user_id: new_template.user_id,
            is_deleted: false,
            created_at: now.clone(),
            updated_at: now,
        };

        diesel::insert_into(templates::table)
            .values(&row)
            .execute(self.conn)?;

        CodeTemplate::try_from(row)
    }

    /// Retrieves a template visible to `user_id`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for deleted templates and other users' templates
    pub fn get_visible(&mut self, user_id: &str, template_id: &str) -> Result<CodeTemplate, Error> {
        let row = templates::table
            .find(template_id)
            .select(TemplateRow::as_select())
            .first(self.conn)
            .optional()?;

        match row.map(CodeTemplate::try_from).transpose()? {
            Some(template) if template.is_visible_to(user_id) => Ok(template),
            _ => Err(Error::not_found("Template", template_id)),
        }
    }

    /// Lists system templates first, then the caller's own, oldest first
    pub fn list_visible(&mut self, user_id: &str) -> Result<Vec<CodeTemplate>, Error> {
        let rows = templates::table
            .filter(templates::is_deleted.eq(false))
            .filter(
                templates::is_system
                    .eq(true)
                    .or(templates::user_id.eq(user_id)),
            )
            .order((
                templates::is_system.desc(),
                templates::created_at.asc(),
                templates::id.asc(),
            ))
            .select(TemplateRow::as_select())
            .load(self.conn)?;

        rows.into_iter().map(CodeTemplate::try_from).collect()
    }

    /// Updates one of the caller's templates
    ///
    /// # Errors
    ///
    /// * `Error::NotFound` if the template is not visible
    /// * `Error::Validation` for system templates or a blank name
    /// * `Error::MissingPlaceholders` if the new body lacks a required placeholder
    pub fn update_template(
        &mut self,
        user_id: &str,
        template_id: &str,
        changes: &TemplateChanges,
    ) -> Result<CodeTemplate, Error> {
        let current = self.get_visible(user_id, template_id)?;
        if current.is_system {
            return Err(Error::validation("System templates cannot be modified"));
        }
        if changes
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(Error::validation("Template name cannot be empty"));
        }
        if let Some(content) = changes.content.as_deref() {
            ensure_valid(content)?;
        }

        let changeset = TemplateChangeset {
            name: changes.name.as_deref().map(str::trim),
            language: changes.language.map(CodeLanguage::as_str),
            content: changes.content.as_deref(),
            updated_at: now_timestamp(),
        };
        diesel::update(templates::table.find(template_id))
            .set(&changeset)
            .execute(self.conn)?;

        self.get_visible(user_id, template_id)
    }

    /// Soft-deletes one of the caller's templates
    ///
    /// Tasks bound to it keep their reference; rendering them reports the
    /// template as not found.
    pub fn soft_delete_template(&mut self, user_id: &str, template_id: &str) -> Result<(), Error> {
        let current = self.get_visible(user_id, template_id)?;
        if current.is_system {
            return Err(Error::validation("System templates cannot be deleted"));
        }

        diesel::update(templates::table.find(template_id))
            .set((
                templates::is_deleted.eq(true),
                templates::updated_at.eq(now_timestamp()),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    /// Ensures one system template exists per language
    ///
    /// # Returns
    ///
    /// The number of templates created; zero on every run after the first
    pub fn seed_system_templates(&mut self) -> Result<usize, Error> {
        self.conn.immediate_transaction(|conn| {
            let mut repo = TemplateRepository::new(conn);
            let mut created = 0;
            for language in CodeLanguage::ALL {
                let existing: i64 = templates::table
                    .filter(templates::is_system.eq(true))
                    .filter(templates::language.eq(language.as_str()))
                    .count()
                    .get_result(repo.conn)?;
                if existing > 0 {
                    continue;
                }

                repo.insert_template(NewTemplate {
                    name: format!("Default {} template", language),
                    language,
                    content: system_template_body(language).to_string(),
                    is_system: true,
                    user_id: None,
                })?;
                created += 1;
            }

            if created > 0 {
                info!("Seeded {} system template(s)", created);
            }
            Ok(created)
        })
    }
}

fn system_template_body(language: CodeLanguage) -> &'static str {
    match language {
        CodeLanguage::Web => SYSTEM_WEB_TEMPLATE,
        CodeLanguage::Java => SYSTEM_JAVA_TEMPLATE,
        CodeLanguage::Kotlin => SYSTEM_KOTLIN_TEMPLATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const BODY: &str = "{title} {summary} {table_data} {data_points}";

    fn user_template(user: &str, content: &str) -> NewTemplate {
        NewTemplate {
            name: "mine".into(),
            language: CodeLanguage::Kotlin,
            content: content.into(),
            is_system: false,
            user_id: Some(user.into()),
        }
    }

    #[test]
    fn seeding_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TemplateRepository::new(&mut conn);

        assert_eq!(repo.seed_system_templates().unwrap(), 3);
        assert_eq!(repo.seed_system_templates().unwrap(), 0);

        let visible = repo.list_visible("anyone").unwrap();
        assert_eq!(visible.len(), 3);
        assert!(visible.iter().all(|t| t.is_system));
    }

    #[test]
    fn rejects_bodies_missing_placeholders() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TemplateRepository::new(&mut conn);

        match repo.insert_template(user_template("u1", "{title} {summary}")) {
            Err(Error::MissingPlaceholders(missing)) => {
                assert_eq!(missing, vec!["{table_data}", "{data_points}"])
            }
            other => panic!("unexpected {:?}", other),
        }

        let template = repo.insert_template(user_template("u1", BODY)).unwrap();
        let changes = TemplateChanges {
            content: Some("{title}".into()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update_template("u1", &template.id, &changes),
            Err(Error::MissingPlaceholders(_))
        ));
    }

    #[test]
    fn system_templates_are_read_only() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TemplateRepository::new(&mut conn);
        repo.seed_system_templates().unwrap();
        let system = repo.list_visible("u1").unwrap().remove(0);

        assert!(matches!(
            repo.update_template("u1", &system.id, &TemplateChanges::default()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            repo.soft_delete_template("u1", &system.id),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn user_templates_are_private_and_listed_after_system() {
        let db = Database::in_memory().unwrap();
        let mut conn = db.get_conn().unwrap();
        let mut repo = TemplateRepository::new(&mut conn);
        let mine = repo.insert_template(user_template("u1", BODY)).unwrap();
        repo.seed_system_templates().unwrap();

        let listed = repo.list_visible("u1").unwrap();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed.last().map(|t| t.id.as_str()), Some(mine.id.as_str()));

        assert!(matches!(
            repo.get_visible("u2", &mine.id),
            Err(Error::NotFound { .. })
        ));
        repo.soft_delete_template("u1", &mine.id).unwrap();
        assert!(matches!(
            repo.get_visible("u1", &mine.id),
            Err(Error::NotFound { .. })
        ));
    }
}

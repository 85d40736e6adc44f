use super::TaskManager;
use crate::codegen::CodeLanguage;
use crate::db::TemplateRepository;
use crate::errors::Error;
use crate::templates::{CodeTemplate, NewTemplate, TemplateChanges};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub language: Option<String>,
    pub content: Option<String>,
}

impl TaskManager {
    /// System templates first, then the caller's own
    pub fn list_templates(&self, user_id: &str) -> Result<Vec<CodeTemplate>, Error> {
        let mut conn = self.database.get_conn()?;
        TemplateRepository::new(&mut conn).list_visible(user_id)
    }

    /// Creates a user template
    ///
    /// # Errors
    /// * `Error::Validation` for a blank name or an unsupported language
    /// * `Error::MissingPlaceholders` if the body lacks a required placeholder
    pub fn create_template(
        &self,
        user_id: &str,
        request: CreateTemplate,
    ) -> Result<CodeTemplate, Error> {
        let language: CodeLanguage = request.language.parse()?;
        let mut conn = self.database.get_conn()?;
        let template = TemplateRepository::new(&mut conn).insert_template(NewTemplate {
            name: request.name,
            language,
            content: request.content,
            is_system: false,
            user_id: Some(user_id.to_string()),
        })?;
        info!("Template {} created by user {}", template.id, user_id);
        Ok(template)
    }

    pub fn update_template(
        &self,
        user_id: &str,
        template_id: &str,
        request: UpdateTemplate,
    ) -> Result<CodeTemplate, Error> {
        let changes = TemplateChanges {
            name: request.name,
            language: request
                .language
                .as_deref()
                .map(str::parse::<CodeLanguage>)
                .transpose()?,
            content: request.content,
        };
        let mut conn = self.database.get_conn()?;
        TemplateRepository::new(&mut conn).update_template(user_id, template_id, &changes)
    }

    pub fn delete_template(&self, user_id: &str, template_id: &str) -> Result<(), Error> {
        let mut conn = self.database.get_conn()?;
        TemplateRepository::new(&mut conn).soft_delete_template(user_id, template_id)?;
        info!("Template {} deleted", template_id);
        Ok(())
    }

    /// Seeds the per-language system templates; safe to call on every boot
    pub fn seed_system_templates(&self) -> Result<usize, Error> {
        let mut conn = self.database.get_conn()?;
        TemplateRepository::new(&mut conn).seed_system_templates()
    }
}

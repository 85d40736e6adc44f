use crate::core::{Group, GroupChanges};
use crate::db::models::GroupRow;
use crate::errors::Error;
use crate::schema::chart_groups;
use crate::utils::now_timestamp;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

const SELF_REFERENCE: &str = "self-referential relation";

#[derive(AsChangeset)]
#[diesel(table_name = chart_groups)]
struct GroupChangeset<'c> {
    name: Option<&'c str>,
    parent_id: Option<Option<&'c str>>,
    updated_at: String,
}

/// Repository for the per-user group tree
pub struct GroupRepository<'a> {
    pub conn: &'a mut SqliteConnection,
}

impl<'a> GroupRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        GroupRepository { conn }
    }

    /// Creates a group, optionally under one of the caller's groups
    ///
    /// # Errors
    ///
    /// * `Error::Validation` if the name is blank
    /// * `Error::NotFound` if the parent is not one of the caller's live groups
    pub fn create_group(
        &mut self,
        user_id: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Group, Error> {
        if name.trim().is_empty() {
            return Err(Error::validation("Group name cannot be empty"));
        }
        if let Some(parent) = parent_id {
            self.get_group(user_id, parent)?;
        }

        let now = now_timestamp();
        let row = GroupRow {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            user_id: user_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            is_deleted: false,
            created_at: now.clone(),
            updated_at: now,
        };
        diesel::insert_into(chart_groups::table)
            .values(&row)
            .execute(self.conn)?;

        Group::try_from(row)
    }

    /// Retrieves one of the caller's live groups
    pub fn get_group(&mut self, user_id: &str, group_id: &str) -> Result<Group, Error> {
        let row = chart_groups::table
            .filter(chart_groups::id.eq(group_id))
            .filter(chart_groups::user_id.eq(user_id))
            .filter(chart_groups::is_deleted.eq(false))
            .select(GroupRow::as_select())
            .first(self.conn)
            .optional()?
            .ok_or_else(|| Error::not_found("Group", group_id))?;

        Group::try_from(row)
    }

    /// All of the caller's live groups, oldest first
    pub fn list_groups(&mut self, user_id: &str) -> Result<Vec<Group>, Error> {
        let rows = chart_groups::table
            .filter(chart_groups::user_id.eq(user_id))
            .filter(chart_groups::is_deleted.eq(false))
            .order((chart_groups::created_at.asc(), chart_groups::id.asc()))
            .select(GroupRow::as_select())
            .load(self.conn)?;

        rows.into_iter().map(Group::try_from).collect()
    }

    /// Renames and/or re-parents a group
    ///
    /// # Errors
    ///
    /// * `Error::Validation` ("self-referential relation") if the new parent is
    ///   the group itself or one of its descendants
    /// * `Error::NotFound` if the group or the new parent is not visible
    pub fn update_group(
        &mut self,
        user_id: &str,
        group_id: &str,
        changes: &GroupChanges,
    ) -> Result<Group, Error> {
        if changes
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(Error::validation("Group name cannot be empty"));
        }

        self.conn.immediate_transaction(|conn| {
            let mut repo = GroupRepository::new(conn);
            repo.get_group(user_id, group_id)?;
            if let Some(Some(parent)) = &changes.parent_id {
                repo.ensure_not_descendant(user_id, group_id, parent)?;
            }

            let changeset = GroupChangeset {
                name: changes.name.as_deref().map(str::trim),
                parent_id: changes.parent_id.as_ref().map(|p| p.as_deref()),
                updated_at: now_timestamp(),
            };
            diesel::update(chart_groups::table.find(group_id))
                .set(&changeset)
                .execute(repo.conn)?;

            repo.get_group(user_id, group_id)
        })
    }

    /// Soft-deletes a group that has no live children
    pub fn soft_delete_group(&mut self, user_id: &str, group_id: &str) -> Result<(), Error> {
        self.conn.immediate_transaction(|conn| {
            let mut repo = GroupRepository::new(conn);
            repo.get_group(user_id, group_id)?;

            let children: i64 = chart_groups::table
                .filter(chart_groups::parent_id.eq(group_id))
                .filter(chart_groups::is_deleted.eq(false))
                .count()
                .get_result(repo.conn)?;
            if children > 0 {
                return Err(Error::validation(format!(
                    "Group {} still has {} child group(s)",
                    group_id, children
                )));
            }

            diesel::update(chart_groups::table.find(group_id))
                .set((
                    chart_groups::is_deleted.eq(true),
                    chart_groups::updated_at.eq(now_timestamp()),
                ))
                .execute(repo.conn)?;
            Ok(())
        })
    }

    /// Walks up from `parent_id` and fails if `group_id` is on the path
    fn ensure_not_descendant(
        &mut self,
        user_id: &str,
        group_id: &str,
        parent_id: &str,
    ) -> Result<(), Error> {
        let mut cursor = Some(parent_id.to_string());
        let mut seen = Vec::new();
        while let Some(current) = cursor {
            if current == group_id {
                return Err(Error::validation(SELF_REFERENCE));
            }
            if seen.contains(&current) {
                break;
            }
            let group = self.get_group(user_id, &current)?;
            seen.push(current);
            cursor = group.parent_id;
        }
        Ok(())
    }
}

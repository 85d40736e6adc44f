use super::TaskManager;
use crate::core::{build_tree, Group, GroupChanges, GroupNode};
use crate::db::GroupRepository;
use crate::errors::Error;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGroup {
    #[serde(default)]
    pub name: Option<String>,
    /// Absent leaves the parent alone; `null` makes the group a root
    #[serde(default, deserialize_with = "crate::utils::present")]
    pub parent_id: Option<Option<String>>,
}

impl TaskManager {
    /// The caller's groups as a forest of root groups
    pub fn list_groups(&self, user_id: &str) -> Result<Vec<GroupNode>, Error> {
        let mut conn = self.database.get_conn()?;
        let groups = GroupRepository::new(&mut conn).list_groups(user_id)?;
        Ok(build_tree(groups))
    }

    pub fn create_group(&self, user_id: &str, request: CreateGroup) -> Result<Group, Error> {
        let mut conn = self.database.get_conn()?;
        GroupRepository::new(&mut conn).create_group(
            user_id,
            &request.name,
            request.parent_id.as_deref(),
        )
    }

    pub fn update_group(
        &self,
        user_id: &str,
        group_id: &str,
        request: UpdateGroup,
    ) -> Result<Group, Error> {
        let changes = GroupChanges {
            name: request.name,
            parent_id: request.parent_id,
        };
        let mut conn = self.database.get_conn()?;
        GroupRepository::new(&mut conn).update_group(user_id, group_id, &changes)
    }

    pub fn delete_group(&self, user_id: &str, group_id: &str) -> Result<(), Error> {
        let mut conn = self.database.get_conn()?;
        GroupRepository::new(&mut conn).soft_delete_group(user_id, group_id)
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A node of a user's group tree; root groups act as applications
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group with its live children, for tree listings
#[derive(Debug, Clone, Serialize)]
pub struct GroupNode {
    #[serde(flatten)]
    pub group: Group,
    pub children: Vec<GroupNode>,
}

/// Partial update of a group
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub name: Option<String>,
    /// `Some(None)` turns the group into a root
    pub parent_id: Option<Option<String>>,
}

/// Assembles the forest of root groups from a flat list
///
/// Groups whose parent is not in `groups` are treated as roots. Sibling order
/// follows the input order.
pub fn build_tree(groups: Vec<Group>) -> Vec<GroupNode> {
    fn attach(parent: Option<&str>, pool: &[Group], known: &[&str]) -> Vec<GroupNode> {
        pool.iter()
            .filter(|g| match (parent, g.parent_id.as_deref()) {
                (None, None) => true,
                (None, Some(p)) => !known.contains(&p),
                (Some(parent), Some(p)) => parent == p,
                (Some(_), None) => false,
            })
            .map(|g| GroupNode {
                group: g.clone(),
                children: attach(Some(&g.id), pool, known),
            })
            .collect()
    }

    let known: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
    attach(None, &groups, &known)
}

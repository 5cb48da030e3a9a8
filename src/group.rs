//! Grouping posts into swimlanes.

use serde::{Deserialize, Serialize};

use crate::domain::{Post, Priority, Status, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    None,
    Status,
    Assignee,
    Priority,
}

/// Key used for posts lacking the grouped attribute. Keys of real values
/// always carry a `kind:` prefix, so no id can collide with it.
pub const UNSET_KEY: &str = "none";

#[derive(Debug, Clone, PartialEq)]
pub struct PostGroup<'a> {
    pub key: String,
    pub label: String,
    pub color: Option<String>,
    pub posts: Vec<&'a Post>,
}

/// Split posts into groups. Groups appear in order of first appearance;
/// priority groups are ordered urgent, high, medium, low, then unset.
pub fn group_posts<'a>(
    posts: &'a [Post],
    group_by: GroupBy,
    statuses: &[Status],
    users: &[User],
) -> Vec<PostGroup<'a>> {
    if group_by == GroupBy::None {
        return vec![PostGroup {
            key: "all".to_string(),
            label: "All Items".to_string(),
            color: None,
            posts: posts.iter().collect(),
        }];
    }

    let mut groups: Vec<PostGroup<'a>> = Vec::new();
    for post in posts {
        let (key, label, color) = describe(post, group_by, statuses, users);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.posts.push(post),
            None => groups.push(PostGroup {
                key,
                label,
                color,
                posts: vec![post],
            }),
        }
    }

    if group_by == GroupBy::Priority {
        groups.sort_by_key(|g| priority_rank(&g.key));
    }
    groups
}

fn describe(post: &Post, group_by: GroupBy, statuses: &[Status], users: &[User]) -> (String, String, Option<String>) {
    match group_by {
        GroupBy::Status => match post.status_id {
            Some(id) => {
                let status = statuses.iter().find(|s| s.id == id);
                (
                    format!("status:{}", id),
                    status.map(|s| s.name.clone()).unwrap_or_else(|| "No Status".to_string()),
                    status.map(|s| s.color.clone()),
                )
            }
            None => (UNSET_KEY.to_string(), "No Status".to_string(), None),
        },
        GroupBy::Assignee => match &post.assignee_id {
            Some(id) => {
                let label = users
                    .iter()
                    .find(|u| &u.id == id)
                    .map(|u| u.email.clone())
                    .unwrap_or_else(|| "Unassigned".to_string());
                (format!("user:{}", id), label, None)
            }
            None => (UNSET_KEY.to_string(), "Unassigned".to_string(), None),
        },
        GroupBy::Priority => match post.priority {
            Some(priority) => (
                format!("priority:{}", priority.as_str()),
                capitalize(priority.as_str()),
                Some(priority.color().to_string()),
            ),
            None => (UNSET_KEY.to_string(), "No Priority".to_string(), None),
        },
        GroupBy::None => ("all".to_string(), "All Items".to_string(), None),
    }
}

fn priority_rank(key: &str) -> usize {
    match key.strip_prefix("priority:").and_then(Priority::parse) {
        Some(Priority::Urgent) => 0,
        Some(Priority::High) => 1,
        Some(Priority::Medium) => 2,
        Some(Priority::Low) => 3,
        None => 4,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

use serde::{Deserialize, Serialize};

/// A roadmap member that posts can be assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl User {
    pub fn new(id: String, email: String) -> Self {
        Self { id, email, name: None }
    }
}

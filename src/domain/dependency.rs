//! Dependency Entity
//!
//! A directed temporal constraint between two posts.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::FinishToStart,
        DependencyType::StartToStart,
        DependencyType::FinishToFinish,
        DependencyType::StartToFinish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "finish-to-start",
            DependencyType::StartToStart => "start-to-start",
            DependencyType::FinishToFinish => "finish-to-finish",
            DependencyType::StartToFinish => "start-to-finish",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Sentence describing the constraint between two titled posts
    pub fn describe(&self, source: &str, target: &str) -> String {
        let (first, second) = match self {
            DependencyType::FinishToStart => ("finish", "start"),
            DependencyType::StartToStart => ("start", "start"),
            DependencyType::FinishToFinish => ("finish", "finish"),
            DependencyType::StartToFinish => ("start", "finish"),
        };
        format!(
            "\"{}\" must {} before \"{}\" can {}",
            source, first, target, second
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: u32,
    pub roadmap_id: u32,
    pub source_id: u32,
    pub target_id: u32,
    pub dependency_type: DependencyType,
}

impl Dependency {
    /// Same ordered (source, target) pair
    pub fn links(&self, source_id: u32, target_id: u32) -> bool {
        self.source_id == source_id && self.target_id == target_id
    }
}

impl Entity for Dependency {
    type Id = u32;
    const KIND: &'static str = "Dependency";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Fields accepted when creating a dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDependency {
    pub roadmap_id: u32,
    pub source_id: u32,
    pub target_id: u32,
    pub dependency_type: DependencyType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_type_names() {
        for t in DependencyType::ALL {
            assert_eq!(DependencyType::parse(t.as_str()), Some(t));
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert_eq!(DependencyType::parse("blocks"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            DependencyType::StartToFinish.describe("Design", "Build"),
            "\"Design\" must start before \"Build\" can finish"
        );
    }
}

//! Repository Integration Tests
//!
//! Repositories and the SQLite backend against an in-memory database.

use std::path::PathBuf;

use clap::Parser;
use roadmap_timeline::domain::{
    DependencyType, DomainError, Milestone, MilestonePatch, NewDependency, NewMilestone, Post, Priority, Roadmap,
};
use roadmap_timeline::export::ExportFormat;
use roadmap_timeline::TimelineBackend;

use crate::export_job::{report_failure, run_export, ExportArgs};
use crate::{
    init_db, DbState, DependencyRepository, MilestoneRepository, PostRepository, Repository, RoadmapRepository,
    RoadmapScoped, SqliteBackend, StatusRepository,
};

async fn setup_test_db() -> DbState {
    init_db(&PathBuf::from(":memory:")).await.expect("Failed to init test DB")
}

/// Roadmap owned by alice with default statuses and two posts
async fn seeded(db: &DbState) -> (SqliteBackend, Roadmap, Vec<Post>) {
    let backend = SqliteBackend::new(db, "alice");
    let roadmap = backend.create_roadmap("Q1 Plan", None, false).await.unwrap();
    let statuses = backend.fetch_statuses(roadmap.id).await.unwrap();

    let mut first = Post::new(0, roadmap.id, "Design".to_string()).with_dates(Some("2024-01-01"), Some("2024-01-05"));
    first.status_id = Some(statuses[0].id);
    first.priority = Some(Priority::High);
    first.tags = vec!["ui".to_string()];
    let mut second = Post::new(0, roadmap.id, "Build".to_string()).with_dates(Some("2024-01-06"), None);
    second.status_id = Some(statuses[0].id);

    let a = backend.create_post(&first).await.unwrap();
    let b = backend.create_post(&second).await.unwrap();
    (backend, roadmap, vec![a, b])
}

#[tokio::test]
async fn test_create_roadmap_seeds_statuses() {
    let db = setup_test_db().await;
    let backend = SqliteBackend::new(&db, "alice");
    let roadmap = backend.create_roadmap("Q1", Some("goals".to_string()), true).await.unwrap();
    assert!(roadmap.id > 0);

    let statuses = backend.fetch_statuses(roadmap.id).await.unwrap();
    let names: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
    assert_eq!(statuses[2].color, "#48bb78");

    // Seeding twice is a no-op
    let again = StatusRepository::new(db.connection())
        .ensure_default_statuses(roadmap.id)
        .await
        .unwrap();
    assert_eq!(again.len(), 3);
}

#[tokio::test]
async fn test_roadmap_crud() {
    let db = setup_test_db().await;
    let repo = RoadmapRepository::new(db.connection());

    let mut roadmap = repo
        .create(&Roadmap::new(0, "Mine".to_string(), "alice".to_string()))
        .await
        .unwrap();
    repo.create(&Roadmap::new(0, "Theirs".to_string(), "bob".to_string()))
        .await
        .unwrap();

    roadmap.is_public = true;
    repo.update(&roadmap).await.unwrap();
    assert!(repo.find_by_id(roadmap.id).await.unwrap().unwrap().is_public);

    assert_eq!(repo.list().await.unwrap().len(), 2);
    assert_eq!(repo.list_visible("carol").await.unwrap().len(), 1);
    assert_eq!(repo.list_visible("bob").await.unwrap().len(), 2);

    repo.delete(roadmap.id).await.unwrap();
    assert!(repo.find_by_id(roadmap.id).await.unwrap().is_none());

    let empty = Roadmap::new(0, " ".to_string(), "alice".to_string());
    assert!(matches!(repo.create(&empty).await, Err(DomainError::InvalidInput(_))));
}

#[tokio::test]
async fn test_post_roundtrip_and_ordering() {
    let db = setup_test_db().await;
    let (_backend, roadmap, posts) = seeded(&db).await;
    assert_eq!(posts[0].order, 0);
    assert_eq!(posts[1].order, 1);

    let repo = PostRepository::new(db.connection());
    let stored = repo.find_by_id(posts[0].id).await.unwrap().unwrap();
    assert_eq!(stored.priority, Some(Priority::High));
    assert_eq!(stored.tags, vec!["ui".to_string()]);
    assert_eq!(stored.start_date.as_deref(), Some("2024-01-01"));

    let listed = repo.list_by_roadmap(roadmap.id).await.unwrap();
    assert_eq!(listed.len(), 2);

    repo.delete(posts[0].id).await.unwrap();
    let remaining = repo.list_by_roadmap(roadmap.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order, 0);
}

#[tokio::test]
async fn test_update_post_status_reindexes_columns() {
    let db = setup_test_db().await;
    let (backend, roadmap, posts) = seeded(&db).await;
    let statuses = backend.fetch_statuses(roadmap.id).await.unwrap();
    let done = statuses[2].id;

    let moved = backend.update_post_status(posts[0].id, done, 5).await.unwrap();
    assert_eq!(moved.status_id, Some(done));
    assert_eq!(moved.order, 0);

    let left_behind = backend.posts.find_by_id(posts[1].id).await.unwrap().unwrap();
    assert_eq!(left_behind.order, 0);

    // Second post goes in front of the first
    let moved = backend.update_post_status(posts[1].id, done, 0).await.unwrap();
    assert_eq!(moved.order, 0);
    let first = backend.posts.find_by_id(posts[0].id).await.unwrap().unwrap();
    assert_eq!(first.order, 1);
}

#[tokio::test]
async fn test_update_post_status_rejects_foreign_status() {
    let db = setup_test_db().await;
    let (backend, _roadmap, posts) = seeded(&db).await;
    let other = backend.create_roadmap("Other", None, false).await.unwrap();
    let foreign = backend.fetch_statuses(other.id).await.unwrap()[0].id;

    let err = backend.update_post_status(posts[0].id, foreign, 0).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_milestone_lifecycle() {
    let db = setup_test_db().await;
    let (backend, roadmap, _posts) = seeded(&db).await;

    let created = backend
        .create_milestone(&NewMilestone {
            roadmap_id: roadmap.id,
            title: "Beta".to_string(),
            description: None,
            date: "2024-02-01".to_string(),
            color: Some("#8b5cf6".to_string()),
        })
        .await
        .unwrap();
    assert!(created.id > 0);

    let patch = MilestonePatch {
        is_completed: Some(true),
        color: Some(None),
        ..Default::default()
    };
    let updated = backend.update_milestone(created.id, &patch).await.unwrap();
    assert!(updated.is_completed);
    assert!(updated.color.is_none());

    let listed = backend.fetch_milestones(roadmap.id).await.unwrap();
    assert_eq!(listed, vec![updated]);

    backend.delete_milestone(created.id).await.unwrap();
    assert!(backend.fetch_milestones(roadmap.id).await.unwrap().is_empty());
    assert!(matches!(
        backend.delete_milestone(created.id).await,
        Err(DomainError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_milestone_requires_title() {
    let db = setup_test_db().await;
    let repo = MilestoneRepository::new(db.connection());
    let (_backend, roadmap, _posts) = seeded(&db).await;

    let blank = Milestone::new(0, roadmap.id, "".to_string(), "2024-01-01".to_string());
    assert!(matches!(repo.create(&blank).await, Err(DomainError::InvalidInput(_))));
}

#[tokio::test]
async fn test_dependency_rules() {
    let db = setup_test_db().await;
    let (backend, roadmap, posts) = seeded(&db).await;
    let new = |source_id, target_id| NewDependency {
        roadmap_id: roadmap.id,
        source_id,
        target_id,
        dependency_type: DependencyType::FinishToStart,
    };

    let created = backend.create_dependency(&new(posts[0].id, posts[1].id)).await.unwrap();
    assert_eq!(created.dependency_type, DependencyType::FinishToStart);

    let duplicate = backend.create_dependency(&new(posts[0].id, posts[1].id)).await;
    assert!(matches!(duplicate, Err(DomainError::Conflict(_))));

    let self_dep = backend.create_dependency(&new(posts[0].id, posts[0].id)).await;
    assert!(matches!(self_dep, Err(DomainError::InvalidInput(_))));

    let missing = backend.create_dependency(&new(posts[0].id, 999)).await;
    assert!(matches!(missing, Err(DomainError::NotFound(_))));

    // Reverse direction is a different pair
    backend.create_dependency(&new(posts[1].id, posts[0].id)).await.unwrap();
    assert_eq!(backend.fetch_dependencies(roadmap.id).await.unwrap().len(), 2);

    let mut changed = created.clone();
    changed.dependency_type = DependencyType::StartToStart;
    let repo = DependencyRepository::new(db.connection());
    assert_eq!(repo.update(&changed).await.unwrap().dependency_type, DependencyType::StartToStart);

    backend.delete_dependency(created.id).await.unwrap();
    assert_eq!(backend.fetch_dependencies(roadmap.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleting_post_cascades_dependencies() {
    let db = setup_test_db().await;
    let (backend, roadmap, posts) = seeded(&db).await;
    backend
        .create_dependency(&NewDependency {
            roadmap_id: roadmap.id,
            source_id: posts[0].id,
            target_id: posts[1].id,
            dependency_type: DependencyType::StartToFinish,
        })
        .await
        .unwrap();

    backend.posts.delete(posts[1].id).await.unwrap();
    assert!(backend.fetch_dependencies(roadmap.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_permissions() {
    let db = setup_test_db().await;
    let (_alice, roadmap, _posts) = seeded(&db).await;
    let bob = SqliteBackend::new(&db, "bob");

    assert!(matches!(
        bob.fetch_posts(roadmap.id).await,
        Err(DomainError::PermissionDenied(_))
    ));

    let mut public = roadmap.clone();
    public.is_public = true;
    RoadmapRepository::new(db.connection()).update(&public).await.unwrap();

    assert_eq!(bob.fetch_posts(roadmap.id).await.unwrap().len(), 2);
    let write = bob
        .create_milestone(&NewMilestone {
            roadmap_id: roadmap.id,
            title: "Sneaky".to_string(),
            description: None,
            date: "2024-01-01".to_string(),
            color: None,
        })
        .await;
    assert!(matches!(write, Err(DomainError::PermissionDenied(_))));
    assert!(matches!(bob.delete_roadmap(roadmap.id).await, Err(DomainError::PermissionDenied(_))));
    assert!(matches!(bob.fetch_posts(999).await, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_status_reorder() {
    let db = setup_test_db().await;
    let (backend, roadmap, _posts) = seeded(&db).await;
    let statuses = backend.fetch_statuses(roadmap.id).await.unwrap();

    let reordered = backend
        .statuses
        .reorder(roadmap.id, &[statuses[2].id])
        .await
        .unwrap();
    let names: Vec<&str> = reordered.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Done", "To Do", "In Progress"]);

    assert!(matches!(
        backend.statuses.reorder(roadmap.id, &[999]).await,
        Err(DomainError::InvalidInput(_))
    ));

    backend.statuses.delete(statuses[0].id).await.unwrap();
    let remaining = backend.fetch_statuses(roadmap.id).await.unwrap();
    assert_eq!(remaining.iter().map(|s| s.order).collect::<Vec<_>>(), vec![0, 1]);
}

#[tokio::test]
async fn test_export_job_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("roadmap.db");
    let db = init_db(&db_path).await.unwrap();
    let (_backend, roadmap, _posts) = seeded(&db).await;
    drop(db);

    let db_arg = db_path.display().to_string();
    let out_arg = dir.path().join("out").display().to_string();
    let id_arg = roadmap.id.to_string();
    let args = ExportArgs::try_parse_from(["roadmap-export", db_arg.as_str(), id_arg.as_str(), "csv", out_arg.as_str()])
        .unwrap();
    let now = chrono::DateTime::parse_from_rfc3339("2024-03-09T10:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    let path = run_export(&args, now).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "q1-plan-timeline-2024-03-09.csv");

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Type,ID,Title"));
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn test_export_args() {
    let args = ExportArgs::try_parse_from(["roadmap-export", "db.sqlite", "7", "JSON"]).unwrap();
    assert_eq!(args.roadmap_id, 7);
    assert_eq!(args.export_format(), ExportFormat::Json);
    assert_eq!(args.out_dir, PathBuf::from("."));

    let args =
        ExportArgs::try_parse_from(["roadmap-export", "db", "1", "csv", "out", "--log-dir", "/tmp/logs"]).unwrap();
    assert_eq!(args.export_format(), ExportFormat::Csv);
    assert_eq!(args.out_dir, PathBuf::from("out"));
    assert_eq!(args.log_dir_or_default(), PathBuf::from("/tmp/logs"));

    assert!(ExportArgs::try_parse_from(["roadmap-export", "db", "x", "csv"]).is_err());
    assert!(ExportArgs::try_parse_from(["roadmap-export", "db", "1", "xml"]).is_err());
    assert!(ExportArgs::try_parse_from(["roadmap-export", "db"]).is_err());
    assert!(ExportArgs::try_parse_from(["roadmap-export", "db", "1", "csv", "out", "extra"]).is_err());
}

#[test]
fn test_export_args_help() {
    let err = ExportArgs::try_parse_from(["roadmap-export", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    assert!(err.to_string().contains("roadmap-export"));
}

#[test]
fn test_report_failure_surfaces_logging_error() {
    // No logger is installed in this test binary
    let result = report_failure(&DomainError::not_found::<Roadmap>(42));
    assert!(matches!(result, Err(rolling_logger::LoggerError::NotInitialized)));
}

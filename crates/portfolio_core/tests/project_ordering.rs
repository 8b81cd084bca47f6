use portfolio_core::db::open_db_in_memory;
use portfolio_core::{
    OrderError, OrderManager, Project, ProjectDraft, ProjectId, ProjectListQuery,
    ProjectRepository, ProjectService, ProjectServiceError, ProjectStatus, RepoError,
    SqliteProjectRepository,
};
use portfolio_core::{PartitionRenumber, RepoResult};
use rusqlite::{params, Connection};
use std::cell::{Cell, RefCell};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> ProjectService<SqliteProjectRepository<'_>> {
    ProjectService::new(SqliteProjectRepository::try_new(conn).unwrap())
}

fn draft(title: &str, featured: bool) -> ProjectDraft {
    ProjectDraft {
        title: title.to_string(),
        description: format!("{title} description"),
        image: "https://cdn.example.com/cover.png".to_string(),
        technologies: vec!["rust".to_string(), "sqlite".to_string()],
        github_url: "https://github.com/someone/project".to_string(),
        url: "https://someone.dev/project".to_string(),
        status: ProjectStatus::Published,
        featured,
    }
}

fn create(conn: &Connection, title: &str, featured: bool) -> Project {
    service(conn).create_project(draft(title, featured)).unwrap()
}

/// `(id, display_order)` of one partition in display order.
fn partition(conn: &Connection, featured: bool) -> Vec<(ProjectId, i64)> {
    let repo = SqliteProjectRepository::try_new(conn).unwrap();
    repo.list_projects(&ProjectListQuery {
        featured: Some(featured),
        status: None,
    })
    .unwrap()
    .into_iter()
    .map(|project| (project.id, project.display_order))
    .collect()
}

fn order_of(conn: &Connection, id: ProjectId) -> i64 {
    service(conn).get_project(id).unwrap().display_order
}

fn assert_dense(conn: &Connection, featured: bool) {
    let mut orders: Vec<i64> = partition(conn, featured)
        .into_iter()
        .map(|(_, order)| order)
        .collect();
    orders.sort_unstable();
    let expected: Vec<i64> = (1..=orders.len() as i64).collect();
    assert_eq!(orders, expected, "partition featured={featured} is not dense");
}

fn force_display_order(conn: &Connection, id: ProjectId, order: i64) {
    conn.execute(
        "UPDATE projects SET display_order = ?2 WHERE id = ?1;",
        params![id.to_string(), order],
    )
    .unwrap();
}

fn fail_writes_for(conn: &Connection, id: ProjectId) {
    conn.execute_batch(&format!(
        "CREATE TEMP TRIGGER fail_order_write
         BEFORE UPDATE OF display_order ON projects
         WHEN NEW.id = '{id}'
         BEGIN
           SELECT RAISE(ABORT, 'forced write failure');
         END;"
    ))
    .unwrap();
}

fn clear_forced_failure(conn: &Connection) {
    conn.execute_batch("DROP TRIGGER IF EXISTS temp.fail_order_write;")
        .unwrap();
}

#[test]
fn create_appends_to_empty_partition() {
    let conn = setup();

    let a = create(&conn, "A", true);
    assert_eq!(a.display_order, 1);
    let b = create(&conn, "B", true);
    assert_eq!(b.display_order, 2);

    let regular = create(&conn, "R", false);
    assert_eq!(regular.display_order, 1);
    assert_eq!(order_of(&conn, a.id), 1);
}

#[test]
fn delete_closes_gap_in_deleted_partition_only() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    let c = create(&conn, "C", false);
    let f1 = create(&conn, "F1", true);
    let f2 = create(&conn, "F2", true);
    let featured_before = partition(&conn, true);

    let deleted = service(&conn).delete_project(b.id).unwrap();
    assert_eq!(deleted.id, b.id);

    assert_eq!(partition(&conn, false), vec![(a.id, 1), (c.id, 2)]);
    assert_eq!(partition(&conn, true), featured_before);
    assert_eq!(featured_before, vec![(f1.id, 1), (f2.id, 2)]);
}

#[test]
fn delete_missing_project_returns_not_found() {
    let conn = setup();
    let missing = Uuid::new_v4();
    let err = service(&conn).delete_project(missing).unwrap_err();
    assert!(matches!(err, ProjectServiceError::ProjectNotFound(id) if id == missing));
}

#[test]
fn feature_toggle_appends_to_new_partition_and_leaves_hole_until_rebalance() {
    let conn = setup();
    for index in 0..5 {
        create(&conn, &format!("F{index}"), true);
    }
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);

    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let orders = OrderManager::new(&repo);
    let assigned = orders.assign_on_feature_toggle(&a, true).unwrap();
    assert_eq!(assigned, 6);

    let moved = service(&conn).get_project(a.id).unwrap();
    assert!(moved.featured);
    assert_eq!(moved.display_order, 6);
    assert_eq!(partition(&conn, false), vec![(b.id, 2)]);

    let summary = orders.rebalance(false).unwrap();
    assert_eq!(summary.members, 1);
    assert_eq!(summary.reassigned, 1);
    assert_eq!(partition(&conn, false), vec![(b.id, 1)]);
    assert_dense(&conn, true);
}

#[test]
fn feature_toggle_to_same_partition_writes_nothing() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let assigned = OrderManager::new(&repo)
        .assign_on_feature_toggle(&a, false)
        .unwrap();
    assert_eq!(assigned, 1);
    assert_eq!(service(&conn).get_project(a.id).unwrap(), a);
}

#[test]
fn service_toggle_rebalances_both_partitions() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    let c = create(&conn, "C", false);
    let f = create(&conn, "F", true);

    let toggled = service(&conn).toggle_featured(a.id).unwrap();
    assert!(toggled.featured);
    assert_eq!(toggled.display_order, 2);
    assert_eq!(partition(&conn, true), vec![(f.id, 1), (a.id, 2)]);
    assert_eq!(partition(&conn, false), vec![(b.id, 1), (c.id, 2)]);

    let back = service(&conn).toggle_featured(a.id).unwrap();
    assert!(!back.featured);
    assert_eq!(back.display_order, 3);
    assert_dense(&conn, true);
    assert_dense(&conn, false);
}

#[test]
fn set_featured_with_unchanged_value_is_noop() {
    let conn = setup();
    let a = create(&conn, "A", true);
    let unchanged = service(&conn).set_featured(a.id, true).unwrap();
    assert_eq!(unchanged, a);
}

#[test]
fn reorder_by_sequence_assigns_positions() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    let c = create(&conn, "C", false);
    let featured_before = {
        create(&conn, "F", true);
        partition(&conn, true)
    };

    let outcome = service(&conn)
        .reorder_projects(&[c.id, a.id, b.id], false)
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Display order successfully updated.");
    assert_eq!(outcome.order, vec![c.id, a.id, b.id]);
    assert_eq!(outcome.reassigned, 3);

    assert_eq!(order_of(&conn, a.id), 2);
    assert_eq!(order_of(&conn, b.id), 3);
    assert_eq!(order_of(&conn, c.id), 1);
    assert_eq!(partition(&conn, true), featured_before);
}

#[test]
fn reorder_rejects_subset_without_mutation() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    create(&conn, "C", false);
    let before = partition(&conn, false);

    let err = service(&conn)
        .reorder_projects(&[b.id, a.id], false)
        .unwrap_err();
    match err {
        ProjectServiceError::Order(OrderError::MembershipMismatch {
            featured,
            partition_size,
            requested,
        }) => {
            assert!(!featured);
            assert_eq!(partition_size, 3);
            assert_eq!(requested, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(service(&conn)
        .reorder_projects(&[b.id, a.id], false)
        .unwrap_err()
        .is_client_error());
    assert_eq!(partition(&conn, false), before);
}

#[test]
fn reorder_rejects_superset_and_foreign_ids_without_mutation() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    let featured = create(&conn, "F", true);
    let before_regular = partition(&conn, false);
    let before_featured = partition(&conn, true);

    let err = service(&conn)
        .reorder_projects(&[b.id, a.id, featured.id], false)
        .unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Order(OrderError::WrongPartition { id, featured: false }) if id == featured.id
    ));

    let unknown = Uuid::new_v4();
    let err = service(&conn)
        .reorder_projects(&[b.id, a.id, unknown], false)
        .unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Order(OrderError::UnknownProject(id)) if id == unknown
    ));

    assert_eq!(partition(&conn, false), before_regular);
    assert_eq!(partition(&conn, true), before_featured);
}

#[test]
fn reorder_rejects_empty_and_duplicate_lists() {
    let conn = setup();
    let a = create(&conn, "A", false);
    create(&conn, "B", false);

    let err = service(&conn).reorder_projects(&[], false).unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Order(OrderError::EmptySequence)
    ));

    let err = service(&conn)
        .reorder_projects(&[a.id, a.id], false)
        .unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Order(OrderError::DuplicateId(id)) if id == a.id
    ));
}

#[test]
fn reorder_write_failure_at_any_position_rolls_back_everything() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    let c = create(&conn, "C", false);
    let d = create(&conn, "D", false);
    create(&conn, "F", true);
    let before_regular = partition(&conn, false);
    let before_featured = partition(&conn, true);

    // Rotation moves every project, so every position issues a write.
    let rotated = [b.id, c.id, d.id, a.id];
    for failing in rotated {
        fail_writes_for(&conn, failing);

        let err = service(&conn)
            .reorder_projects(&rotated, false)
            .unwrap_err();
        assert!(
            matches!(err, ProjectServiceError::Order(OrderError::ReorderAborted(_))),
            "unexpected error: {err}"
        );
        assert!(!err.is_client_error());
        assert_eq!(partition(&conn, false), before_regular);
        assert_eq!(partition(&conn, true), before_featured);

        clear_forced_failure(&conn);
    }

    service(&conn).reorder_projects(&rotated, false).unwrap();
    assert_eq!(
        partition(&conn, false),
        vec![(b.id, 1), (c.id, 2), (d.id, 3), (a.id, 4)]
    );
}

#[test]
fn rebalance_repairs_gaps_and_duplicates_keeping_insertion_order_for_ties() {
    let conn = setup();
    let a = create(&conn, "A", true);
    let b = create(&conn, "B", true);
    let c = create(&conn, "C", true);
    let d = create(&conn, "D", true);
    force_display_order(&conn, a.id, 7);
    force_display_order(&conn, b.id, 3);
    force_display_order(&conn, c.id, 3);
    force_display_order(&conn, d.id, 0);

    let [featured, regular] = service(&conn).rebalance_all().unwrap();
    assert_eq!(featured.members, 4);
    assert_eq!(regular.members, 0);

    assert_eq!(
        partition(&conn, true),
        vec![(d.id, 1), (b.id, 2), (c.id, 3), (a.id, 4)]
    );
}

#[test]
fn rebalance_is_idempotent() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    force_display_order(&conn, a.id, 10);
    force_display_order(&conn, b.id, 4);

    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let orders = OrderManager::new(&repo);
    let first = orders.rebalance(false).unwrap();
    let after_first = partition(&conn, false);
    let second = orders.rebalance(false).unwrap();

    assert_eq!(first.reassigned, 2);
    assert_eq!(second.reassigned, 0);
    assert_eq!(partition(&conn, false), after_first);
    assert_eq!(after_first, vec![(b.id, 1), (a.id, 2)]);
}

#[test]
fn write_order_sequence_rejects_partial_membership() {
    let conn = setup();
    let a = create(&conn, "A", false);
    create(&conn, "B", false);
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let err = repo.write_order_sequence(false, &[a.id]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::PartitionChanged {
            featured: false,
            expected: 1,
            actual: 2
        }
    ));
}

#[test]
fn mixed_operation_sequence_keeps_both_partitions_dense() {
    let conn = setup();
    let svc = service(&conn);
    let mut ids = Vec::new();
    for index in 0..6 {
        let project = svc
            .create_project(draft(&format!("P{index}"), index % 2 == 0))
            .unwrap();
        ids.push(project.id);
    }

    svc.delete_project(ids[2]).unwrap();
    svc.toggle_featured(ids[1]).unwrap();
    svc.toggle_featured(ids[4]).unwrap();
    svc.delete_project(ids[0]).unwrap();

    let mut featured: Vec<ProjectId> = partition(&conn, true).into_iter().map(|(id, _)| id).collect();
    featured.reverse();
    svc.reorder_projects(&featured, true).unwrap();
    svc.create_project(draft("late", false)).unwrap();

    assert_dense(&conn, true);
    assert_dense(&conn, false);
}

/// Repository that lands one extra create right after a delete or partition
/// move commits, ahead of the follow-up rebalance.
struct InterleavedCreateRepo<'c> {
    inner: SqliteProjectRepository<'c>,
    pending: RefCell<Option<ProjectDraft>>,
    armed: Cell<bool>,
}

impl<'c> InterleavedCreateRepo<'c> {
    fn new(conn: &'c Connection, pending: ProjectDraft) -> Self {
        Self {
            inner: SqliteProjectRepository::try_new(conn).unwrap(),
            pending: RefCell::new(Some(pending)),
            armed: Cell::new(false),
        }
    }

    fn land_pending_create(&self) -> RepoResult<()> {
        if !self.armed.replace(false) {
            return Ok(());
        }
        let Some(draft) = self.pending.borrow_mut().take() else {
            return Ok(());
        };
        let draft = draft.validated().unwrap();
        let slot = self.inner.max_display_order(draft.featured)?.unwrap_or(0) + 1;
        self.inner
            .insert_project(&Project::from_draft(Uuid::new_v4(), draft, slot))?;
        Ok(())
    }
}

impl ProjectRepository for InterleavedCreateRepo<'_> {
    fn insert_project(&self, project: &Project) -> RepoResult<Project> {
        self.inner.insert_project(project)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.inner.get_project(id)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        self.inner.list_projects(query)
    }

    fn update_project_payload(&self, id: ProjectId, draft: &ProjectDraft) -> RepoResult<Project> {
        self.inner.update_project_payload(id, draft)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let deleted = self.inner.delete_project(id)?;
        self.armed.set(true);
        Ok(deleted)
    }

    fn max_display_order(&self, featured: bool) -> RepoResult<Option<i64>> {
        self.land_pending_create()?;
        self.inner.max_display_order(featured)
    }

    fn list_partition_ids(&self, featured: bool) -> RepoResult<Vec<ProjectId>> {
        self.land_pending_create()?;
        self.inner.list_partition_ids(featured)
    }

    fn move_to_partition(
        &self,
        id: ProjectId,
        featured: bool,
        display_order: i64,
    ) -> RepoResult<()> {
        self.inner.move_to_partition(id, featured, display_order)?;
        self.armed.set(true);
        Ok(())
    }

    fn write_order_sequence(&self, featured: bool, ids: &[ProjectId]) -> RepoResult<usize> {
        self.land_pending_create()?;
        self.inner.write_order_sequence(featured, ids)
    }

    fn rebalance_partition(&self, featured: bool) -> RepoResult<PartitionRenumber> {
        self.land_pending_create()?;
        self.inner.rebalance_partition(featured)
    }
}

#[test]
fn delete_cleanup_includes_project_created_before_rebalance() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    let c = create(&conn, "C", false);

    let repo = InterleavedCreateRepo::new(&conn, draft("Late", false));
    let service = ProjectService::new(repo);
    let deleted = service.delete_project(a.id).unwrap();
    assert_eq!(deleted.id, a.id);

    let late = id_by_title(&conn, "Late");
    assert_eq!(partition(&conn, false), vec![(b.id, 1), (c.id, 2), (late, 3)]);
}

#[test]
fn partition_move_rebalance_includes_project_created_before_rebalance() {
    let conn = setup();
    let a = create(&conn, "A", false);
    let b = create(&conn, "B", false);
    let c = create(&conn, "C", false);
    let f = create(&conn, "F", true);

    let repo = InterleavedCreateRepo::new(&conn, draft("Late", false));
    let service = ProjectService::new(repo);
    let moved = service.toggle_featured(b.id).unwrap();
    assert!(moved.featured);
    assert_eq!(moved.display_order, 2);

    let late = id_by_title(&conn, "Late");
    assert_eq!(partition(&conn, true), vec![(f.id, 1), (b.id, 2)]);
    assert_eq!(partition(&conn, false), vec![(a.id, 1), (c.id, 2), (late, 3)]);
}

fn id_by_title(conn: &Connection, title: &str) -> ProjectId {
    conn.query_row(
        "SELECT id FROM projects WHERE title = ?1;",
        [title],
        |row| row.get::<_, String>(0),
    )
    .map(|id| Uuid::parse_str(&id).unwrap())
    .unwrap()
}

use super::*;
use chrono::{TimeZone, Utc};
use shared::{
    domain::FormStatus,
    protocol::{FolderRecord, FormRecord},
};

fn form(id: &str, folder: Option<&str>) -> FormRecord {
    FormRecord {
        form_id: FormId::new(id),
        title: id.to_string(),
        description: String::new(),
        responses: 0,
        views: 0,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        status: FormStatus::Draft,
        share_token: None,
        folder_id: folder.map(FolderId::new),
    }
}

fn folder(id: &str, form_count: u32) -> FolderRecord {
    FolderRecord {
        folder_id: FolderId::new(id),
        name: id.to_string(),
        description: String::new(),
        color: "#dc2626".to_string(),
        form_count,
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(),
    }
}

fn seeded_store() -> ItemStore {
    let mut store = ItemStore::new();
    store.upsert_folder(folder("f1", 1));
    store.upsert_folder(folder("f2", 0));
    store.upsert_form(form("a", None));
    store.upsert_form(form("b", Some("f1")));
    store
}

#[test]
fn folder_drags_resolve_to_noop() {
    let store = seeded_store();
    let plan = resolve_drop(
        &store,
        &DragItem::Folder(FolderId::new("f1")),
        Some(&DropTarget::Folder(FolderId::new("f2"))),
    );
    assert_eq!(plan, RelocationPlan::NoOp);
}

#[test]
fn missing_target_resolves_to_noop() {
    let store = seeded_store();
    let plan = resolve_drop(&store, &DragItem::Form(FormId::new("a")), None);
    assert_eq!(plan, RelocationPlan::NoOp);
}

#[test]
fn dropping_on_current_location_resolves_to_noop() {
    let store = seeded_store();
    let onto_own_folder = resolve_drop(
        &store,
        &DragItem::Form(FormId::new("b")),
        Some(&DropTarget::Folder(FolderId::new("f1"))),
    );
    assert_eq!(onto_own_folder, RelocationPlan::NoOp);

    let unassigned_onto_unassigned = resolve_drop(
        &store,
        &DragItem::Form(FormId::new("a")),
        Some(&DropTarget::Unassigned),
    );
    assert_eq!(unassigned_onto_unassigned, RelocationPlan::NoOp);
}

#[test]
fn unknown_target_folder_resolves_to_noop() {
    let store = seeded_store();
    let plan = resolve_drop(
        &store,
        &DragItem::Form(FormId::new("a")),
        Some(&DropTarget::Folder(FolderId::new("ghost"))),
    );
    assert_eq!(plan, RelocationPlan::NoOp);
}

#[test]
fn move_plan_carries_prior_reference() {
    let store = seeded_store();
    let plan = resolve_drop(
        &store,
        &DragItem::Form(FormId::new("b")),
        Some(&DropTarget::Folder(FolderId::new("f2"))),
    );
    assert_eq!(
        plan,
        RelocationPlan::Move {
            form_id: FormId::new("b"),
            from: Some(FolderId::new("f1")),
            to: Some(FolderId::new("f2")),
        }
    );
}

#[test]
fn apply_optimistic_adjusts_both_counts_and_snapshots_prior_state() {
    let mut store = seeded_store();
    let from = FolderId::new("f1");
    let to = FolderId::new("f2");

    let snapshot = apply_optimistic(&mut store, &FormId::new("b"), Some(&from), Some(&to))
        .expect("optimistic move");

    assert_eq!(store.form(&FormId::new("b")).unwrap().folder_id, Some(to));
    assert_eq!(store.folder(&FolderId::new("f1")).unwrap().form_count, 0);
    assert_eq!(store.folder(&FolderId::new("f2")).unwrap().form_count, 1);
    assert_eq!(snapshot.prior_folder, Some(FolderId::new("f1")));
    assert_eq!(snapshot.affected.len(), 2);
}

#[test]
fn roll_back_restores_reference_and_counts() {
    let mut store = seeded_store();
    let from = FolderId::new("f1");
    let to = FolderId::new("f2");
    let snapshot = apply_optimistic(&mut store, &FormId::new("b"), Some(&from), Some(&to))
        .expect("optimistic move");

    roll_back(&mut store, &snapshot);

    assert_eq!(
        store.form(&FormId::new("b")).unwrap().folder_id,
        Some(FolderId::new("f1"))
    );
    assert_eq!(store.folder(&FolderId::new("f1")).unwrap().form_count, 1);
    assert_eq!(store.folder(&FolderId::new("f2")).unwrap().form_count, 0);
}

#[test]
fn roll_back_leaves_form_unassigned_when_prior_folder_vanished() {
    let mut store = seeded_store();
    let from = FolderId::new("f1");
    let to = FolderId::new("f2");
    let snapshot = apply_optimistic(&mut store, &FormId::new("b"), Some(&from), Some(&to))
        .expect("optimistic move");

    store.remove_folder(&FolderId::new("f1"));
    roll_back(&mut store, &snapshot);

    assert_eq!(store.form(&FormId::new("b")).unwrap().folder_id, None);
    assert_eq!(store.folder(&FolderId::new("f2")).unwrap().form_count, 0);
}

use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use step_editor_core::{
    Axis, Command, CommandResult, CursorCommand, Document, EditCommand, EditorConfig,
    EditorStateManager, JsonSerializer, MemoryBackend, Part, Placement, RotationCommand,
    RotationKind, SaveStatus, SelectionCommand, StateChange, StateChangeType, Step, StepRotation,
};

fn manager() -> EditorStateManager {
    let main = Part::assembly(
        "main.ldr",
        vec![
            Step::new(vec![Placement::new("sub.ldr"), Placement::new("3001.dat")]),
            Step::new(vec![Placement::new("3001.dat"), Placement::new("3001.dat")]),
        ],
    );
    let sub = Part::assembly(
        "sub.ldr",
        vec![
            Step::new(vec![Placement::new("3001.dat")]),
            Step::new(vec![Placement::new("3001.dat")]),
        ],
    );
    let document = Document::with_parts(main, [sub, Part::leaf("3001.dat")]).unwrap();
    EditorStateManager::new("main.ldr", document, EditorConfig::default()).unwrap()
}

fn recorder(manager: &mut EditorStateManager) -> Arc<Mutex<Vec<StateChange>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    manager.subscribe(move |change| sink.lock().unwrap().push(change.clone()));
    changes
}

#[test]
fn test_cursor_state_describes_nested_position() {
    let manager = manager();
    let state = manager.get_cursor_state();

    assert_eq!(state.global_index, 0);
    assert_eq!(state.total_steps, 4);
    assert_eq!(state.part_id.as_deref(), Some("sub.ldr"));
    assert_eq!(state.step_index, Some(0));
    assert_eq!(state.path.len(), 2);
    assert_eq!(state.placement_count, 1);
    assert_eq!(state.ghosted_count, 0);
}

#[test]
fn test_cursor_moves_report_new_index() {
    let mut manager = manager();
    let changes = recorder(&mut manager);

    manager
        .execute(Command::Cursor(CursorCommand::GoTo { index: 3 }))
        .unwrap();

    let changes = changes.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, StateChangeType::CursorMoved);
    assert_eq!(changes[0].cursor, 3);
    assert_eq!(changes[0].old_version, 0);
    assert_eq!(changes[0].new_version, 1);
    assert!(!manager.is_modified());
}

#[test]
fn test_selection_does_not_modify_document() {
    let mut manager = manager();
    let changes = recorder(&mut manager);
    manager
        .execute(Command::Cursor(CursorCommand::Last))
        .unwrap();

    manager
        .execute(Command::Selection(SelectionCommand::SelectAll))
        .unwrap();

    assert_eq!(
        changes.lock().unwrap().last().map(|c| c.change_type),
        Some(StateChangeType::SelectionChanged)
    );
    assert!(!manager.is_modified());
    assert_eq!(manager.get_cursor_state().ghosted_count, 2);
}

#[test]
fn test_skipped_edit_changes_nothing() {
    let mut manager = manager();
    let changes = recorder(&mut manager);

    let result = manager
        .execute(Command::Edit(EditCommand::Recolor { color: 4 }))
        .unwrap();

    assert!(matches!(result, CommandResult::Skipped(_)));
    assert!(changes.lock().unwrap().is_empty());
    assert_eq!(manager.version(), 0);
}

#[test]
fn test_extract_then_save_round_trip() {
    let mut manager = manager();
    manager
        .execute_batch(vec![
            Command::Cursor(CursorCommand::Last),
            Command::Selection(SelectionCommand::Toggle { placement: 1 }),
        ])
        .unwrap();

    let result = manager
        .execute(Command::Edit(EditCommand::ExtractToNewPart))
        .unwrap();
    assert!(matches!(result, CommandResult::Created { ref part_id, .. } if part_id == "0.ldr"));

    let mut backend = MemoryBackend::new();
    manager.save_with(&JsonSerializer, &mut backend).unwrap();

    assert!(!manager.is_modified());
    assert_eq!(*manager.save_status(), SaveStatus::Saved);
    let saved = backend.last_content().unwrap();
    assert!(!saved.contains("ghost"));
    let restored = Document::from_json(saved).unwrap();
    assert_eq!(&restored, manager.editor().document());
}

#[test]
fn test_rotation_commands_propagate_and_validate() {
    let mut manager = manager();
    manager
        .execute(Command::Cursor(CursorCommand::GoTo { index: 2 }))
        .unwrap();

    manager
        .execute_batch(vec![
            Command::Rotation(RotationCommand::SetKind {
                kind: RotationKind::Absolute,
            }),
            Command::Rotation(RotationCommand::Nudge {
                axis: Axis::Y,
                steps: -1,
            }),
        ])
        .unwrap();

    let main = manager.editor().document().main_model().unwrap();
    let expected = Some(StepRotation::new(0.0, -90.0, 0.0, RotationKind::Absolute));
    assert_eq!(main.steps[0].rotation, expected);
    assert_eq!(main.steps[1].rotation, expected);

    let err = manager
        .execute(Command::Rotation(RotationCommand::SetAngles {
            x: 0.0,
            y: f64::INFINITY,
            z: 0.0,
        }))
        .unwrap_err();
    assert_eq!(err.to_string(), "rotation angle for y must be finite, got inf");
    let main = manager.editor().document().main_model().unwrap();
    assert_eq!(main.steps[0].rotation, expected);

    manager
        .execute(Command::Rotation(RotationCommand::End))
        .unwrap();
    let main = manager.editor().document().main_model().unwrap();
    assert_eq!(main.steps[0].rotation, None);
    assert_eq!(main.steps[1].rotation, None);
}

#[test]
fn test_navigation_during_save_keeps_save_current() {
    let mut manager = manager();
    manager
        .execute(Command::Edit(EditCommand::InsertStepAfter))
        .unwrap();

    let request = manager.begin_save(&JsonSerializer).unwrap();
    assert_eq!(*manager.save_status(), SaveStatus::Saving);
    manager
        .execute_batch(vec![
            Command::Cursor(CursorCommand::First),
            Command::Selection(SelectionCommand::SelectAll),
        ])
        .unwrap();
    assert!(manager.version() > request.version);
    assert_eq!(manager.document_version(), request.version);

    manager.complete_save(&request, Ok(()));

    assert!(!manager.is_modified());
    assert_eq!(*manager.save_status(), SaveStatus::Saved);
    let current = manager.editor().document().to_json().unwrap();
    assert_eq!(current, request.content);
}

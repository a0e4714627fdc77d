//! Restructuring example
//!
//! Builds a small model, splits a step, extracts a subassembly and saves the result.
//! Run with `RUST_LOG=debug` to see the cursor arithmetic.

use step_editor_core::{
    Command, CursorCommand, Document, EditCommand, EditorConfig, EditorStateManager,
    JsonSerializer, MemoryBackend, Part, Placement, SelectionCommand, Step,
};

fn main() {
    env_logger::init();

    let main = Part::assembly(
        "house.ldr",
        vec![
            Step::new(vec![
                Placement::new("3001.dat").with_color(4),
                Placement::new("3001.dat").with_color(4),
                Placement::new("3003.dat").with_color(1),
            ]),
            Step::new(vec![Placement::new("3001.dat").with_color(14)]),
        ],
    );
    let document = Document::with_parts(main, [Part::leaf("3001.dat"), Part::leaf("3003.dat")])
        .expect("valid document");

    let mut manager = EditorStateManager::new("house.ldr", document, EditorConfig::default())
        .expect("valid document");

    manager.subscribe(|change| {
        println!(
            "  {:?} (version {} -> {}, cursor {})",
            change.change_type, change.old_version, change.new_version, change.cursor
        );
    });

    println!("1. Initial state:");
    print_state(&manager);

    println!("\n2. Move the blue brick into its own step:");
    manager
        .execute_batch(vec![
            Command::Selection(SelectionCommand::Toggle { placement: 2 }),
            Command::Edit(EditCommand::MoveToNext),
        ])
        .expect("commands succeed");
    print_state(&manager);

    println!("\n3. Extract the red bricks into a subassembly:");
    manager
        .execute_batch(vec![
            Command::Cursor(CursorCommand::First),
            Command::Edit(EditCommand::ExtractToNewPart),
        ])
        .expect("commands succeed");
    print_state(&manager);

    println!("\n4. Save:");
    let mut backend = MemoryBackend::new();
    match manager.save_with(&JsonSerializer, &mut backend) {
        Ok(()) => println!("  saved {} bytes", backend.last_content().map_or(0, str::len)),
        Err(err) => println!("  {err}"),
    }
    print_state(&manager);
}

fn print_state(manager: &EditorStateManager) {
    let document = manager.get_document_state();
    let cursor = manager.get_cursor_state();
    println!(
        "  parts: {}, steps: {}, modified: {}, save: {:?}",
        document.part_count, document.total_steps, document.is_modified, document.save_status
    );
    println!(
        "  cursor: {}/{} in {:?} step {:?} ({} placements)",
        cursor.global_index,
        cursor.total_steps,
        cursor.part_id,
        cursor.step_index,
        cursor.placement_count
    );
}

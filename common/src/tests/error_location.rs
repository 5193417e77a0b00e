use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every error in the workspace embeds an `ErrorLocation`. If it
/// captures the wrong position, a failed reconnect or a bad pairing key points developers
/// at the wrong source line.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` stops being propagated or the
/// constructor swaps line and column.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: Current source position
    // WHEN: Creating ErrorLocation from it
    let location = ErrorLocation::from(Location::caller());
    let expected_line = line!() - 1;

    // THEN: Should capture file, line, and column
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert_eq!(location.line, expected_line, "Should capture correct line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the bracketed `[file:line:column]` Display format.
///
/// **WHY THIS MATTERS**: Error messages end with the location; log readers grep for it.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops a component or the brackets.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation {
        file: "src/codec/mod.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = format!("{location}");

    // THEN: Should be [file:line:column]
    assert_eq!(formatted, "[src/codec/mod.rs:42:7]");
}

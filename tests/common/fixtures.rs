use serde_json::{Value, json};

/// Width of every character in the fixtures, in millipoints.
pub const CHAR: i32 = 6000;

/// Measure that fits exactly ten characters.
pub const MEASURE: i32 = 10 * CHAR;

/// Default line height.
pub const LINE: i32 = 12000;

/// Text that breaks into exactly `count` full lines at `MEASURE`.
///
/// Each line is "aaaa bbbbb": 4 + 1 + 5 characters, so no line needs to stretch.
pub fn exact_lines(count: usize) -> String {
    vec!["aaaa bbbbb"; count].join(" ")
}

/// A document with one page master of `lines` lines and one sequence.
pub fn single_sequence(lines: i32, flow: Value) -> Value {
    json!({
        "pageMasters": [
            { "name": "body", "regionWidth": MEASURE, "regionHeight": lines * LINE }
        ],
        "config": { "charWidth": CHAR },
        "sequences": [
            { "name": "main", "master": "body", "flow": flow }
        ]
    })
}

pub fn paragraph(text: &str) -> Value {
    json!({ "type": "paragraph", "text": text })
}

pub fn block(height: i32) -> Value {
    json!({ "type": "block", "height": height })
}

/// Front matter citing an appendix that lives in a later sequence.
pub fn cross_reference_document() -> Value {
    json!({
        "pageMasters": [
            { "name": "body", "regionWidth": MEASURE, "regionHeight": 3 * LINE }
        ],
        "config": { "charWidth": CHAR },
        "sequences": [
            {
                "name": "front",
                "master": "body",
                "flow": [
                    { "type": "paragraph", "text": exact_lines(2) },
                    { "type": "pageCitation", "id": "appendix" },
                    { "type": "pageCitation", "id": "tables" },
                    { "type": "paragraph", "text": exact_lines(2) }
                ]
            },
            {
                "name": "back",
                "master": "body",
                "initialPageNumber": 10,
                "flow": [
                    { "type": "paragraph", "text": exact_lines(3) },
                    { "type": "anchor", "id": "appendix" },
                    { "type": "paragraph", "text": exact_lines(1) }
                ]
            }
        ]
    })
}

//! Static domain synonym table for employee roster fields.
//!
//! Pairs are bidirectional: either side of a pair may appear in the rule
//! source while the dataset uses the other.

pub const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("employee id", "employee no"),
    ("employee no", "staff number"),
    ("name", "full name"),
    ("birth date", "date of birth"),
    ("resident id", "resident registration no"),
    ("hire date", "entry date"),
    ("leave date", "resignation date"),
    ("average salary", "average wage"),
    ("salary", "wage"),
];

//! Name normalization primitives.

/// Normalize a display name: control whitespace becomes a plain space,
/// whitespace runs collapse to one space, ends are trimmed.
pub fn normalize_name(name: &str) -> String {
    name.replace(['\n', '\r', '\t'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical comparison key: normalized with all remaining whitespace
/// stripped. Two names refer to the same sheet iff their canonical forms
/// are equal.
pub fn canonical_name(name: &str) -> String {
    normalize_name(name).split_whitespace().collect()
}

/// Canonical form of the part before the first parenthesis.
///
/// Column headers often carry code explanations in parentheses, e.g.
/// "Employee Type (1: staff, 3: executive)"; the core is "EmployeeType".
pub fn core_name(name: &str) -> String {
    let head = name.split('(').next().unwrap_or(name);
    canonical_name(head)
}

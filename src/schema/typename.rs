// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! C++ type-name munging for the planner.
//!
//! Streamer type names arrive as C++ spellings (`vector<map<int,double>>`,
//! `Int_t`, `TString*`, `double[]`). The planner dispatches on the outermost
//! class token and recurses into template arguments; the helpers here do
//! that string surgery plus the two path/title patterns inherited from the
//! host file layout (object-path cycle suffixes and branch-title dimension
//! specs).

use std::sync::OnceLock;

use regex::Regex;

use crate::core::{DecodeError, Result};

/// STL container keywords recognized by the sequence and map factories.
const STL_TYPENAMES: &[&str] = &[
    "vector",
    "array",
    "string",
    "list",
    "set",
    "multiset",
    "unordered_set",
    "unordered_multiset",
    "map",
    "multimap",
    "unordered_map",
    "unordered_multimap",
];

/// Check whether a type token names an STL container.
pub fn is_stl_container(name: &str) -> bool {
    STL_TYPENAMES.contains(&name)
}

/// Extract the outermost class token of a type name.
///
/// `vector<map<int,double>>` -> `vector`, `TArrayI` -> `TArrayI`,
/// `TObjArray*` -> `TObjArray`. Keeps multi-word primitive spellings
/// (`unsigned long long`) intact.
pub fn top_type_name(type_name: &str) -> &str {
    let trimmed = type_name.trim();
    let head = match trimmed.find('<') {
        Some(i) => &trimmed[..i],
        None => trimmed,
    };
    head.trim_end_matches('*').trim()
}

/// Extract the element type of a sequence-like template instantiation.
///
/// `vector<vector<int>>` -> `vector<int>`.
pub fn sequence_element_type(type_name: &str) -> Result<&str> {
    let inner = template_args(type_name)?;
    Ok(inner.trim())
}

/// Split a map-like template instantiation into key and value type names.
///
/// The split happens at the first comma at template depth 0:
/// `map<int, vector<pair<int,int>>>` -> (`int`, `vector<pair<int,int>>`).
pub fn map_key_val_types(type_name: &str) -> Result<(&str, &str)> {
    let inner = template_args(type_name)?;

    let mut depth = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                return Ok((inner[..i].trim(), inner[i + 1..].trim()));
            }
            _ => {}
        }
    }

    Err(DecodeError::schema(
        "",
        format!("map type '{type_name}' has no comma at template depth 0"),
    ))
}

/// Slice out the template-argument list of a type name.
fn template_args(type_name: &str) -> Result<&str> {
    let trimmed = type_name.trim();
    let open = trimmed.find('<');
    let close = trimmed.rfind('>');
    match (open, close) {
        (Some(o), Some(c)) if o < c => Ok(&trimmed[o + 1..c]),
        _ => Err(DecodeError::schema(
            "",
            format!("type '{type_name}' has no template arguments"),
        )),
    }
}

/// Check whether a type name declares a jagged trailing dimension.
pub fn is_jagged_type(type_name: &str) -> bool {
    type_name.trim_end().ends_with("[]")
}

/// Strip every trailing `[]` from a type name.
pub fn strip_array_suffix(type_name: &str) -> &str {
    let mut s = type_name.trim_end();
    while let Some(stripped) = s.strip_suffix("[]") {
        s = stripped.trim_end();
    }
    s
}

/// Strip cycle suffixes from an object path: `tree/branch;1` ->
/// `tree/branch`.
pub fn regularize_object_path(path: &str) -> String {
    static CYCLE: OnceLock<Regex> = OnceLock::new();
    let re = CYCLE.get_or_init(|| Regex::new(r";[0-9]+").expect("valid cycle pattern"));
    re.replace_all(path, "").into_owned()
}

/// Parse the dimension spec of a branch title.
///
/// `"hits[10][20]/I"` -> `([10, 20], false)`; a non-numeric index such as
/// `"hits[nhits]"` marks the branch jagged. Returns the fixed dimensions
/// and the jagged flag.
pub fn title_dims(title: &str) -> (Vec<usize>, bool) {
    static DIMS: OnceLock<Regex> = OnceLock::new();
    let re = DIMS.get_or_init(|| Regex::new(r"\[([^\[\]]*)\]").expect("valid dims pattern"));

    let mut dims = Vec::new();
    let mut jagged = false;
    for cap in re.captures_iter(title) {
        let token = &cap[1];
        match token.parse::<usize>() {
            Ok(n) => dims.push(n),
            Err(_) => jagged = true,
        }
    }
    (dims, jagged)
}

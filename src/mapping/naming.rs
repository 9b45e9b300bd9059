/// Conversion function name for a pair of (possibly package-qualified) types.
///
/// `derive_name("redirect", "lookup.RedirectStorage")` gives
/// `fromRedirectToLookupRedirectStorage`.
pub fn derive_name(from_type: &str, to_type: &str) -> String {
    format!("from{}To{}", title_type(from_type), title_type(to_type))
}

/// Title-case every dot-separated segment and join them without separator.
fn title_type(name: &str) -> String {
    name.split('.').map(title_case).collect()
}

fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

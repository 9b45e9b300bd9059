use serde::Serialize;

/// A source field copied into the destination field of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldCorrespondence {
    pub from: String,
    pub to: String,
}

/// Pair every `from` field with an identically named `to` field.
///
/// Output keeps the order of `from`; a repeated `from` name yields one entry
/// per occurrence. Field counts are small, so a linear scan of `to` is used.
pub fn match_fields<S: AsRef<str>>(from: &[S], to: &[S]) -> Vec<FieldCorrespondence> {
    from.iter()
        .map(AsRef::as_ref)
        .filter(|name| to.iter().any(|t| t.as_ref() == *name))
        .map(|name| FieldCorrespondence {
            from: name.to_string(),
            to: name.to_string(),
        })
        .collect()
}

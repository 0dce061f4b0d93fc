use itertools::Itertools;

// Invariant: should always begin with a '.' (dot)
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct FullyQualifiedName(String);

impl FullyQualifiedName {
    pub fn new(package_string: &str, type_path: &[impl AsRef<str>], type_name: &str) -> Self {
        Self(format!(
            "{}{}{}{}{}{}",
            if package_string.is_empty() { "" } else { "." },
            package_string.trim_matches('.'),
            if type_path.is_empty() { "" } else { "." },
            type_path
                .iter()
                .map(AsRef::as_ref)
                .map(|type_path_str| type_path_str.trim_start_matches('.'))
                .join("."),
            if type_name.is_empty() { "" } else { "." },
            type_name,
        ))
    }

    /// Normalizes a field or method `type_name`, which `protoc` always emits
    /// fully qualified, to the canonical leading-dot form.
    pub fn from_type_name(type_name: &str) -> Self {
        Self::new("", &[type_name], "")
    }
}

impl AsRef<str> for FullyQualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

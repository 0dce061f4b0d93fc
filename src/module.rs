use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[^/.]+$").unwrap());

/// A TypeScript module path derived from a `.proto` file path.
///
/// Components are POSIX path segments with the file extension stripped from
/// the last one, e.g. `google/protobuf/timestamp`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Module {
    components: Vec<String>,
}

impl Module {
    /// Construct a module path from a `.proto` file path, as found in
    /// `FileDescriptorProto::name` and `FileDescriptorProto::dependency`.
    pub fn from_proto_path(path: &str) -> Self {
        let mut components: Vec<String> = Vec::new();
        for part in EXTENSION.replace(path, "").split('/') {
            match part {
                "" | "." => {}
                ".." if components.last().map_or(false, |last| last != "..") => {
                    components.pop();
                }
                _ => components.push(part.to_owned()),
            }
        }
        Self { components }
    }

    /// An iterator over the parts of the path.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|s| s.as_str())
    }

    /// The directory part of the path.
    fn directory(&self) -> &[String] {
        match self.components.split_last() {
            Some((_, directory)) => directory,
            None => &[],
        }
    }

    /// Format the module path into a file name with the given extension.
    pub fn to_file_name(&self, extension: &str) -> String {
        let mut name = self.to_string();
        name.push_str(extension);
        name
    }

    /// The module specifier used by `importer` to import this module.
    ///
    /// This is the relative path from the importer's directory, prefixed with
    /// `./` unless it already climbs out with `..`.
    pub fn import_path_from(&self, importer: &Module) -> String {
        let from = importer.directory();
        let common = from
            .iter()
            .zip(self.directory())
            .take_while(|(a, b)| a == b)
            .count();

        let relative: Vec<&str> = std::iter::repeat("..")
            .take(from.len() - common)
            .chain(self.components[common..].iter().map(String::as_str))
            .collect();
        let relative = relative.join("/");

        if relative.starts_with('.') {
            relative
        } else {
            format!("./{}", relative)
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts = self.parts();
        if let Some(first) = parts.next() {
            f.write_str(first)?;
        }
        for part in parts {
            f.write_str("/")?;
            f.write_str(part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_proto_path() {
        let module = Module::from_proto_path("google/protobuf/timestamp.proto");
        assert_eq!(
            module.parts().collect::<Vec<_>>(),
            vec!["google", "protobuf", "timestamp"]
        );
        assert_eq!(Module::from_proto_path("./a/./b.proto").to_string(), "a/b");
        assert_eq!(Module::from_proto_path("a/../b.proto").to_string(), "b");
        assert_eq!(Module::from_proto_path("v1.2/api").to_string(), "v1.2/api");
    }

    #[test]
    fn test_to_file_name() {
        assert_eq!(
            Module::from_proto_path("test/_/no_namespace/double_nested.proto").to_file_name(".ts"),
            "test/_/no_namespace/double_nested.ts"
        );
        assert_eq!(Module::from_proto_path("plain").to_file_name(".ts"), "plain.ts");
    }

    #[test]
    fn test_import_path_from() {
        let case = |importer: &str, dependency: &str, expected: &str| {
            assert_eq!(
                Module::from_proto_path(dependency)
                    .import_path_from(&Module::from_proto_path(importer)),
                expected,
                "{} importing {}",
                importer,
                dependency
            );
        };

        case("a.proto", "b.proto", "./b");
        case("a/x.proto", "a/y.proto", "./y");
        case("a/x.proto", "a/b/y.proto", "./b/y");
        case("a/b/x.proto", "a/y.proto", "../y");
        case("a/b/x.proto", "c/d/y.proto", "../../c/d/y");
        case("x.proto", "google/protobuf/any.proto", "./google/protobuf/any");
        case("a/b/x.proto", "a.proto", "../../a");
    }
}

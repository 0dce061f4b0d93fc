//! Cross-file type registry and the per-file dependency alias scope.

use std::collections::{BTreeMap, HashMap};

use log::trace;
use prost_types::field_descriptor_proto::Type;
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::{Error, FullyQualifiedName, Result};

/// What a registered type name points at.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Message,
    /// A synthetic `map<K, V>` entry message.
    MapEntry {
        key: FieldDescriptorProto,
        value: FieldDescriptorProto,
    },
    Enum {
        /// Name of the first declared value, if that value is zero.
        zero_value: Option<String>,
    },
}

/// A resolved message or enum, with everything needed to reference it from
/// another file.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    pub name: FullyQualifiedName,
    /// The `.proto` file declaring the type.
    pub file: String,
    pub package: String,
    /// Enclosing message names followed by the type's own name.
    pub type_path: Vec<String>,
    pub kind: TypeKind,
}

/// Maps every fully-qualified type name in a request to its declaration.
///
/// The table is filled by a pre-pass over all files with [`register`] before
/// any code is generated, so that forward references and references into
/// files later in the request resolve. It is read-only afterwards.
///
/// [`register`]: TypeResolver::register
#[derive(Debug, Default)]
pub struct TypeResolver {
    types: HashMap<FullyQualifiedName, TypeReference>,
    /// Files re-exported by each file through `import public`.
    public_dependencies: HashMap<String, Vec<String>>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records all enums and messages of `file`, recursing into nested types.
    pub fn register(&mut self, file: &FileDescriptorProto) -> Result<()> {
        let file_name = file.name();
        let package = file.package();
        let root: [&str; 0] = [];

        let public = file
            .public_dependency
            .iter()
            .filter_map(|&index| file.dependency.get(usize::try_from(index).ok()?))
            .cloned()
            .collect::<Vec<_>>();
        if !public.is_empty() {
            trace!("public imports of {:?}: {:?}", file_name, public);
            self.public_dependencies.insert(file_name.to_owned(), public);
        }

        for desc in &file.enum_type {
            self.register_enum(file_name, package, &root, desc);
        }
        for message in &file.message_type {
            self.register_message(file_name, package, &root, message)?;
        }

        Ok(())
    }

    fn register_enum(
        &mut self,
        file_name: &str,
        package: &str,
        type_path: &[impl AsRef<str>],
        desc: &EnumDescriptorProto,
    ) {
        let zero_value = desc
            .value
            .first()
            .filter(|value| value.number() == 0)
            .map(|value| value.name().to_owned());
        self.insert(
            file_name,
            package,
            type_path,
            desc.name(),
            TypeKind::Enum { zero_value },
        );
    }

    fn register_message(
        &mut self,
        file_name: &str,
        package: &str,
        type_path: &[impl AsRef<str>],
        message: &DescriptorProto,
    ) -> Result<()> {
        let is_map_entry = message
            .options
            .as_ref()
            .map_or(false, |options| options.map_entry());

        let kind = if is_map_entry {
            let fq_name = FullyQualifiedName::new(package, type_path, message.name());
            map_entry_kind(&fq_name, message)?
        } else {
            TypeKind::Message
        };
        self.insert(file_name, package, type_path, message.name(), kind);

        let mut nested_path: Vec<String> =
            type_path.iter().map(|s| s.as_ref().to_owned()).collect();
        nested_path.push(message.name().to_owned());

        for desc in &message.enum_type {
            self.register_enum(file_name, package, &nested_path, desc);
        }
        for nested in &message.nested_type {
            self.register_message(file_name, package, &nested_path, nested)?;
        }

        Ok(())
    }

    fn insert(
        &mut self,
        file_name: &str,
        package: &str,
        type_path: &[impl AsRef<str>],
        type_name: &str,
        kind: TypeKind,
    ) {
        let name = FullyQualifiedName::new(package, type_path, type_name);
        trace!("register: {:?} in {:?}", name, file_name);

        let mut path: Vec<String> = type_path.iter().map(|s| s.as_ref().to_owned()).collect();
        path.push(type_name.to_owned());

        self.types.insert(
            name.clone(),
            TypeReference {
                name,
                file: file_name.to_owned(),
                package: package.to_owned(),
                type_path: path,
                kind,
            },
        );
    }

    /// Looks up a type name, as found in `FieldDescriptorProto::type_name` or
    /// `MethodDescriptorProto::input_type`, referenced from `from_file`.
    pub fn resolve(&self, type_name: &str, from_file: &str) -> Result<&TypeReference> {
        self.types
            .get(&FullyQualifiedName::from_type_name(type_name))
            .ok_or_else(|| Error::UnresolvedType {
                type_name: type_name.to_owned(),
                file: from_file.to_owned(),
            })
    }

    /// Files that `file` re-exports with `import public`, in import order.
    pub fn public_dependencies(&self, file: &str) -> &[String] {
        self.public_dependencies
            .get(file)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn map_entry_kind(fq_name: &FullyQualifiedName, message: &DescriptorProto) -> Result<TypeKind> {
    let malformed = || Error::MalformedMapEntry(fq_name.as_ref().to_owned());
    match &message.field[..] {
        [key, value] if key.name() == "key" && value.name() == "value" => {
            if matches!(key.r#type(), Type::Message | Type::Group | Type::Enum) {
                return Err(malformed());
            }
            Ok(TypeKind::MapEntry {
                key: key.clone(),
                value: value.clone(),
            })
        }
        _ => Err(malformed()),
    }
}

/// Identifiers scoped to the generation of a single output file: the alias
/// bound to each imported dependency and the counters behind unique names
/// such as `pb_1` or `dependency_2`.
///
/// Identifiers are only unique within one file, so the map must be emptied
/// with [`reset_dependency_map`] after each file is emitted.
///
/// [`reset_dependency_map`]: DependencyAliasMap::reset_dependency_map
#[derive(Debug, Default)]
pub struct DependencyAliasMap {
    identifiers: BTreeMap<String, String>,
    counters: HashMap<String, u32>,
}

impl DependencyAliasMap {
    /// Returns `base_N`, where `N` counts the names requested for `base` in
    /// the current file.
    pub fn unique_name(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_owned()).or_insert(0);
        *counter += 1;
        format!("{}_{}", base, counter)
    }

    pub fn set_identifier_for_dependency(&mut self, dependency: &str, identifier: String) {
        self.identifiers.insert(dependency.to_owned(), identifier);
    }

    pub fn identifier_for(&self, dependency: &str) -> Option<&str> {
        self.identifiers.get(dependency).map(String::as_str)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.identifiers.keys().map(String::as_str)
    }

    pub fn reset_dependency_map(&mut self) {
        self.identifiers.clear();
        self.counters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty() && self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use prost_types::field_descriptor_proto::Label;
    use prost_types::{EnumValueDescriptorProto, MessageOptions};

    use super::*;

    fn field(name: &str, number: i32, r#type: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_owned()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(r#type as i32),
            ..Default::default()
        }
    }

    fn file(name: &str, package: &str, messages: Vec<DescriptorProto>) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(name.to_owned()),
            package: Some(package.to_owned()),
            message_type: messages,
            ..Default::default()
        }
    }

    fn message(name: &str) -> DescriptorProto {
        DescriptorProto {
            name: Some(name.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_nested_types() {
        let mut outer = message("Outer");
        outer.nested_type.push(message("Inner"));
        outer.enum_type.push(EnumDescriptorProto {
            name: Some("Kind".to_owned()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("KIND_UNSPECIFIED".to_owned()),
                    number: Some(0),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("KIND_A".to_owned()),
                    number: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        let mut resolver = TypeResolver::new();
        resolver
            .register(&file("a/outer.proto", "foo.bar", vec![outer]))
            .unwrap();
        assert_eq!(resolver.len(), 3);

        let inner = resolver.resolve(".foo.bar.Outer.Inner", "x.proto").unwrap();
        assert_eq!(inner.file, "a/outer.proto");
        assert_eq!(inner.package, "foo.bar");
        assert_eq!(inner.type_path, vec!["Outer", "Inner"]);
        assert_eq!(inner.kind, TypeKind::Message);

        let kind = resolver.resolve(".foo.bar.Outer.Kind", "x.proto").unwrap();
        assert_eq!(
            kind.kind,
            TypeKind::Enum {
                zero_value: Some("KIND_UNSPECIFIED".to_owned())
            }
        );
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let mut user = message("User");
        user.field.push(FieldDescriptorProto {
            type_name: Some(".common.Id".to_owned()),
            ..field("id", 1, Type::Message)
        });
        let files = vec![
            file("user.proto", "users", vec![user]),
            file("common.proto", "common", vec![message("Id")]),
        ];

        let mut resolver = TypeResolver::new();
        for file in files.iter().rev() {
            resolver.register(file).unwrap();
        }
        assert!(resolver.resolve(".common.Id", "user.proto").is_ok());

        let mut resolver = TypeResolver::new();
        for file in &files {
            resolver.register(file).unwrap();
        }
        let reference = resolver.resolve(".common.Id", "user.proto").unwrap();
        assert_eq!(reference.file, "common.proto");
    }

    #[test]
    fn test_unresolved_type() {
        let resolver = TypeResolver::new();
        assert_eq!(
            resolver.resolve(".missing.Type", "a.proto").unwrap_err(),
            Error::UnresolvedType {
                type_name: ".missing.Type".to_owned(),
                file: "a.proto".to_owned(),
            }
        );
    }

    #[test]
    fn test_map_entry() {
        let mut entry = message("LabelsEntry");
        entry.options = Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        });
        entry.field = vec![field("key", 1, Type::String), field("value", 2, Type::Int32)];
        let mut owner = message("Owner");
        owner.nested_type.push(entry);

        let mut resolver = TypeResolver::new();
        resolver.register(&file("m.proto", "", vec![owner])).unwrap();
        let reference = resolver.resolve(".Owner.LabelsEntry", "m.proto").unwrap();
        assert!(matches!(reference.kind, TypeKind::MapEntry { .. }));
    }

    #[test]
    fn test_malformed_map_entry() {
        let mut entry = message("BadEntry");
        entry.options = Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        });
        entry.field = vec![field("key", 1, Type::String)];

        let mut resolver = TypeResolver::new();
        assert_eq!(
            resolver.register(&file("m.proto", "pkg", vec![entry])),
            Err(Error::MalformedMapEntry(".pkg.BadEntry".to_owned()))
        );
    }

    #[test]
    fn test_public_dependencies() {
        let mut reexporter = file("b.proto", "pkg", vec![]);
        reexporter.dependency = vec!["a.proto".to_owned(), "c.proto".to_owned()];
        reexporter.public_dependency = vec![1, 7];

        let mut resolver = TypeResolver::new();
        resolver.register(&reexporter).unwrap();
        resolver.register(&file("c.proto", "pkg", vec![message("C")])).unwrap();

        assert_eq!(resolver.public_dependencies("b.proto"), ["c.proto".to_owned()]);
        assert!(resolver.public_dependencies("c.proto").is_empty());
        assert!(resolver.public_dependencies("unknown.proto").is_empty());
    }

    #[test]
    fn test_dependency_alias_map() {
        let mut aliases = DependencyAliasMap::default();
        assert_eq!(aliases.unique_name("pb"), "pb_1");
        assert_eq!(aliases.unique_name("dependency"), "dependency_1");
        assert_eq!(aliases.unique_name("dependency"), "dependency_2");

        aliases.set_identifier_for_dependency("a.proto", "dependency_1".to_owned());
        assert_eq!(aliases.identifier_for("a.proto"), Some("dependency_1"));
        assert_eq!(aliases.identifier_for("b.proto"), None);

        aliases.reset_dependency_map();
        assert!(aliases.is_empty());
        assert_eq!(aliases.dependencies().count(), 0);
        assert_eq!(aliases.unique_name("dependency"), "dependency_1");
    }
}

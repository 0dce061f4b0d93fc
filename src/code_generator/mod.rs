use std::collections::VecDeque;

use itertools::{Either, Itertools};
use log::{debug, trace};
use multimap::MultiMap;
use prost_types::compiler::Version;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    OneofDescriptorProto, ServiceDescriptorProto,
};

use crate::ast::{Declaration, Import, Namespace, SourceFile};
use crate::ident::to_flat_ident;
use crate::module::Module;
use crate::type_resolver::{DependencyAliasMap, TypeReference, TypeResolver};
use crate::{Config, Error, Result};

mod enums;
mod messages;
mod services;

mod syntax;
use syntax::Syntax;

const RUNTIME_PACKAGE: &str = "google-protobuf";
const GRPC_WEB_PACKAGE: &str = "grpc-web";
const EXTENSION: &str = ".ts";

/// Generates the declaration tree of a single `.proto` file.
pub struct CodeGenerator<'a> {
    config: &'a Config,
    resolver: &'a TypeResolver,
    aliases: &'a mut DependencyAliasMap,
    file: &'a FileDescriptorProto,
    package: String,
    syntax: Syntax,
    /// Names of the messages enclosing the declaration being lowered.
    type_path: Vec<String>,
    /// Identifier of the `google-protobuf` import.
    runtime: String,
}

impl<'a> CodeGenerator<'a> {
    pub fn generate(
        config: &'a Config,
        resolver: &'a TypeResolver,
        aliases: &'a mut DependencyAliasMap,
        file: &'a FileDescriptorProto,
        compiler_version: &Version,
    ) -> Result<SourceFile> {
        let runtime = aliases.unique_name("pb");
        let grpc = aliases.unique_name("grpc");
        let grpc_web = aliases.unique_name("grpc_web");

        let mut code_gen = CodeGenerator {
            config,
            resolver,
            aliases,
            file,
            package: file.package().to_owned(),
            syntax: file.syntax.as_deref().into(),
            type_path: Vec::new(),
            runtime,
        };

        debug!(
            "file: {:?}, package: {:?}",
            file.name(),
            code_gen.package
        );

        let module = Module::from_proto_path(file.name());
        let mut imports = code_gen.import_dependencies(&module);

        let mut body = Vec::new();
        for desc in &file.enum_type {
            body.push(Declaration::Enum(code_gen.lower_enum(desc)));
        }
        for message in &file.message_type {
            body.extend(code_gen.lower_message(message, config.no_namespace)?);
        }

        if !body.is_empty() {
            imports.push(Import {
                identifier: code_gen.runtime.clone(),
                module: RUNTIME_PACKAGE.to_owned(),
            });
        }

        if !config.no_grpc && !file.service.is_empty() {
            imports.push(Import {
                identifier: grpc.clone(),
                module: config.grpc_package.clone(),
            });
            if config.target == crate::Target::Web {
                imports.push(Import {
                    identifier: grpc_web.clone(),
                    module: GRPC_WEB_PACKAGE.to_owned(),
                });
            }
            body.extend(code_gen.lower_services(&grpc, &grpc_web)?);
        }

        if !code_gen.package.is_empty() && !config.no_namespace {
            body = vec![Declaration::Namespace(Namespace {
                name: code_gen.package.clone(),
                body,
            })];
        }

        Ok(SourceFile {
            name: module.to_file_name(EXTENSION),
            header: code_gen.header(compiler_version),
            imports,
            body,
        })
    }

    /// Binds a unique identifier to every dependency and imports it by its
    /// path relative to the current file.
    ///
    /// Files re-exported by a dependency through `import public` are imported
    /// as well, after the direct dependencies.
    fn import_dependencies(&mut self, module: &Module) -> Vec<Import> {
        let file = self.file;
        let resolver = self.resolver;

        let mut pending: VecDeque<&str> = file.dependency.iter().map(String::as_str).collect();
        let mut imports = Vec::with_capacity(pending.len());
        while let Some(dependency) = pending.pop_front() {
            if dependency == file.name() || self.aliases.identifier_for(dependency).is_some() {
                continue;
            }

            let identifier = self.aliases.unique_name("dependency");
            self.aliases
                .set_identifier_for_dependency(dependency, identifier.clone());
            imports.push(Import {
                identifier,
                module: Module::from_proto_path(dependency).import_path_from(module),
            });

            pending.extend(
                resolver
                    .public_dependencies(dependency)
                    .iter()
                    .map(String::as_str),
            );
        }
        imports
    }

    fn header(&self, compiler_version: &Version) -> Vec<String> {
        let mut header = vec![
            "Generated by the protoc-gen-ts.  DO NOT EDIT!".to_owned(),
            format!(
                "compiler version: {}.{}.{}",
                compiler_version.major(),
                compiler_version.minor(),
                compiler_version.patch()
            ),
            format!("source: {}", self.file.name()),
            format!("git: {}", env!("CARGO_PKG_REPOSITORY")),
        ];
        if self
            .file
            .options
            .as_ref()
            .map_or(false, |options| options.deprecated())
        {
            header.push("@deprecated".to_owned());
        }
        header
    }

    fn resolve(&self, type_name: &str) -> Result<&'a TypeReference> {
        self.resolver.resolve(type_name, self.file.name())
    }

    /// The TypeScript expression naming a resolved type from the current file.
    fn type_expression(&self, reference: &TypeReference) -> Result<String> {
        let local = if self.config.no_namespace {
            to_flat_ident(&reference.type_path)
        } else {
            reference.type_path.iter().join(".")
        };

        if reference.file == self.file.name() {
            return Ok(local);
        }

        let alias = self
            .aliases
            .identifier_for(&reference.file)
            .ok_or_else(|| Error::MissingDependency {
                file: self.file.name().to_owned(),
                dependency: reference.file.clone(),
            })?;

        if self.config.no_namespace || reference.package.is_empty() {
            Ok(format!("{}.{}", alias, local))
        } else {
            Ok(format!("{}.{}.{}", alias, reference.package, local))
        }
    }

    /// The class or enum name of a declaration inside the current type path.
    fn declaration_name(&self, name: &str, flatten: bool) -> String {
        if flatten && !self.type_path.is_empty() {
            let mut path = self.type_path.clone();
            path.push(name.to_owned());
            to_flat_ident(&path)
        } else {
            name.to_owned()
        }
    }
}

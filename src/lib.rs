//! `protoc-gen-ts` is a `protoc` plugin that turns `.proto` files into
//! TypeScript modules built on the `google-protobuf` runtime, with optional
//! gRPC stubs for `@grpc/grpc-js` or `grpc-web`.
//!
//! ## Example
//!
//! ```bash
//! $ protoc --plugin=protoc-gen-ts=target/release/protoc-gen-ts \
//!     --ts_out=src/generated \
//!     --ts_opt=target=web,unary_rpc_promise \
//!     -I protos protos/helloworld.proto
//! ```
//!
//! For every file in the request the plugin writes a `.ts` file next to the
//! source path, containing:
//!
//! - an `enum` per protobuf enum,
//! - a class per message, extending `pb.Message` with typed accessors,
//!   `fromObject` / `toObject` and `serialize` / `deserialize`,
//! - for each service, an `Unimplemented<Service>Service` server stub and a
//!   `<Service>Client` for the configured target.
//!
//! ## Options
//!
//! Options are passed with `--ts_opt` as comma separated `key` or `key=value`
//! tokens:
//!
//! | Option | Effect |
//! |---|---|
//! | `target=node\|web` | client flavor, `node` by default |
//! | `grpc_package=<name>` | grpc runtime module, `@grpc/grpc-js` by default |
//! | `no_namespace` | do not wrap files in a package namespace and flatten nested types |
//! | `no_grpc` | skip service generation |
//! | `unary_rpc_promise` | node clients return promises for unary calls |
//! | `json_names` | use proto3 JSON names in `fromObject` / `toObject` |
//! | `explicit_override` | mark overridden `Message` methods with `override` |
//! | `ts_version=<major.minor>` | TypeScript version the output targets, `5.0` by default |
//!
//! Unknown options are an error.
//!
//! The library can also be driven directly:
//!
//! ```rust,no_run
//! use prost_types::compiler::CodeGeneratorRequest;
//!
//! # fn read_request() -> CodeGeneratorRequest { unimplemented!() }
//! let request: CodeGeneratorRequest = read_request();
//! let response = protoc_gen_ts::run_plugin(request);
//! assert!(response.error.is_none());
//! ```

use log::{debug, error, info};
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

pub mod ast;
mod code_generator;
mod error;
mod fully_qualified_name;
mod ident;
mod module;
mod options;
mod printer;
mod type_resolver;

use crate::code_generator::CodeGenerator;
pub use crate::error::{Error, Result};
use crate::fully_qualified_name::FullyQualifiedName;
pub use crate::options::{Target, TypeScriptVersion};
pub use crate::printer::print;
pub use crate::type_resolver::{DependencyAliasMap, TypeKind, TypeReference, TypeResolver};

/// Configuration options for TypeScript code generation.
///
/// This configuration builder can be used to set non-default code generation
/// options, or parsed from the plugin parameter with
/// [`Config::from_parameter`].
#[derive(Debug, Clone)]
pub struct Config {
    target: Target,
    grpc_package: String,
    no_namespace: bool,
    no_grpc: bool,
    unary_rpc_promise: bool,
    json_names: bool,
    explicit_override: bool,
    ts_version: TypeScriptVersion,
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Config {
        Config::default()
    }

    /// Selects the RPC client flavor generated for every service.
    pub fn target(&mut self, target: Target) -> &mut Self {
        self.target = target;
        self
    }

    /// Module the node flavor's grpc runtime is imported from.
    pub fn grpc_package<S>(&mut self, package: S) -> &mut Self
    where
        S: Into<String>,
    {
        self.grpc_package = package.into();
        self
    }

    /// Emits declarations at the top level instead of inside a namespace named
    /// after the proto package, and hoists nested types next to their parent
    /// as `Parent_Child`.
    pub fn no_namespace(&mut self, enabled: bool) -> &mut Self {
        self.no_namespace = enabled;
        self
    }

    /// Skips server and client generation for services.
    pub fn no_grpc(&mut self, enabled: bool) -> &mut Self {
        self.no_grpc = enabled;
        self
    }

    /// Makes unary methods of node clients return a `Promise`.
    pub fn unary_rpc_promise(&mut self, enabled: bool) -> &mut Self {
        self.unary_rpc_promise = enabled;
        self
    }

    /// Uses the proto3 JSON names of fields as keys in plain objects.
    pub fn json_names(&mut self, enabled: bool) -> &mut Self {
        self.json_names = enabled;
        self
    }

    /// Emits the `override` modifier on methods overriding the runtime's
    /// `Message` methods, for projects compiled with `noImplicitOverride`.
    pub fn explicit_override(&mut self, enabled: bool) -> &mut Self {
        self.explicit_override = enabled;
        self
    }

    /// The TypeScript version the generated code is compiled with.
    pub fn ts_version(&mut self, version: TypeScriptVersion) -> &mut Self {
        self.ts_version = version;
        self
    }

    /// Runs the generator on a decoded request and builds the response,
    /// carrying either the generated files or a single error.
    pub fn run_plugin(&self, request: CodeGeneratorRequest) -> CodeGeneratorResponse {
        into_response(self.generate(&request))
    }

    /// Generates one TypeScript file per file in the request.
    ///
    /// All type names of the request are registered before the first file is
    /// generated. Any error aborts the whole run.
    pub fn generate(&self, request: &CodeGeneratorRequest) -> Result<Vec<File>> {
        if !self.ts_version.is_supported() {
            return Err(Error::UnsupportedTypeScript {
                minimum: TypeScriptVersion::MINIMUM,
                found: self.ts_version,
            });
        }

        let mut resolver = TypeResolver::new();
        for file in &request.proto_file {
            resolver.register(file)?;
        }
        debug!(
            "registered {} types from {} files",
            resolver.len(),
            request.proto_file.len()
        );

        let compiler_version = request.compiler_version.clone().unwrap_or_default();
        let mut aliases = DependencyAliasMap::default();
        let mut files = Vec::with_capacity(request.proto_file.len());

        for file in &request.proto_file {
            let source = CodeGenerator::generate(
                self,
                &resolver,
                &mut aliases,
                file,
                &compiler_version,
            )?;
            info!("generated {}", source.name);
            files.push(File {
                content: Some(print(&source)),
                name: Some(source.name),
                ..Default::default()
            });

            // Identifiers are only unique within one file.
            aliases.reset_dependency_map();
        }

        Ok(files)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            target: Target::default(),
            grpc_package: "@grpc/grpc-js".to_owned(),
            no_namespace: false,
            no_grpc: false,
            unary_rpc_promise: false,
            json_names: false,
            explicit_override: false,
            ts_version: TypeScriptVersion::default(),
        }
    }
}

/// Parses the request's parameter string and runs the generator.
///
/// Configuration errors are reported through the response like any other
/// error.
pub fn run_plugin(request: CodeGeneratorRequest) -> CodeGeneratorResponse {
    match Config::from_parameter(request.parameter()) {
        Ok(config) => config.run_plugin(request),
        Err(error) => into_response(Err(error)),
    }
}

fn into_response(result: Result<Vec<File>>) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };
    match result {
        Ok(files) => response.file = files,
        Err(err) => {
            error!("{}", err);
            response.error = Some(err.to_string());
        }
    }
    response
}

#[cfg(test)]
mod test_helpers;

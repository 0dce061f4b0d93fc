//! The declaration tree produced for each `.proto` file.
//!
//! The code generator lowers descriptors into these nodes and the printer
//! renders them as TypeScript. Type references inside the tree are already
//! resolved to TypeScript type expressions (`dependency_1.foo.Bar`).

use crate::Target;

/// One generated TypeScript file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Output path, relative to the `--ts_out` directory.
    pub name: String,
    /// Lines of the leading banner comment.
    pub header: Vec<String>,
    pub imports: Vec<Import>,
    pub body: Vec<Declaration>,
}

/// `import * as <identifier> from "<module>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub identifier: String,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Enum(EnumDeclaration),
    Message(MessageDeclaration),
    Namespace(Namespace),
    RpcInterfaces(RpcInterfaces),
    UnimplementedServer(ServerDeclaration),
    Client(ClientDeclaration),
}

/// `export namespace <name> { ... }`; the name may be dotted (`foo.bar`).
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub body: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDeclaration {
    pub name: String,
    /// Values in declaration order, aliases included.
    pub values: Vec<EnumValue>,
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

/// A message class.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDeclaration {
    /// The TypeScript class name.
    pub name: String,
    /// Identifier the `google-protobuf` runtime is imported as.
    pub runtime: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDeclaration>,
    pub oneofs: Vec<OneofDeclaration>,
    /// Nested enums and messages, printed in a namespace named after the class.
    /// Empty when nested types are flattened.
    pub nested: Vec<Declaration>,
    pub deserialize: DeserializeMethod,
    pub deprecated: bool,
    /// Mark methods inherited from `Message` with `override`.
    pub explicit_override: bool,
}

impl MessageDeclaration {
    pub fn field(&self, number: i32) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|field| field.number == number)
    }

    /// Position of a oneof in `oneofs`, which is also its slot in the
    /// runtime's oneof groups.
    pub fn oneof_position(&self, oneof_index: i32) -> Option<usize> {
        self.oneofs
            .iter()
            .position(|oneof| oneof.index == oneof_index)
    }

    /// Field numbers of repeated (non-map) fields.
    pub fn repeated_fields(&self) -> Vec<i32> {
        self.fields
            .iter()
            .filter(|field| field.cardinality == Cardinality::Repeated)
            .map(|field| field.number)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    /// Property name; the field name as written in the `.proto` file.
    pub name: String,
    /// Key used by `fromObject` / `toObject`.
    pub object_key: String,
    pub number: i32,
    pub field_type: FieldType,
    pub cardinality: Cardinality,
    /// Index into the message's `oneof_decl`, for members of a real oneof.
    pub oneof_index: Option<i32>,
    /// TypeScript expression of the value read when the field is unset.
    pub default_value: String,
    pub packed: bool,
    pub deprecated: bool,
}

impl FieldDeclaration {
    /// Whether a `has_<name>` presence accessor is generated.
    pub fn has_presence(&self) -> bool {
        self.cardinality == Cardinality::Optional
            || self.oneof_index.is_some()
            || (self.cardinality == Cardinality::Singular
                && matches!(self.field_type, FieldType::Message(_)))
    }

    pub fn is_map(&self) -> bool {
        matches!(self.field_type, FieldType::Map { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Implicit presence: unset reads as the default value.
    Singular,
    /// Explicit presence (`optional`, proto2 fields).
    Optional,
    Repeated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar(Scalar),
    Enum(String),
    Message(String),
    Map {
        key: Scalar,
        value: Box<FieldType>,
    },
}

impl FieldType {
    /// The TypeScript type of a single value.
    pub fn ts_type(&self) -> String {
        match self {
            FieldType::Scalar(scalar) => scalar.ts_type().to_owned(),
            FieldType::Enum(name) | FieldType::Message(name) => name.clone(),
            FieldType::Map { key, value } => format!("Map<{}, {}>", key.ts_type(), value.ts_type()),
        }
    }

    /// Suffix of the `BinaryWriter.write*` / `BinaryReader.read*` methods.
    pub fn wire_method(&self) -> &'static str {
        match self {
            FieldType::Scalar(scalar) => scalar.wire_method(),
            FieldType::Enum(_) => "Enum",
            FieldType::Message(_) | FieldType::Map { .. } => "Message",
        }
    }
}

/// Protobuf scalar value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Bytes,
    Uint32,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl Scalar {
    pub fn ts_type(&self) -> &'static str {
        match self {
            Scalar::Bool => "boolean",
            Scalar::String => "string",
            Scalar::Bytes => "Uint8Array",
            _ => "number",
        }
    }

    pub fn wire_method(&self) -> &'static str {
        match self {
            Scalar::Double => "Double",
            Scalar::Float => "Float",
            Scalar::Int64 => "Int64",
            Scalar::Uint64 => "Uint64",
            Scalar::Int32 => "Int32",
            Scalar::Fixed64 => "Fixed64",
            Scalar::Fixed32 => "Fixed32",
            Scalar::Bool => "Bool",
            Scalar::String => "String",
            Scalar::Bytes => "Bytes",
            Scalar::Uint32 => "Uint32",
            Scalar::Sfixed32 => "Sfixed32",
            Scalar::Sfixed64 => "Sfixed64",
            Scalar::Sint32 => "Sint32",
            Scalar::Sint64 => "Sint64",
        }
    }

    pub fn zero_value(&self) -> &'static str {
        match self {
            Scalar::Bool => "false",
            Scalar::String => "\"\"",
            Scalar::Bytes => "new Uint8Array(0)",
            _ => "0",
        }
    }

    /// Whether repeated fields of this type may use packed encoding.
    pub fn is_packable(&self) -> bool {
        !matches!(self, Scalar::String | Scalar::Bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneofDeclaration {
    pub name: String,
    /// Index of the oneof in the message's `oneof_decl`.
    pub index: i32,
    /// Member field numbers, in declaration order.
    pub members: Vec<i32>,
}

/// The `deserialize` method: one `case` per known field number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeMethod {
    pub arms: Vec<i32>,
    pub unknown_fields: UnknownFieldPolicy,
}

/// What generated code does with a field number it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// `reader.skipField()` and keep reading.
    Skip,
}

/// The generic call-shape interfaces shared by every client in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcInterfaces {
    pub target: Target,
    /// Identifier of the RPC runtime the interfaces are written against.
    pub runtime: String,
}

/// A service as seen by the stub generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// The service name as it appears in the `.proto` file.
    pub name: String,
    pub methods: Vec<Method>,
    pub deprecated: bool,
}

/// A service method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// The name of the method as it appears in the `.proto` file.
    pub name: String,
    /// The HTTP/2 path, `/<package>.<Service>/<Method>`.
    pub path: String,
    /// The input TypeScript type.
    pub input_type: String,
    /// The output TypeScript type.
    pub output_type: String,
    /// Identifies if client streams multiple client messages.
    pub client_streaming: bool,
    /// Identifies if server streams multiple server messages.
    pub server_streaming: bool,
    pub deprecated: bool,
}

/// `Unimplemented<Service>Service`: the service definition table plus one
/// handler per method answering `UNIMPLEMENTED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDeclaration {
    pub name: String,
    /// Identifier the grpc runtime is imported as.
    pub runtime: String,
    pub service: Service,
}

/// `<Service>Client`, shaped by the run's target flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDeclaration {
    pub name: String,
    pub target: Target,
    /// Identifier of the flavor's RPC runtime (`grpc_1` or `grpc_web_1`).
    pub runtime: String,
    /// Name of the server declaration whose definition table node clients
    /// are built from.
    pub server: String,
    pub service: Service,
    /// Unary node methods return promises instead of taking callbacks.
    pub unary_promise: bool,
}

//! Renders the declaration tree as TypeScript source.
//!
//! The output follows the layout of the TypeScript compiler's printer: four
//! space indentation, single statement bodies of `if` on their own indented
//! line, and no blank lines between members.

use itertools::Itertools;

use crate::ast::{
    Cardinality, ClientDeclaration, Declaration, EnumDeclaration, FieldDeclaration, FieldType,
    Method, MessageDeclaration, OneofDeclaration, RpcInterfaces, Scalar, ServerDeclaration,
    SourceFile,
};
use crate::ident::to_string_literal;
use crate::Target;

const INDENT: &str = "    ";

/// Prints a generated file.
pub fn print(source: &SourceFile) -> String {
    let mut printer = Printer::default();
    printer.header(&source.header);
    for import in &source.imports {
        printer.line(format!(
            "import * as {} from {};",
            import.identifier,
            to_string_literal(&import.module)
        ));
    }
    for declaration in &source.body {
        printer.declaration(declaration);
    }
    printer.buf
}

#[derive(Default)]
struct Printer {
    buf: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(line);
        }
        self.buf.push('\n');
    }

    /// Prints `line` and indents what follows.
    fn open(&mut self, line: impl AsRef<str>) {
        self.line(line);
        self.depth += 1;
    }

    /// Dedents and prints `line`.
    fn close(&mut self, line: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(line);
    }

    /// Prints `line` one level out, e.g. `}) {` between a parameter type
    /// and a body.
    fn reopen(&mut self, line: impl AsRef<str>) {
        self.close(line);
        self.depth += 1;
    }

    /// `if (condition)` with the statement on the next line.
    fn guarded(&mut self, condition: impl AsRef<str>, statement: impl AsRef<str>) {
        self.line(format!("if ({})", condition.as_ref()));
        self.depth += 1;
        self.line(statement);
        self.depth -= 1;
    }

    fn deprecated(&mut self, deprecated: bool) {
        if deprecated {
            self.line("/** @deprecated */");
        }
    }

    fn header(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.line("/**");
        let last = lines.len() - 1;
        for (idx, line) in lines.iter().enumerate() {
            if idx == last {
                self.line(format!(" * {} */", line));
            } else {
                self.line(format!(" * {}", line));
            }
        }
    }

    fn declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Enum(desc) => self.enumeration(desc),
            Declaration::Message(message) => self.message(message),
            Declaration::Namespace(namespace) => {
                self.open(format!("export namespace {} {{", namespace.name));
                for declaration in &namespace.body {
                    self.declaration(declaration);
                }
                self.close("}");
            }
            Declaration::RpcInterfaces(interfaces) => self.rpc_interfaces(interfaces),
            Declaration::UnimplementedServer(server) => self.server(server),
            Declaration::Client(client) => match client.target {
                Target::Node => self.node_client(client),
                Target::Web => self.web_client(client),
            },
        }
    }

    fn enumeration(&mut self, desc: &EnumDeclaration) {
        self.deprecated(desc.deprecated);
        self.open(format!("export enum {} {{", desc.name));
        let last = desc.values.len().saturating_sub(1);
        for (idx, value) in desc.values.iter().enumerate() {
            let separator = if idx == last { "" } else { "," };
            self.line(format!("{} = {}{}", value.name, value.number, separator));
        }
        self.close("}");
    }
}

/// The TypeScript type of a field's property.
fn property_type(field: &FieldDeclaration) -> String {
    match field.cardinality {
        Cardinality::Repeated => format!("{}[]", field.field_type.ts_type()),
        _ => field.field_type.ts_type(),
    }
}

/// The type of a field in the plain object form of a message.
fn object_type(field: &FieldDeclaration) -> String {
    fn value_type(field_type: &FieldType) -> String {
        match field_type {
            FieldType::Message(name) => format!("ReturnType<typeof {}.prototype.toObject>", name),
            FieldType::Map { value, .. } => {
                format!("{{ [key: string]: {} }}", value_type(value))
            }
            other => other.ts_type(),
        }
    }

    match field.cardinality {
        Cardinality::Repeated => format!("{}[]", value_type(&field.field_type)),
        _ => value_type(&field.field_type),
    }
}

fn override_modifier(message: &MessageDeclaration) -> &'static str {
    if message.explicit_override {
        "override "
    } else {
        ""
    }
}

// Messages
impl Printer {
    fn message(&mut self, message: &MessageDeclaration) {
        self.deprecated(message.deprecated);
        self.open(format!(
            "export class {} extends {}.Message {{",
            message.name, message.runtime
        ));
        let oneof_decls = message
            .oneofs
            .iter()
            .map(|oneof| format!("[{}]", oneof.members.iter().join(", ")))
            .join(", ");
        self.line(format!("#one_of_decls: number[][] = [{}];", oneof_decls));

        self.constructor(message);
        for field in &message.fields {
            self.accessors(message, field);
        }
        for oneof in &message.oneofs {
            self.oneof_case(message, oneof);
        }
        self.from_object(message);
        self.to_object(message);
        self.serialize(message);
        self.deserialize(message);
        self.binary_methods(message);
        self.close("}");

        if !message.nested.is_empty() {
            self.open(format!("export namespace {} {{", message.name));
            for declaration in &message.nested {
                self.declaration(declaration);
            }
            self.close("}");
        }
    }

    /// Opens a method whose single parameter is an object type with one
    /// optional key per field.
    fn open_with_object_type(
        &mut self,
        prefix: &str,
        suffix: &str,
        entries: impl IntoIterator<Item = (String, String)>,
    ) {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            self.open(format!("{}{{}}{}", prefix, suffix));
            return;
        }
        self.open(format!("{}{{", prefix));
        for (key, ts_type) in entries {
            self.line(format!("{}?: {};", key, ts_type));
        }
        self.reopen(format!("}}{}", suffix));
    }

    fn constructor(&mut self, message: &MessageDeclaration) {
        let pb = &message.runtime;
        self.open_with_object_type(
            "constructor(data?: any[] | ",
            ") {",
            message
                .fields
                .iter()
                .map(|field| (field.name.clone(), property_type(field))),
        );
        self.line("super();");
        self.line(format!(
            "{}.Message.initialize(this, Array.isArray(data) ? data : [], 0, -1, [{}], this.#one_of_decls);",
            pb,
            message.repeated_fields().iter().join(", ")
        ));
        if !message.fields.is_empty() {
            self.open("if (!Array.isArray(data) && typeof data == \"object\") {");
            for field in &message.fields {
                self.open(format!(
                    "if (\"{name}\" in data && data.{name} != undefined) {{",
                    name = field.name
                ));
                self.line(format!("this.{name} = data.{name};", name = field.name));
                self.close("}");
            }
            self.close("}");
        }
        for field in message.fields.iter().filter(|field| field.is_map()) {
            self.guarded(
                format!("!this.{}", field.name),
                format!("this.{} = new Map();", field.name),
            );
        }
        self.close("}");
    }

    fn accessors(&mut self, message: &MessageDeclaration, field: &FieldDeclaration) {
        let pb = &message.runtime;
        let name = &field.name;
        let number = field.number;
        let ts_type = property_type(field);

        let getter = match (&field.field_type, field.cardinality) {
            (FieldType::Map { .. }, _) => {
                format!("return {}.Message.getField(this, {}) as any as {};", pb, number, ts_type)
            }
            (FieldType::Message(message_type), Cardinality::Repeated) => format!(
                "return {}.Message.getRepeatedWrapperField(this, {}, {}) as {};",
                pb, message_type, number, ts_type
            ),
            (FieldType::Message(message_type), _) => format!(
                "return {}.Message.getWrapperField(this, {}, {}) as {};",
                pb, message_type, number, ts_type
            ),
            _ => format!(
                "return {}.Message.getFieldWithDefault(this, {}, {}) as {};",
                pb, number, field.default_value, ts_type
            ),
        };

        let oneof_slot = field
            .oneof_index
            .and_then(|index| message.oneof_position(index))
            .map(|position| format!("this.#one_of_decls[{}]", position));
        let setter = match (&field.field_type, field.cardinality, oneof_slot) {
            (FieldType::Map { .. }, _, _) => {
                format!("{}.Message.setField(this, {}, value as any);", pb, number)
            }
            (FieldType::Message(_), Cardinality::Repeated, _) => {
                format!("{}.Message.setRepeatedWrapperField(this, {}, value);", pb, number)
            }
            (FieldType::Message(_), _, Some(slot)) => format!(
                "{}.Message.setOneofWrapperField(this, {}, {}, value);",
                pb, number, slot
            ),
            (FieldType::Message(_), _, None) => {
                format!("{}.Message.setWrapperField(this, {}, value);", pb, number)
            }
            (_, _, Some(slot)) => {
                format!("{}.Message.setOneofField(this, {}, {}, value);", pb, number, slot)
            }
            (_, _, None) => format!("{}.Message.setField(this, {}, value);", pb, number),
        };

        self.deprecated(field.deprecated);
        self.open(format!("get {}() {{", name));
        self.line(getter);
        self.close("}");
        self.open(format!("set {}(value: {}) {{", name, ts_type));
        self.line(setter);
        self.close("}");

        if field.has_presence() {
            self.open(format!("get has_{}() {{", name));
            self.line(format!("return {}.Message.getField(this, {}) != null;", pb, number));
            self.close("}");
        }
    }

    fn oneof_case(&mut self, message: &MessageDeclaration, oneof: &OneofDeclaration) {
        let members: Vec<(i32, &str)> = oneof
            .members
            .iter()
            .filter_map(|number| Some((*number, message.field(*number)?.name.as_str())))
            .collect();

        self.open(format!("get {}() {{", oneof.name));
        self.open("const cases: {");
        self.line(format!(
            "[index: number]: \"none\"{};",
            members
                .iter()
                .map(|(_, name)| format!(" | \"{}\"", name))
                .join("")
        ));
        self.reopen("} = {");
        let cases = std::iter::once("0: \"none\"".to_owned())
            .chain(
                members
                    .iter()
                    .map(|(number, name)| format!("{}: \"{}\"", number, name)),
            )
            .collect::<Vec<_>>();
        let last = cases.len() - 1;
        for (idx, case) in cases.iter().enumerate() {
            let separator = if idx == last { "" } else { "," };
            self.line(format!("{}{}", case, separator));
        }
        self.close("};");
        self.line(format!(
            "return cases[{}.Message.computeOneofCase(this, [{}])];",
            message.runtime,
            oneof.members.iter().join(", ")
        ));
        self.close("}");
    }

    fn from_object(&mut self, message: &MessageDeclaration) {
        self.open_with_object_type(
            "static fromObject(data: ",
            &format!("): {} {{", message.name),
            message
                .fields
                .iter()
                .map(|field| (field.object_key.clone(), object_type(field))),
        );
        self.line(format!("const message = new {}({{}});", message.name));
        for field in &message.fields {
            let value = format!("data.{}", field.object_key);
            let converted = match (&field.field_type, field.cardinality) {
                (FieldType::Message(message_type), Cardinality::Repeated) => format!(
                    "{}.map(item => {}.fromObject(item))",
                    value, message_type
                ),
                (FieldType::Message(message_type), _) => {
                    format!("{}.fromObject({})", message_type, value)
                }
                (FieldType::Map { key, value: map_value }, _) => {
                    let key_expr = match key {
                        Scalar::String => "key",
                        Scalar::Bool => "key === \"true\"",
                        _ => "Number(key)",
                    };
                    let value_expr = match &**map_value {
                        FieldType::Message(message_type) => {
                            format!("{}.fromObject(value)", message_type)
                        }
                        _ => "value".to_owned(),
                    };
                    format!(
                        "new Map(Object.entries({}).map(([key, value]) => [{}, {}] as [{}, {}]))",
                        value,
                        key_expr,
                        value_expr,
                        key.ts_type(),
                        map_value.ts_type()
                    )
                }
                _ => value.clone(),
            };
            self.open(format!("if ({} != null) {{", value));
            self.line(format!("message.{} = {};", field.name, converted));
            self.close("}");
        }
        self.line("return message;");
        self.close("}");
    }

    fn to_object(&mut self, message: &MessageDeclaration) {
        self.open(format!("{}toObject() {{", override_modifier(message)));
        self.open_with_object_type(
            "const data: ",
            " = {};",
            message
                .fields
                .iter()
                .map(|field| (field.object_key.clone(), object_type(field))),
        );
        // `open_with_object_type` leaves the indentation of a body.
        self.depth -= 1;
        for field in &message.fields {
            let value = format!("this.{}", field.name);
            let converted = match (&field.field_type, field.cardinality) {
                (FieldType::Message(message_type), Cardinality::Repeated) => format!(
                    "{}.map((item: {}) => item.toObject())",
                    value, message_type
                ),
                (FieldType::Message(_), _) => format!("{}.toObject()", value),
                (FieldType::Map { value: map_value, .. }, _) => match &**map_value {
                    FieldType::Message(_) => format!(
                        "Object.fromEntries(Array.from({}).map(([key, value]) => [key, value.toObject()]))",
                        value
                    ),
                    _ => format!("Object.fromEntries({})", value),
                },
                _ => value.clone(),
            };
            let condition = if field.has_presence() {
                format!("this.has_{}", field.name)
            } else {
                format!("{} != null", value)
            };
            self.open(format!("if ({}) {{", condition));
            self.line(format!("data.{} = {};", field.object_key, converted));
            self.close("}");
        }
        self.line("return data;");
        self.close("}");
    }

    fn serialize(&mut self, message: &MessageDeclaration) {
        let pb = &message.runtime;
        self.line("serialize(): Uint8Array;");
        self.line(format!("serialize(w: {}.BinaryWriter): void;", pb));
        self.open(format!(
            "serialize(w?: {}.BinaryWriter): Uint8Array | void {{",
            pb
        ));
        self.line(format!("const writer = w || new {}.BinaryWriter();", pb));
        for field in &message.fields {
            self.write_field(field);
        }
        self.guarded("!w", "return writer.getResultBuffer();");
        self.close("}");
    }

    fn write_field(&mut self, field: &FieldDeclaration) {
        let name = &field.name;
        let number = field.number;
        let method = field.field_type.wire_method();

        match (&field.field_type, field.cardinality) {
            (FieldType::Map { key, value }, _) => {
                self.open(format!("for (const [key, value] of this.{}) {{", name));
                self.open(format!("writer.writeMessage({}, this.{}, () => {{", number, name));
                self.line(format!("writer.write{}(1, key);", key.wire_method()));
                match &**value {
                    FieldType::Message(_) => {
                        self.line("writer.writeMessage(2, value, () => value.serialize(writer));")
                    }
                    other => self.line(format!("writer.write{}(2, value);", other.wire_method())),
                }
                self.close("});");
                self.close("}");
            }
            (FieldType::Message(message_type), Cardinality::Repeated) => self.guarded(
                format!("this.{}.length", name),
                format!(
                    "writer.writeRepeatedMessage({}, this.{}, (item: {}) => item.serialize(writer));",
                    number, name, message_type
                ),
            ),
            (_, Cardinality::Repeated) => {
                let encoding = if field.packed { "Packed" } else { "Repeated" };
                self.guarded(
                    format!("this.{}.length", name),
                    format!("writer.write{}{}({}, this.{});", encoding, method, number, name),
                )
            }
            (FieldType::Message(_), _) => self.guarded(
                format!("this.has_{}", name),
                format!(
                    "writer.writeMessage({}, this.{}, () => this.{}.serialize(writer));",
                    number, name, name
                ),
            ),
            _ => {
                let condition = if field.has_presence() {
                    format!("this.has_{}", name)
                } else if matches!(
                    field.field_type,
                    FieldType::Scalar(Scalar::String | Scalar::Bytes)
                ) {
                    format!("this.{}.length", name)
                } else {
                    format!("this.{} != {}", name, field.default_value)
                };
                self.guarded(
                    condition,
                    format!("writer.write{}({}, this.{});", method, number, name),
                )
            }
        }
    }

    fn deserialize(&mut self, message: &MessageDeclaration) {
        let pb = &message.runtime;
        self.open(format!(
            "static deserialize(bytes: Uint8Array | {pb}.BinaryReader): {} {{",
            message.name,
            pb = pb
        ));
        self.line(format!(
            "const reader = bytes instanceof {pb}.BinaryReader ? bytes : new {pb}.BinaryReader(bytes), message = new {}();",
            message.name,
            pb = pb
        ));
        self.open("while (reader.nextField()) {");
        self.guarded("reader.isEndGroup()", "break;");
        self.open("switch (reader.getFieldNumber()) {");
        for field in message
            .deserialize
            .arms
            .iter()
            .filter_map(|number| message.field(*number))
        {
            self.open(format!("case {}:", field.number));
            self.read_field(pb, field);
            self.line("break;");
            self.depth -= 1;
        }
        // Unknown fields are skipped, whatever the wire type.
        self.line("default: reader.skipField();");
        self.close("}");
        self.close("}");
        self.line("return message;");
        self.close("}");
    }

    fn read_field(&mut self, pb: &str, field: &FieldDeclaration) {
        let name = &field.name;
        let number = field.number;
        let method = field.field_type.wire_method();

        match (&field.field_type, field.cardinality) {
            (FieldType::Map { key, value }, _) => match &**value {
                FieldType::Message(message_type) => {
                    self.open(format!(
                        "reader.readMessage(message, () => {}.Map.deserializeBinary(message.{} as any, reader, reader.read{}, () => {{",
                        pb,
                        name,
                        key.wire_method()
                    ));
                    self.line("let value;");
                    self.line(format!(
                        "reader.readMessage(message, () => value = {}.deserialize(reader));",
                        message_type
                    ));
                    self.line("return value;");
                    self.close("}));");
                }
                other => self.line(format!(
                    "reader.readMessage(message, () => {}.Map.deserializeBinary(message.{} as any, reader, reader.read{}, reader.read{}));",
                    pb,
                    name,
                    key.wire_method(),
                    other.wire_method()
                )),
            },
            (FieldType::Message(message_type), Cardinality::Repeated) => self.line(format!(
                "reader.readMessage(message.{name}, () => {pb}.Message.addToRepeatedWrapperField(message, {number}, {ty}.deserialize(reader), {ty}));",
                name = name,
                pb = pb,
                number = number,
                ty = message_type
            )),
            (FieldType::Message(message_type), _) => self.line(format!(
                "reader.readMessage(message.{name}, () => message.{name} = {ty}.deserialize(reader));",
                name = name,
                ty = message_type
            )),
            (field_type, Cardinality::Repeated) if can_read_packed(field_type) => {
                // Packed and unpacked encodings are both accepted.
                self.line(format!(
                    "message.{name} = [...message.{name}, ...(reader.isDelimited() ? reader.readPacked{m}() : [reader.read{m}()])];",
                    name = name,
                    m = method
                ))
            }
            (_, Cardinality::Repeated) => self.line(format!(
                "{}.Message.addToRepeatedField(message, {}, reader.read{}());",
                pb, number, method
            )),
            _ => self.line(format!("message.{} = reader.read{}();", name, method)),
        }
    }

    fn binary_methods(&mut self, message: &MessageDeclaration) {
        let modifier = override_modifier(message);
        self.open(format!("{}serializeBinary(): Uint8Array {{", modifier));
        self.line("return this.serialize();");
        self.close("}");
        self.open(format!(
            "static {}deserializeBinary(bytes: Uint8Array): {} {{",
            modifier, message.name
        ));
        self.line(format!("return {}.deserialize(bytes);", message.name));
        self.close("}");
    }
}

fn can_read_packed(field_type: &FieldType) -> bool {
    match field_type {
        FieldType::Scalar(scalar) => scalar.is_packable(),
        FieldType::Enum(_) => true,
        FieldType::Message(_) | FieldType::Map { .. } => false,
    }
}

// Services
impl Printer {
    fn rpc_interfaces(&mut self, interfaces: &RpcInterfaces) {
        let rt = &interfaces.runtime;
        let blocks: Vec<(&str, Vec<String>)> = match interfaces.target {
            Target::Node => vec![
                (
                    "GrpcUnaryServiceInterface",
                    vec![
                        format!("(message: P, metadata: {rt}.Metadata, options: {rt}.CallOptions, callback: {rt}.requestCallback<R>): {rt}.ClientUnaryCall;", rt = rt),
                        format!("(message: P, metadata: {rt}.Metadata, callback: {rt}.requestCallback<R>): {rt}.ClientUnaryCall;", rt = rt),
                        format!("(message: P, options: {rt}.CallOptions, callback: {rt}.requestCallback<R>): {rt}.ClientUnaryCall;", rt = rt),
                        format!("(message: P, callback: {rt}.requestCallback<R>): {rt}.ClientUnaryCall;", rt = rt),
                    ],
                ),
                (
                    "GrpcStreamServiceInterface",
                    vec![
                        format!("(message: P, metadata: {rt}.Metadata, options?: {rt}.CallOptions): {rt}.ClientReadableStream<R>;", rt = rt),
                        format!("(message: P, options?: {rt}.CallOptions): {rt}.ClientReadableStream<R>;", rt = rt),
                    ],
                ),
                (
                    "GrpcWritableServiceInterface",
                    vec![
                        format!("(metadata: {rt}.Metadata, options: {rt}.CallOptions, callback: {rt}.requestCallback<R>): {rt}.ClientWritableStream<P>;", rt = rt),
                        format!("(metadata: {rt}.Metadata, callback: {rt}.requestCallback<R>): {rt}.ClientWritableStream<P>;", rt = rt),
                        format!("(options: {rt}.CallOptions, callback: {rt}.requestCallback<R>): {rt}.ClientWritableStream<P>;", rt = rt),
                        format!("(callback: {rt}.requestCallback<R>): {rt}.ClientWritableStream<P>;", rt = rt),
                    ],
                ),
                (
                    "GrpcChunkServiceInterface",
                    vec![
                        format!("(metadata: {rt}.Metadata, options?: {rt}.CallOptions): {rt}.ClientDuplexStream<P, R>;", rt = rt),
                        format!("(options?: {rt}.CallOptions): {rt}.ClientDuplexStream<P, R>;", rt = rt),
                    ],
                ),
                (
                    "GrpcPromiseServiceInterface",
                    vec![
                        format!("(message: P, metadata: {rt}.Metadata, options?: {rt}.CallOptions): Promise<R>;", rt = rt),
                        format!("(message: P, options?: {rt}.CallOptions): Promise<R>;", rt = rt),
                    ],
                ),
            ],
            Target::Web => vec![
                (
                    "GrpcWebUnaryServiceInterface",
                    vec![format!("(message: P, metadata?: {}.Metadata | null): Promise<R>;", rt)],
                ),
                (
                    "GrpcWebStreamServiceInterface",
                    vec![format!(
                        "(message: P, metadata?: {rt}.Metadata): {rt}.ClientReadableStream<R>;",
                        rt = rt
                    )],
                ),
            ],
        };

        for (name, signatures) in blocks {
            self.open(format!("interface {}<P, R> {{", name));
            for signature in signatures {
                self.line(signature);
            }
            self.close("}");
        }
    }

    fn server(&mut self, server: &ServerDeclaration) {
        let rt = &server.runtime;
        let service = &server.service;

        self.deprecated(service.deprecated);
        self.open(format!("export class {} {{", server.name));
        self.open("static definition = {");
        let last = service.methods.len().saturating_sub(1);
        for (idx, method) in service.methods.iter().enumerate() {
            self.open(format!("{}: {{", method.name));
            self.line(format!("path: {},", to_string_literal(&method.path)));
            self.line(format!("requestStream: {},", method.client_streaming));
            self.line(format!("responseStream: {},", method.server_streaming));
            self.line(format!(
                "requestSerialize: (message: {}) => Buffer.from(message.serialize()),",
                method.input_type
            ));
            self.line(format!(
                "requestDeserialize: (bytes: Buffer) => {}.deserialize(new Uint8Array(bytes)),",
                method.input_type
            ));
            self.line(format!(
                "responseSerialize: (message: {}) => Buffer.from(message.serialize()),",
                method.output_type
            ));
            self.line(format!(
                "responseDeserialize: (bytes: Buffer) => {}.deserialize(new Uint8Array(bytes))",
                method.output_type
            ));
            self.close(if idx == last { "}" } else { "}," });
        }
        self.close("};");
        self.line(format!("[method: string]: {}.UntypedHandleCall;", rt));

        for method in &service.methods {
            self.server_handler(rt, method);
        }
        self.close("}");
    }

    fn server_handler(&mut self, rt: &str, method: &Method) {
        let (input, output) = (&method.input_type, &method.output_type);
        let parameters = match (method.client_streaming, method.server_streaming) {
            (false, false) => format!(
                "call: {rt}.ServerUnaryCall<{}, {}>, callback: {rt}.sendUnaryData<{}>",
                input,
                output,
                output,
                rt = rt
            ),
            (false, true) => format!("call: {}.ServerWritableStream<{}, {}>", rt, input, output),
            (true, false) => format!(
                "call: {rt}.ServerReadableStream<{}, {}>, callback: {rt}.sendUnaryData<{}>",
                input,
                output,
                output,
                rt = rt
            ),
            (true, true) => format!("call: {}.ServerDuplexStream<{}, {}>", rt, input, output),
        };
        let status = format!(
            "{{ code: {}.status.UNIMPLEMENTED, details: {} }}",
            rt,
            to_string_literal(&format!("Method {} is not implemented", method.name))
        );

        self.deprecated(method.deprecated);
        self.open(format!("{}({}): void {{", method.name, parameters));
        if method.server_streaming {
            self.line(format!("call.emit(\"error\", {});", status));
        } else {
            self.line(format!("callback({}, null);", status));
        }
        self.close("}");
    }

    fn node_client(&mut self, client: &ClientDeclaration) {
        let rt = &client.runtime;
        let service = &client.service;

        self.deprecated(service.deprecated);
        self.open(format!(
            "export class {} extends {}.makeGenericClientConstructor({}.definition, {}, {{}}) {{",
            client.name,
            rt,
            client.server,
            to_string_literal(&service.name)
        ));
        self.open(format!(
            "constructor(address: string, credentials: {rt}.ChannelCredentials, options?: Partial<{rt}.ChannelOptions>) {{",
            rt = rt
        ));
        self.line("super(address, credentials, options);");
        self.close("}");

        for method in &service.methods {
            self.deprecated(method.deprecated);
            self.node_client_method(rt, method, client.unary_promise);
        }
        self.close("}");
    }

    fn node_client_method(&mut self, rt: &str, method: &Method, unary_promise: bool) {
        let (name, input, output) = (&method.name, &method.input_type, &method.output_type);
        match (method.client_streaming, method.server_streaming) {
            (false, false) if unary_promise => {
                self.open(format!(
                    "{name}: GrpcPromiseServiceInterface<{i}, {o}> = (message: {i}, metadata?: {rt}.Metadata | {rt}.CallOptions, options?: {rt}.CallOptions): Promise<{o}> => {{",
                    name = name,
                    i = input,
                    o = output,
                    rt = rt
                ));
                self.open("if (!metadata) {");
                self.line(format!("metadata = new {}.Metadata;", rt));
                self.close("}");
                self.open("if (!options) {");
                self.line("options = {};");
                self.close("}");
                self.open(format!(
                    "return new Promise((resolve, reject) => super.{}(message, metadata, options, (error: {}.ServiceError, response: {}) => {{",
                    name, rt, output
                ));
                self.open("if (error) {");
                self.line("reject(error);");
                self.close("}");
                self.open("else {");
                self.line("resolve(response);");
                self.close("}");
                self.close("}));");
                self.close("};");
            }
            (false, false) => {
                self.open(format!(
                    "{name}: GrpcUnaryServiceInterface<{i}, {o}> = (message: {i}, metadata: {rt}.Metadata | {rt}.CallOptions | {rt}.requestCallback<{o}>, options?: {rt}.CallOptions | {rt}.requestCallback<{o}>, callback?: {rt}.requestCallback<{o}>): {rt}.ClientUnaryCall => {{",
                    name = name,
                    i = input,
                    o = output,
                    rt = rt
                ));
                self.line(format!(
                    "return super.{}(message, metadata, options, callback);",
                    name
                ));
                self.close("};");
            }
            (false, true) => {
                self.open(format!(
                    "{name}: GrpcStreamServiceInterface<{i}, {o}> = (message: {i}, metadata?: {rt}.Metadata | {rt}.CallOptions, options?: {rt}.CallOptions): {rt}.ClientReadableStream<{o}> => {{",
                    name = name,
                    i = input,
                    o = output,
                    rt = rt
                ));
                self.line(format!("return super.{}(message, metadata, options);", name));
                self.close("};");
            }
            (true, false) => {
                self.open(format!(
                    "{name}: GrpcWritableServiceInterface<{i}, {o}> = (metadata: {rt}.Metadata | {rt}.CallOptions | {rt}.requestCallback<{o}>, options?: {rt}.CallOptions | {rt}.requestCallback<{o}>, callback?: {rt}.requestCallback<{o}>): {rt}.ClientWritableStream<{i}> => {{",
                    name = name,
                    i = input,
                    o = output,
                    rt = rt
                ));
                self.line(format!("return super.{}(metadata, options, callback);", name));
                self.close("};");
            }
            (true, true) => {
                self.open(format!(
                    "{name}: GrpcChunkServiceInterface<{i}, {o}> = (metadata?: {rt}.Metadata | {rt}.CallOptions, options?: {rt}.CallOptions): {rt}.ClientDuplexStream<{i}, {o}> => {{",
                    name = name,
                    i = input,
                    o = output,
                    rt = rt
                ));
                self.line(format!("return super.{}(metadata, options);", name));
                self.close("};");
            }
        }
    }

    fn web_client(&mut self, client: &ClientDeclaration) {
        let rt = &client.runtime;
        let service = &client.service;

        self.deprecated(service.deprecated);
        self.open(format!("export class {} {{", client.name));
        self.line("private _address: string;");
        self.line(format!("private _client: {}.GrpcWebClientBase;", rt));
        self.open(format!(
            "constructor(address: string, credentials?: Object, options?: {}.GrpcWebClientBaseOptions) {{",
            rt
        ));
        self.guarded("!options", "options = {};");
        self.line("options.format = options.format || \"text\";");
        self.line("this._address = address;");
        self.line(format!("this._client = new {}.GrpcWebClientBase(options);", rt));
        self.close("}");

        for method in &service.methods {
            self.web_client_method(rt, &client.name, method);
        }
        self.close("}");
    }

    fn web_client_method(&mut self, rt: &str, client: &str, method: &Method) {
        let (name, input, output) = (&method.name, &method.input_type, &method.output_type);
        let path = to_string_literal(&method.path);

        let (method_type, call, interface) = match (method.client_streaming, method.server_streaming)
        {
            (false, false) => ("UNARY", "thenableCall", "GrpcWebUnaryServiceInterface"),
            (false, true) => ("SERVER_STREAMING", "serverStreaming", "GrpcWebStreamServiceInterface"),
            _ => {
                self.deprecated(method.deprecated);
                self.open(format!("{}(): never {{", name));
                self.line(format!(
                    "throw new Error({});",
                    to_string_literal(&format!(
                        "{} uses client streaming, which grpc-web does not support",
                        method.path
                    ))
                ));
                self.close("}");
                return;
            }
        };

        self.line(format!(
            "private static {name} = new {rt}.MethodDescriptor({path}, {rt}.MethodType.{method_type}, {i}, {o}, (message: {i}) => message.serialize(), {o}.deserialize);",
            name = name,
            rt = rt,
            path = path,
            method_type = method_type,
            i = input,
            o = output
        ));
        self.deprecated(method.deprecated);
        let metadata = if method.server_streaming {
            format!("{}.Metadata", rt)
        } else {
            format!("{}.Metadata | null", rt)
        };
        self.open(format!(
            "{name}: {interface}<{i}, {o}> = (message: {i}, metadata?: {metadata}) => {{",
            name = name,
            interface = interface,
            i = input,
            o = output,
            metadata = metadata
        ));
        self.line(format!(
            "return this._client.{}(this._address + {}, message, metadata || {{}}, {}.{});",
            call, path, client, name
        ));
        self.close("};");
    }
}

use super::*;

use crate::ast::{
    Cardinality, DeserializeMethod, FieldDeclaration, FieldType, MessageDeclaration, Scalar,
    UnknownFieldPolicy,
};
use crate::ident::{to_json_name, to_string_literal, unescape_c_escape_string};
use crate::type_resolver::TypeKind;

mod oneof;

type OneofFields = MultiMap<i32, i32>;

impl CodeGenerator<'_> {
    /// Lowers a message and everything nested in it.
    ///
    /// When `flatten` is set the nested declarations are returned before the
    /// message itself, otherwise they end up in its `nested` list.
    pub(super) fn lower_message(
        &mut self,
        message: &DescriptorProto,
        flatten: bool,
    ) -> Result<Vec<Declaration>> {
        debug!("  message: {:?}", message.name());

        let message_name = message.name();
        let name = self.declaration_name(message_name, flatten);

        // Map entries are lowered as part of the fields using them.
        let (nested_types, map_entries): (Vec<_>, Vec<_>) =
            message.nested_type.iter().partition_map(|nested| {
                if is_map_entry(nested) {
                    Either::Right(nested.name())
                } else {
                    Either::Left(nested)
                }
            });
        trace!("    map entries: {:?}", map_entries);

        self.type_path.push(message_name.to_owned());
        let mut nested = Vec::with_capacity(message.enum_type.len() + nested_types.len());
        for desc in &message.enum_type {
            nested.push(Declaration::Enum(self.lower_enum(desc)));
        }
        for nested_type in nested_types {
            nested.extend(self.lower_message(nested_type, flatten)?);
        }
        self.type_path.pop();

        // Members of synthetic oneofs behave like plain optional fields.
        let oneof_fields: OneofFields = message
            .field
            .iter()
            .filter(|field| !field.proto3_optional())
            .filter_map(|field| Some((field.oneof_index?, field.number())))
            .collect();

        let fields = message
            .field
            .iter()
            .map(|field| self.lower_field(field, &oneof_fields))
            .collect::<Result<Vec<_>>>()?;
        let oneofs = self.lower_oneofs(&message.oneof_decl, oneof_fields);

        let declaration = MessageDeclaration {
            name,
            runtime: self.runtime.clone(),
            deserialize: DeserializeMethod {
                arms: fields.iter().map(|field| field.number).collect(),
                unknown_fields: UnknownFieldPolicy::Skip,
            },
            fields,
            oneofs,
            nested: Vec::new(),
            deprecated: message
                .options
                .as_ref()
                .map_or(false, |options| options.deprecated()),
            explicit_override: self.config.explicit_override,
        };

        if flatten {
            nested.push(Declaration::Message(declaration));
            Ok(nested)
        } else {
            Ok(vec![Declaration::Message(MessageDeclaration {
                nested,
                ..declaration
            })])
        }
    }

    fn lower_field(
        &self,
        field: &FieldDescriptorProto,
        oneof_fields: &OneofFields,
    ) -> Result<FieldDeclaration> {
        let field_type = self.resolve_field_type(field)?;
        let oneof_index = field
            .oneof_index
            .filter(|index| oneof_fields.get_vec(index).is_some() && !field.proto3_optional());

        let cardinality = match (&field_type, field.label()) {
            (FieldType::Map { .. }, _) => Cardinality::Singular,
            (_, Label::Repeated) => Cardinality::Repeated,
            _ if oneof_index.is_some() => Cardinality::Singular,
            _ if field.proto3_optional() || self.syntax != Syntax::Proto3 => Cardinality::Optional,
            _ => Cardinality::Singular,
        };

        debug!(
            "    field: {:?}, type: {:?}, cardinality: {:?}",
            field.name(),
            field_type,
            cardinality
        );

        let packed = cardinality == Cardinality::Repeated
            && can_pack(&field_type)
            && field
                .options
                .as_ref()
                .and_then(|options| options.packed)
                .unwrap_or(self.syntax != Syntax::Proto2);

        Ok(FieldDeclaration {
            name: field.name().to_owned(),
            object_key: if self.config.json_names {
                to_json_name(field)
            } else {
                field.name().to_owned()
            },
            number: field.number(),
            default_value: self.default_value(field, &field_type, cardinality)?,
            field_type,
            cardinality,
            oneof_index,
            packed,
            deprecated: field
                .options
                .as_ref()
                .map_or(false, |options| options.deprecated()),
        })
    }

    fn resolve_field_type(&self, field: &FieldDescriptorProto) -> Result<FieldType> {
        if let Some(scalar) = to_scalar(field.r#type()) {
            return Ok(FieldType::Scalar(scalar));
        }

        let reference = self.resolve(field.type_name())?;
        match &reference.kind {
            TypeKind::Enum { .. } => Ok(FieldType::Enum(self.type_expression(reference)?)),
            TypeKind::Message => Ok(FieldType::Message(self.type_expression(reference)?)),
            TypeKind::MapEntry { key, value } => {
                let malformed = || Error::MalformedMapEntry(reference.name.as_ref().to_owned());
                let key = to_scalar(key.r#type()).ok_or_else(malformed)?;
                let value = self.resolve_field_type(value)?;
                if matches!(value, FieldType::Map { .. }) {
                    return Err(malformed());
                }
                Ok(FieldType::Map {
                    key,
                    value: Box::new(value),
                })
            }
        }
    }

    /// The TypeScript expression an unset field reads as.
    fn default_value(
        &self,
        field: &FieldDescriptorProto,
        field_type: &FieldType,
        cardinality: Cardinality,
    ) -> Result<String> {
        if cardinality == Cardinality::Repeated {
            return Ok("[]".to_owned());
        }

        let explicit = field.default_value.as_deref();
        let invalid = || Error::InvalidDefault {
            field: field.name().to_owned(),
            value: explicit.unwrap_or_default().to_owned(),
        };

        match field_type {
            FieldType::Map { .. } => Ok("new Map()".to_owned()),
            FieldType::Message(_) => Ok("undefined".to_owned()),
            FieldType::Enum(enum_type) => match explicit {
                Some(value) => Ok(format!("{}.{}", enum_type, value)),
                None => {
                    let reference = self.resolve(field.type_name())?;
                    match &reference.kind {
                        TypeKind::Enum {
                            zero_value: Some(zero_value),
                        } => Ok(format!("{}.{}", enum_type, zero_value)),
                        _ => Ok("0".to_owned()),
                    }
                }
            },
            FieldType::Scalar(scalar) => {
                let value = match explicit {
                    Some(value) => value,
                    None => return Ok(scalar.zero_value().to_owned()),
                };
                match scalar {
                    Scalar::String => Ok(to_string_literal(value)),
                    Scalar::Bytes => {
                        let bytes = unescape_c_escape_string(value).ok_or_else(invalid)?;
                        Ok(format!("new Uint8Array([{}])", bytes.iter().join(", ")))
                    }
                    Scalar::Bool => match value {
                        "true" | "false" => Ok(value.to_owned()),
                        _ => Err(invalid()),
                    },
                    Scalar::Double | Scalar::Float => match value {
                        "inf" => Ok("Infinity".to_owned()),
                        "-inf" => Ok("-Infinity".to_owned()),
                        "nan" => Ok("NaN".to_owned()),
                        _ => value.parse::<f64>().map(|_| value.to_owned()).map_err(|_| invalid()),
                    },
                    _ => value.parse::<i128>().map(|_| value.to_owned()).map_err(|_| invalid()),
                }
            }
        }
    }
}

fn is_map_entry(message: &DescriptorProto) -> bool {
    message
        .options
        .as_ref()
        .map_or(false, |options| options.map_entry())
}

fn to_scalar(r#type: Type) -> Option<Scalar> {
    match r#type {
        Type::Double => Some(Scalar::Double),
        Type::Float => Some(Scalar::Float),
        Type::Int64 => Some(Scalar::Int64),
        Type::Uint64 => Some(Scalar::Uint64),
        Type::Int32 => Some(Scalar::Int32),
        Type::Fixed64 => Some(Scalar::Fixed64),
        Type::Fixed32 => Some(Scalar::Fixed32),
        Type::Bool => Some(Scalar::Bool),
        Type::String => Some(Scalar::String),
        Type::Bytes => Some(Scalar::Bytes),
        Type::Uint32 => Some(Scalar::Uint32),
        Type::Sfixed32 => Some(Scalar::Sfixed32),
        Type::Sfixed64 => Some(Scalar::Sfixed64),
        Type::Sint32 => Some(Scalar::Sint32),
        Type::Sint64 => Some(Scalar::Sint64),
        Type::Group | Type::Message | Type::Enum => None,
    }
}

/// Returns `true` if the repeated field type can be packed.
fn can_pack(field_type: &FieldType) -> bool {
    match field_type {
        FieldType::Scalar(scalar) => scalar.is_packable(),
        FieldType::Enum(_) => true,
        FieldType::Message(_) | FieldType::Map { .. } => false,
    }
}

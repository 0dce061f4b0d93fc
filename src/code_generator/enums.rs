use super::*;

use crate::ast::{EnumDeclaration, EnumValue};

impl CodeGenerator<'_> {
    /// Values keep their declared order and numbers; aliases are kept as is.
    pub(super) fn lower_enum(&self, desc: &EnumDescriptorProto) -> EnumDeclaration {
        debug!("  enum: {:?}", desc.name());

        EnumDeclaration {
            name: self.declaration_name(desc.name(), self.config.no_namespace),
            values: desc
                .value
                .iter()
                .map(|value| EnumValue {
                    name: value.name().to_owned(),
                    number: value.number(),
                })
                .collect(),
            deprecated: desc
                .options
                .as_ref()
                .map_or(false, |options| options.deprecated()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::tests::generate_with;
    use crate::ast::{Declaration, EnumDeclaration, EnumValue};
    use crate::test_helpers::*;
    use crate::Config;

    fn lowered_enum(values: &[(&str, i32)]) -> EnumDeclaration {
        let mut file = file("e.proto", "");
        file.enum_type = vec![enumeration("Status", values)];
        let mut source = generate_with(&Config::new(), &[file]).remove(0);
        match source.body.remove(0) {
            Declaration::Enum(desc) => desc,
            other => panic!("expected an enum, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_value_fidelity() {
        let desc = lowered_enum(&[("A", 0), ("B", 5), ("C", 5)]);
        assert_eq!(desc.name, "Status");
        assert_eq!(
            desc.values,
            vec![
                EnumValue {
                    name: "A".to_owned(),
                    number: 0
                },
                EnumValue {
                    name: "B".to_owned(),
                    number: 5
                },
                EnumValue {
                    name: "C".to_owned(),
                    number: 5
                },
            ]
        );
    }

    #[test]
    fn test_enum_negative_and_sparse_values() {
        let desc = lowered_enum(&[("NEG", -1), ("ZERO", 0), ("BIG", 1000)]);
        let numbers: Vec<i32> = desc.values.iter().map(|value| value.number).collect();
        assert_eq!(numbers, vec![-1, 0, 1000]);
        assert!(!desc.deprecated);
    }
}

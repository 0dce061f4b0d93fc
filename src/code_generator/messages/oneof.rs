use super::*;

use crate::ast::OneofDeclaration;

impl CodeGenerator<'_> {
    pub(super) fn lower_oneofs(
        &self,
        oneof_declarations: &[OneofDescriptorProto],
        mut oneof_fields: OneofFields,
    ) -> Vec<OneofDeclaration> {
        let mut oneofs = Vec::with_capacity(oneof_declarations.len());

        for (idx, oneof) in oneof_declarations.iter().enumerate() {
            let idx = idx as i32;
            // optional fields create a synthetic oneof that we want to skip
            let members = match oneof_fields.remove(&idx) {
                Some(members) => members,
                None => continue,
            };

            debug!("    oneof: {:?}, members: {:?}", oneof.name(), members);

            oneofs.push(OneofDeclaration {
                name: oneof.name().to_owned(),
                index: idx,
                members,
            });
        }

        oneofs
    }
}

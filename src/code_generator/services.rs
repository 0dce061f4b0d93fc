use super::*;

use crate::ast::{ClientDeclaration, Method, RpcInterfaces, ServerDeclaration, Service};
use crate::Target;

impl CodeGenerator<'_> {
    /// Lowers every service of the file into a server stub and one client of
    /// the configured target, preceded by the call-shape interfaces the
    /// clients share.
    pub(super) fn lower_services(&self, grpc: &str, grpc_web: &str) -> Result<Vec<Declaration>> {
        let target = self.config.target;
        let client_runtime = match target {
            Target::Node => grpc,
            Target::Web => grpc_web,
        };

        let mut declarations = Vec::with_capacity(1 + 2 * self.file.service.len());
        declarations.push(Declaration::RpcInterfaces(RpcInterfaces {
            target,
            runtime: client_runtime.to_owned(),
        }));

        for service in &self.file.service {
            let service = self.lower_service(service)?;
            let server = format!("Unimplemented{}Service", service.name);

            declarations.push(Declaration::UnimplementedServer(ServerDeclaration {
                name: server.clone(),
                runtime: grpc.to_owned(),
                service: service.clone(),
            }));
            declarations.push(Declaration::Client(ClientDeclaration {
                name: format!("{}Client", service.name),
                target,
                runtime: client_runtime.to_owned(),
                server,
                service,
                unary_promise: self.config.unary_rpc_promise,
            }));
        }

        Ok(declarations)
    }

    fn lower_service(&self, service: &ServiceDescriptorProto) -> Result<Service> {
        let name = service.name().to_owned();
        debug!("  service: {:?}", name);

        let service_path = if self.package.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", self.package, name)
        };

        let methods = service
            .method
            .iter()
            .map(|method| {
                debug!("  method: {:?}", method.name());

                let input_type = self.type_expression(self.resolve(method.input_type())?)?;
                let output_type = self.type_expression(self.resolve(method.output_type())?)?;

                Ok(Method {
                    name: method.name().to_owned(),
                    path: format!("/{}/{}", service_path, method.name()),
                    input_type,
                    output_type,
                    client_streaming: method.client_streaming(),
                    server_streaming: method.server_streaming(),
                    deprecated: method
                        .options
                        .as_ref()
                        .map_or(false, |options| options.deprecated()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Service {
            name,
            methods,
            deprecated: service
                .options
                .as_ref()
                .map_or(false, |options| options.deprecated()),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::tests::generate_with;
    use super::*;
    use crate::test_helpers::*;

    fn streaming_file(package: &str) -> FileDescriptorProto {
        let mut file = file("chat.proto", package);
        let prefix = if package.is_empty() {
            String::new()
        } else {
            format!(".{}", package)
        };
        let msg = format!("{}.Msg", prefix);
        file.message_type = vec![message("Msg", vec![scalar("text", 1, Type::String)])];
        file.service = vec![
            service(
                "Chat",
                vec![
                    method("Send", &msg, &msg, false, false),
                    method("Watch", &msg, &msg, false, true),
                    method("Upload", &msg, &msg, true, false),
                    method("Talk", &msg, &msg, true, true),
                ],
            ),
            service("Admin", vec![method("Reset", &msg, &msg, false, false)]),
        ];
        file
    }

    fn rpc_declarations(config: &Config, file: FileDescriptorProto) -> Vec<Declaration> {
        let mut body = generate_with(config, &[file]).remove(0).body;
        if matches!(body.as_slice(), [Declaration::Namespace(_)]) {
            if let Some(Declaration::Namespace(namespace)) = body.pop() {
                body = namespace.body;
            }
        }
        body.into_iter()
            .filter(|declaration| !matches!(declaration, Declaration::Message(_)))
            .collect()
    }

    #[test]
    fn test_node_flavor() {
        let mut config = Config::new();
        config.unary_rpc_promise(true);
        let declarations = rpc_declarations(&config, streaming_file("chat.v1"));

        assert_eq!(declarations.len(), 5);
        assert_eq!(
            declarations[0],
            Declaration::RpcInterfaces(RpcInterfaces {
                target: Target::Node,
                runtime: "grpc_1".to_owned(),
            })
        );

        let clients: Vec<&ClientDeclaration> = declarations
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Client(client) => Some(client),
                _ => None,
            })
            .collect();
        assert_eq!(clients.len(), 2);
        assert!(clients.iter().all(|client| client.target == Target::Node));
        assert!(clients.iter().all(|client| client.unary_promise));
        assert_eq!(clients[0].name, "ChatClient");
        assert_eq!(clients[0].server, "UnimplementedChatService");

        let paths: Vec<&str> = clients[0]
            .service
            .methods
            .iter()
            .map(|method| method.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/chat.v1.Chat/Send",
                "/chat.v1.Chat/Watch",
                "/chat.v1.Chat/Upload",
                "/chat.v1.Chat/Talk",
            ]
        );
    }

    #[test]
    fn test_web_flavor() {
        let mut config = Config::new();
        config.target(Target::Web);
        let declarations = rpc_declarations(&config, streaming_file(""));

        let mut servers = 0;
        let mut clients = 0;
        for declaration in &declarations {
            match declaration {
                Declaration::RpcInterfaces(interfaces) => {
                    assert_eq!(interfaces.target, Target::Web);
                    assert_eq!(interfaces.runtime, "grpc_web_1");
                }
                Declaration::UnimplementedServer(server) => {
                    servers += 1;
                    assert_eq!(server.runtime, "grpc_1");
                }
                Declaration::Client(client) => {
                    clients += 1;
                    assert_eq!(client.target, Target::Web);
                    assert_eq!(client.runtime, "grpc_web_1");
                }
                other => panic!("unexpected declaration {:?}", other),
            }
        }
        assert_eq!((servers, clients), (2, 2));

        match &declarations[1] {
            Declaration::UnimplementedServer(server) => {
                let method = &server.service.methods[1];
                assert_eq!(method.path, "/Chat/Watch");
                assert_eq!(method.input_type, "Msg");
                assert!(method.server_streaming && !method.client_streaming);
            }
            other => panic!("expected a server, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_method_type() {
        let mut file = file("broken.proto", "");
        file.service = vec![service(
            "Broken",
            vec![method("Call", ".Nope", ".Nope", false, false)],
        )];
        let resolver = TypeResolver::new();
        let mut aliases = DependencyAliasMap::default();
        let error = CodeGenerator::generate(
            &Config::new(),
            &resolver,
            &mut aliases,
            &file,
            &Version::default(),
        )
        .unwrap_err();
        assert!(matches!(error, Error::UnresolvedType { .. }));
    }
}

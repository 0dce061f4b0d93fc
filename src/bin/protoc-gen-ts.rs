use std::io::{Error, ErrorKind, Read, Result, Write};

use log::debug;
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;

fn main() -> Result<()> {
    env_logger::init();

    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;

    let request = CodeGeneratorRequest::decode(&*buf).map_err(|error| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("invalid CodeGeneratorRequest: {}", error),
        )
    })?;
    debug!(
        "request: {} files, parameter {:?}",
        request.proto_file.len(),
        request.parameter()
    );

    let response = protoc_gen_ts::run_plugin(request);

    buf.clear();
    response.encode(&mut buf).map_err(|error| {
        Error::new(
            ErrorKind::Other,
            format!("failed to encode CodeGeneratorResponse: {}", error),
        )
    })?;
    std::io::stdout().write_all(&buf)?;

    Ok(())
}

use prost::Message;
use protoc_gen_store::{
    DescriptorBuilder, FieldInfo, MethodInfo, MethodSignature, ProtoType,
};
use tracing_subscriber::prelude::*;

fn signature(required: &str) -> Vec<u8> {
    MethodSignature {
        required: required.to_string(),
    }
    .encode_to_vec()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut b = DescriptorBuilder::new();
    let file = b.file("helloworld/helloworld.proto", "helloworld");
    let request = b.message(file, "HelloRequest");
    b.field(request, "name", FieldInfo::scalar(1, ProtoType::String));
    b.field(request, "greeting_count", FieldInfo::scalar(2, ProtoType::Int32).optional());
    let reply = b.message(file, "HelloReply");
    b.field(reply, "message", FieldInfo::scalar(1, ProtoType::String));

    let greeter = b.service(file, "Greeter");
    b.method(
        greeter,
        "SayHello",
        MethodInfo::unary(request, reply).with_signature(signature("name")),
    );
    let mut stream = MethodInfo::unary(request, reply);
    stream.server_streaming = true;
    b.method(greeter, "SayHelloStream", stream);

    let tree = b.build();

    // e.g. STORE_GEN_OPTIONS=format=false
    let param = std::env::var("STORE_GEN_OPTIONS").ok();
    let artifacts = protoc_gen_store::run(&tree, param.as_deref())?;
    tracing::info!(count = artifacts.len(), "generation complete");

    for artifact in artifacts {
        println!("// {}", artifact.name);
        println!("{}", artifact.content);
    }

    Ok(())
}

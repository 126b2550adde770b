//! Compiles the `conduit.v1` protobuf schema into Rust gRPC bindings.
//!
//! Uses the vendored `protoc` binary so the build does not depend on a
//! system-wide protobuf installation. Generated code lands in `OUT_DIR`
//! and is included via `tonic::include_proto!` in `src/pb.rs`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/conduit.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/conduit.proto");
    Ok(())
}

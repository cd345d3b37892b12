//! Builds the gRPC client and server code for `proto/snowman.proto`.
//!
//! The `id` field of `Snowflake` is generated as `bytes::Bytes` rather than
//! `Vec<u8>`, and a file descriptor set is written next to the generated
//! code so the server can expose gRPC reflection.
//!
//! Generated code is included with:
//!
//! ```rust,ignore
//! pub mod proto {
//!     tonic::include_proto!("snowman.v1");
//! }
//! ```
//!
//! # Panics
//!
//! Panics if code generation fails.

use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("snowman_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();

    config
        .bytes([".snowman.v1.Snowflake.id"])
        .file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/snowman.proto"], &["proto"])
        .unwrap();

    println!("cargo:rerun-if-changed=proto/snowman.proto");
}

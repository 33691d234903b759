//! Build Script for Watchlist Service
//!
//! Generates the `AssetService` gRPC server and client stubs. Message types
//! are hand-written prost structs in `src/infrastructure/grpc/proto.rs`, so
//! no `.proto` compiler is required.
//!
//! `tonic_build::manual` panics on failure, which halts the build.

use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic_prost::ProstCodec";

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("super::{input}"))
        .output_type(format!("super::{output}"))
        .codec_path(CODEC)
        .build()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let asset_service = Service::builder()
        .name("AssetService")
        .package("watchlist.v1")
        .comment("Quote lookup and watchlist management.")
        .method(unary(
            "get_asset_price",
            "GetAssetPrice",
            "AssetRequest",
            "AssetPriceResponse",
        ))
        .method(unary(
            "add_asset_to_watchlist",
            "AddAssetToWatchlist",
            "AssetRequest",
            "SuccessResponse",
        ))
        .method(unary("get_watchlist", "GetWatchlist", "Empty", "WatchlistResponse"))
        .build();

    // Client enabled for integration tests
    Builder::new()
        .build_client(true)
        .build_server(true)
        .compile(&[asset_service]);
}

//! Response compression layer.

use tower_http::compression::CompressionLayer;

/// Gzip responses for clients that accept it.
pub fn build_compression_layer() -> CompressionLayer {
    CompressionLayer::new().gzip(true)
}

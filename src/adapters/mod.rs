// Adapters layer: one `ProviderAdapter` per external source plus the shared
// HTTP plumbing (client, status classification, credentials).

pub mod auto_dev;
pub mod carquery;
pub mod http;
pub mod nhtsa;

pub use auto_dev::AutoDevAdapter;
pub use carquery::CarQueryAdapter;
pub use nhtsa::NhtsaAdapter;

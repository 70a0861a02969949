pub mod digest;
pub mod config;
pub mod io_stream;
pub mod store;
pub mod chain;
pub mod crypto;
pub mod cli;

pub use digest::{Digest, Hasher, HASH_LEN};
pub use config::{Options, DEFAULT_BLOCK_LEN};
pub use store::{BlockStore, FlatStore, ShardedStore, Framing, StoreKind};
pub use chain::{Chain, ChainReader, Trailer, Reconstructor, ChainSummary};
pub use crypto::{Cipher, Key, Decryptor, Encryptor};

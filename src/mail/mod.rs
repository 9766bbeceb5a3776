pub mod decoders;
pub mod headers;
pub mod imap_client;
pub mod transport;

//! OMF writer (C7/C8/C9): segment/record serialization, the super-record
//! packer, and ExpressLoad pre-segment synthesis. Consumes the
//! `sn_model::Segment`s produced by `sn-link`.

pub mod header;
pub mod push;
pub mod reloc_pack;
pub mod super_record;
pub mod writer;

pub use header::{ExpressEntry, OmfHeader};
pub use writer::{write_omf, WriteOptions};

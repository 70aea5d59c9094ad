//! roulette-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Ereignisse die zwischen Client und Server
//! ueber die persistente Verbindung ausgetauscht werden, sowie den
//! Frame-Codec (Laenge + JSON) fuer `tokio_util::codec::Framed`.

pub mod events;
pub mod wire;

pub use events::{ClientEvent, ErrorCode, ErrorResponse, ServerEvent};
pub use wire::{ClientCodec, FrameCodec, ServerCodec, ServerRohCodec};

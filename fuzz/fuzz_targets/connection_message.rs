//! Feed arbitrary bytes to a connection.
//!
//! Measurement requests are skipped so the target never walks the host
//! filesystem; every other path must return without panicking.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use pts_imc::{ConnectionState, ImcConfig};
use pts_proto::{Attribute, PaTncMessage};

fuzz_target!(|data: &[u8]| {
    let data = Bytes::copy_from_slice(data);
    if let Ok(message) = PaTncMessage::decode(data.clone()) {
        if message.attributes().iter().any(|a| matches!(a, Attribute::ReqFileMeas(_))) {
            return;
        }
    }

    let config = ImcConfig::default();
    let mut state = ConnectionState::new(1, &config);
    let _ = state.handle_message(data, &config);
});

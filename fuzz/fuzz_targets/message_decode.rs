//! Decode arbitrary bytes as a PA-TNC message.
//!
//! Anything that decodes must re-encode and decode to the same message.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use pts_proto::PaTncMessage;

fuzz_target!(|data: &[u8]| {
    let data = Bytes::copy_from_slice(data);
    if let Ok(message) = PaTncMessage::decode(data) {
        let encoded = message.encode().expect("decoded message re-encodes");
        let again = PaTncMessage::decode(encoded).expect("re-encoded message decodes");
        assert_eq!(again, message);
    }
});

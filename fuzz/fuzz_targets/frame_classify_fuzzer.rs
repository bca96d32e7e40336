//! Fuzz target for inbound frame classification
//!
//! Feeds arbitrary text to `classify` to find:
//! - Decoder panics on malformed JSON
//! - Sentinels leaking into the chat path
//! - Envelopes that decode but do not re-encode
//!
//! The fuzzer should NEVER panic. Invalid frames become `Unparsed`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wirechat_proto::{classify, decode_frame, encode_chat, AuthSignal, InboundFrame};

fuzz_target!(|text: &str| {
    match classify(text) {
        InboundFrame::Auth(signal) => {
            assert_eq!(AuthSignal::from_sentinel(text), Some(signal));
        }
        InboundFrame::Chat(message) => {
            assert!(AuthSignal::from_sentinel(text).is_none());

            // Whatever decodes must survive a trip through the encoder
            let encoded = encode_chat(&message).expect("decoded message encodes");
            let decoded = decode_frame(&encoded).expect("encoded message decodes");
            assert_eq!(decoded, message);
        }
        InboundFrame::Unparsed(failure) => {
            assert_eq!(failure.raw, text);
        }
    }
});

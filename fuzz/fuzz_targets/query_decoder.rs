#![no_main]

use compready::report::codec::{encode, parse_query_string};
use compready::settings::Settings;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(query) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(settings) = Settings::embedded() else {
        return;
    };
    let Ok(codec) = settings.codec() else {
        return;
    };

    // Decoding must never panic, and anything it accepts must survive a round trip
    if let Ok(config) = codec.decode(parse_query_string(query)) {
        let decoded = codec.decode(encode(&config));
        assert_eq!(decoded.as_ref(), Ok(&config));
    }
});

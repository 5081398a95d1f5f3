#![no_main]
use kafka_replay::transcoder::Decoder;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Decode arbitrary bytes as a container until it ends or fails
    let Ok(mut decoder) = Decoder::new(Cursor::new(data)) else {
        return;
    };
    let first = match decoder.read() {
        Ok(Some(entry)) => entry,
        Ok(None) | Err(_) => return,
    };
    for _ in 0..10_000 {
        match decoder.read() {
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        }
    }

    // Reset lands back on the first record
    decoder.reset().unwrap();
    assert_eq!(decoder.read().unwrap(), Some(first));
});

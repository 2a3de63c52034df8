#![no_main]

use std::convert::Infallible;

use futures_util::stream::iter;
use libfuzzer_sys::fuzz_target;
use partwise::bytes::Bytes;
use partwise::{reader_from_stream, ParseOptions, StreamingParser};
use tokio::runtime;

fuzz_target!(|data: &[u8]| {
    // Smallest buffer "X-BOUNDARY" allows, so boundaries straddle every read.
    let options = ParseOptions::new("X-BOUNDARY").buffer_size(17);
    let mut parser = StreamingParser::with_options(data, options).expect("valid options");

    let mut breaks = 0;
    while breaks < 3 {
        match parser.next_event() {
            Err(_) | Ok(None) => breaks += 1,
            Ok(Some(_)) => continue,
        }
    }

    let chunks = data
        .chunks(7)
        .map(|chunk| Result::<Bytes, Infallible>::Ok(Bytes::copy_from_slice(chunk)))
        .collect::<Vec<_>>();
    let mut parser = StreamingParser::new(reader_from_stream(iter(chunks)), "X-BOUNDARY").expect("valid options");

    let rt = runtime::Builder::new_current_thread().build().expect("runtime");
    rt.block_on(async {
        let mut breaks = 0;
        while breaks < 3 {
            match parser.next_event_async().await {
                Err(_) | Ok(None) => breaks += 1,
                Ok(Some(_)) => continue,
            }
        }
    })
});

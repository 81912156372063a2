#![no_main]

use lgh_git::LogParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Small line limit so the LineTooLong path is reached too
    let _ = LogParser::new().with_max_line_bytes(4096).parse_reader(data);
});

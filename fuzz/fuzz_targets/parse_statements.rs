#![no_main]

use libfuzzer_sys::fuzz_target;
use promptsql_core::parse_statements;

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        let _ = parse_statements(sql);
    }
});

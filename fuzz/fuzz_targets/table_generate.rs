#![no_main]

use capsgen::{generate, GenOptions, Mode, Table};
use libfuzzer_sys::fuzz_target;

// Arbitrary text must either fail cleanly or render a table whose leaf count matches its rows.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(table) = Table::parse(text) else {
        return;
    };
    for mode in [Mode::Decode, Mode::Encode, Mode::Vpp] {
        if let Ok(generated) = generate(mode, &table, &GenOptions::default()) {
            assert_eq!(generated.summary.rows, table.len());
            assert!(generated.text.ends_with("};\n"));
        }
    }
});

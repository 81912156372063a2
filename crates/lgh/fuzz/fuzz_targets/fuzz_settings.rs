#![no_main]

//! Fuzz target for the settings file
//!
//! Arbitrary text must either decode into `Settings` or fail cleanly, and a
//! decoded value must survive a save/load cycle through TOML.

use libfuzzer_sys::fuzz_target;

use lgh::config::Settings;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(settings) = toml::from_str::<Settings>(s) {
            let text = toml::to_string(&settings).expect("decoded settings re-encode");
            let back: Settings = toml::from_str(&text).expect("encoded settings decode");
            assert_eq!(back, settings);
        }
    }
});

#![no_main]

//! Arbitrary text must either parse into a config that builds a cache, or
//! fail with a ConfigError. It must never panic.

use libfuzzer_sys::fuzz_target;
use recall_core::config::Config;
use recall_core::shared::ConcurrentCache;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = Config::from_toml_str(text) {
        let cache = config
            .cache
            .build::<u8, u8>()
            .expect("validated config must build");
        assert_eq!(cache.capacity(), config.cache.capacity);
        assert_eq!(cache.backend(), config.cache.backend);
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = stepguard_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A valid config always yields a usable keymap
            assert!(!cfg.effective_keymap().is_empty());
        }
    }
    // Remote codes come from the same text in practice (inline keymaps, CLI)
    let _ = stepguard_config::parse_code(data);
});

mod api;
mod app;
mod components;
mod models;
mod pages;
mod session;
mod state;
mod storage;
mod util;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(app::App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::session::SessionGuard;
    use crate::storage;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_token_storage_roundtrip() {
        storage::clear_token();
        assert!(storage::load_token().is_none());

        storage::save_token("t1");
        assert_eq!(storage::load_token().as_deref(), Some("t1"));

        storage::clear_token();
        assert!(storage::load_token().is_none());
    }

    #[wasm_bindgen_test]
    fn test_session_load_discards_garbage_token() {
        storage::save_token("not-a-jwt");
        let guard = SessionGuard::load();
        assert!(!guard.is_valid());
        // The rejected token must not survive in storage either.
        assert!(storage::load_token().is_none());
    }
}

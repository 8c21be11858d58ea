//! Test fixtures: engines, spec file locations and generated scripts.

#![allow(dead_code)]

use jsrt::{Config, Engine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

/// Seed for generated identifiers, so failures reproduce.
pub const TEST_RANDOM_SEED: u64 = 0x5eed_0f_e7;

/// Engine with the default config.
pub fn engine() -> Engine {
    Engine::new()
}

/// Engine where specs without expectations pass.
pub fn engine_allowing_empty_specs() -> Engine {
    Engine::with_config(Config {
        fail_on_empty_specs: false,
        ..Config::default()
    })
}

/// Path of a file under the crate's `specs/` directory.
pub fn spec_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("specs")
        .join(name)
}

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(TEST_RANDOM_SEED)
}

/// A random identifier that is not a reserved word: a letter or `_`
/// followed by letters, digits, `_` and `$`.
pub fn random_identifier(rng: &mut StdRng) -> String {
    const HEAD: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
    const TAIL: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";
    let len = rng.gen_range(1..12);
    let mut name = String::with_capacity(len + 1);
    // The `q` prefix keeps generated names clear of keywords.
    name.push('q');
    name.push(HEAD[rng.gen_range(0..HEAD.len())] as char);
    for _ in 1..len {
        name.push(TAIL[rng.gen_range(0..TAIL.len())] as char);
    }
    name
}

/// `var <object> = {}; <object>.<property>.<method>();`
pub fn undefined_member_call(object: &str, property: &str, method: &str) -> String {
    format!(
        "var {o} = {{}}; {o}.{p}.{m}();",
        o = object,
        p = property,
        m = method
    )
}

/// The error-handling spec body with the call replaced by `body`.
pub fn error_spec_with_body(body: &str) -> String {
    format!(
        r#"
describe("calling a function on an undefined property of an object", function(){{
  it("should include the function name in the error message", function(){{
    {}
  }});
}});
"#,
        body
    )
}

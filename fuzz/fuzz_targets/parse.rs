#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    ministache::syntax::parse(input).ok();
});

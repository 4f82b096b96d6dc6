#![no_main]

use cilmeta::metadata::method::MethodBody;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = MethodBody::from(data);
    let _ = MethodBody::extent(|len| data.get(..len).ok_or(cilmeta::Error::OutOfBounds));
});

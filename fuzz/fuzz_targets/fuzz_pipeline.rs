#![no_main]

use libfuzzer_sys::fuzz_target;
use lumen_transform::{DataMap, Glsl, Manager};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let program = lumen_reader::parse(source);
        if !program.is_valid() {
            return;
        }
        let mut manager = Manager::new();
        if manager.add(Box::new(Glsl)).is_ok() {
            // Transforms may fail, but never panic.
            let _ = manager.run(program, DataMap::new());
        }
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use sim86_core::{classify, disassemble, run, SimConfig, Traversal};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let _ = classify(data);
    let _ = disassemble(data);

    let _ = run(data, &SimConfig::default());

    let config = SimConfig {
        traversal: Traversal::FollowIp,
        step_limit: Some(4_096),
        ..SimConfig::default()
    };
    let _ = run(data, &config);
});

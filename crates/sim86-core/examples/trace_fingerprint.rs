//! Deterministic trace fingerprint for cross-host comparison of run output.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use sim86_core::{run, SimConfig, Traversal};

/// Counts `cx` down from 5 while accumulating into `ax` and a memory word.
const PROGRAM: &[u8] = &[
    0xB9, 0x05, 0x00, // mov cx, 5
    0xBB, 0x00, 0x01, // mov bx, 256
    0x01, 0xC8, // add ax, cx
    0x01, 0x0F, // add [bx], cx
    0x83, 0xE9, 0x01, // sub cx, 1
    0x75, 0xF7, // jne $-7
    0x8B, 0x17, // mov dx, [bx]
];

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let config = SimConfig {
        traversal: Traversal::FollowIp,
        ..SimConfig::default()
    };
    let report = run(PROGRAM, &config).expect("program runs");

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for record in &report.records {
        hash_bytes(&mut hash, &record.instruction.bytes);
        hash_bytes(&mut hash, record.instruction.to_string().as_bytes());
        hash_bytes(&mut hash, &record.before.to_le_bytes());
        hash_bytes(&mut hash, &record.after.to_le_bytes());
        hash_bytes(&mut hash, &record.flags_after.bits().to_le_bytes());
        hash_bytes(&mut hash, &record.ip_after.to_le_bytes());
    }

    for (_, value) in report.final_registers() {
        hash_bytes(&mut hash, &value.to_le_bytes());
    }
    hash_bytes(&mut hash, &report.final_state.ip.to_le_bytes());
    hash_bytes(&mut hash, &report.final_state.flags.bits().to_le_bytes());
    hash_bytes(&mut hash, report.final_state.memory.as_slice());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}

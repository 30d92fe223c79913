//! Whole-stream scenarios through the public run API.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use sim86_core::{
    run, DecodeError, ErrorClass, Flag, FlagPolicy, Location, MemoryModel, Register, SimConfig,
    SimError, Simulator, Traversal,
};

#[test]
fn short_form_move_into_ax() {
    let report = run(&[0b1011_1000, 0b0000_0101, 0x00], &SimConfig::default()).expect("runs");
    assert_eq!(report.records.len(), 1);

    let record = &report.records[0];
    assert_eq!(record.instruction.to_string(), "mov ax, 5");
    assert_eq!(record.instruction.len(), 3);
    assert_eq!(
        record.instruction.source.as_ref().map(|s| s.location),
        Some(Location::Immediate(5))
    );
    assert_eq!(report.final_state.registers.get(Register::Ax), 0x0005);
}

#[test]
fn direct_address_never_uses_bp() {
    // mov bp, 0x0200; mov word [1000], 7; mov ax, [1000]
    let bytes = [
        0xBD, 0x00, 0x02, // mov bp, 512
        0xC7, 0x06, 0xE8, 0x03, 0x07, 0x00, // mov word [1000], 7
        0x8B, 0x06, 0xE8, 0x03, // mov ax, [1000]
    ];
    let report = run(&bytes, &SimConfig::default()).expect("runs");
    let texts: Vec<_> = report
        .records
        .iter()
        .map(|r| r.instruction.to_string())
        .collect();
    assert_eq!(texts, ["mov bp, 512", "mov word [1000], 7", "mov ax, [1000]"]);
    assert_eq!(report.records[2].instruction.len(), 4);
    assert_eq!(
        report.records[2].instruction.source.as_ref().map(|s| s.location),
        Some(Location::Memory(1000))
    );
    assert_eq!(report.final_state.memory.read_u16_le(1000), 7);
    assert_eq!(report.final_state.memory.read_u16_le(1000 + 512), 0);
    assert_eq!(report.final_state.registers.get(Register::Ax), 7);
}

#[test]
fn arithmetic_program_traces_destinations_and_flags() {
    let bytes = [
        0xBB, 0x03, 0xF0, // mov bx, -4093
        0xB9, 0x01, 0x0F, // mov cx, 3841
        0x29, 0xCB, // sub bx, cx
        0xBC, 0xE6, 0x03, // mov sp, 998
        0xBD, 0xE7, 0x03, // mov bp, 999
        0x39, 0xE5, // cmp bp, sp
        0x81, 0xC5, 0x03, 0x04, // add bp, 1027
        0x81, 0xED, 0xEA, 0x07, // sub bp, 2026
    ];
    let report = run(&bytes, &SimConfig::default()).expect("runs");
    assert_eq!(report.records.len(), 8);

    let sub = &report.records[2];
    assert_eq!(sub.instruction.to_string(), "sub bx, cx");
    assert_eq!((sub.before, sub.after), (0xF003, 0xE102));
    assert!(sub.flags_after.is_set(Flag::Sign));

    let cmp = &report.records[5];
    assert_eq!(cmp.instruction.to_string(), "cmp bp, sp");
    assert_eq!((cmp.before, cmp.after), (999, 999));
    assert!(!cmp.flags_after.is_set(Flag::Zero));
    assert!(!cmp.flags_after.is_set(Flag::Sign));

    let last = &report.records[7];
    assert_eq!(last.instruction.to_string(), "sub bp, 2026");
    assert_eq!(last.after, 0);
    assert!(last.flags_after.is_set(Flag::Zero));

    let registers = report.final_registers();
    assert_eq!(
        registers.map(|(register, _)| register),
        [
            Register::Ax,
            Register::Bx,
            Register::Cx,
            Register::Dx,
            Register::Sp,
            Register::Bp,
            Register::Si,
            Register::Di,
        ]
    );
    assert_eq!(registers[1].1, 0xE102);
    assert_eq!(registers[2].1, 0x0F01);
    assert_eq!(registers[4].1, 998);
    assert_eq!(registers[5].1, 0);
    assert_eq!(report.final_state.ip, 24);
}

#[test]
fn flag_policy_changes_jump_outcome() {
    // sub ax, ax (ZF=1); mov bx, 1; je $+5; mov cx, 9
    let bytes = [
        0x29, 0xC0, 0xBB, 0x01, 0x00, 0x74, 0x03, 0xB9, 0x09, 0x00,
    ];
    let follow = |flag_policy| SimConfig {
        flag_policy,
        traversal: Traversal::FollowIp,
        ..SimConfig::default()
    };

    let moves_clear_zf = run(&bytes, &follow(FlagPolicy::IncludeMoves)).expect("runs");
    assert_eq!(moves_clear_zf.final_state.registers.get(Register::Cx), 9);

    let moves_keep_zf = run(&bytes, &follow(FlagPolicy::ArithmeticOnly)).expect("runs");
    assert_eq!(moves_keep_zf.final_state.registers.get(Register::Cx), 0);
    assert_eq!(moves_keep_zf.records.len(), 3);
}

#[test]
fn inert_memory_keeps_addresses_but_no_storage() {
    let config = SimConfig {
        memory: MemoryModel::Inert,
        ..SimConfig::default()
    };
    // mov word [bx + 2], 5; add ax, [bx + 2]
    let report = run(&[0xC7, 0x47, 0x02, 0x05, 0x00, 0x03, 0x47, 0x02], &config).expect("runs");
    assert_eq!(
        report.records[0].instruction.destination.location,
        Location::Memory(2)
    );
    assert_eq!(report.final_state.registers.get(Register::Ax), 0);
}

#[test]
fn failing_instruction_aborts_with_annotation() {
    let err = run(&[0xB8, 0x01, 0x00, 0x8C, 0xC8], &SimConfig::default()).expect_err("mov r/m, sreg");
    match &err {
        SimError::Instruction { offset, bytes, source } => {
            assert_eq!(*offset, 3);
            assert_eq!(bytes, &[0x8C, 0xC8]);
            assert_eq!(source.class(), ErrorClass::UnknownOperation);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("8c c8"));
}

#[test]
fn stepping_exposes_state_between_instructions() {
    let mut sim = Simulator::new(vec![0xB0, 0x7F, 0x04, 0x01], SimConfig::default());

    let first = sim.step().expect("steps").expect("record");
    assert_eq!(first.instruction.to_string(), "mov al, 127");
    assert!(!sim.cpu().flags.is_set(Flag::Sign));

    let second = sim.step().expect("steps").expect("record");
    assert_eq!(second.instruction.to_string(), "add al, 1");
    assert_eq!(second.after, 0x80);
    assert!(sim.cpu().flags.is_set(Flag::Sign));

    assert!(sim.step().expect("steps").is_none());
}

#[test]
fn truncated_stream_reports_exhaustion() {
    let err = run(&[0x83, 0xC6], &SimConfig::default()).expect_err("missing immediate");
    assert_eq!(
        err.decode_error(),
        Some(&DecodeError::StreamExhausted {
            needed: 3,
            available: 2
        })
    );
}

//! SVE base64 kernel
//!
//! One trio (encode) or quartet (decode) per byte lane, so each iteration
//! handles VL of them. `ld3b`/`st4b` and `ld4b`/`st3b` de-interleave and
//! re-interleave the groups, which makes the byte shuffle implicit. A
//! `whilelo` predicate sizes the last iteration, so no scalar remainder loop
//! is needed inside the kernel.
//!
//! Rust has no SVE intrinsics; the loops are inline assembly. Each block
//! lists the z and p registers it writes as explicit clobbers, all of them
//! caller-saved (z0-z4, z16-z23, p0, p1).

use std::arch::asm;

/// Vector length in bytes.
///
/// # Safety
///
/// The CPU must support SVE.
#[target_feature(enable = "sve")]
pub(crate) unsafe fn vector_bytes() -> usize {
    let vl: usize;
    unsafe {
        asm!("cntb {vl}", vl = out(reg) vl, options(pure, nomem, nostack));
    }
    vl
}

/// Encodes every whole trio of `input`. Returns bytes consumed.
///
/// # Safety
///
/// The CPU must support SVE.
#[target_feature(enable = "sve")]
pub(crate) unsafe fn encode(input: &[u8], out: &mut [u8]) -> usize {
    let trios = (input.len() / 3).min(out.len() / 4);
    if trios == 0 {
        return 0;
    }

    // z0-z2: input bytes b0, b1, b2 of each trio
    // z16-z19: sextets
    // z20-z23: characters
    // p0: active trios, p1: range masks
    unsafe {
        asm!(
            "mov {i}, #0",
            "whilelo p0.b, {i}, {n}",
            "2:",
            "ld3b {{z0.b, z1.b, z2.b}}, p0/z, [{src}]",

            // s0 = b0 >> 2
            "lsr z16.b, z0.b, #2",
            // s1 = (b0 & 3) << 4 | b1 >> 4
            "lsl z17.b, z0.b, #4",
            "and z17.b, z17.b, #0x30",
            "lsr z4.b, z1.b, #4",
            "orr z17.d, z17.d, z4.d",
            // s2 = (b1 & 15) << 2 | b2 >> 6
            "lsl z18.b, z1.b, #2",
            "and z18.b, z18.b, #0x3c",
            "lsr z4.b, z2.b, #6",
            "orr z18.d, z18.d, z4.d",
            // s3 = b2 & 63
            "mov z19.d, z2.d",
            "and z19.b, z19.b, #0x3f",

            // Sextet -> ASCII: start at 'A' + s, then override per range.
            "mov z20.d, z16.d",
            "add z20.b, z20.b, #65",
            "cmphs p1.b, p0/z, z16.b, #26",
            "mov z4.d, z16.d",
            "add z4.b, z4.b, #71",
            "mov z20.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z16.b, #52",
            "mov z4.d, z16.d",
            "sub z4.b, z4.b, #4",
            "mov z20.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z16.b, #62",
            "mov z20.b, p1/m, #43",
            "cmphs p1.b, p0/z, z16.b, #63",
            "mov z20.b, p1/m, #47",

            "mov z21.d, z17.d",
            "add z21.b, z21.b, #65",
            "cmphs p1.b, p0/z, z17.b, #26",
            "mov z4.d, z17.d",
            "add z4.b, z4.b, #71",
            "mov z21.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z17.b, #52",
            "mov z4.d, z17.d",
            "sub z4.b, z4.b, #4",
            "mov z21.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z17.b, #62",
            "mov z21.b, p1/m, #43",
            "cmphs p1.b, p0/z, z17.b, #63",
            "mov z21.b, p1/m, #47",

            "mov z22.d, z18.d",
            "add z22.b, z22.b, #65",
            "cmphs p1.b, p0/z, z18.b, #26",
            "mov z4.d, z18.d",
            "add z4.b, z4.b, #71",
            "mov z22.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z18.b, #52",
            "mov z4.d, z18.d",
            "sub z4.b, z4.b, #4",
            "mov z22.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z18.b, #62",
            "mov z22.b, p1/m, #43",
            "cmphs p1.b, p0/z, z18.b, #63",
            "mov z22.b, p1/m, #47",

            "mov z23.d, z19.d",
            "add z23.b, z23.b, #65",
            "cmphs p1.b, p0/z, z19.b, #26",
            "mov z4.d, z19.d",
            "add z4.b, z4.b, #71",
            "mov z23.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z19.b, #52",
            "mov z4.d, z19.d",
            "sub z4.b, z4.b, #4",
            "mov z23.b, p1/m, z4.b",
            "cmphs p1.b, p0/z, z19.b, #62",
            "mov z23.b, p1/m, #43",
            "cmphs p1.b, p0/z, z19.b, #63",
            "mov z23.b, p1/m, #47",

            "st4b {{z20.b, z21.b, z22.b, z23.b}}, p0, [{dst}]",
            "incb {i}",
            "addvl {src}, {src}, #3",
            "addvl {dst}, {dst}, #4",
            "whilelo p0.b, {i}, {n}",
            "b.mi 2b",
            i = out(reg) _,
            n = in(reg) trios,
            src = inout(reg) input.as_ptr() => _,
            dst = inout(reg) out.as_mut_ptr() => _,
            out("v0") _, out("v1") _, out("v2") _, out("v3") _, out("v4") _,
            out("v16") _, out("v17") _, out("v18") _, out("v19") _,
            out("v20") _, out("v21") _, out("v22") _, out("v23") _,
            out("p0") _, out("p1") _,
            options(nostack),
        );
    }

    trios * 3
}

/// Decodes quartets until one holds padding or a character outside the
/// alphabet. Returns characters consumed.
///
/// An iteration with any bad lane stores nothing, so the count stops at that
/// iteration's first quartet.
///
/// # Safety
///
/// The CPU must support SVE.
#[target_feature(enable = "sve")]
pub(crate) unsafe fn decode(input: &[u8], out: &mut [u8]) -> usize {
    let quartets = (input.len() / 4).min(out.len() / 3);
    if quartets == 0 {
        return 0;
    }

    let decoded: usize;

    // z0-z3: characters c0..c3 of each quartet
    // z16-z19: sextets, 0xFF for anything outside the alphabet
    // z20-z22: output bytes
    // p0: active quartets, p1: range masks
    unsafe {
        asm!(
            "mov {i}, #0",
            "whilelo p0.b, {i}, {n}",
            "2:",
            "ld4b {{z0.b, z1.b, z2.b, z3.b}}, p0/z, [{src}]",

            "mov z16.b, #-1",
            "mov z4.d, z0.d",
            "sub z4.b, z4.b, #65",
            "cmplo p1.b, p0/z, z4.b, #26",
            "mov z16.b, p1/m, z4.b",
            "mov z4.d, z0.d",
            "sub z4.b, z4.b, #97",
            "cmplo p1.b, p0/z, z4.b, #26",
            "add z4.b, z4.b, #26",
            "mov z16.b, p1/m, z4.b",
            "mov z4.d, z0.d",
            "sub z4.b, z4.b, #48",
            "cmplo p1.b, p0/z, z4.b, #10",
            "add z4.b, z4.b, #52",
            "mov z16.b, p1/m, z4.b",
            "mov z4.d, z0.d",
            "sub z4.b, z4.b, #43",
            "cmpeq p1.b, p0/z, z4.b, #0",
            "mov z16.b, p1/m, #62",
            "cmpeq p1.b, p0/z, z4.b, #4",
            "mov z16.b, p1/m, #63",

            "mov z17.b, #-1",
            "mov z4.d, z1.d",
            "sub z4.b, z4.b, #65",
            "cmplo p1.b, p0/z, z4.b, #26",
            "mov z17.b, p1/m, z4.b",
            "mov z4.d, z1.d",
            "sub z4.b, z4.b, #97",
            "cmplo p1.b, p0/z, z4.b, #26",
            "add z4.b, z4.b, #26",
            "mov z17.b, p1/m, z4.b",
            "mov z4.d, z1.d",
            "sub z4.b, z4.b, #48",
            "cmplo p1.b, p0/z, z4.b, #10",
            "add z4.b, z4.b, #52",
            "mov z17.b, p1/m, z4.b",
            "mov z4.d, z1.d",
            "sub z4.b, z4.b, #43",
            "cmpeq p1.b, p0/z, z4.b, #0",
            "mov z17.b, p1/m, #62",
            "cmpeq p1.b, p0/z, z4.b, #4",
            "mov z17.b, p1/m, #63",

            "mov z18.b, #-1",
            "mov z4.d, z2.d",
            "sub z4.b, z4.b, #65",
            "cmplo p1.b, p0/z, z4.b, #26",
            "mov z18.b, p1/m, z4.b",
            "mov z4.d, z2.d",
            "sub z4.b, z4.b, #97",
            "cmplo p1.b, p0/z, z4.b, #26",
            "add z4.b, z4.b, #26",
            "mov z18.b, p1/m, z4.b",
            "mov z4.d, z2.d",
            "sub z4.b, z4.b, #48",
            "cmplo p1.b, p0/z, z4.b, #10",
            "add z4.b, z4.b, #52",
            "mov z18.b, p1/m, z4.b",
            "mov z4.d, z2.d",
            "sub z4.b, z4.b, #43",
            "cmpeq p1.b, p0/z, z4.b, #0",
            "mov z18.b, p1/m, #62",
            "cmpeq p1.b, p0/z, z4.b, #4",
            "mov z18.b, p1/m, #63",

            "mov z19.b, #-1",
            "mov z4.d, z3.d",
            "sub z4.b, z4.b, #65",
            "cmplo p1.b, p0/z, z4.b, #26",
            "mov z19.b, p1/m, z4.b",
            "mov z4.d, z3.d",
            "sub z4.b, z4.b, #97",
            "cmplo p1.b, p0/z, z4.b, #26",
            "add z4.b, z4.b, #26",
            "mov z19.b, p1/m, z4.b",
            "mov z4.d, z3.d",
            "sub z4.b, z4.b, #48",
            "cmplo p1.b, p0/z, z4.b, #10",
            "add z4.b, z4.b, #52",
            "mov z19.b, p1/m, z4.b",
            "mov z4.d, z3.d",
            "sub z4.b, z4.b, #43",
            "cmpeq p1.b, p0/z, z4.b, #0",
            "mov z19.b, p1/m, #62",
            "cmpeq p1.b, p0/z, z4.b, #4",
            "mov z19.b, p1/m, #63",

            // Any active lane >= 64 aborts before this iteration stores.
            "orr z4.d, z16.d, z17.d",
            "orr z4.d, z4.d, z18.d",
            "orr z4.d, z4.d, z19.d",
            "cmphs p1.b, p0/z, z4.b, #64",
            "b.ne 3f",

            // o0 = s0 << 2 | s1 >> 4
            "lsl z20.b, z16.b, #2",
            "lsr z4.b, z17.b, #4",
            "orr z20.d, z20.d, z4.d",
            // o1 = s1 << 4 | s2 >> 2
            "lsl z21.b, z17.b, #4",
            "lsr z4.b, z18.b, #2",
            "orr z21.d, z21.d, z4.d",
            // o2 = s2 << 6 | s3
            "lsl z22.b, z18.b, #6",
            "orr z22.d, z22.d, z19.d",

            "st3b {{z20.b, z21.b, z22.b}}, p0, [{dst}]",
            "incb {i}",
            "addvl {src}, {src}, #4",
            "addvl {dst}, {dst}, #3",
            "whilelo p0.b, {i}, {n}",
            "b.mi 2b",
            "mov {i}, {n}",
            "3:",
            i = out(reg) decoded,
            n = in(reg) quartets,
            src = inout(reg) input.as_ptr() => _,
            dst = inout(reg) out.as_mut_ptr() => _,
            out("v0") _, out("v1") _, out("v2") _, out("v3") _, out("v4") _,
            out("v16") _, out("v17") _, out("v18") _, out("v19") _,
            out("v20") _, out("v21") _, out("v22") _, out("v23") _,
            out("p0") _, out("p1") _,
            options(nostack),
        );
    }

    decoded * 4
}

use std::fmt::Write;

use cgen_ast::NumType;

use crate::tables::c_num_type;

const NUM_TYPES: [NumType; 8] = [
    NumType::U8,
    NumType::U16,
    NumType::U32,
    NumType::U64,
    NumType::I8,
    NumType::I16,
    NumType::I32,
    NumType::I64,
];

pub(super) fn gen_slice_helpers() -> String {
    r"/* Slices and tables; out-of-range requests yield an empty slice */
static inline cgen_base__slice_u8 cgen_base__make_slice_u8(uint8_t* ptr, size_t len) {
    cgen_base__slice_u8 ret;
    ret.ptr = ptr;
    ret.len = len;
    return ret;
}

static inline cgen_base__slice_u8 cgen_base__slice_u8__subslice_i(cgen_base__slice_u8 s, uint64_t i) {
    if ((i <= SIZE_MAX) && (i <= s.len)) {
        return cgen_base__make_slice_u8(s.ptr + i, s.len - ((size_t)i));
    }
    return cgen_base__make_slice_u8(NULL, 0);
}

static inline cgen_base__slice_u8 cgen_base__slice_u8__subslice_j(cgen_base__slice_u8 s, uint64_t j) {
    if ((j <= SIZE_MAX) && (j <= s.len)) {
        return cgen_base__make_slice_u8(s.ptr, ((size_t)j));
    }
    return cgen_base__make_slice_u8(NULL, 0);
}

static inline cgen_base__slice_u8 cgen_base__slice_u8__subslice_ij(cgen_base__slice_u8 s, uint64_t i, uint64_t j) {
    if ((i <= j) && (j <= SIZE_MAX) && (j <= s.len)) {
        return cgen_base__make_slice_u8(s.ptr + i, ((size_t)(j - i)));
    }
    return cgen_base__make_slice_u8(NULL, 0);
}

static inline cgen_base__slice_u8 cgen_base__slice_u8__suffix(cgen_base__slice_u8 s, uint64_t up_to) {
    if ((uint64_t)(s.len) > up_to) {
        return cgen_base__make_slice_u8(s.ptr + (s.len - ((size_t)up_to)), ((size_t)up_to));
    }
    return s;
}

static inline cgen_base__slice_u8 cgen_base__slice_u8__prefix(cgen_base__slice_u8 s, uint64_t up_to) {
    if ((uint64_t)(s.len) > up_to) {
        return cgen_base__make_slice_u8(s.ptr, ((size_t)up_to));
    }
    return s;
}

/* Copies min(dst.len, src.len) bytes; the ranges may overlap */
static inline uint64_t cgen_base__slice_u8__copy_from_slice(cgen_base__slice_u8 dst, cgen_base__slice_u8 src) {
    size_t n = dst.len < src.len ? dst.len : src.len;
    if (n > 0) {
        memmove(dst.ptr, src.ptr, n);
    }
    return (uint64_t)n;
}

static inline cgen_base__slice_u8 cgen_base__table_u8__row(cgen_base__table_u8 t, uint64_t y) {
    if (t.ptr && (y < (uint64_t)(t.height))) {
        return cgen_base__make_slice_u8(t.ptr + (t.stride * ((size_t)y)), t.width);
    }
    return cgen_base__make_slice_u8(NULL, 0);
}

"
    .to_string()
}

/// `cgen_base__load_u{N}{be,le}` and `cgen_base__store_u{N}{be,le}` for
/// every byte width up to 8.
pub(super) fn gen_load_store() -> String {
    let mut s = String::from("/* Unaligned loads and stores */\n");
    for bytes in 1..=8u32 {
        let bits = bytes * 8;
        let ty = c_num_type(NumType::unsigned_for_bits(bits));
        for (suffix, big) in [("be", true), ("le", false)] {
            let shift = |i: u32| if big { 8 * (bytes - 1 - i) } else { 8 * i };
            let terms: Vec<String> = (0..bytes)
                .map(|i| format!("(({ty})(p[{i}]) << {})", shift(i)))
                .collect();
            let _ = writeln!(
                s,
                "static inline {ty} cgen_base__load_u{bits}{suffix}(const uint8_t* p) {{\n    return {};\n}}\n",
                terms.join(" | ")
            );
            let _ = writeln!(
                s,
                "static inline void cgen_base__store_u{bits}{suffix}(uint8_t* p, {ty} x) {{"
            );
            for i in 0..bytes {
                let _ = writeln!(s, "    p[{i}] = (uint8_t)(x >> {});", shift(i));
            }
            s.push_str("}\n\n");
        }
    }
    s
}

pub(super) fn gen_min_max() -> String {
    let mut s = String::from("/* Numeric helpers */\n");
    for n in NUM_TYPES {
        let ty = c_num_type(n);
        for (name, op) in [("min", '<'), ("max", '>')] {
            let _ = writeln!(
                s,
                "static inline {ty} cgen_base__{n}__{name}({ty} x, {ty} y) {{\n    return x {op} y ? x : y;\n}}\n"
            );
        }
        if !n.is_signed() {
            let max = format!("UINT{}_MAX", n.bits());
            let _ = writeln!(
                s,
                "static inline {ty} cgen_base__{n}__sat_add({ty} x, {ty} y) {{\n    {ty} r = ({ty})(x + y);\n    return r < x ? {max} : r;\n}}\n"
            );
        }
    }
    s
}

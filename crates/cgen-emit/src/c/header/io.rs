use std::fmt::Write;

/// Mark, position and limit helpers shared by readers and writers.
pub(super) fn gen_cursor_helpers() -> String {
    let mut s = String::from("/* Cursor helpers */\n");
    for kind in ["reader", "writer"] {
        let _ = write!(
            s,
            r"static inline cgen_base__empty_struct cgen_base__io_{kind}__set_mark(cgen_base__io_{kind}* o, uint8_t* mark) {{
    o->private_impl.mark = mark;
    return cgen_base__return_empty_struct();
}}

static inline cgen_base__slice_u8 cgen_base__io_{kind}__since_mark(cgen_base__io_{kind}* o, uint8_t* iop) {{
    uint8_t* mark = o->private_impl.mark;
    if (mark && (mark <= iop)) {{
        return cgen_base__make_slice_u8(mark, (size_t)(iop - mark));
    }}
    return cgen_base__make_slice_u8(NULL, 0);
}}

static inline uint64_t cgen_base__io_{kind}__position(cgen_base__io_{kind}* o, uint8_t* iop) {{
    cgen_base__io_buffer* buf = o->private_impl.buf;
    if (!buf || !iop) {{
        return 0;
    }}
    return buf->meta.pos + ((uint64_t)(iop - buf->data.ptr));
}}

/* Returns the new end of the usable range */
static inline uint8_t* cgen_base__io_{kind}__set_limit(cgen_base__io_{kind}* o, uint8_t* iop, uint8_t* io1, uint64_t limit) {{
    if (iop && (((uint64_t)(io1 - iop)) > limit)) {{
        io1 = iop + limit;
    }}
    o->private_impl.limit = io1;
    return io1;
}}

"
        );
    }
    s
}

/// Bulk copies into a writer. Each returns the number of bytes copied and
/// advances the cursor(s) it was given.
pub(super) fn gen_writer_copies() -> String {
    r"/* Writer copies */
static inline uint32_t cgen_base__io_writer__copy_n_from_history(uint8_t** ptr_iop, uint8_t* io0, uint8_t* io1, uint32_t length, uint32_t distance) {
    uint8_t* p = *ptr_iop;
    if (!distance || ((size_t)(p - io0) < (size_t)distance)) {
        return 0;
    }
    uint8_t* q = p - distance;
    size_t n = (size_t)(io1 - p);
    if ((size_t)length > n) {
        length = (uint32_t)n;
    } else {
        n = (size_t)length;
    }
    /* Byte at a time: source and destination may overlap */
    for (; n > 0; n--) {
        *p++ = *q++;
    }
    *ptr_iop = p;
    return length;
}

/* Caller guarantees distance and length are in range */
static inline uint32_t cgen_base__io_writer__copy_n_from_history_fast(uint8_t** ptr_iop, uint8_t* io0, uint8_t* io1, uint32_t length, uint32_t distance) {
    (void)io0;
    (void)io1;
    uint8_t* p = *ptr_iop;
    uint8_t* q = p - distance;
    for (uint32_t n = length; n > 0; n--) {
        *p++ = *q++;
    }
    *ptr_iop = p;
    return length;
}

static inline uint32_t cgen_base__io_writer__copy_n_from_reader(uint8_t** ptr_iop_w, uint8_t* io1_w, uint32_t length, uint8_t** ptr_iop_r, uint8_t* io1_r) {
    uint8_t* w = *ptr_iop_w;
    uint8_t* r = *ptr_iop_r;
    size_t n = length;
    if (n > (size_t)(io1_w - w)) {
        n = (size_t)(io1_w - w);
    }
    if (n > (size_t)(io1_r - r)) {
        n = (size_t)(io1_r - r);
    }
    if (n > 0) {
        memmove(w, r, n);
        *ptr_iop_w += n;
        *ptr_iop_r += n;
    }
    return (uint32_t)n;
}

static inline uint64_t cgen_base__io_writer__copy_from_slice(uint8_t** ptr_iop, uint8_t* io1, cgen_base__slice_u8 src) {
    uint8_t* w = *ptr_iop;
    size_t n = src.len;
    if (n > (size_t)(io1 - w)) {
        n = (size_t)(io1 - w);
    }
    if (n > 0) {
        memmove(w, src.ptr, n);
        *ptr_iop += n;
    }
    return (uint64_t)n;
}

static inline uint32_t cgen_base__io_writer__copy_n_from_slice(uint8_t** ptr_iop, uint8_t* io1, uint32_t length, cgen_base__slice_u8 src) {
    if ((size_t)length < src.len) {
        src.len = length;
    }
    return (uint32_t)cgen_base__io_writer__copy_from_slice(ptr_iop, io1, src);
}

"
    .to_string()
}

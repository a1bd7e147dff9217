use crate::config::EmitConfig;

pub(super) fn gen_includes_and_constants(cfg: &EmitConfig) -> String {
    format!(
        r"#include <stdbool.h>
#include <stddef.h>
#include <stdint.h>
#include <string.h>

/* Version token checked by every constructor */
#define CGEN_VERSION ((uint32_t){version:#010x})

/* Initialization guard values */
#define CGEN_BASE__MAGIC ((uint32_t)0x3CCB6C71)
#define CGEN_BASE__ALREADY_ZEROED ((uint32_t)0x68602EF1)

/* Branch prediction hints */
#if defined(__GNUC__)
#define CGEN_BASE__LIKELY(expr) (__builtin_expect(!!(expr), 1))
#define CGEN_BASE__UNLIKELY(expr) (__builtin_expect(!!(expr), 0))
#else
#define CGEN_BASE__LIKELY(expr) (expr)
#define CGEN_BASE__UNLIKELY(expr) (expr)
#endif

",
        version = cfg.version,
    )
}

pub(super) fn gen_types() -> String {
    r"/* Value of calls that produce nothing */
typedef struct {
    uint8_t private_unused;
} cgen_base__empty_struct;

static inline cgen_base__empty_struct cgen_base__return_empty_struct(void) {
    cgen_base__empty_struct ret;
    ret.private_unused = 0;
    return ret;
}

typedef struct {
    uint8_t* ptr;
    size_t len;
} cgen_base__slice_u8;

typedef struct {
    uint8_t* ptr;
    size_t width;
    size_t height;
    size_t stride;
} cgen_base__table_u8;

/* Caller-owned byte buffer: data[ri:wi] is readable, data[wi:len] writable */
typedef struct {
    cgen_base__slice_u8 data;
    struct {
        size_t wi;
        size_t ri;
        uint64_t pos;
        bool closed;
    } meta;
} cgen_base__io_buffer;

typedef struct {
    struct {
        cgen_base__io_buffer* buf;
        uint8_t* mark;
        uint8_t* limit;
    } private_impl;
} cgen_base__io_reader;

typedef struct {
    struct {
        cgen_base__io_buffer* buf;
        uint8_t* mark;
        uint8_t* limit;
    } private_impl;
} cgen_base__io_writer;

static inline cgen_base__io_reader cgen_base__io_buffer__reader(cgen_base__io_buffer* buf) {
    cgen_base__io_reader ret;
    ret.private_impl.buf = buf;
    ret.private_impl.mark = NULL;
    ret.private_impl.limit = NULL;
    return ret;
}

static inline cgen_base__io_writer cgen_base__io_buffer__writer(cgen_base__io_buffer* buf) {
    cgen_base__io_writer ret;
    ret.private_impl.buf = buf;
    ret.private_impl.mark = NULL;
    ret.private_impl.limit = NULL;
    return ret;
}

typedef struct {
    struct {
        uint32_t pixfmt;
        uint32_t pixsub;
        uint32_t width;
        uint32_t height;
        uint64_t first_frame_io_position;
        bool first_frame_is_opaque;
    } private_impl;
} cgen_base__image_config;

static inline cgen_base__empty_struct cgen_base__image_config__initialize(
    cgen_base__image_config* c, uint32_t pixfmt, uint32_t pixsub, uint32_t width,
    uint32_t height, uint64_t first_frame_io_position, bool first_frame_is_opaque) {
    if (c) {
        c->private_impl.pixfmt = pixfmt;
        c->private_impl.pixsub = pixsub;
        c->private_impl.width = width;
        c->private_impl.height = height;
        c->private_impl.first_frame_io_position = first_frame_io_position;
        c->private_impl.first_frame_is_opaque = first_frame_is_opaque;
    }
    return cgen_base__return_empty_struct();
}

"
    .to_string()
}

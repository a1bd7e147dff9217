use cgen_ast::{
    Arg, AssignOp, AssocOp, BinaryOp, Expr, Field, FuncBuilder, NumType, Package, Stmt,
    StructDecl, TypeExpr, UnaryOp,
};

use super::*;
use crate::config::EmitConfig;

fn demo_pkg() -> Package {
    let mut pkg = Package::new("demo");
    pkg.structs.push(
        StructDecl::new("decoder")
            .public()
            .suspendible()
            .field(Field::new("width", TypeExpr::u32())),
    );
    pkg.funcs.push(
        FuncBuilder::method("decoder", "inner")
            .suspendible()
            .param("src", TypeExpr::reader())
            .build(),
    );
    pkg
}

fn render(e: &Expr) -> String {
    let config = EmitConfig::default();
    let pkg = demo_pkg();
    let emitter = CEmitter::new(&config, &pkg);
    emitter.render_expr(e, &mut Substitutions::new(), 0).unwrap()
}

fn render_fn(pkg: &Package, func: &Func) -> Result<FuncOutput> {
    let config = EmitConfig::default();
    let mut emitter = CEmitter::new(&config, pkg);
    emitter.render_func(func)
}

fn var(name: &str, typ: TypeExpr) -> Expr {
    Expr::ident(name, typ)
}

fn call(recv: Expr, method: &str, args: Vec<Arg>, out: TypeExpr) -> Expr {
    Expr::call(recv, method, args, out)
}

fn src() -> Expr {
    Expr::arg("src", TypeExpr::reader())
}

fn dst() -> Expr {
    Expr::arg("dst", TypeExpr::writer())
}

fn read_u8() -> Expr {
    call(src(), "read_u8", vec![], TypeExpr::u8())
}

#[test]
fn test_render_literals() {
    assert_eq!(render(&Expr::lit(5, TypeExpr::u32())), "5");
    assert_eq!(render(&Expr::lit(-1, TypeExpr::num(NumType::I32))), "(-1)");
    assert_eq!(render(&Expr::lit(0xFFFF_FFFF, TypeExpr::u32())), "4294967295u");
    assert_eq!(
        render(&Expr::lit(i128::from(u64::MAX), TypeExpr::u64())),
        "18446744073709551615ull"
    );
    assert_eq!(
        render(&Expr::lit(i128::from(i64::MIN), TypeExpr::num(NumType::I64))),
        "(-9223372036854775807ll - 1)"
    );
    assert_eq!(
        render(&Expr::lit(-5_000_000_000, TypeExpr::num(NumType::I64))),
        "(-5000000000ll)"
    );
    assert_eq!(render(&Expr::bool_lit(true)), "true");
    assert_eq!(render(&Expr::bool_lit(false)), "false");
}

#[test]
fn test_render_constant_folds_subtree() {
    // A folded constant wins over its structure.
    let e = Expr::add(var("a", TypeExpr::u32()), var("b", TypeExpr::u32())).with_const(12);
    assert_eq!(render(&e), "12");
}

#[test]
fn test_render_names() {
    assert_eq!(render(&var("x", TypeExpr::u32())), "v_x");
    assert_eq!(render(&Expr::arg("n", TypeExpr::u32())), "a_n");
    assert_eq!(render(&Expr::this("decoder")), "self");
    assert_eq!(
        render(&Expr::field(Expr::this("decoder"), "width", TypeExpr::u32())),
        "self->f_width"
    );
    let inner = var("cfg", TypeExpr::strukt("decoder"));
    assert_eq!(render(&Expr::field(inner, "width", TypeExpr::u32())), "v_cfg.f_width");
}

#[test]
fn test_render_operators() {
    let a32 = || var("a", TypeExpr::u32());
    let b32 = || var("b", TypeExpr::u32());
    assert_eq!(render(&Expr::add(a32(), b32())), "(v_a + v_b)");
    assert_eq!(render(&Expr::binary(BinaryOp::Lt, a32(), b32())), "(v_a < v_b)");
    assert_eq!(render(&Expr::binary(BinaryOp::AndNot, a32(), b32())), "(v_a & ~v_b)");
    assert_eq!(
        render(&Expr::unary(UnaryOp::Not, var("d", TypeExpr::bool()))),
        "(!v_d)"
    );
    assert_eq!(
        render(&Expr::assoc(AssocOp::Add, vec![a32(), b32(), var("c", TypeExpr::u32())])),
        "((v_a + v_b) + v_c)"
    );
    assert_eq!(
        render(&Expr::cast(var("a", TypeExpr::u8()), TypeExpr::u32())),
        "((uint32_t)(v_a))"
    );
}

#[test]
fn test_render_narrows_small_arithmetic() {
    let a = || var("a", TypeExpr::u8());
    let b = || var("b", TypeExpr::u8());
    assert_eq!(render(&Expr::add(a(), b())), "((uint8_t)(v_a + v_b))");
    assert_eq!(render(&Expr::unary(UnaryOp::Complement, a())), "((uint8_t)(~v_a))");
    assert_eq!(
        render(&Expr::unary(UnaryOp::Minus, var("s", TypeExpr::num(NumType::I16)))),
        "((int16_t)(-v_s))"
    );
    // Comparisons are not narrowed.
    assert_eq!(render(&Expr::binary(BinaryOp::Eq, a(), b())), "(v_a == v_b)");
}

#[test]
fn test_render_index_and_slice() {
    let s = || var("s", TypeExpr::slice_u8());
    let arr = || var("buf", TypeExpr::array(16, TypeExpr::u8()));
    let i = || var("i", TypeExpr::u64());
    let j = || var("j", TypeExpr::u64());
    assert_eq!(render(&Expr::index(s(), i())), "v_s.ptr[v_i]");
    assert_eq!(render(&Expr::index(arr(), i())), "v_buf[v_i]");
    assert_eq!(
        render(&Expr::slice(s(), Some(i()), Some(j()))),
        "cgen_base__slice_u8__subslice_ij(v_s, v_i, v_j)"
    );
    assert_eq!(
        render(&Expr::slice(s(), Some(i()), None)),
        "cgen_base__slice_u8__subslice_i(v_s, v_i)"
    );
    assert_eq!(
        render(&Expr::slice(arr(), None, Some(j()))),
        "cgen_base__slice_u8__subslice_j(cgen_base__make_slice_u8(v_buf, 16), v_j)"
    );
    assert_eq!(render(&Expr::slice(s(), None, None)), "v_s");
}

#[test]
fn test_render_numeric_builtins() {
    let x8 = || var("x", TypeExpr::u8());
    let n = || vec![Arg::new("n", Expr::lit(3, TypeExpr::u32()))];
    assert_eq!(
        render(&call(x8(), "low_bits", n(), TypeExpr::u8())),
        "((v_x) & ((1 << (3)) - 1))"
    );
    assert_eq!(
        render(&call(var("x", TypeExpr::u64()), "low_bits", n(), TypeExpr::u64())),
        "((v_x) & ((((uint64_t)1) << (3)) - 1))"
    );
    assert_eq!(
        render(&call(x8(), "high_bits", n(), TypeExpr::u8())),
        "((v_x) >> (8 - (3)))"
    );
    let y = vec![Arg::new("a", var("y", TypeExpr::u32()))];
    assert_eq!(
        render(&call(var("x", TypeExpr::u32()), "max", y.clone(), TypeExpr::u32())),
        "cgen_base__u32__max(v_x, v_y)"
    );
    assert_eq!(
        render(&call(var("x", TypeExpr::u32()), "min", y, TypeExpr::u32())),
        "cgen_base__u32__min(v_x, v_y)"
    );
}

#[test]
fn test_render_slice_and_table_builtins() {
    let s = || var("s", TypeExpr::slice_u8());
    let t = || var("t", TypeExpr::table_u8());
    let n = || vec![Arg::new("n", var("n", TypeExpr::u64()))];
    assert_eq!(render(&call(s(), "length", vec![], TypeExpr::u64())), "((uint64_t)(v_s.len))");
    assert_eq!(
        render(&call(s(), "suffix", n(), TypeExpr::slice_u8())),
        "cgen_base__slice_u8__suffix(v_s, v_n)"
    );
    assert_eq!(
        render(&call(s(), "prefix", n(), TypeExpr::slice_u8())),
        "cgen_base__slice_u8__prefix(v_s, v_n)"
    );
    assert_eq!(
        render(&call(
            s(),
            "copy_from_slice",
            vec![Arg::new("s", var("o", TypeExpr::slice_u8()))],
            TypeExpr::u64()
        )),
        "cgen_base__slice_u8__copy_from_slice(v_s, v_o)"
    );
    assert_eq!(render(&call(t(), "height", vec![], TypeExpr::u64())), "((uint64_t)(v_t.height))");
    assert_eq!(render(&call(t(), "width", vec![], TypeExpr::u64())), "((uint64_t)(v_t.width))");
    assert_eq!(render(&call(t(), "stride", vec![], TypeExpr::u64())), "((uint64_t)(v_t.stride))");
    assert_eq!(
        render(&call(t(), "row", n(), TypeExpr::slice_u8())),
        "cgen_base__table_u8__row(v_t, v_n)"
    );
}

#[test]
fn test_render_reader_builtins() {
    let n = || vec![Arg::new("n", var("n", TypeExpr::u32()))];
    assert_eq!(
        render(&call(src(), "read_u32le", vec![], TypeExpr::u32()).in_bounds()),
        "(iop_a_src += 4, cgen_base__load_u32le(iop_a_src - 4))"
    );
    assert_eq!(
        render(&call(src(), "peek_u16be", vec![], TypeExpr::u16())),
        "cgen_base__load_u16be(iop_a_src)"
    );
    assert_eq!(
        render(&call(src(), "skip_fast", n(), TypeExpr::empty())),
        "(iop_a_src += v_n, cgen_base__return_empty_struct())"
    );
    assert_eq!(
        render(&call(src(), "undo_byte", vec![], TypeExpr::empty())),
        "(iop_a_src--, cgen_base__return_empty_struct())"
    );
    assert_eq!(
        render(&call(src(), "can_undo_byte", vec![], TypeExpr::bool())),
        "(iop_a_src > io0_a_src)"
    );
    assert_eq!(
        render(&call(src(), "available", vec![], TypeExpr::u64())),
        "((uint64_t)(io1_a_src - iop_a_src))"
    );
    assert_eq!(
        render(&call(src(), "mark", vec![], TypeExpr::empty())),
        "cgen_base__io_reader__set_mark(&a_src, iop_a_src)"
    );
    assert_eq!(
        render(&call(src(), "since_mark", vec![], TypeExpr::slice_u8())),
        "cgen_base__io_reader__since_mark(&a_src, iop_a_src)"
    );
    assert_eq!(
        render(&call(src(), "position", vec![], TypeExpr::u64())),
        "cgen_base__io_reader__position(&a_src, iop_a_src)"
    );
    assert_eq!(
        render(&call(src(), "set_limit", n(), TypeExpr::empty())),
        "(io1_a_src = cgen_base__io_reader__set_limit(&a_src, iop_a_src, io1_a_src, v_n), cgen_base__return_empty_struct())"
    );
}

#[test]
fn test_render_writer_builtins() {
    let n = || Arg::new("n", var("n", TypeExpr::u32()));
    let d = || Arg::new("d", var("d", TypeExpr::u32()));
    assert_eq!(
        render(&call(
            dst(),
            "write_fast_u16le",
            vec![Arg::new("a", var("x", TypeExpr::u16()))],
            TypeExpr::empty()
        )),
        "(cgen_base__store_u16le(iop_a_dst, v_x), iop_a_dst += 2, cgen_base__return_empty_struct())"
    );
    assert_eq!(
        render(&call(dst(), "copy_n_from_history", vec![n(), d()], TypeExpr::u32())),
        "cgen_base__io_writer__copy_n_from_history(&iop_a_dst, io0_a_dst, io1_a_dst, v_n, v_d)"
    );
    assert_eq!(
        render(&call(dst(), "copy_n_from_history_fast", vec![n(), d()], TypeExpr::u32())),
        "cgen_base__io_writer__copy_n_from_history_fast(&iop_a_dst, io0_a_dst, io1_a_dst, v_n, v_d)"
    );
    assert_eq!(
        render(&call(
            dst(),
            "copy_n_from_reader",
            vec![n(), Arg::new("r", src())],
            TypeExpr::u32()
        )),
        "cgen_base__io_writer__copy_n_from_reader(&iop_a_dst, io1_a_dst, v_n, &iop_a_src, io1_a_src)"
    );
    let s = || Arg::new("s", var("s", TypeExpr::slice_u8()));
    assert_eq!(
        render(&call(dst(), "copy_from_slice", vec![s()], TypeExpr::u64())),
        "cgen_base__io_writer__copy_from_slice(&iop_a_dst, io1_a_dst, v_s)"
    );
    assert_eq!(
        render(&call(dst(), "copy_n_from_slice", vec![n(), s()], TypeExpr::u32())),
        "cgen_base__io_writer__copy_n_from_slice(&iop_a_dst, io1_a_dst, v_n, v_s)"
    );
    assert_eq!(
        render(&call(dst(), "available", vec![], TypeExpr::u64())),
        "((uint64_t)(io1_a_dst - iop_a_dst))"
    );
}

#[test]
fn test_render_image_config_initialize() {
    let cfg = Expr::arg("dst", TypeExpr::ptr(TypeExpr::Base(cgen_ast::BaseType::ImageConfig)));
    let args = vec![
        Arg::new("pixfmt", Expr::lit(1, TypeExpr::u32())),
        Arg::new("pixsub", Expr::lit(0, TypeExpr::u32())),
        Arg::new("width", var("w", TypeExpr::u32())),
        Arg::new("height", var("h", TypeExpr::u32())),
        Arg::new("first_frame_io_position", var("pos", TypeExpr::u64())),
        Arg::new("first_frame_is_opaque", Expr::bool_lit(false)),
    ];
    assert_eq!(
        render(&call(cfg, "initialize", args, TypeExpr::empty())),
        "cgen_base__image_config__initialize(a_dst, 1, 0, v_w, v_h, v_pos, false)"
    );
}

#[test]
fn test_render_user_call() {
    let config = EmitConfig::default();
    let mut pkg = demo_pkg();
    pkg.funcs.push(
        FuncBuilder::method("decoder", "area")
            .param("scale", TypeExpr::u32())
            .returns(TypeExpr::u32())
            .build(),
    );
    let emitter = CEmitter::new(&config, &pkg);
    let e = call(
        Expr::this("decoder"),
        "area",
        vec![Arg::new("scale", Expr::lit(2, TypeExpr::u32()))],
        TypeExpr::u32(),
    );
    assert_eq!(
        emitter.render_expr(&e, &mut Substitutions::new(), 0).unwrap(),
        "cgen_demo_decoder_area(self, 2)"
    );
}

#[test]
fn test_render_user_call_orders_args_by_param() {
    let config = EmitConfig::default();
    let mut pkg = demo_pkg();
    pkg.funcs.push(
        FuncBuilder::method("decoder", "resize")
            .param("w", TypeExpr::u32())
            .param("h", TypeExpr::u32())
            .returns(TypeExpr::u32())
            .build(),
    );
    let emitter = CEmitter::new(&config, &pkg);
    let resize = |args| call(Expr::this("decoder"), "resize", args, TypeExpr::u32());
    let e = resize(vec![
        Arg::new("h", var("b", TypeExpr::u32())),
        Arg::new("w", var("a", TypeExpr::u32())),
    ]);
    assert_eq!(
        emitter.render_expr(&e, &mut Substitutions::new(), 0).unwrap(),
        "cgen_demo_decoder_resize(self, v_a, v_b)"
    );

    let missing = resize(vec![Arg::new("w", var("a", TypeExpr::u32()))]);
    assert!(matches!(
        emitter.render_expr(&missing, &mut Substitutions::new(), 0),
        Err(GenError::Unsupported(_))
    ));
    let unknown = resize(vec![
        Arg::new("w", var("a", TypeExpr::u32())),
        Arg::new("h", var("b", TypeExpr::u32())),
        Arg::new("depth", var("c", TypeExpr::u32())),
    ]);
    assert!(matches!(
        emitter.render_expr(&unknown, &mut Substitutions::new(), 0),
        Err(GenError::Unsupported(_))
    ));
}

#[test]
fn test_render_unknown_builtin() {
    let config = EmitConfig::default();
    let pkg = demo_pkg();
    let emitter = CEmitter::new(&config, &pkg);
    let e = call(var("x", TypeExpr::u32()), "length", vec![], TypeExpr::u64());
    let err = emitter.render_expr(&e, &mut Substitutions::new(), 0).unwrap_err();
    assert_eq!(
        err,
        GenError::NoSuchBuiltin {
            capability: "u32".to_string(),
            method: "length".to_string(),
        }
    );
}

#[test]
fn test_render_unhoisted_suspendible_call() {
    let config = EmitConfig::default();
    let pkg = demo_pkg();
    let emitter = CEmitter::new(&config, &pkg);
    let err = emitter.render_expr(&read_u8(), &mut Substitutions::new(), 0).unwrap_err();
    assert!(matches!(err, GenError::Internal(_)));
}

fn window(base: Expr, lo: Expr, width: i128) -> Expr {
    let hi = Expr::add(lo.clone(), Expr::lit(width, TypeExpr::u64()));
    Expr::slice(base, Some(lo), Some(hi))
}

fn copy(dst: Expr, src: Expr) -> Expr {
    call(dst, "copy_from_slice", vec![Arg::new("s", src)], TypeExpr::u64())
}

#[test]
fn test_render_copy_8_bytes() {
    let a = var("a", TypeExpr::slice_u8());
    let b = var("b", TypeExpr::slice_u8());
    let e = copy(
        window(a, var("i", TypeExpr::u64()), 8),
        window(b, var("j", TypeExpr::u64()), 8),
    );
    assert_eq!(render(&e), "memcpy((v_a.ptr)+(v_i),(v_b.ptr)+(v_j), 8)");
}

#[test]
fn test_render_copy_8_bytes_from_array_prefix() {
    let buf = var("buf", TypeExpr::array(16, TypeExpr::u8()));
    let dst = Expr::slice(buf, None, Some(Expr::lit(8, TypeExpr::u64())));
    let src = window(var("b", TypeExpr::slice_u8()), var("j", TypeExpr::u64()), 8);
    assert_eq!(render(&copy(dst, src)), "memcpy((v_buf),(v_b.ptr)+(v_j), 8)");
}

#[test]
fn test_render_copy_8_bytes_fallbacks() {
    let general = "cgen_base__slice_u8__copy_from_slice(";
    let a = || var("a", TypeExpr::slice_u8());
    let b = || var("b", TypeExpr::slice_u8());
    let i = || var("i", TypeExpr::u64());
    let j = || var("j", TypeExpr::u64());

    // 7 bytes wide.
    let e = copy(window(a(), i(), 7), window(b(), j(), 7));
    assert!(render(&e).starts_with(general));

    // Upper bound offset from a different lower bound.
    let hi = Expr::add(j(), Expr::lit(8, TypeExpr::u64()));
    let skewed = Expr::slice(a(), Some(i()), Some(hi));
    let e = copy(skewed, window(b(), j(), 8));
    assert!(render(&e).starts_with(general));

    // Source is a plain slice, not a window.
    let e = copy(window(a(), i(), 8), b());
    assert!(render(&e).starts_with(general));

    // Literal bounds 8 apart are not written as `lo + 8`.
    let lit = |v| Expr::lit(v, TypeExpr::u64());
    let e = copy(
        Expr::slice(a(), Some(lit(2)), Some(lit(10))),
        Expr::slice(b(), Some(lit(0)), Some(lit(8))),
    );
    assert!(render(&e).starts_with(general));

    // `[0:8]` has a lower bound, so it is not the `[:8]` prefix form.
    let e = copy(
        Expr::slice(a(), Some(lit(0)), Some(lit(8))),
        window(b(), j(), 8),
    );
    assert!(render(&e).starts_with(general));
}

#[test]
fn test_render_copy_8_bytes_not_with_suspendible_index() {
    let config = EmitConfig::default();
    let pkg = demo_pkg();
    let emitter = CEmitter::new(&config, &pkg);
    let lo = Expr::cast(read_u8(), TypeExpr::u64());
    let e = copy(
        window(var("a", TypeExpr::slice_u8()), lo, 8),
        window(var("b", TypeExpr::slice_u8()), var("j", TypeExpr::u64()), 8),
    );
    let mut subst = Substitutions::new();
    let mut calls = Vec::new();
    emitter.collect_hoisted(&e, 0, &mut calls).unwrap();
    assert_eq!(calls.len(), 2);
    subst.push(calls[0], Some("t_0".to_string()));
    subst.push(calls[1], Some("t_1".to_string()));
    let out = emitter.render_expr(&e, &mut subst, 0).unwrap();
    assert!(out.starts_with("cgen_base__slice_u8__copy_from_slice("));
    assert!(out.contains("((uint64_t)(t_0))"));
    assert!(out.contains("((uint64_t)(t_1))"));
}

#[test]
fn test_render_depth_limit() {
    let config = EmitConfig::default().with_max_expr_depth(4);
    let pkg = demo_pkg();
    let emitter = CEmitter::new(&config, &pkg);
    let chain = |n: usize| {
        let mut e = var("x", TypeExpr::u32());
        for _ in 0..n {
            e = Expr::unary(UnaryOp::Minus, e);
        }
        e
    };
    assert_eq!(
        emitter.render_expr(&chain(4), &mut Substitutions::new(), 0).unwrap(),
        "(-(-(-(-v_x))))"
    );
    assert_eq!(
        emitter.render_expr(&chain(5), &mut Substitutions::new(), 0),
        Err(GenError::ExprTooDeep { max: 4 })
    );
}

fn decode(body: Vec<Stmt>) -> Func {
    let mut b = FuncBuilder::method("decoder", "decode")
        .public()
        .suspendible()
        .param("dst", TypeExpr::writer())
        .param("src", TypeExpr::reader());
    for s in body {
        b.push(s);
    }
    b.build()
}

#[test]
fn test_render_hoisted_read() {
    let pkg = demo_pkg();
    let func = decode(vec![Stmt::var(
        "x",
        TypeExpr::u32(),
        Some(call(src(), "read_u32le", vec![], TypeExpr::u32())),
    )]);
    let out = render_fn(&pkg, &func).unwrap();
    assert_eq!(
        out.frame,
        vec!["uint64_t scratch", "uint32_t v_x", "uint32_t t_0"]
    );
    let code = &out.code;
    assert!(code.contains("    coro_susp_point = 1;\nresume_1:;\n"));
    assert!(code.contains("if (CGEN_BASE__LIKELY(io1_a_src - iop_a_src >= 4)) {"));
    assert!(code.contains("t_0 = cgen_base__load_u32le(iop_a_src);"));
    assert!(code.contains("self->private_impl.s_decode[0].scratch = 0;"));
    assert!(code.contains("coro_susp_point = 2;"));
    assert!(code.contains("uint32_t num_bits = ((uint32_t)(*scratch >> 56));"));
    assert!(code.contains("if (num_bits == 24) {"));
    assert!(code.contains("    v_x = t_0;\n"));
    assert!(code.contains("if (coro_susp_point == 2) {\n        goto resume_2;"));
}

#[test]
fn test_render_hoisted_read_big_endian() {
    let pkg = demo_pkg();
    let func = decode(vec![Stmt::var(
        "x",
        TypeExpr::u16(),
        Some(call(src(), "read_u16be", vec![], TypeExpr::u16())),
    )]);
    let code = render_fn(&pkg, &func).unwrap().code;
    assert!(code.contains("*scratch |= ((uint64_t)(*iop_a_src++)) << (56 - num_bits);"));
    assert!(code.contains("t_0 = ((uint16_t)(*scratch >> 48));"));
}

#[test]
fn test_render_hoists_duplicates_in_order() {
    let pkg = demo_pkg();
    let func = decode(vec![
        Stmt::var("x", TypeExpr::u8(), None),
        Stmt::assign(
            AssignOp::Eq,
            var("x", TypeExpr::u8()),
            Expr::binary(BinaryOp::Sub, read_u8(), read_u8()),
        ),
    ]);
    let out = render_fn(&pkg, &func).unwrap();
    let code = &out.code;
    let first = code.find("t_0 = *iop_a_src++;").unwrap();
    let second = code.find("t_1 = *iop_a_src++;").unwrap();
    assert!(first < second);
    assert!(code.contains("v_x = ((uint8_t)(t_0 - t_1));"));
    assert!(code.contains("if (CGEN_BASE__UNLIKELY(iop_a_src == io1_a_src)) {"));
    assert!(code.contains("status = CGEN_DEMO_SUSPENSION_SHORT_READ;"));
}

#[test]
fn test_render_write_statement() {
    let pkg = demo_pkg();
    let func = decode(vec![Stmt::expr(call(
        dst(),
        "write_u8",
        vec![Arg::new("a", Expr::lit(7, TypeExpr::u8()))],
        TypeExpr::empty(),
    ))]);
    let out = render_fn(&pkg, &func).unwrap();
    assert!(out.code.contains("if (CGEN_BASE__UNLIKELY(io1_a_dst - iop_a_dst < 1)) {"));
    assert!(out.code.contains("status = CGEN_DEMO_SUSPENSION_SHORT_WRITE;"));
    assert!(out.code.contains("*iop_a_dst++ = 7;"));
    // Nothing to save but the scratch word.
    assert_eq!(out.frame, vec!["uint64_t scratch"]);
}

#[test]
fn test_render_skip_statement() {
    let pkg = demo_pkg();
    let func = decode(vec![Stmt::expr(call(
        src(),
        "skip",
        vec![Arg::new("n", Expr::lit(10, TypeExpr::u32()))],
        TypeExpr::empty(),
    ))]);
    let code = render_fn(&pkg, &func).unwrap().code;
    assert!(code.contains("self->private_impl.s_decode[0].scratch = 10;\n    coro_susp_point = 1;"));
    assert!(code.contains(
        "if (self->private_impl.s_decode[0].scratch > ((uint64_t)(io1_a_src - iop_a_src))) {"
    ));
    assert!(code.contains("iop_a_src += self->private_impl.s_decode[0].scratch;"));
}

#[test]
fn test_render_coroutine_call() {
    let pkg = demo_pkg();
    let func = decode(vec![Stmt::expr(call(
        Expr::this("decoder"),
        "inner",
        vec![Arg::new("src", src())],
        TypeExpr::empty(),
    ))]);
    let code = render_fn(&pkg, &func).unwrap().code;
    assert!(code.contains("status = cgen_demo_decoder_inner(self, a_src);"));
    assert!(code.contains(
        "if (a_src.private_impl.buf) { a_src.private_impl.buf->meta.ri = ((size_t)(iop_a_src - a_src.private_impl.buf->data.ptr)); }"
    ));
    assert!(code.contains(
        "if (a_src.private_impl.buf) { iop_a_src = a_src.private_impl.buf->data.ptr + a_src.private_impl.buf->meta.ri; }"
    ));
    assert!(code.contains("        if (status & 1) {\n            goto exit;"));
}

fn io_helper_pkg() -> Package {
    let mut pkg = demo_pkg();
    pkg.funcs.push(
        FuncBuilder::method("decoder", "helper")
            .param("src", TypeExpr::reader())
            .returns(TypeExpr::u32())
            .build(),
    );
    pkg
}

fn helper_call() -> Expr {
    call(
        Expr::this("decoder"),
        "helper",
        vec![Arg::new("src", src())],
        TypeExpr::u32(),
    )
}

#[test]
fn test_render_io_call_syncs_cursors() {
    let pkg = io_helper_pkg();
    let func = decode(vec![Stmt::var("n", TypeExpr::u32(), Some(helper_call()))]);
    let code = render_fn(&pkg, &func).unwrap().code;
    let line = "t_0 = cgen_demo_decoder_helper(self, a_src);";
    let at = code.find(line).unwrap();
    assert!(code[..at].trim_end().ends_with(
        "if (a_src.private_impl.buf) { a_src.private_impl.buf->meta.ri = ((size_t)(iop_a_src - a_src.private_impl.buf->data.ptr)); }"
    ));
    assert!(code[at + line.len()..].trim_start().starts_with(
        "if (a_src.private_impl.buf) { iop_a_src = a_src.private_impl.buf->data.ptr + a_src.private_impl.buf->meta.ri; }"
    ));
    assert!(code.contains("v_n = t_0;"));
    // No resume point: the call cannot suspend.
    assert!(!code.contains("resume_1"));
}

#[test]
fn test_render_io_call_in_plain_function() {
    let pkg = io_helper_pkg();
    let func = FuncBuilder::method("decoder", "peek")
        .param("src", TypeExpr::reader())
        .returns(TypeExpr::u32())
        .stmt(Stmt::ret(Some(Expr::add(helper_call(), Expr::lit(1, TypeExpr::u32())))))
        .build();
    let code = render_fn(&pkg, &func).unwrap().code;
    assert!(code.contains("    uint32_t t_0 = 0;\n"));
    assert!(code.contains("t_0 = cgen_demo_decoder_helper(self, a_src);"));
    assert!(code.contains("ret = (t_0 + 1);"));
}

#[test]
fn test_render_io_call_in_while_condition() {
    let pkg = io_helper_pkg();
    let cond = Expr::binary(BinaryOp::Ne, helper_call(), Expr::lit(0, TypeExpr::u32()));
    let func = decode(vec![Stmt::while_loop(cgen_ast::LoopId(0), cond, vec![])]);
    assert!(matches!(render_fn(&pkg, &func), Err(GenError::Unsupported(_))));
}

#[test]
fn test_render_public_frame() {
    let pkg = demo_pkg();
    let out = render_fn(&pkg, &decode(vec![Stmt::expr(read_u8())])).unwrap();
    assert_eq!(
        out.signature,
        "cgen_demo_status cgen_demo_decoder_decode(cgen_demo_decoder* self, cgen_base__io_writer a_dst, cgen_base__io_reader a_src)"
    );
    let code = &out.code;
    for needle in [
        "if (!self) {\n        return CGEN_DEMO_ERROR_NULL_RECEIVER;",
        "cgen_demo_status status = self->status;",
        "if (self->magic != CGEN_BASE__MAGIC) {",
        "status = CGEN_DEMO_ERROR_CONSTRUCTOR_NOT_CALLED;",
        "uint32_t coro_susp_point = self->private_impl.p_decode;",
        "uint8_t t_0 = 0;",
        "iop_a_src = a_src.private_impl.buf->data.ptr + a_src.private_impl.buf->meta.ri;",
        "io1_a_dst = a_dst.private_impl.buf->data.ptr + a_dst.private_impl.buf->data.len;",
        "if (coro_susp_point) {\n        t_0 = self->private_impl.s_decode[0].t_0;",
        "ok:\n    self->private_impl.p_decode = 0;",
        "suspend:\n    self->private_impl.p_decode = coro_susp_point;\n    self->private_impl.s_decode[0].t_0 = t_0;",
        "status = CGEN_DEMO_STATUS_SHORT_SRC;",
        "status = CGEN_DEMO_STATUS_SHORT_DST;",
        "self->status = status;\n    return status;",
    ] {
        assert!(code.contains(needle), "missing {needle:?} in\n{code}");
    }
}

#[test]
fn test_render_private_frame_has_no_guards() {
    let pkg = demo_pkg();
    let inner = pkg.find_method("decoder", "inner").unwrap().clone();
    let out = render_fn(&pkg, &inner).unwrap();
    assert!(out.signature.starts_with("static cgen_demo_status cgen_demo_decoder_inner("));
    assert!(out.code.contains("cgen_demo_status status = CGEN_DEMO_STATUS_OK;"));
    assert!(!out.code.contains("CGEN_BASE__MAGIC"));
    assert!(!out.code.contains("self->status = status;"));
}

#[test]
fn test_render_while_labels() {
    let pkg = demo_pkg();
    let func = FuncBuilder::method("decoder", "spin")
        .while_loop(Expr::bool_lit(true), |id, _| vec![FuncBuilder::brk(id)])
        .build();
    let code = render_fn(&pkg, &func).unwrap().code;
    assert!(code.contains("    while (true) {\n        goto label_0_break;\n    }\nlabel_0_break:;\n"));
    assert!(!code.contains("continue"));
}

#[test]
fn test_render_while_continue_label() {
    let pkg = demo_pkg();
    let func = FuncBuilder::method("decoder", "spin")
        .while_loop(var("go", TypeExpr::bool()), |id, _| {
            vec![FuncBuilder::cont(id)]
        })
        .build();
    let code = render_fn(&pkg, &func).unwrap().code;
    assert!(code.contains("label_0_continue:;\n    while (v_go) {\n        goto label_0_continue;"));
    assert!(!code.contains("label_0_break"));
}

#[test]
fn test_render_plain_statements() {
    let pkg = demo_pkg();
    let this_width = || Expr::field(Expr::this("decoder"), "width", TypeExpr::u32());
    let func = FuncBuilder::method("decoder", "bump")
        .public()
        .returns(TypeExpr::u32())
        .stmt(Stmt::var("mask", TypeExpr::u32(), Some(Expr::lit(3, TypeExpr::u32()))))
        .stmt(Stmt::var("buf", TypeExpr::array(4, TypeExpr::u8()), None))
        .stmt(Stmt::assign(AssignOp::AndNotEq, this_width(), var("mask", TypeExpr::u32())))
        .stmt(Stmt::if_else(
            Expr::binary(BinaryOp::Gt, this_width(), Expr::lit(9, TypeExpr::u32())),
            vec![Stmt::ret(Some(Expr::lit(1, TypeExpr::u32())))],
            vec![Stmt::assign(AssignOp::AddEq, this_width(), Expr::lit(1, TypeExpr::u32()))],
        ))
        .stmt(Stmt::ret(Some(this_width())))
        .build();
    let out = render_fn(&pkg, &func).unwrap();
    assert_eq!(out.signature, "uint32_t cgen_demo_decoder_bump(cgen_demo_decoder* self)");
    assert!(out.frame.is_empty());
    let expected = "uint32_t cgen_demo_decoder_bump(cgen_demo_decoder* self) {
    if (!self) {
        return ((uint32_t){0});
    }
    uint32_t v_mask = 0;
    uint8_t v_buf[4] = {0};
    v_mask = 3;
    memset(&v_buf, 0, sizeof(v_buf));
    self->f_width &= ~v_mask;
    if ((self->f_width > 9)) {
        return 1;
    } else {
        self->f_width += 1;
    }
    return self->f_width;
}
";
    assert_eq!(out.code, expected);
}

#[test]
fn test_render_plain_with_io() {
    let pkg = demo_pkg();
    let func = FuncBuilder::method("decoder", "peek")
        .param("src", TypeExpr::reader())
        .returns(TypeExpr::u8())
        .stmt(Stmt::ret(Some(call(src(), "read_u8", vec![], TypeExpr::u8()).in_bounds())))
        .build();
    let code = render_fn(&pkg, &func).unwrap().code;
    assert!(code.contains("uint8_t ret = 0;"));
    assert!(code.contains("ret = (iop_a_src += 1, cgen_base__load_u8be(iop_a_src - 1));\n    goto exit;"));
    assert!(code.contains("exit:\n    if (a_src.private_impl.buf)"));
    assert!(code.contains("return ret;"));
}

#[test]
fn test_render_suspendible_without_receiver() {
    let pkg = demo_pkg();
    let func = FuncBuilder::new("orphan").suspendible().build();
    assert_eq!(
        render_fn(&pkg, &func).unwrap_err(),
        GenError::SuspendibleWithoutReceiver("orphan".to_string())
    );
}

#[test]
fn test_render_unknown_receiver() {
    let pkg = demo_pkg();
    let func = FuncBuilder::method("encoder", "run").build();
    assert_eq!(
        render_fn(&pkg, &func).unwrap_err(),
        GenError::UnknownStruct("encoder".to_string())
    );
}

#[test]
fn test_render_suspendible_in_while_condition() {
    let pkg = demo_pkg();
    let cond = Expr::binary(BinaryOp::Ne, read_u8(), Expr::lit(0, TypeExpr::u8()));
    let func = decode(vec![Stmt::while_loop(cgen_ast::LoopId(0), cond, vec![])]);
    assert!(matches!(render_fn(&pkg, &func), Err(GenError::Unsupported(_))));
}

#[test]
fn test_render_suspendible_call_in_plain_function() {
    let pkg = demo_pkg();
    let func = FuncBuilder::method("decoder", "plain")
        .param("src", TypeExpr::reader())
        .stmt(Stmt::expr(read_u8()))
        .build();
    assert!(matches!(render_fn(&pkg, &func), Err(GenError::Unsupported(_))));
}

#[test]
fn test_render_too_many_temps() {
    let config = EmitConfig {
        max_temps: 1,
        ..EmitConfig::default()
    };
    let pkg = demo_pkg();
    let mut emitter = CEmitter::new(&config, &pkg);
    let func = decode(vec![Stmt::expr(Expr::add(read_u8(), read_u8()))]);
    assert_eq!(
        emitter.render_func(&func).unwrap_err(),
        GenError::TooManyTemps { max: 1 }
    );
}

#[test]
fn test_render_body_too_deep() {
    let config = EmitConfig::default().with_max_body_depth(1);
    let pkg = demo_pkg();
    let mut emitter = CEmitter::new(&config, &pkg);
    let innermost = Stmt::if_else(Expr::bool_lit(true), vec![], vec![]);
    let middle = Stmt::if_else(Expr::bool_lit(true), vec![innermost], vec![]);
    let outer = Stmt::if_else(Expr::bool_lit(true), vec![middle], vec![]);
    let func = FuncBuilder::method("decoder", "nest").stmt(outer).build();
    assert_eq!(
        emitter.render_func(&func).unwrap_err(),
        GenError::BodyTooDeep { max: 1 }
    );
}

#[test]
fn test_render_functions_are_independent() {
    let config = EmitConfig::default();
    let pkg = demo_pkg();
    let mut emitter = CEmitter::new(&config, &pkg);
    let a = emitter.render_func(&decode(vec![Stmt::expr(read_u8())])).unwrap();
    let b = emitter.render_func(&decode(vec![Stmt::expr(read_u8())])).unwrap();
    // Resume points and temporaries restart at every function.
    assert_eq!(a.code, b.code);
    assert!(emitter.output().is_empty());
}

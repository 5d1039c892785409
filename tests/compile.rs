//! End-to-end tests against the worked examples: since there is no
//! assembler/linker available in this harness, these check structural
//! properties of the emitted text rather than running the binary.

use subc::compile;

#[test]
fn returning_a_constant() {
    let asm = compile("int main() { return 0; }").unwrap();
    assert!(asm.contains(".globl main"));
    assert!(asm.contains("main:"));
    assert!(asm.contains("mov x0, #0"));
    assert!(asm.contains("b .L.return.main"));
    assert!(asm.contains(".L.return.main:"));
}

#[test]
fn arithmetic_with_locals() {
    let asm = compile("int main() { int a=1; int b=2; return a+b*3; }").unwrap();
    assert!(asm.contains("mul x0, x0, x1"));
    assert!(asm.contains("add x0, x0, x1"));
}

#[test]
fn for_loop_summation() {
    let asm =
        compile("int main() { int i; int s=0; for(i=1;i<=10;i=i+1) s=s+i; return s; }").unwrap();
    assert!(asm.contains(".L.for.begin.0:"));
    assert!(asm.contains(".L.for.end.0:"));
    assert!(asm.contains("cset x0, le"));
}

#[test]
fn array_indexing() {
    let asm =
        compile("int main() { int a[3]; a[0]=1; a[1]=2; a[2]=4; return a[0]+a[1]+a[2]; }")
            .unwrap();
    // a's frame slot is 24 bytes (3 ints * 8), 16-byte aligned to 32.
    assert!(asm.contains("sub sp, sp, #32"));
    assert!(!asm.contains("strb"), "int array should use full-width stores only");
    assert!(asm.contains("str x1, [x0]"));
}

#[test]
fn char_array_uses_byte_loads_and_stores() {
    let asm =
        compile("int main() { char s[4]; s[0]=97; s[1]=98; s[2]=99; s[3]=0; return s[2]; }")
            .unwrap();
    assert!(asm.contains("strb w1, [x0]"));
    assert!(asm.contains("ldrsb w0, [x0]"));
}

#[test]
fn function_call_with_arguments() {
    let asm =
        compile("int add(int x, int y) { return x+y; } int main() { return add(3, 4); }")
            .unwrap();
    assert!(asm.contains("bl add"));
    assert!(asm.contains(".globl add"));
    assert!(asm.contains(".globl main"));
    assert!(asm.contains("ldr x0, [sp], #16"));
    assert!(asm.contains("ldr x1, [sp], #16"));
}

#[test]
fn global_variables_get_a_data_section() {
    let asm = compile("int g; int main() { g = 5; return g; }").unwrap();
    assert!(asm.contains(".data"));
    assert!(asm.contains(".globl .L.g"));
    assert!(asm.contains(".L.g:"));
    assert!(asm.contains(".zero 8"));
    assert!(asm.contains("adrp x0, .L.g"));
    assert!(asm.contains("add x0, x0, :lo12:.L.g"));
}

#[test]
fn compilation_is_deterministic() {
    let source = "int main() { int i; int s=0; for(i=1;i<=10;i=i+1) s=s+i; return s; }";
    assert_eq!(compile(source).unwrap(), compile(source).unwrap());
}

#[test]
fn frame_sizes_are_sixteen_byte_aligned() {
    for source in [
        "int main() { return 0; }",
        "int main() { char c; return 0; }",
        "int main() { int a[3]; return 0; }",
    ] {
        let asm = compile(source).unwrap();
        for line in asm.lines().filter(|l| l.trim_start().starts_with("sub sp, sp, #")) {
            let n: u32 = line.rsplit('#').next().unwrap().trim().parse().unwrap();
            assert_eq!(n % 16, 0, "frame size {n} in {line:?} is not 16-byte aligned");
        }
    }
}

#[test]
fn undefined_variable_reports_at_parse_time() {
    let err = compile("int main() { return x; }").unwrap_err();
    assert!(err.message.contains("undefined variable"));
}

#[test]
fn pointer_arithmetic_scales_by_element_size() {
    let asm = compile("int main() { int a[3]; int *p; p = a; p = p + 1; return *p; }").unwrap();
    assert!(asm.contains("mov x2, #8"));
    assert!(asm.contains("mul x1, x1, x2"));
}

#[test]
fn statement_expression_yields_its_tail_value() {
    let asm = compile("int main() { return ({ int a = 1; int b = 2; a + b; }); }").unwrap();
    assert!(asm.contains("add x0, x0, x1"));
    assert!(asm.contains("b .L.return.main"));
}

#[test]
fn statement_expression_nested_in_assignment() {
    let asm = compile("int main() { int a; a = ({ 1; 2; 3; }); return a; }").unwrap();
    assert!(asm.contains("mov x0, #3"));
}

//! End-to-end tests: C source through tokenizing, parsing and code
//! generation, then executed in-process with LLVM's JIT.

use std::rc::Rc;

use inkwell::{
    context::Context,
    execution_engine::ExecutionEngine,
    targets::{InitializationConfig, Target},
    OptimizationLevel,
};
use minicc::{
    compiler::{backend::emit_object, compiler::compile},
    errors::diagnostics::Diagnostics,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

type Unary = unsafe extern "C" fn(i32) -> i32;
type Binary = unsafe extern "C" fn(i32, i32) -> i32;
type Ternary = unsafe extern "C" fn(i32, i32, i32) -> i32;

fn try_compile<'ctx>(
    context: &'ctx Context,
    source: &str,
) -> Result<ExecutionEngine<'ctx>, Diagnostics> {
    Target::initialize_native(&InitializationConfig::default()).unwrap();

    let ast = parse(tokenize(source).unwrap()).unwrap();
    type_check(&ast).unwrap();

    let compiler = compile(Rc::new(ast), context, "integration")?;
    assert!(compiler.module.verify().is_ok());

    Ok(compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap())
}

fn jit<'ctx>(context: &'ctx Context, source: &str) -> ExecutionEngine<'ctx> {
    try_compile(context, source).unwrap()
}

fn call0(engine: &ExecutionEngine, name: &str) -> i32 {
    unsafe {
        engine
            .get_function::<unsafe extern "C" fn() -> i32>(name)
            .unwrap()
            .call()
    }
}

fn call1(engine: &ExecutionEngine, name: &str, a: i32) -> i32 {
    unsafe { engine.get_function::<Unary>(name).unwrap().call(a) }
}

fn call2(engine: &ExecutionEngine, name: &str, a: i32, b: i32) -> i32 {
    unsafe { engine.get_function::<Binary>(name).unwrap().call(a, b) }
}

fn call3(engine: &ExecutionEngine, name: &str, a: i32, b: i32, c: i32) -> i32 {
    unsafe { engine.get_function::<Ternary>(name).unwrap().call(a, b, c) }
}

const COMPREHENSIVE: &str = r#"
// basic arithmetic
int suma(int a, int b) { return a + b; }
int resta(int a, int b) { return a - b; }
int multiplicacion(int a, int b) { return a * b; }
int division(int a, int b) { return a / b; }
int modulo(int a, int b) { return a % b; }

int absoluto(int x) {
    if (x < 0) {
        return -x;
    }
    return x;
}

int maximo(int a, int b) {
    if (a > b) {
        return a;
    } else {
        return b;
    }
}

int minimo(int a, int b) {
    if (a < b) {
        return a;
    }
    return b;
}

int factorial(int n) {
    int resultado = 1;
    int i = 1;
    for (i = 1; i <= n; i++) {
        resultado = resultado * i;
    }
    return resultado;
}

int suma_arreglo(int n) {
    int total = 0;
    int i = 0;
    for (i = 0; i <= n; i++) {
        total = total + i;
    }
    return total;
}

int fibonacci(int n) {
    if (n <= 1) {
        return n;
    }

    int a = 0;
    int b = 1;
    int temp = 0;
    int i = 2;

    for (i = 2; i <= n; i++) {
        temp = a + b;
        a = b;
        b = temp;
    }
    return b;
}

int factorial_recursivo(int n) {
    if (n <= 1) {
        return 1;
    }
    return n * factorial_recursivo(n - 1);
}

int suma_recursiva(int n) {
    if (n <= 0) {
        return 0;
    }
    return n + suma_recursiva(n - 1);
}

int operaciones_complejas(int x, int y) {
    int resultado = 0;
    resultado = (x + y) * (x - y) + (x * y) / 2;
    int temp = resultado;
    resultado = resultado + x * y;
    temp = temp - resultado;
    return resultado + temp;
}

int main() {
    if (suma(5, 3) != 8) return 1;
    if (resta(10, 4) != 6) return 2;
    if (multiplicacion(3, 4) != 12) return 3;
    if (division(15, 3) != 5) return 4;
    if (modulo(10, 3) != 1) return 5;
    if (absoluto(-5) != 5) return 6;
    if (absoluto(5) != 5) return 7;
    if (maximo(3, 7) != 7) return 8;
    if (minimo(3, 7) != 3) return 9;
    if (factorial(5) != 120) return 10;
    if (suma_arreglo(5) != 15) return 11;
    if (fibonacci(6) != 8) return 12;
    if (factorial_recursivo(5) != 120) return 13;
    if (suma_recursiva(5) != 15) return 14;
    if (operaciones_complejas(4, 3) != 13) return 15;
    return 0;
}
"#;

const OPERATORS: &str = r#"
int test_logicos(int a, int b) {
    if (a == b && a != 0) return 1;
    if (a > b || a < 0) return 2;
    if ((a != b)) return 3;
    return 0;
}

int test_comparaciones(int a, int b) {
    int resultado = 0;
    if (a == b) resultado += 1;
    if (a != b) resultado += 2;
    if (a < b) resultado += 4;
    if (a <= b) resultado += 8;
    if (a > b) resultado += 16;
    if (a >= b) resultado += 32;
    return resultado;
}

int test_assign_compuestos(int a, int b) {
    int resultado = a;
    resultado += b;
    resultado -= a;
    resultado *= b;
    resultado /= 2;
    resultado %= 3;
    return resultado;
}

int test_inc_dec(int a) {
    int b = a;
    b++;
    b--;
    return b;
}

int test_ternario(int a, int b) {
    return (a > b) ? a : b;
}

int test_ternario_anidado(int a, int b, int c) {
    return (a > b) ? ((a > c) ? a : c) : ((b > c) ? b : c);
}

int test_expresiones_complejas(int a, int b, int c) {
    return (a + b) * c - (a / b) + (a % c) * (b << 2);
}

int test_multiple_declarations(int x) {
    int a = x, b = x * 2, c = x * 3;
    int d = a + b + c;
    a += b;
    b -= c;
    c *= d;
    return a + b + c + d;
}

int test_condicionales_anidadas(int a, int b, int c) {
    if (a > b) {
        if (b > c) return 1;
        if (a > c) return 2;
        return 3;
    } else {
        if (a > c) return 4;
        if (b > c) return 5;
        return 6;
    }
}
"#;

const CONTROL_FLOW: &str = r#"
int test_while(int n) {
    int i = 0;
    int suma = 0;
    while (i < n) {
        suma += i;
        i++;
    }
    return suma;
}

int test_switch(int a) {
    int resultado = 0;
    switch (a) {
        case 1:
            resultado = 10;
            break;
        case 2:
            resultado = 20;
            break;
        case 3:
            resultado = 30;
            break;
        default:
            resultado = 0;
    }
    return resultado;
}

int test_switch_sin_break(int a) {
    int resultado = 0;
    switch (a) {
        case 1:
            resultado += 1;
        case 2:
            resultado += 2;
        case 3:
            resultado += 3;
        default:
            resultado += 4;
    }
    return resultado;
}

int test_break_continue(int n) {
    int i;
    int suma = 0;
    for (i = 0; i < n; i++) {
        if (i % 2 == 0) continue;
        if (i > 10) break;
        suma += i;
    }
    return suma;
}

int cuenta(int n) {
    int i = 0;
    do {
        i++;
    } while (i < n);
    return i;
}

int primero(int n) {
    int i = 0;
    while (i < n) {
        if (i * i > 10) return i;
        i++;
    }
    return -1;
}

int letra(char c) {
    switch (c) {
        case 'a': return 1;
        case 'b': return 2;
    }
    return 0;
}

int efecto() {
    int x = 0;
    if (0 && (x = 1)) {
        return 5;
    }
    return x;
}
"#;

#[test]
fn test_comprehensive_suite() {
    let context = Context::create();
    let engine = jit(&context, COMPREHENSIVE);

    assert_eq!(call2(&engine, "suma", 5, 3), 8);
    assert_eq!(call2(&engine, "resta", 10, 4), 6);
    assert_eq!(call2(&engine, "multiplicacion", 3, 4), 12);
    assert_eq!(call2(&engine, "division", 15, 3), 5);
    assert_eq!(call2(&engine, "modulo", 10, 3), 1);
    assert_eq!(call1(&engine, "absoluto", -5), 5);
    assert_eq!(call2(&engine, "maximo", 3, 7), 7);
    assert_eq!(call2(&engine, "minimo", 3, 7), 3);
    assert_eq!(call1(&engine, "factorial", 5), 120);
    assert_eq!(call1(&engine, "suma_arreglo", 5), 15);
    assert_eq!(call1(&engine, "fibonacci", 6), 8);
    assert_eq!(call1(&engine, "fibonacci", 1), 1);
    assert_eq!(call1(&engine, "factorial_recursivo", 5), 120);
    assert_eq!(call1(&engine, "suma_recursiva", 5), 15);
    assert_eq!(call2(&engine, "operaciones_complejas", 4, 3), 13);
    assert_eq!(call0(&engine, "main"), 0);
}

#[test]
fn test_logical_and_comparison_operators() {
    let context = Context::create();
    let engine = jit(&context, OPERATORS);

    assert_eq!(call2(&engine, "test_logicos", 5, 5), 1);
    assert_eq!(call2(&engine, "test_logicos", 10, 5), 2);
    assert_eq!(call2(&engine, "test_logicos", 0, 0), 0);
    assert_eq!(call2(&engine, "test_logicos", 3, 5), 3);

    assert_eq!(call2(&engine, "test_comparaciones", 5, 5), 41);
    assert_eq!(call2(&engine, "test_comparaciones", 3, 7), 14);
    assert_eq!(call2(&engine, "test_comparaciones", 7, 3), 50);
}

#[test]
fn test_assignments_and_increments() {
    let context = Context::create();
    let engine = jit(&context, OPERATORS);

    assert_eq!(call2(&engine, "test_assign_compuestos", 10, 20), 2);
    assert_eq!(call1(&engine, "test_inc_dec", 5), 5);
    assert_eq!(call1(&engine, "test_multiple_declarations", 2), 88);
}

#[test]
fn test_ternaries() {
    let context = Context::create();
    let engine = jit(&context, OPERATORS);

    assert_eq!(call2(&engine, "test_ternario", 10, 5), 10);
    assert_eq!(call2(&engine, "test_ternario", 5, 10), 10);
    assert_eq!(call3(&engine, "test_ternario_anidado", 10, 5, 8), 10);
    assert_eq!(call3(&engine, "test_ternario_anidado", 5, 10, 8), 10);
    assert_eq!(call3(&engine, "test_ternario_anidado", 5, 8, 10), 10);
}

#[test]
fn test_complex_expressions_and_nested_conditions() {
    let context = Context::create();
    let engine = jit(&context, OPERATORS);

    assert_eq!(call3(&engine, "test_expresiones_complejas", 10, 5, 3), 63);

    let cases = [
        ((10, 5, 3), 1),
        ((10, 3, 5), 2),
        ((5, 10, 3), 4),
        ((3, 10, 5), 5),
        ((3, 5, 10), 6),
    ];
    for ((a, b, c), expected) in cases {
        assert_eq!(
            call3(&engine, "test_condicionales_anidadas", a, b, c),
            expected,
            "({}, {}, {})",
            a,
            b,
            c
        );
    }
}

#[test]
fn test_loops() {
    let context = Context::create();
    let engine = jit(&context, CONTROL_FLOW);

    assert_eq!(call1(&engine, "test_while", 5), 10);
    assert_eq!(call1(&engine, "test_while", 0), 0);
    assert_eq!(call1(&engine, "test_break_continue", 20), 25);
    assert_eq!(call1(&engine, "cuenta", 0), 1);
    assert_eq!(call1(&engine, "cuenta", 5), 5);
    assert_eq!(call1(&engine, "primero", 10), 4);
    assert_eq!(call1(&engine, "primero", 2), -1);
}

#[test]
fn test_switches() {
    let context = Context::create();
    let engine = jit(&context, CONTROL_FLOW);

    assert_eq!(call1(&engine, "test_switch", 1), 10);
    assert_eq!(call1(&engine, "test_switch", 2), 20);
    assert_eq!(call1(&engine, "test_switch", 3), 30);
    assert_eq!(call1(&engine, "test_switch", 4), 0);

    assert_eq!(call1(&engine, "test_switch_sin_break", 1), 10);
    assert_eq!(call1(&engine, "test_switch_sin_break", 3), 7);
    assert_eq!(call1(&engine, "test_switch_sin_break", 9), 4);

    assert_eq!(call1(&engine, "letra", 97), 1);
    assert_eq!(call1(&engine, "letra", 98), 2);
    assert_eq!(call1(&engine, "letra", 99), 0);
}

#[test]
fn test_logical_operators_do_not_short_circuit() {
    let context = Context::create();
    let engine = jit(&context, CONTROL_FLOW);

    assert_eq!(call0(&engine, "efecto"), 1);
}

#[test]
fn test_mutual_recursion_across_definition_order() {
    let context = Context::create();
    let engine = jit(
        &context,
        "int es_par(int n) { if (n == 0) return 1; return es_impar(n - 1); }
         int es_impar(int n) { if (n == 0) return 0; return es_par(n - 1); }",
    );

    assert_eq!(call1(&engine, "es_par", 10), 1);
    assert_eq!(call1(&engine, "es_impar", 7), 1);
    assert_eq!(call1(&engine, "es_par", 7), 0);
}

#[test]
fn test_floating_point_arithmetic() {
    let context = Context::create();
    let engine = jit(
        &context,
        "double media(int a, int b) { double s = a + b; return s / 2; }
         int trunca(float f) { return f * 2; }",
    );

    let media = unsafe {
        engine
            .get_function::<unsafe extern "C" fn(i32, i32) -> f64>("media")
            .unwrap()
            .call(3, 4)
    };
    assert_eq!(media, 3.5);

    let trunca = unsafe {
        engine
            .get_function::<unsafe extern "C" fn(f32) -> i32>("trunca")
            .unwrap()
            .call(1.75)
    };
    assert_eq!(trunca, 3);
}

#[test]
fn test_bitwise_operators() {
    let context = Context::create();
    let engine = jit(
        &context,
        "int bits(int a) { return ((a & 12) | 1) ^ (~a & 3); }
         int desplaza(int a) { int r = a; r <<= 3; r >>= 1; return r; }",
    );

    assert_eq!(call1(&engine, "bits", 5), 7);
    assert_eq!(call1(&engine, "desplaza", 3), 12);
}

#[test]
fn test_diagnostics_prevent_execution() {
    let context = Context::create();
    let diagnostics = try_compile(
        &context,
        "int f(int a) { return b; }\nint g() { return f(1, 2); }",
    )
    .err()
    .unwrap();

    let names: Vec<&str> = diagnostics.iter().map(|e| e.get_error_name()).collect();
    assert_eq!(names, ["VariableNotDeclared", "ArgumentCountMismatch"]);
}

#[test]
fn test_emit_object_file() {
    Target::initialize_native(&InitializationConfig::default()).unwrap();

    let context = Context::create();
    let ast = parse(tokenize("int main() { printf(\"hola %d\\n\", 42); return 0; }").unwrap())
        .unwrap();
    let compiler = compile(Rc::new(ast), &context, "object").unwrap();

    let path = std::env::temp_dir()
        .join(format!("minicc-{}", std::process::id()))
        .join("out.o");
    emit_object(&compiler.module, OptimizationLevel::None, &path).unwrap();

    let metadata = std::fs::metadata(&path).unwrap();
    assert!(metadata.len() > 0);
    std::fs::remove_file(&path).unwrap();
}

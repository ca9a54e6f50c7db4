//! Functions the generated code may call without declaring them.

use inkwell::{module::Linkage, values::FunctionValue, AddressSpace};

use super::compiler::Compiler;

pub const PRINTF: &str = "printf";

/// Declares `i32 printf(i8*, ...)` in the module being built.
pub fn declare_builtins<'a>(compiler: &Compiler<'a>) -> FunctionValue<'a> {
    if let Some(printf) = compiler.module.get_function(PRINTF) {
        return printf;
    }

    let i8_ptr_type = compiler.context.i8_type().ptr_type(AddressSpace::default());
    let printf_type = compiler
        .context
        .i32_type()
        .fn_type(&[i8_ptr_type.into()], true);

    compiler
        .module
        .add_function(PRINTF, printf_type, Some(Linkage::External))
}

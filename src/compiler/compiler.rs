//! Main compiler module.
//!
//! This module contains the core Compiler structure and implements the
//! compilation pipeline from the AST to an LLVM module: every function
//! signature is declared first, then each body is lowered into basic blocks.
//! Lowering failures are collected as diagnostics instead of aborting, and a
//! module with any diagnostic is never handed to the backend.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    types::{BasicMetadataTypeEnum, BasicTypeEnum},
    values::{BasicValueEnum, FunctionValue, IntValue, PointerValue},
    AddressSpace, FloatPredicate, IntPredicate,
};
use tracing::{debug, info};

use crate::{
    ast::ast::{Ast, NodeId},
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
    Position,
};

use super::{
    builtins::{declare_builtins, PRINTF},
    stmt::gen_block,
    symbols::SymbolTable,
    types::{describe, CType},
};

/// Storage backing a named local or parameter.
#[derive(Debug, Clone, Copy)]
pub struct Symbol<'a> {
    pub pointer: PointerValue<'a>,
    pub ty: BasicTypeEnum<'a>,
}

/// Where `break` and `continue` go from inside a loop or switch.
#[derive(Debug, Clone, Copy)]
pub struct JumpTarget<'a> {
    pub break_block: BasicBlock<'a>,
    /// `None` for a switch that is not nested in a loop.
    pub continue_block: Option<BasicBlock<'a>>,
}

/// The main compiler structure that holds the state of the compilation process.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    /// The tree being compiled
    pub ast: Rc<Ast>,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder, i.e. the insertion cursor
    pub builder: Builder<'a>,

    /// Locals and parameters of the function being lowered
    pub symbols: SymbolTable<Symbol<'a>>,
    /// Errors gathered so far
    pub diagnostics: Diagnostics,
    pub current_function: Option<FunctionValue<'a>>,
    /// Innermost loop or switch last
    pub jump_targets: Vec<JumpTarget<'a>>,

    /// One global buffer per distinct string literal
    strings: RefCell<HashMap<Vec<u8>, PointerValue<'a>>>,
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler with an empty module named `module_name`.
    pub fn new(ast: Rc<Ast>, context: &'a Context, module_name: &str) -> Self {
        Compiler {
            ast,
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            current_function: None,
            jump_targets: vec![],
            strings: RefCell::new(HashMap::new()),
        }
    }

    /// First pass: add every function signature to the module.
    ///
    /// Returns the definitions to lower, in source order. A function that
    /// fails to declare, or a second body for the same name, is reported and
    /// left out.
    fn declare_functions(&mut self) -> Vec<(NodeId, FunctionValue<'a>)> {
        let ast = Rc::clone(&self.ast);
        let mut defined = HashSet::new();
        let mut definitions = vec![];

        for &function in ast.functions() {
            match self.declare_function(function, &mut defined) {
                Ok(Some(value)) => definitions.push((function, value)),
                Ok(None) => {}
                Err(error) => self.diagnostics.push(error),
            }
        }

        definitions
    }

    fn declare_function(
        &self,
        node: NodeId,
        defined: &mut HashSet<String>,
    ) -> Result<Option<FunctionValue<'a>>, Error> {
        let ast = &self.ast;
        let parts = ast.function_parts(node)?;
        let position = ast.position(node);

        if parts.name == PRINTF {
            if parts.body.is_some() {
                return Err(Error::new(
                    ErrorImpl::FunctionAlreadyDefined {
                        function: String::from(PRINTF),
                    },
                    position,
                ));
            }
            debug!("ignoring user prototype of printf");
            return Ok(None);
        }

        let mut params: Vec<BasicMetadataTypeEnum<'a>> = vec![];
        for &param in parts.params {
            let type_node = ast.children(param)[0];
            let ctype = CType::from_token(ast.type_token(type_node));
            match ctype.basic_type(self.context) {
                Some(type_) => params.push(type_.into()),
                None => {
                    return Err(Error::new(
                        ErrorImpl::InvalidDeclarationType {
                            name: ast.text(param).to_string(),
                            type_: String::from("void"),
                        },
                        ast.position(param),
                    ))
                }
            }
        }

        let return_type = CType::from_token(ast.type_token(parts.return_type));
        let function_type = return_type.fn_type(self.context, &params);

        let function = match self.module.get_function(parts.name) {
            Some(existing) if existing.get_type() != function_type => {
                return Err(Error::new(
                    ErrorImpl::ConflictingDeclaration {
                        function: parts.name.to_string(),
                    },
                    position,
                ));
            }
            Some(existing) => existing,
            None => self
                .module
                .add_function(parts.name, function_type, Some(Linkage::External)),
        };

        if parts.body.is_none() {
            return Ok(None);
        }

        if !defined.insert(parts.name.to_string()) {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDefined {
                    function: parts.name.to_string(),
                },
                position,
            ));
        }

        Ok(Some(function))
    }

    /// Second pass: lower one function body.
    fn define_function(&mut self, node: NodeId, function: FunctionValue<'a>) -> Result<(), Error> {
        let ast = Rc::clone(&self.ast);
        let parts = ast.function_parts(node)?;
        let Some(body) = parts.body else {
            return Ok(());
        };

        debug!(function = parts.name, "lowering function");

        self.current_function = Some(function);
        self.symbols.clear();
        self.jump_targets.clear();

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        for (index, &param) in parts.params.iter().enumerate() {
            let name = ast.text(param);
            let value = function.get_nth_param(index as u32).ok_or_else(|| {
                Error::new(
                    ErrorImpl::MalformedTree {
                        message: format!("parameter {} of {} has no value", index, parts.name),
                    },
                    ast.position(param),
                )
            })?;

            let pointer = self.entry_alloca(value.get_type(), name)?;
            self.builder.build_store(pointer, value)?;
            self.symbols.put(
                name,
                Symbol {
                    pointer,
                    ty: value.get_type(),
                },
            );
        }

        gen_block(self, body);

        // Falling off the end returns zero, or nothing for void
        if !self.is_terminated() {
            match function.get_type().get_return_type() {
                Some(return_type) => {
                    self.builder.build_return(Some(&return_type.const_zero()))?;
                }
                None => {
                    self.builder.build_return(None)?;
                }
            }
        }

        self.current_function = None;
        Ok(())
    }

    pub fn function(&self, position: Position) -> Result<FunctionValue<'a>, Error> {
        self.current_function.ok_or_else(|| {
            Error::new(
                ErrorImpl::MalformedTree {
                    message: String::from("code outside of a function"),
                },
                position,
            )
        })
    }

    /// Appends a block to the current function.
    pub fn append_block(&self, name: &str, position: Position) -> Result<BasicBlock<'a>, Error> {
        Ok(self
            .context
            .append_basic_block(self.function(position)?, name))
    }

    /// Whether the block under the cursor already ends in a branch or return.
    pub fn is_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    /// Branches to `target` unless the current block is already terminated.
    pub fn branch_if_open(&self, target: BasicBlock<'a>) -> Result<(), Error> {
        if !self.is_terminated() {
            self.builder.build_unconditional_branch(target)?;
        }
        Ok(())
    }

    /// Allocates a stack slot at the top of the entry block.
    pub fn entry_alloca(&self, ty: BasicTypeEnum<'a>, name: &str) -> Result<PointerValue<'a>, Error> {
        let function = self.function(Position::null())?;
        let entry = function.get_first_basic_block().ok_or_else(|| {
            Error::new(
                ErrorImpl::MalformedTree {
                    message: String::from("function has no entry block"),
                },
                Position::null(),
            )
        })?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(ty, name)?)
    }

    /// Pointer to the global array holding `bytes`, shared by equal literals.
    pub fn string_literal(&self, bytes: &[u8]) -> Result<PointerValue<'a>, Error> {
        let cached = self.strings.borrow().get(bytes).copied();
        if let Some(pointer) = cached {
            return Ok(pointer);
        }

        // A NUL-terminated byte array; `\xHH` escapes may leave it non-UTF-8
        let value = self.context.const_string(bytes, true);
        let global = self
            .module
            .add_global(value.get_type(), Some(AddressSpace::default()), ".str");
        global.set_linkage(Linkage::Private);
        global.set_unnamed_addr(true);
        global.set_constant(true);
        global.set_alignment(1);
        global.set_initializer(&value);

        let zero = self.context.i32_type().const_zero();
        // SAFETY: index 0,0 stays inside the array
        let pointer = unsafe {
            global
                .as_pointer_value()
                .const_in_bounds_gep(&[zero, zero])
        };
        self.strings.borrow_mut().insert(bytes.to_vec(), pointer);

        Ok(pointer)
    }

    /// Converts `value` to `target` the way C does on assignment.
    pub fn coerce(
        &self,
        value: BasicValueEnum<'a>,
        target: BasicTypeEnum<'a>,
        position: Position,
    ) -> Result<BasicValueEnum<'a>, Error> {
        if value.get_type() == target {
            return Ok(value);
        }

        let converted: BasicValueEnum<'a> = match (value, target) {
            (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(int_type)) => {
                let from = int.get_type().get_bit_width();
                let to = int_type.get_bit_width();
                if from == 1 {
                    self.builder.build_int_z_extend(int, int_type, "zext")?.into()
                } else if from < to {
                    self.builder.build_int_s_extend(int, int_type, "sext")?.into()
                } else {
                    self.builder.build_int_truncate(int, int_type, "trunc")?.into()
                }
            }
            (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(float_type)) => {
                let int = self.widen_int(int)?;
                self.builder
                    .build_signed_int_to_float(int, float_type, "sitofp")?
                    .into()
            }
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::IntType(int_type)) => self
                .builder
                .build_float_to_signed_int(float, int_type, "fptosi")?
                .into(),
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::FloatType(float_type)) => {
                if float_type == self.context.f64_type() {
                    self.builder.build_float_ext(float, float_type, "fpext")?.into()
                } else {
                    self.builder.build_float_trunc(float, float_type, "fptrunc")?.into()
                }
            }
            _ => {
                return Err(Error::new(
                    ErrorImpl::InvalidOperandType {
                        operator: format!("conversion to {}", describe(target)),
                        type_: describe(value.get_type()),
                    },
                    position,
                ))
            }
        };

        Ok(converted)
    }

    /// Promotes `i1` and `i8` to `i32`; wider integers pass through.
    pub fn widen_int(&self, value: IntValue<'a>) -> Result<IntValue<'a>, Error> {
        let i32_type = self.context.i32_type();
        Ok(match value.get_type().get_bit_width() {
            1 => self.builder.build_int_z_extend(value, i32_type, "zext")?,
            width if width < 32 => self.builder.build_int_s_extend(value, i32_type, "sext")?,
            _ => value,
        })
    }

    /// Usual arithmetic conversions: both operands end up with one type.
    pub fn unify_operands(
        &self,
        lhs: BasicValueEnum<'a>,
        rhs: BasicValueEnum<'a>,
        position: Position,
    ) -> Result<(BasicValueEnum<'a>, BasicValueEnum<'a>), Error> {
        let f64_type: BasicTypeEnum<'a> = self.context.f64_type().into();
        let f32_type: BasicTypeEnum<'a> = self.context.f32_type().into();

        let types = [lhs.get_type(), rhs.get_type()];
        let common = if types.contains(&f64_type) {
            f64_type
        } else if types.contains(&f32_type) {
            f32_type
        } else {
            self.context.i32_type().into()
        };

        Ok((
            self.coerce(lhs, common, position)?,
            self.coerce(rhs, common, position)?,
        ))
    }

    /// Nonzero test producing an `i1`.
    pub fn to_bool(&self, value: BasicValueEnum<'a>, position: Position) -> Result<IntValue<'a>, Error> {
        match value {
            BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => Ok(int),
            BasicValueEnum::IntValue(int) => Ok(self.builder.build_int_compare(
                IntPredicate::NE,
                int,
                int.get_type().const_zero(),
                "tobool",
            )?),
            BasicValueEnum::FloatValue(float) => Ok(self.builder.build_float_compare(
                FloatPredicate::UNE,
                float,
                float.get_type().const_zero(),
                "tobool",
            )?),
            BasicValueEnum::PointerValue(pointer) => {
                Ok(self.builder.build_is_not_null(pointer, "tobool")?)
            }
            other => Err(Error::new(
                ErrorImpl::InvalidOperandType {
                    operator: String::from("condition"),
                    type_: describe(other.get_type()),
                },
                position,
            )),
        }
    }
}

/// Lowers a parsed program into an LLVM module.
///
/// This is the primary entry point for code generation. It:
/// 1. Declares `printf`
/// 2. Declares every function so calls may precede definitions
/// 3. Lowers each function body
///
/// # Returns
///
/// The compiler owning the finished module, or every diagnostic raised
/// while lowering. A module with diagnostics is never returned.
pub fn compile<'a>(
    ast: Rc<Ast>,
    context: &'a Context,
    module_name: &str,
) -> Result<Compiler<'a>, Diagnostics> {
    let mut compiler = Compiler::new(ast, context, module_name);

    declare_builtins(&compiler);

    for (node, function) in compiler.declare_functions() {
        if let Err(error) = compiler.define_function(node, function) {
            compiler.diagnostics.push(error);
        }
    }

    if !compiler.diagnostics.is_empty() {
        info!(
            count = compiler.diagnostics.len(),
            "code generation failed"
        );
        return Err(std::mem::take(&mut compiler.diagnostics));
    }

    info!(module = module_name, "code generation succeeded");
    Ok(compiler)
}

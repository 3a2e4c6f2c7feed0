mod symbol_table;
mod vm;

pub use symbol_table::*;
pub use vm::*;

use crate::error::CodegenError;
use crate::syntax_tree::{
    BinaryOperator, Class, ClassSubroutine, ClassSubroutineType, ClassVariableStorage,
    Expression, KeywordConstant, Statement, SubroutineCall, Term, UnaryOperator,
};
use crate::tokens::MAX_INTEGER_CONSTANT;

use ArithmeticCommand as Op;
use VmInstruction::*;

/// Walks one class and emits its VM code. The class scope symbol table lives for the whole
/// class; the subroutine scope table and both label counters are reset for every subroutine.
struct CodeGenerator<'c> {
    class: &'c Class,
    class_symbols: SymbolTable,
    subroutine_symbols: SymbolTable,
    if_counter: usize,
    while_counter: usize,
    output: Vec<VmInstruction>,
}

impl<'c> CodeGenerator<'c> {
    fn new(class: &'c Class) -> Self {
        Self {
            class,
            class_symbols: SymbolTable::new(class.name.clone()),
            subroutine_symbols: SymbolTable::new(class.name.clone()),
            if_counter: 0,
            while_counter: 0,
            output: Vec::new(),
        }
    }

    fn put(&mut self, instruction: VmInstruction) {
        self.output.push(instruction);
    }

    fn push_constant(&mut self, value: usize) -> Result<(), CodegenError> {
        if value > usize::from(MAX_INTEGER_CONSTANT) {
            return Err(CodegenError::ConstantOutOfRange {
                value,
                subroutine: self.subroutine_symbols.scope().to_owned(),
            });
        }
        self.put(Push(Segment::Constant, value));
        Ok(())
    }

    /// Looks `var_name` up in the subroutine scope first, then in the class scope.
    fn var_info(&self, var_name: &str) -> Result<&Symbol, CodegenError> {
        self.subroutine_symbols
            .lookup(var_name)
            .or_else(|| self.class_symbols.lookup(var_name))
            .ok_or_else(|| CodegenError::UnresolvedSymbol {
                name: var_name.to_owned(),
                subroutine: self.subroutine_symbols.scope().to_owned(),
            })
    }

    fn push_variable(&mut self, var_name: &str) -> Result<(), CodegenError> {
        let symbol = self.var_info(var_name)?;
        let instruction = Push(symbol.storage.segment(), symbol.index);
        self.put(instruction);
        Ok(())
    }

    fn pop_variable(&mut self, var_name: &str) -> Result<(), CodegenError> {
        let symbol = self.var_info(var_name)?;
        let instruction = Pop(symbol.storage.segment(), symbol.index);
        self.put(instruction);
        Ok(())
    }

    /// Leaves the address `name + index` on the stack.
    fn push_element_address(&mut self, name: &str, index: &Expression) -> Result<(), CodegenError> {
        self.push_expression(index)?;
        self.push_variable(name)?;
        self.put(Arithmetic(Op::Add));
        Ok(())
    }

    /// Generates the call and leaves the callee's return value on the stack.
    fn push_call(&mut self, call: &SubroutineCall) -> Result<(), CodegenError> {
        let (qualifier, has_receiver) = match &call.receiver {
            // A method of this class, called on the current object.
            None => {
                self.put(Push(Segment::Pointer, 0));
                (self.class.name.clone(), true)
            }
            Some(receiver) => match self.var_info(receiver) {
                Ok(symbol) => {
                    let qualifier = symbol.typ.clone();
                    self.push_variable(receiver)?;
                    (qualifier, true)
                }
                // Not a variable, so it names a class and this is a function or constructor.
                Err(_) => (receiver.clone(), false),
            },
        };
        for arg in &call.args {
            self.push_expression(arg)?;
        }
        self.put(Call {
            name: format!("{}.{}", qualifier, call.name),
            args: call.args.len() + usize::from(has_receiver),
        });
        Ok(())
    }

    fn push_term(&mut self, term: &Term) -> Result<(), CodegenError> {
        match term {
            Term::IntegerConstant(value) => self.put(Push(Segment::Constant, usize::from(*value))),
            Term::StringConstant(value) => {
                self.push_constant(value.chars().count())?;
                self.put(Call {
                    name: "String.new".to_owned(),
                    args: 1,
                });
                for c in value.chars() {
                    self.push_constant(c as usize)?;
                    self.put(Call {
                        name: "String.appendChar".to_owned(),
                        args: 2,
                    });
                }
            }
            Term::KeywordConstant(constant) => match constant {
                KeywordConstant::True => {
                    self.put(Push(Segment::Constant, 0));
                    self.put(Arithmetic(Op::Not));
                }
                KeywordConstant::False | KeywordConstant::Null => {
                    self.put(Push(Segment::Constant, 0))
                }
                KeywordConstant::This => self.put(Push(Segment::Pointer, 0)),
            },
            Term::Variable(name) => self.push_variable(name)?,
            Term::ArrayAccess { name, index } => {
                self.push_element_address(name, index)?;
                self.put(Pop(Segment::Pointer, 1));
                self.put(Push(Segment::That, 0));
            }
            Term::UnaryOperation { operator, rhs } => {
                self.push_term(rhs)?;
                self.put(Arithmetic(match operator {
                    UnaryOperator::Negate => Op::Neg,
                    UnaryOperator::BitwiseNot => Op::Not,
                }));
            }
            Term::SubroutineCall(call) => self.push_call(call)?,
            Term::Parenthesized(inner) => self.push_expression(inner)?,
        }
        Ok(())
    }

    fn put_binary_operator(&mut self, operator: BinaryOperator) {
        use BinaryOperator::*;
        let instruction = match operator {
            Add => Arithmetic(Op::Add),
            Subtract => Arithmetic(Op::Sub),
            BitwiseAnd => Arithmetic(Op::And),
            BitwiseOr => Arithmetic(Op::Or),
            LessThan => Arithmetic(Op::Lt),
            GreaterThan => Arithmetic(Op::Gt),
            Equal => Arithmetic(Op::Eq),
            Multiply => Call {
                name: "Math.multiply".to_owned(),
                args: 2,
            },
            Divide => Call {
                name: "Math.divide".to_owned(),
                args: 2,
            },
        };
        self.put(instruction);
    }

    /// Generates code to evaluate the expression strictly left to right and leave its value on
    /// the top of the stack.
    fn push_expression(&mut self, expr: &Expression) -> Result<(), CodegenError> {
        self.push_term(&expr.first)?;
        for (operator, term) in &expr.rest {
            self.push_term(term)?;
            self.put_binary_operator(*operator);
        }
        Ok(())
    }

    fn generate_body(&mut self, body: &[Statement]) -> Result<(), CodegenError> {
        for statement in body {
            self.generate_statement(statement)?;
        }
        Ok(())
    }

    fn generate_statement(&mut self, statement: &Statement) -> Result<(), CodegenError> {
        match statement {
            Statement::Let {
                target,
                index: None,
                value,
            } => {
                self.push_expression(value)?;
                self.pop_variable(target)?;
            }
            Statement::Let {
                target,
                index: Some(index),
                value,
            } => {
                self.push_element_address(target, index)?;
                self.push_expression(value)?;
                // Park the value so the address can go into 'that' first.
                self.put(Pop(Segment::Temp, 0));
                self.put(Pop(Segment::Pointer, 1));
                self.put(Push(Segment::Temp, 0));
                self.put(Pop(Segment::That, 0));
            }
            Statement::If {
                condition,
                body,
                else_body,
            } => {
                let label_id = self.if_counter;
                self.if_counter += 1;
                self.push_expression(condition)?;
                self.put(IfGoto(format!("IF_TRUE{}", label_id)));
                self.put(Goto(format!("IF_FALSE{}", label_id)));
                self.put(Label(format!("IF_TRUE{}", label_id)));
                self.generate_body(body)?;
                match else_body {
                    Some(else_body) => {
                        self.put(Goto(format!("IF_END{}", label_id)));
                        self.put(Label(format!("IF_FALSE{}", label_id)));
                        self.generate_body(else_body)?;
                        self.put(Label(format!("IF_END{}", label_id)));
                    }
                    None => self.put(Label(format!("IF_FALSE{}", label_id))),
                }
            }
            Statement::While { condition, body } => {
                let label_id = self.while_counter;
                self.while_counter += 1;
                self.put(Label(format!("WHILE_EXP{}", label_id)));
                self.push_expression(condition)?;
                self.put(Arithmetic(Op::Not));
                self.put(IfGoto(format!("WHILE_END{}", label_id)));
                self.generate_body(body)?;
                self.put(Goto(format!("WHILE_EXP{}", label_id)));
                self.put(Label(format!("WHILE_END{}", label_id)));
            }
            Statement::Do(call) => {
                self.push_call(call)?;
                self.put(Pop(Segment::Temp, 0));
            }
            Statement::Return(value) => {
                match value {
                    Some(value) => self.push_expression(value)?,
                    None => self.put(Push(Segment::Constant, 0)),
                }
                self.put(Return);
            }
        }
        Ok(())
    }

    fn generate_subroutine(&mut self, subroutine: &ClassSubroutine) -> Result<(), CodegenError> {
        let qualified_name = format!("{}.{}", self.class.name, subroutine.name);
        self.subroutine_symbols.reset(qualified_name.clone());
        self.if_counter = 0;
        self.while_counter = 0;

        if subroutine.typ == ClassSubroutineType::Method {
            // The receiver arrives as the hidden first argument.
            self.subroutine_symbols
                .add("this", &self.class.name, StorageClass::Argument)?;
        }
        for parameter in &subroutine.parameters {
            self.subroutine_symbols.add(
                &parameter.name,
                parameter.typ.name(),
                StorageClass::Argument,
            )?;
        }
        for declaration in &subroutine.local_variables {
            for name in &declaration.names {
                self.subroutine_symbols
                    .add(name, declaration.typ.name(), StorageClass::Local)?;
            }
        }

        self.put(Function {
            name: qualified_name,
            locals: self.subroutine_symbols.count(StorageClass::Local),
        });
        match subroutine.typ {
            ClassSubroutineType::Method => {
                self.put(Push(Segment::Argument, 0));
                self.put(Pop(Segment::Pointer, 0));
            }
            ClassSubroutineType::Constructor => {
                let fields = self.class_symbols.count(StorageClass::Field);
                self.push_constant(fields)?;
                self.put(Call {
                    name: "Memory.alloc".to_owned(),
                    args: 1,
                });
                self.put(Pop(Segment::Pointer, 0));
            }
            ClassSubroutineType::StaticFunction => (),
        }

        self.generate_body(&subroutine.body)?;
        log::debug!(
            "generated {} ({} arguments, {} locals)",
            self.subroutine_symbols.scope(),
            self.subroutine_symbols.count(StorageClass::Argument),
            self.subroutine_symbols.count(StorageClass::Local)
        );
        Ok(())
    }

    fn generate(&mut self) -> Result<(), CodegenError> {
        let class = self.class;
        for declaration in &class.variables {
            let storage = match declaration.storage {
                ClassVariableStorage::Static => StorageClass::Static,
                ClassVariableStorage::Field => StorageClass::Field,
            };
            for name in &declaration.names {
                self.class_symbols
                    .add(name, declaration.typ.name(), storage)?;
            }
        }

        for subroutine in &class.subroutines {
            self.generate_subroutine(subroutine)?;
        }
        Ok(())
    }
}

/// Lowers one class to VM instructions, subroutines in declaration order.
pub fn generate_code(for_class: &Class) -> Result<Vec<VmInstruction>, CodegenError> {
    let mut generator = CodeGenerator::new(for_class);
    generator.generate()?;
    Ok(generator.output)
}

//! The instruction set of the stack machine. Nothing outside these instructions is ever
//! emitted.

use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Constant => "constant",
            Self::Argument => "argument",
            Self::Local => "local",
            Self::Static => "static",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Temp => "temp",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticCommand {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Display for ArithmeticCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VmInstruction {
    Arithmetic(ArithmeticCommand),
    Push(Segment, usize),
    Pop(Segment, usize),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: usize },
    Call { name: String, args: usize },
    Return,
}

impl Display for VmInstruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arithmetic(command) => write!(f, "{}", command),
            Self::Push(segment, index) => write!(f, "push {} {}", segment, index),
            Self::Pop(segment, index) => write!(f, "pop {} {}", segment, index),
            Self::Label(label) => write!(f, "label {}", label),
            Self::Goto(label) => write!(f, "goto {}", label),
            Self::IfGoto(label) => write!(f, "if-goto {}", label),
            Self::Function { name, locals } => write!(f, "function {} {}", name, locals),
            Self::Call { name, args } => write!(f, "call {} {}", name, args),
            Self::Return => write!(f, "return"),
        }
    }
}

/// One instruction per line, each terminated by a newline.
pub fn render(instructions: &[VmInstruction]) -> String {
    instructions
        .iter()
        .map(|instruction| format!("{}\n", instruction))
        .collect()
}

//! The syntax tree of one compilation unit. It is built once by the parser and never mutated
//! afterwards.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    BuiltinInt,
    BuiltinChar,
    BuiltinBool,
    BuiltinVoid,
    Other(String),
}

impl DataType {
    /// The name of the type as written in source, which for class types is also the qualifier
    /// of their subroutines.
    pub fn name(&self) -> &str {
        match self {
            Self::BuiltinInt => "int",
            Self::BuiltinChar => "char",
            Self::BuiltinBool => "boolean",
            Self::BuiltinVoid => "void",
            Self::Other(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    pub name: String,
    pub variables: Vec<ClassVariableDeclaration>,
    pub subroutines: Vec<ClassSubroutine>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassVariableStorage {
    Static,
    Field,
}

/// `static int a, b;` or `field Point origin;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassVariableDeclaration {
    pub storage: ClassVariableStorage,
    pub typ: DataType,
    pub names: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassSubroutineType {
    Constructor,
    Method,
    StaticFunction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub name: String,
    pub typ: DataType,
}

/// `var int i, j;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVariableDeclaration {
    pub typ: DataType,
    pub names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSubroutine {
    pub name: String,
    pub typ: ClassSubroutineType,
    pub return_type: DataType,
    pub parameters: Vec<VariableDeclaration>,
    pub local_variables: Vec<LocalVariableDeclaration>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Let {
        target: String,
        /// Present for `let a[i] = ...;`.
        index: Option<Expression>,
        value: Expression,
    },
    If {
        condition: Expression,
        body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Do(SubroutineCall),
    Return(Option<Expression>),
}

/// A flat chain `first (op term)*`, evaluated strictly left to right. All binary operators bind
/// equally tight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    pub first: Term,
    pub rest: Vec<(BinaryOperator, Term)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    IntegerConstant(u16),
    StringConstant(String),
    KeywordConstant(KeywordConstant),
    Variable(String),
    ArrayAccess {
        name: String,
        index: Box<Expression>,
    },
    UnaryOperation {
        operator: UnaryOperator,
        rhs: Box<Term>,
    },
    SubroutineCall(SubroutineCall),
    Parenthesized(Box<Expression>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeywordConstant {
    True,
    False,
    Null,
    This,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    BitwiseNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    BitwiseAnd,
    BitwiseOr,
    LessThan,
    GreaterThan,
    Equal,
}

/// `name(args)` when `receiver` is absent, otherwise `receiver.name(args)` where the receiver is
/// either a variable or a class name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubroutineCall {
    pub receiver: Option<String>,
    pub name: String,
    pub args: Vec<Expression>,
}

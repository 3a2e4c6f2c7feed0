use super::structure::*;
use crate::error::ParseError;
use crate::tokens::*;
use std::fmt::Display;

/// How deeply statements, expressions and calls may nest before parsing gives up. Sized so that
/// the deepest accepted input still fits a 2 MiB thread stack.
pub const MAX_NESTING_DEPTH: usize = 128;

type ParseResult<T> = Result<T, ParseError>;

/// Recursive descent parser with backtracking. Every production either returns a complete node
/// or fails; callers that treat a production as one of several alternatives rewind the cursor
/// and try the next one.
pub struct Parser<'t> {
    cursor: TokenCursor<'t>,
    depth: usize,
    /// The recoverable failure that got furthest into the token stream. Backtracking discards
    /// local failures, so this is usually the most helpful thing to report.
    furthest_failure: Option<ParseError>,
}

// Handles error boilerplate for us.
macro_rules! match_next_token {
    ($sel:ident, $description:expr, { $($patterns:pat => $values:expr),* $(,)? }) => {
        match $sel.cursor.advance() {
            $(
                Some(SourceToken { token: $patterns, .. }) => $values,
            )*
            Some(_) => Err($sel.error_at_previous($description)),
            None => Err($sel.error_at_next($description)),
        }
    }
}

impl<'t> Parser<'t> {
    pub fn new(program: &'t TokenizedProgram) -> Self {
        Self {
            cursor: TokenCursor::new(program),
            depth: 0,
            furthest_failure: None,
        }
    }

    /// Describes the token that was just consumed as not being what was expected.
    fn error_at_previous(&self, expected: impl Display) -> ParseError {
        let position = self.cursor.position().index().saturating_sub(1);
        match self.cursor.previous() {
            Some(found) => ParseError::Mismatch {
                expected: expected.to_string(),
                found: found.token.to_string(),
                position,
                line: found.line,
                col: found.col,
            },
            None => self.error_at_next(expected),
        }
    }

    /// Describes the token that would be consumed next as not being what was expected.
    fn error_at_next(&self, expected: impl Display) -> ParseError {
        let position = self.cursor.position().index();
        match self.cursor.peek() {
            Some(found) => ParseError::Mismatch {
                expected: expected.to_string(),
                found: found.token.to_string(),
                position,
                line: found.line,
                col: found.col,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                position,
            },
        }
    }

    fn remember_failure(&mut self, err: ParseError) {
        let further = match (&self.furthest_failure, err.position()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(known), Some(position)) => known.position().map_or(true, |p| position >= p),
        };
        if further {
            self.furthest_failure = Some(err);
        }
    }

    /// Picks what to report for a failure that escaped the whole parse.
    fn most_relevant(&mut self, err: ParseError) -> ParseError {
        match (self.furthest_failure.take(), err.position()) {
            (Some(furthest), Some(position))
                if furthest.position().is_some_and(|p| p > position) =>
            {
                furthest
            }
            _ => err,
        }
    }

    /// Runs `rule` as an optional production. On a recoverable failure the cursor is put back
    /// where it was and `None` is returned.
    fn attempt<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Option<T>> {
        let saved = self.cursor.position();
        match rule(self) {
            Ok(node) => Ok(Some(node)),
            Err(err) if err.is_recoverable() => {
                log::trace!("backtracking to token {}: {}", saved.index(), err);
                self.remember_failure(err);
                self.cursor.restore(saved);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Zero or more repetitions of `rule`. Failing to match one more is never an error.
    fn repeat<T>(
        &mut self,
        mut rule: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.attempt(&mut rule)? {
            items.push(item);
        }
        Ok(items)
    }

    /// Tries each alternative in order and returns the first that matches.
    fn first_match<T>(
        &mut self,
        description: &str,
        alternatives: &[fn(&mut Self) -> ParseResult<T>],
    ) -> ParseResult<T> {
        for alternative in alternatives {
            if let Some(node) = self.attempt(*alternative)? {
                return Ok(node);
            }
        }
        Err(self.error_at_next(description))
    }

    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            let (line, col) = self
                .cursor
                .peek()
                .or_else(|| self.cursor.previous())
                .map_or((0, 0), |t| (t.line, t.col));
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                line,
                col,
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn expect_next(&mut self, expected: Token) -> ParseResult<()> {
        match self.cursor.advance() {
            Some(found) if found.token == expected => Ok(()),
            Some(_) => Err(self.error_at_previous(&expected)),
            None => Err(self.error_at_next(&expected)),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match_next_token!(self, "identifier", {
            Token::Identifier(ident) => Ok(ident.clone())
        })
    }

    /// 'int' | 'char' | 'boolean' | className, plus 'void' when `allow_void` is set.
    fn parse_data_type(&mut self, allow_void: bool) -> ParseResult<DataType> {
        let description = if allow_void {
            "data type or void"
        } else {
            "data type"
        };
        match_next_token!(self, description, {
            Token::Identifier(ident) => Ok(DataType::Other(ident.clone())),
            Token::Keyword(Keyword::Int) => Ok(DataType::BuiltinInt),
            Token::Keyword(Keyword::Char) => Ok(DataType::BuiltinChar),
            Token::Keyword(Keyword::Boolean) => Ok(DataType::BuiltinBool),
            Token::Keyword(Keyword::Void) => if allow_void {
                Ok(DataType::BuiltinVoid)
            } else {
                Err(self.error_at_previous(description))
            }
        })
    }

    /// varName (',' varName)* ';'
    fn parse_variable_names(&mut self) -> ParseResult<Vec<String>> {
        let mut names = vec![self.expect_identifier()?];
        loop {
            match_next_token!(self, "comma or semicolon", {
                Token::Symbol(Symbol::Semicolon) => break,
                Token::Symbol(Symbol::Comma) => {
                    names.push(self.expect_identifier()?);
                    Ok(())
                }
            })?;
        }
        Ok(names)
    }

    /// ('static' | 'field') type varName (',' varName)* ';'
    fn parse_class_variable_declaration(&mut self) -> ParseResult<ClassVariableDeclaration> {
        let storage = match_next_token!(self, "static or field", {
            Token::Keyword(Keyword::Static) => Ok(ClassVariableStorage::Static),
            Token::Keyword(Keyword::Field) => Ok(ClassVariableStorage::Field)
        })?;
        let typ = self.parse_data_type(false)?;
        let names = self.parse_variable_names()?;
        Ok(ClassVariableDeclaration {
            storage,
            typ,
            names,
        })
    }

    /// 'var' type varName (',' varName)* ';'
    fn parse_local_variable_declaration(&mut self) -> ParseResult<LocalVariableDeclaration> {
        self.expect_next(Keyword::Var.into())?;
        let typ = self.parse_data_type(false)?;
        let names = self.parse_variable_names()?;
        Ok(LocalVariableDeclaration { typ, names })
    }

    fn parse_parameter(&mut self) -> ParseResult<VariableDeclaration> {
        let typ = self.parse_data_type(false)?;
        let name = self.expect_identifier()?;
        Ok(VariableDeclaration { name, typ })
    }

    /// '(' ((type varName) (',' type varName)*)? ')'
    fn parse_parameter_list(&mut self) -> ParseResult<Vec<VariableDeclaration>> {
        self.expect_next(Symbol::LeftParen.into())?;
        let mut parameters = Vec::new();
        if let Some(first) = self.attempt(Self::parse_parameter)? {
            parameters.push(first);
            parameters.extend(self.repeat(|p| {
                p.expect_next(Symbol::Comma.into())?;
                p.parse_parameter()
            })?);
        }
        self.expect_next(Symbol::RightParen.into())?;
        Ok(parameters)
    }

    /// '(' (expression (',' expression)*)? ')'
    fn parse_argument_list(&mut self) -> ParseResult<Vec<Expression>> {
        self.expect_next(Symbol::LeftParen.into())?;
        let mut args = Vec::new();
        if let Some(first) = self.attempt(Self::parse_expression)? {
            args.push(first);
            args.extend(self.repeat(|p| {
                p.expect_next(Symbol::Comma.into())?;
                p.parse_expression()
            })?);
        }
        self.expect_next(Symbol::RightParen.into())?;
        Ok(args)
    }

    /// subroutineName '(' args ')' | (className | varName) '.' subroutineName '(' args ')'
    fn parse_subroutine_call(&mut self) -> ParseResult<SubroutineCall> {
        // An argument list goes through several more frames than a parenthesized term.
        self.nested(Self::parse_subroutine_call_inner)
    }

    fn parse_subroutine_call_inner(&mut self) -> ParseResult<SubroutineCall> {
        let unqualified = self.attempt(|p| {
            let name = p.expect_identifier()?;
            let args = p.parse_argument_list()?;
            Ok(SubroutineCall {
                receiver: None,
                name,
                args,
            })
        })?;
        if let Some(call) = unqualified {
            return Ok(call);
        }
        let receiver = self.expect_identifier()?;
        self.expect_next(Symbol::Dot.into())?;
        let name = self.expect_identifier()?;
        let args = self.parse_argument_list()?;
        Ok(SubroutineCall {
            receiver: Some(receiver),
            name,
            args,
        })
    }

    fn parse_integer_constant(&mut self) -> ParseResult<Term> {
        match_next_token!(self, "integer constant", {
            Token::IntegerConstant(value) => Ok(Term::IntegerConstant(*value))
        })
    }

    fn parse_call_term(&mut self) -> ParseResult<Term> {
        self.parse_subroutine_call().map(Term::SubroutineCall)
    }

    fn parse_string_constant(&mut self) -> ParseResult<Term> {
        match_next_token!(self, "string constant", {
            Token::StringConstant(value) => Ok(Term::StringConstant(value.clone()))
        })
    }

    fn parse_keyword_constant(&mut self) -> ParseResult<Term> {
        let constant = match_next_token!(self, "true, false, null or this", {
            Token::Keyword(Keyword::True) => Ok(KeywordConstant::True),
            Token::Keyword(Keyword::False) => Ok(KeywordConstant::False),
            Token::Keyword(Keyword::Null) => Ok(KeywordConstant::Null),
            Token::Keyword(Keyword::This) => Ok(KeywordConstant::This)
        })?;
        Ok(Term::KeywordConstant(constant))
    }

    /// varName ('[' expression ']')?
    fn parse_variable_term(&mut self) -> ParseResult<Term> {
        let name = self.expect_identifier()?;
        match self.attempt(Self::parse_index)? {
            Some(index) => Ok(Term::ArrayAccess {
                name,
                index: Box::new(index),
            }),
            None => Ok(Term::Variable(name)),
        }
    }

    /// '[' expression ']'
    fn parse_index(&mut self) -> ParseResult<Expression> {
        self.expect_next(Symbol::LeftSquareBracket.into())?;
        let index = self.parse_expression()?;
        self.expect_next(Symbol::RightSquareBracket.into())?;
        Ok(index)
    }

    fn parse_unary_term(&mut self) -> ParseResult<Term> {
        let operator = match_next_token!(self, "- or ~", {
            Token::Symbol(Symbol::Minus) => Ok(UnaryOperator::Negate),
            Token::Symbol(Symbol::Tilde) => Ok(UnaryOperator::BitwiseNot)
        })?;
        let rhs = self.nested(Self::parse_term)?;
        Ok(Term::UnaryOperation {
            operator,
            rhs: Box::new(rhs),
        })
    }

    fn parse_parenthesized_term(&mut self) -> ParseResult<Term> {
        self.expect_next(Symbol::LeftParen.into())?;
        let inner = self.parse_expression()?;
        self.expect_next(Symbol::RightParen.into())?;
        Ok(Term::Parenthesized(Box::new(inner)))
    }

    /// Parses a 'term' of an expression, I.E. anything that isn't a binary operation. The call
    /// shape is tried before a plain variable so that `name(` and `name.name(` become calls.
    fn parse_term(&mut self) -> ParseResult<Term> {
        self.first_match(
            "term",
            &[
                Self::parse_integer_constant,
                Self::parse_call_term,
                Self::parse_string_constant,
                Self::parse_keyword_constant,
                Self::parse_variable_term,
                Self::parse_unary_term,
                Self::parse_parenthesized_term,
            ],
        )
    }

    fn parse_binary_operator(&mut self) -> ParseResult<BinaryOperator> {
        match_next_token!(self, "binary operator", {
            Token::Symbol(Symbol::Plus) => Ok(BinaryOperator::Add),
            Token::Symbol(Symbol::Minus) => Ok(BinaryOperator::Subtract),
            Token::Symbol(Symbol::Asterisk) => Ok(BinaryOperator::Multiply),
            Token::Symbol(Symbol::ForwardSlash) => Ok(BinaryOperator::Divide),
            Token::Symbol(Symbol::Ampersand) => Ok(BinaryOperator::BitwiseAnd),
            Token::Symbol(Symbol::VerticalPipe) => Ok(BinaryOperator::BitwiseOr),
            Token::Symbol(Symbol::LeftAngleBracket) => Ok(BinaryOperator::LessThan),
            Token::Symbol(Symbol::RightAngleBracket) => Ok(BinaryOperator::GreaterThan),
            Token::Symbol(Symbol::Equals) => Ok(BinaryOperator::Equal)
        })
    }

    /// term (op term)*
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.nested(|p| {
            let first = p.parse_term()?;
            let rest = p.repeat(|p| {
                let operator = p.parse_binary_operator()?;
                let term = p.parse_term()?;
                Ok((operator, term))
            })?;
            Ok(Expression { first, rest })
        })
    }

    /// '{' statement* '}'
    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        self.expect_next(Symbol::LeftBrace.into())?;
        let statements = self.repeat(Self::parse_statement)?;
        self.expect_next(Symbol::RightBrace.into())?;
        Ok(statements)
    }

    /// 'let' varName ('[' expression ']')? '=' expression ';'
    fn parse_let_statement(&mut self) -> ParseResult<Statement> {
        self.expect_next(Keyword::Let.into())?;
        let target = self.expect_identifier()?;
        let index = self.attempt(Self::parse_index)?;
        self.expect_next(Symbol::Equals.into())?;
        let value = self.parse_expression()?;
        self.expect_next(Symbol::Semicolon.into())?;
        Ok(Statement::Let {
            target,
            index,
            value,
        })
    }

    /// '(' expression ')'
    fn parse_condition(&mut self) -> ParseResult<Expression> {
        self.expect_next(Symbol::LeftParen.into())?;
        let condition = self.parse_expression()?;
        self.expect_next(Symbol::RightParen.into())?;
        Ok(condition)
    }

    /// 'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?
    fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        self.expect_next(Keyword::If.into())?;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        let else_body = self.attempt(|p| {
            p.expect_next(Keyword::Else.into())?;
            p.parse_block()
        })?;
        Ok(Statement::If {
            condition,
            body,
            else_body,
        })
    }

    /// 'while' '(' expression ')' '{' statements '}'
    fn parse_while_statement(&mut self) -> ParseResult<Statement> {
        self.expect_next(Keyword::While.into())?;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;
        Ok(Statement::While { condition, body })
    }

    /// 'do' subroutineCall ';'
    fn parse_do_statement(&mut self) -> ParseResult<Statement> {
        self.expect_next(Keyword::Do.into())?;
        let call = self.parse_subroutine_call()?;
        self.expect_next(Symbol::Semicolon.into())?;
        Ok(Statement::Do(call))
    }

    /// 'return' expression? ';'
    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        self.expect_next(Keyword::Return.into())?;
        let value = self.attempt(Self::parse_expression)?;
        self.expect_next(Symbol::Semicolon.into())?;
        Ok(Statement::Return(value))
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        self.nested(|p| {
            p.first_match(
                "statement",
                &[
                    Self::parse_let_statement,
                    Self::parse_if_statement,
                    Self::parse_while_statement,
                    Self::parse_do_statement,
                    Self::parse_return_statement,
                ],
            )
        })
    }

    /// ('constructor' | 'function' | 'method') ('void' | type) subroutineName
    /// '(' parameterList ')' '{' varDec* statement* '}'
    fn parse_class_subroutine(&mut self) -> ParseResult<ClassSubroutine> {
        use ClassSubroutineType::*;

        let typ = match_next_token!(self, "constructor, function or method", {
            Token::Keyword(Keyword::Constructor) => Ok(Constructor),
            Token::Keyword(Keyword::Function) => Ok(StaticFunction),
            Token::Keyword(Keyword::Method) => Ok(Method)
        })?;
        let return_type = self.parse_data_type(true)?;
        let name = self.expect_identifier()?;
        let parameters = self.parse_parameter_list()?;
        self.expect_next(Symbol::LeftBrace.into())?;
        let local_variables = self.repeat(Self::parse_local_variable_declaration)?;
        let body = self.repeat(Self::parse_statement)?;
        self.expect_next(Symbol::RightBrace.into())?;
        Ok(ClassSubroutine {
            name,
            typ,
            return_type,
            parameters,
            local_variables,
            body,
        })
    }

    /// 'class' className '{' classVarDec* subroutineDec* '}'
    fn parse_class(&mut self) -> ParseResult<Class> {
        self.expect_next(Keyword::Class.into())?;
        let name = self.expect_identifier()?;
        self.expect_next(Symbol::LeftBrace.into())?;
        let variables = self.repeat(Self::parse_class_variable_declaration)?;
        let subroutines = self.repeat(Self::parse_class_subroutine)?;
        self.expect_next(Symbol::RightBrace.into())?;
        Ok(Class {
            name,
            variables,
            subroutines,
        })
    }

    /// Parses exactly one class and requires that nothing follows it.
    pub fn parse_compilation_unit(mut self) -> Result<Class, ParseError> {
        let class = match self.parse_class() {
            Ok(class) => class,
            Err(err) => return Err(self.most_relevant(err)),
        };
        if let Some(extra) = self.cursor.peek() {
            return Err(ParseError::TrailingInput {
                found: extra.token.to_string(),
                line: extra.line,
                col: extra.col,
            });
        }
        log::debug!(
            "parsed class {} with {} subroutines",
            class.name,
            class.subroutines.len()
        );
        Ok(class)
    }
}

pub fn parse(program: &TokenizedProgram) -> Result<Class, ParseError> {
    Parser::new(program).parse_compilation_unit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> Result<Class, ParseError> {
        parse(&tokenize(source).unwrap())
    }

    /// Parses `source` with a single production and requires all input to be consumed.
    fn parse_with<T>(source: &str, rule: impl FnOnce(&mut Parser<'_>) -> ParseResult<T>) -> T {
        let program = tokenize(source).unwrap();
        let mut parser = Parser::new(&program);
        let node = rule(&mut parser).unwrap();
        assert!(parser.cursor.at_end(), "unconsumed input in {:?}", source);
        node
    }

    fn expression(source: &str) -> Expression {
        parse_with(source, |p| p.parse_expression())
    }

    fn statement(source: &str) -> Statement {
        parse_with(source, |p| p.parse_statement())
    }

    fn single(term: Term) -> Expression {
        Expression {
            first: term,
            rest: Vec::new(),
        }
    }

    fn var(name: &str) -> Term {
        Term::Variable(name.to_owned())
    }

    #[test]
    fn parses_empty_class() {
        let class = parse_source("class Main { }").unwrap();
        assert_eq!(class.name, "Main");
        assert!(class.variables.is_empty());
        assert!(class.subroutines.is_empty());
    }

    #[test]
    fn parses_declarations_in_order() {
        let class = parse_source(
            "class Point {
                field int x, y;
                static Point origin;
                constructor Point new(int ax, int ay) { var int t; var Array a, b; return this; }
                method void clear() { return; }
                function boolean check(char c) { return true; }
            }",
        )
        .unwrap();
        assert_eq!(
            class.variables,
            vec![
                ClassVariableDeclaration {
                    storage: ClassVariableStorage::Field,
                    typ: DataType::BuiltinInt,
                    names: vec!["x".to_owned(), "y".to_owned()],
                },
                ClassVariableDeclaration {
                    storage: ClassVariableStorage::Static,
                    typ: DataType::Other("Point".to_owned()),
                    names: vec!["origin".to_owned()],
                },
            ]
        );
        let types: Vec<_> = class.subroutines.iter().map(|s| s.typ).collect();
        assert_eq!(
            types,
            vec![
                ClassSubroutineType::Constructor,
                ClassSubroutineType::Method,
                ClassSubroutineType::StaticFunction
            ]
        );
        let new = &class.subroutines[0];
        assert_eq!(new.return_type, DataType::Other("Point".to_owned()));
        assert_eq!(new.parameters.len(), 2);
        assert_eq!(new.parameters[1].name, "ay");
        assert_eq!(new.local_variables.len(), 2);
        assert_eq!(new.local_variables[1].names, vec!["a", "b"]);
        assert_eq!(class.subroutines[1].return_type, DataType::BuiltinVoid);
        assert_eq!(class.subroutines[2].parameters[0].typ, DataType::BuiltinChar);
    }

    #[test]
    fn void_is_only_a_return_type() {
        assert!(parse_source("class A { field void x; }").is_err());
        assert!(parse_source("class A { function void f(void x) { return; } }").is_err());
    }

    #[test]
    fn expressions_are_flat_left_to_right_chains() {
        assert_eq!(
            expression("1 + 2 * x"),
            Expression {
                first: Term::IntegerConstant(1),
                rest: vec![
                    (BinaryOperator::Add, Term::IntegerConstant(2)),
                    (BinaryOperator::Multiply, var("x")),
                ],
            }
        );
    }

    #[test]
    fn call_shape_wins_over_plain_identifier() {
        assert_eq!(
            expression("f(1, x)").first,
            Term::SubroutineCall(SubroutineCall {
                receiver: None,
                name: "f".to_owned(),
                args: vec![
                    single(Term::IntegerConstant(1)),
                    single(var("x")),
                ],
            })
        );
        assert_eq!(
            expression("obj.run()").first,
            Term::SubroutineCall(SubroutineCall {
                receiver: Some("obj".to_owned()),
                name: "run".to_owned(),
                args: vec![],
            })
        );
        assert_eq!(expression("f").first, var("f"));
    }

    #[test]
    fn array_access_and_nested_terms() {
        assert_eq!(
            expression("a[i + 1]").first,
            Term::ArrayAccess {
                name: "a".to_owned(),
                index: Box::new(Expression {
                    first: var("i"),
                    rest: vec![(BinaryOperator::Add, Term::IntegerConstant(1))],
                }),
            }
        );
        assert_eq!(
            expression("-~(x)").first,
            Term::UnaryOperation {
                operator: UnaryOperator::Negate,
                rhs: Box::new(Term::UnaryOperation {
                    operator: UnaryOperator::BitwiseNot,
                    rhs: Box::new(Term::Parenthesized(Box::new(single(var("x"))))),
                }),
            }
        );
        assert_eq!(
            expression("\"hi\" = null").rest,
            vec![(
                BinaryOperator::Equal,
                Term::KeywordConstant(KeywordConstant::Null)
            )]
        );
    }

    #[test]
    fn statements() {
        assert_eq!(
            statement("let a[0] = 1;"),
            Statement::Let {
                target: "a".to_owned(),
                index: Some(single(Term::IntegerConstant(0))),
                value: single(Term::IntegerConstant(1)),
            }
        );
        assert_eq!(
            statement("if (x) { } else { return; }"),
            Statement::If {
                condition: single(var("x")),
                body: vec![],
                else_body: Some(vec![Statement::Return(None)]),
            }
        );
        assert_eq!(
            statement("if (x) { return 1; }"),
            Statement::If {
                condition: single(var("x")),
                body: vec![Statement::Return(Some(single(
                    Term::IntegerConstant(1)
                )))],
                else_body: None,
            }
        );
        assert_eq!(
            statement("while (true) { do Output.println(); }"),
            Statement::While {
                condition: single(Term::KeywordConstant(KeywordConstant::True)),
                body: vec![Statement::Do(SubroutineCall {
                    receiver: Some("Output".to_owned()),
                    name: "println".to_owned(),
                    args: vec![],
                })],
            }
        );
    }

    #[test]
    fn do_requires_a_call() {
        let program = tokenize("do x;").unwrap();
        assert!(Parser::new(&program).parse_statement().is_err());
    }

    #[test]
    fn rejects_trailing_input() {
        let err = parse_source("class A { } class B { }").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { line: 1, col: 13, .. }));
    }

    #[test]
    fn reports_the_furthest_failure() {
        let err = parse_source("class A {\n function void f() {\n  let x = ;\n }\n}").unwrap_err();
        match err {
            ParseError::Mismatch {
                expected,
                found,
                line,
                col,
                ..
            } => {
                assert_eq!(expected, "term");
                assert_eq!(found, "symbol ';'");
                assert_eq!((line, col), (3, 11));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn reports_unexpected_end_of_file() {
        let err = parse_source("class A { function void f() {").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }), "{:?}", err);
    }

    #[test]
    fn deep_nesting_fails_cleanly() {
        let depth = MAX_NESTING_DEPTH + 10;
        let source = format!(
            "class A {{ function int f() {{ return {}1{}; }} }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let err = parse_source(&source).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{:?}", err);
    }

    #[test]
    fn deeply_nested_calls_fail_cleanly() {
        for shape in ["f(", "Math.abs(", "a[", "-(", "~"] {
            let closing = match shape {
                "f(" | "Math.abs(" | "-(" => ")",
                "a[" => "]",
                _ => "",
            };
            let source = format!(
                "class A {{ function int f(Array a) {{ return {}1{}; }} }}",
                shape.repeat(250),
                closing.repeat(250)
            );
            let err = parse_source(&source).unwrap_err();
            assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{}: {:?}", shape, err);
        }
    }

    #[test]
    fn deeply_nested_statements_fail_cleanly() {
        let depth = MAX_NESTING_DEPTH + 10;
        let source = format!(
            "class A {{ function void f() {{ {}return;{} }} }}",
            "while (true) { ".repeat(depth),
            " }".repeat(depth)
        );
        let err = parse_source(&source).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{:?}", err);
    }

    #[test]
    fn nesting_just_under_the_limit_is_accepted() {
        // Every call level counts twice: once for the call, once for its argument.
        let source = format!(
            "class A {{ function int f(int x) {{ return {}1{}; }} }}",
            "f(".repeat(MAX_NESTING_DEPTH / 2 - 2),
            ")".repeat(MAX_NESTING_DEPTH / 2 - 2)
        );
        assert!(parse_source(&source).is_ok());
    }

    #[test]
    fn moderate_nesting_is_fine() {
        let source = format!(
            "class A {{ function int f() {{ return {}1{}; }} }}",
            "(".repeat(20),
            ")".repeat(20)
        );
        assert!(parse_source(&source).is_ok());
    }
}

use std::fmt::{Display, Formatter};

/// Every token of one compilation unit, in source order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenizedProgram {
    pub tokens: Vec<SourceToken>,
}

impl TokenizedProgram {
    /// Renders the token listing in the XML format used by the course tools, one token per
    /// line.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<tokens>\n");
        for source_token in &self.tokens {
            let token = &source_token.token;
            let tag = token.kind().xml_tag();
            xml.push_str(&format!("<{tag}> {} </{tag}>\n", escape_xml(&token.text())));
        }
        xml.push_str("</tokens>\n");
        xml
    }

    /// The token texts joined by single spaces. Comments and layout are the only information
    /// lost compared to the source.
    pub fn to_spaced_text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| match &t.token {
                Token::StringConstant(value) => format!("\"{}\"", value),
                other => other.text(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A token together with where it started in the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceToken {
    pub token: Token,
    /// Byte offset of the first character.
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Keyword(Keyword),
    Symbol(Symbol),
    /// Always within 0..=32767, the tokenizer rejects anything larger.
    IntegerConstant(u16),
    StringConstant(String),
    Identifier(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Symbol,
    IntegerConstant,
    StringConstant,
    Identifier,
}

impl TokenKind {
    fn xml_tag(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Symbol => "symbol",
            Self::IntegerConstant => "integerConstant",
            Self::StringConstant => "stringConstant",
            Self::Identifier => "identifier",
        }
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Keyword(_) => TokenKind::Keyword,
            Self::Symbol(_) => TokenKind::Symbol,
            Self::IntegerConstant(_) => TokenKind::IntegerConstant,
            Self::StringConstant(_) => TokenKind::StringConstant,
            Self::Identifier(_) => TokenKind::Identifier,
        }
    }

    /// The payload of the token. String constants are returned without their quotes.
    pub fn text(&self) -> String {
        match self {
            Self::Keyword(k) => k.as_text().to_owned(),
            Self::Symbol(s) => s.as_text().to_owned(),
            Self::IntegerConstant(v) => v.to_string(),
            Self::StringConstant(v) | Self::Identifier(v) => v.clone(),
        }
    }
}

impl From<Keyword> for Token {
    fn from(other: Keyword) -> Self {
        Self::Keyword(other)
    }
}

impl From<Symbol> for Token {
    fn from(other: Symbol) -> Self {
        Self::Symbol(other)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword(k) => write!(f, "keyword '{}'", k),
            Self::Symbol(s) => write!(f, "symbol '{}'", s),
            Self::IntegerConstant(v) => write!(f, "integer literal '{}'", v),
            Self::StringConstant(v) => write!(f, "string literal \"{}\"", v),
            Self::Identifier(v) => write!(f, "identifier '{}'", v),
        }
    }
}

/// This is a macro for creating an enum with functions to convert back and forth from a string
/// representation.
macro_rules! keyword_enum {
    ($EnumName:ident $($VariantName:ident $value:literal)*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $EnumName {
            $($VariantName),*
        }
        impl $EnumName {
            /// Returns the variant whose text is `text`, if there is one.
            pub fn from_text(text: &str) -> Option<Self> {
                match text {
                    $($value => Some(Self::$VariantName),)*
                    _ => None
                }
            }

            /// Returns the source text of this variant.
            pub fn as_text(self) -> &'static str {
                match self {
                    $(Self::$VariantName => $value,)*
                }
            }
        }
        impl Display for $EnumName {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_text())
            }
        }
    }
}

keyword_enum! {
    Keyword
    Class "class"
    Constructor "constructor"
    Function "function"
    Method "method"
    Field "field"
    Static "static"
    Var "var"
    Int "int"
    Char "char"
    Boolean "boolean"
    Void "void"
    True "true"
    False "false"
    Null "null"
    This "this"
    Let "let"
    Do "do"
    If "if"
    Else "else"
    While "while"
    Return "return"
}

keyword_enum! {
    Symbol
    LeftBrace "{"
    RightBrace "}"
    LeftParen "("
    RightParen ")"
    LeftSquareBracket "["
    RightSquareBracket "]"
    Dot "."
    Comma ","
    Semicolon ";"
    Plus "+"
    Minus "-"
    // The actual symbol names rather than the name of the operation they represent are used here
    // for clarity regarding what this enum actually does.
    Asterisk "*"
    ForwardSlash "/"
    Ampersand "&"
    VerticalPipe "|"
    LeftAngleBracket "<"
    RightAngleBracket ">"
    Equals "="
    Tilde "~"
}

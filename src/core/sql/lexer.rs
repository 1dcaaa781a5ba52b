use crate::core::error::DbError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // 关键字
    Select,
    From,
    Where,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    As,
    And,
    Or,
    Not,
    Is,
    Null,
    True,
    False,
    // 操作符
    Eq,    // = 或 ==
    Ne,    // != 或 <>
    Gt,    // >
    Lt,    // <
    Ge,    // >=
    Le,    // <=
    Minus, // -
    Asterisk,
    // 分隔符
    Comma,     // ,
    Semicolon, // ;
    LParen,    // (
    RParen,    // )
    // 字面量
    Identifier(String),
    String(String),
    Integer(i64),
    Float(f64),
}

/// 关键字表。列名与这些词相同时必须加双引号
pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "ORDER", "BY", "ASC", "DESC", "LIMIT", "AS",
    "AND", "OR", "NOT", "IS", "NULL", "TRUE", "FALSE",
];

pub fn is_keyword(word: &str) -> bool {
    let upper = word.to_uppercase();
    KEYWORDS.iter().any(|k| *k == upper)
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new() -> Self {
        Lexer {
            input: Vec::new(),
            position: 0,
        }
    }

    pub fn tokenize(&mut self, input: &str) -> Result<Vec<Token>, DbError> {
        self.input = input.chars().collect();
        self.position = 0;
        let mut tokens = Vec::new();

        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.position += 1;
                continue;
            }

            // 注释直接跳过
            if c == '-' && self.peek() == Some('-') {
                self.position += 2;
                self.read_until('\n');
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                let identifier = self.read_identifier();
                let token = match identifier.to_uppercase().as_str() {
                    "SELECT" => Token::Select,
                    "FROM" => Token::From,
                    "WHERE" => Token::Where,
                    "ORDER" => Token::Order,
                    "BY" => Token::By,
                    "ASC" => Token::Asc,
                    "DESC" => Token::Desc,
                    "LIMIT" => Token::Limit,
                    "AS" => Token::As,
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    "IS" => Token::Is,
                    "NULL" => Token::Null,
                    "TRUE" => Token::True,
                    "FALSE" => Token::False,
                    _ => Token::Identifier(identifier),
                };
                tokens.push(token);
                continue;
            }

            if c.is_ascii_digit() || (c == '.' && self.peek().map_or(false, |p| p.is_ascii_digit())) {
                tokens.push(self.read_number(false)?);
                continue;
            }

            // 方言里没有算术运算，紧跟数字的负号属于字面量本身，这样 i64::MIN 也能表示
            if c == '-' && self.peek().map_or(false, |p| p.is_ascii_digit() || p == '.') {
                self.position += 1;
                tokens.push(self.read_number(true)?);
                continue;
            }

            // 字符串, '' 表示单引号本身
            if c == '\'' {
                self.position += 1;
                let string = self.read_quoted('\'')?;
                tokens.push(Token::String(string));
                continue;
            }

            // 带双引号的标识符
            if c == '"' {
                self.position += 1;
                let identifier = self.read_quoted('"')?;
                tokens.push(Token::Identifier(identifier));
                continue;
            }

            let token = match c {
                '=' if self.peek() == Some('=') => {
                    self.position += 1;
                    Token::Eq
                }
                '=' => Token::Eq,
                '!' if self.peek() == Some('=') => {
                    self.position += 1;
                    Token::Ne
                }
                '<' if self.peek() == Some('>') => {
                    self.position += 1;
                    Token::Ne
                }
                '>' if self.peek() == Some('=') => {
                    self.position += 1;
                    Token::Ge
                }
                '>' => Token::Gt,
                '<' if self.peek() == Some('=') => {
                    self.position += 1;
                    Token::Le
                }
                '<' => Token::Lt,
                '-' => Token::Minus,
                '*' => Token::Asterisk,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '(' => Token::LParen,
                ')' => Token::RParen,
                _ => return Err(DbError::SqlError(format!("未知字符: {}", c))),
            };
            tokens.push(token);
            self.position += 1;
        }

        Ok(tokens)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                identifier.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        identifier
    }

    fn read_number(&mut self, negative: bool) -> Result<Token, DbError> {
        let mut number = if negative { String::from("-") } else { String::new() };
        let mut seen_dot = false;
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                number.push(c);
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                number.push(c);
            } else {
                break;
            }
            self.position += 1;
        }

        if seen_dot {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| DbError::SqlError(format!("无效数字: {}", number)))
        } else {
            number
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| DbError::SqlError(format!("数字超出范围: {}", number)))
        }
    }

    // 读取到配对的引号为止，连续两个引号视为转义
    fn read_quoted(&mut self, quote: char) -> Result<String, DbError> {
        let mut result = String::new();
        while let Some(c) = self.current() {
            self.position += 1;
            if c == quote {
                if self.current() == Some(quote) {
                    result.push(quote);
                    self.position += 1;
                    continue;
                }
                return Ok(result);
            }
            result.push(c);
        }
        Err(DbError::SqlError(format!("缺少结束引号 {}", quote)))
    }

    fn read_until(&mut self, end: char) {
        while let Some(c) = self.current() {
            if c == end {
                break;
            }
            self.position += 1;
        }
    }
}

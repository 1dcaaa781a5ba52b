use crate::core::error::DbError;
use crate::core::types::DataType;
use super::lexer::Token;
use super::{
    AggregateArgument, AggregateFunction, Operator, OrderBy, Projection, SelectItem,
    SelectStatement, SortDirection, WhereClause,
};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            tokens: Vec::new(),
            position: 0,
        }
    }

    pub fn parse(&mut self, tokens: Vec<Token>) -> Result<SelectStatement, DbError> {
        self.tokens = tokens;
        self.position = 0;

        if self.tokens.is_empty() {
            return Err(DbError::SqlError("空语句".to_string()));
        }

        let statement = match self.peek() {
            Some(Token::Select) => self.parse_select()?,
            Some(token) => return Err(DbError::SqlError(format!("只支持 SELECT 语句, 实际以 {:?} 开始", token))),
            None => return Err(DbError::SqlError("空语句".to_string())),
        };

        // 末尾最多一个分号，之后不允许再有任何内容
        if let Some(Token::Semicolon) = self.peek() {
            self.next();
        }
        if let Some(token) = self.peek() {
            return Err(DbError::SqlError(format!("语句结束后出现多余内容: {:?}", token)));
        }

        Ok(statement)
    }

    fn parse_select(&mut self) -> Result<SelectStatement, DbError> {
        self.expect(Token::Select)?;

        let mut items = Vec::new();
        loop {
            items.push(self.parse_select_item()?);

            match self.peek() {
                Some(Token::Comma) => {
                    self.next();
                    continue;
                }
                Some(Token::From) => break,
                _ => return Err(DbError::SqlError("期望逗号或FROM子句".to_string())),
            }
        }

        self.expect(Token::From)?;
        let table = self.parse_identifier("期望表名")?;

        let where_clause = if matches!(self.peek(), Some(Token::Where)) {
            self.next();
            Some(self.parse_or_condition()?)
        } else {
            None
        };

        let order_by = self.parse_order_by()?;
        let limit = self.parse_limit()?;

        Ok(SelectStatement {
            items,
            table,
            where_clause,
            order_by,
            limit,
        })
    }

    fn parse_select_item(&mut self) -> Result<SelectItem, DbError> {
        if let Some(Token::Asterisk) = self.peek() {
            self.next();
            return Ok(SelectItem { projection: Projection::Wildcard, alias: None });
        }

        let name = self.parse_identifier("期望列名或聚合函数")?;

        let projection = if let Some(Token::LParen) = self.peek() {
            let function = AggregateFunction::from_name(&name)
                .ok_or_else(|| DbError::SqlError(format!("不支持的函数: {}", name)))?;
            self.next(); // 消费左括号
            let argument = match self.peek() {
                Some(Token::Asterisk) if function == AggregateFunction::Count => {
                    self.next();
                    AggregateArgument::Star
                }
                Some(Token::Asterisk) => {
                    return Err(DbError::SqlError(format!("{}(*) 不受支持", function.name())));
                }
                _ => AggregateArgument::Column(self.parse_identifier("期望列名")?),
            };
            self.expect(Token::RParen)?;
            Projection::Aggregate { function, argument }
        } else {
            Projection::Column(name)
        };

        let alias = if let Some(Token::As) = self.peek() {
            self.next();
            Some(self.parse_identifier("期望别名")?)
        } else {
            None
        };

        Ok(SelectItem { projection, alias })
    }

    fn parse_or_condition(&mut self) -> Result<WhereClause, DbError> {
        let mut left = self.parse_and_condition()?;

        while let Some(Token::Or) = self.peek() {
            self.next(); // 消费 OR
            let right = self.parse_and_condition()?;
            left = WhereClause::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_condition(&mut self) -> Result<WhereClause, DbError> {
        let mut left = self.parse_condition()?;

        while let Some(Token::And) = self.peek() {
            self.next(); // 消费 AND
            let right = self.parse_condition()?;
            left = WhereClause::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_condition(&mut self) -> Result<WhereClause, DbError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.next();
                let condition = self.parse_or_condition()?;
                self.expect(Token::RParen)?;
                return Ok(condition);
            }
            Some(Token::Not) => {
                self.next();
                let condition = self.parse_condition()?;
                return Ok(WhereClause::Not(Box::new(condition)));
            }
            _ => {}
        }

        let column = self.parse_identifier("期望列名")?;

        // IS NULL / IS NOT NULL
        if let Some(Token::Is) = self.peek() {
            self.next();
            let negated = if let Some(Token::Not) = self.peek() {
                self.next();
                true
            } else {
                false
            };
            self.expect(Token::Null)?;
            return Ok(WhereClause::IsNull { column, negated });
        }

        let operator = match self.next() {
            Some(Token::Eq) => Operator::Eq,
            Some(Token::Ne) => Operator::Ne,
            Some(Token::Gt) => Operator::Gt,
            Some(Token::Lt) => Operator::Lt,
            Some(Token::Ge) => Operator::Ge,
            Some(Token::Le) => Operator::Le,
            _ => return Err(DbError::SqlError("期望操作符".to_string())),
        };

        let value = self.parse_value()?;

        Ok(WhereClause::Simple { column, operator, value })
    }

    fn parse_value(&mut self) -> Result<DataType, DbError> {
        match self.next() {
            Some(Token::Integer(n)) => Ok(DataType::Int(n)),
            Some(Token::Float(f)) => Ok(DataType::Real(f)),
            Some(Token::String(s)) => Ok(DataType::Text(s)),
            Some(Token::Null) => Ok(DataType::Null),
            Some(Token::True) => Ok(DataType::Int(1)),
            Some(Token::False) => Ok(DataType::Int(0)),
            Some(Token::Minus) => match self.next() {
                Some(Token::Integer(n)) => n
                    .checked_neg()
                    .map(DataType::Int)
                    .ok_or_else(|| DbError::SqlError("数字超出范围".to_string())),
                Some(Token::Float(f)) => Ok(DataType::Real(-f)),
                _ => Err(DbError::SqlError("负号后期望数字".to_string())),
            },
            _ => Err(DbError::SqlError("期望值".to_string())),
        }
    }

    fn parse_order_by(&mut self) -> Result<Option<OrderBy>, DbError> {
        if let Some(Token::Order) = self.peek() {
            self.next(); // 消费 ORDER
            self.expect(Token::By)?;

            let column = self.parse_identifier("期望列名")?;

            let direction = match self.peek() {
                Some(Token::Asc) => {
                    self.next();
                    SortDirection::Asc
                }
                Some(Token::Desc) => {
                    self.next();
                    SortDirection::Desc
                }
                _ => SortDirection::Asc, // 默认升序
            };

            return Ok(Some(OrderBy { column, direction }));
        }

        Ok(None)
    }

    fn parse_limit(&mut self) -> Result<Option<usize>, DbError> {
        if let Some(Token::Limit) = self.peek() {
            self.next();
            return match self.next() {
                Some(Token::Integer(n)) if n >= 0 => Ok(Some(n as usize)),
                _ => Err(DbError::SqlError("LIMIT 期望非负整数".to_string())),
            };
        }
        Ok(None)
    }

    fn parse_identifier(&mut self, message: &str) -> Result<String, DbError> {
        match self.next() {
            Some(Token::Identifier(name)) => Ok(name),
            _ => Err(DbError::SqlError(message.to_string())),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), DbError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(DbError::SqlError(format!("期望 {:?}, 实际 {:?}", expected, token))),
            None => Err(DbError::SqlError(format!("期望 {:?}, 但已到结尾", expected))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }
}

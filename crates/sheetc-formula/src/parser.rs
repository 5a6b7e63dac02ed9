//! Formula parser
//!
//! A recursive descent parser for Excel formulas with proper operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use sheetc_core::{CellAddress, CellError, CellRange};

/// Deepest expression nesting the parser accepts
pub const MAX_NESTING: usize = 64;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use sheetc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// let ast = parse_formula("='Rates 2024'!B2*2").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();

    let formula = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    let mut parser = FormulaParser::new(formula);
    let expr = parser.parse_expression()?;

    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected token after expression: {:?}",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    Identifier(String), // Function name or named range
    CellRef(String),    // Cell reference like A1, $A$1
    SheetRef(String),   // Sheet prefix like Sheet1! or 'My Sheet'!

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    Unknown(char),

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            depth: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Token::Eof;
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Token::LessEqual;
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Token::NotEqual;
            }
            return Token::LessThan;
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Token::GreaterEqual;
            }
            return Token::GreaterThan;
        }

        if c == '"' {
            return self.scan_string();
        }

        if c == '\'' {
            return self.scan_quoted_sheet();
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_alphabetic() || c == '_' || c == '$' || c == '#' {
            return self.scan_identifier_or_ref();
        }

        self.advance();
        Token::Unknown(c)
    }

    fn scan_string(&mut self) -> Token {
        self.advance(); // opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                if self.peek_char_at(1) == Some('"') {
                    s.push('"');
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        if self.peek_char() == Some('"') {
            self.advance();
        }

        Token::String(s)
    }

    /// `'My Sheet'!` with `''` as an escaped quote
    fn scan_quoted_sheet(&mut self) -> Token {
        self.advance(); // opening quote

        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if c == '\'' {
                if self.peek_char_at(1) == Some('\'') {
                    name.push('\'');
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
            } else {
                name.push(c);
                self.advance();
            }
        }

        if self.peek_char() == Some('\'') {
            self.advance();
        }

        if self.peek_char() == Some('!') {
            self.advance();
            return Token::SheetRef(name);
        }

        Token::Unknown('\'')
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        let num: f64 = num_str.parse().unwrap_or(0.0);
        Token::Number(num)
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        // Error values first (#VALUE!, #REF!, etc.)
        if self.peek_char() == Some('#') {
            let start = self.pos;
            self.advance();
            while self.peek_char().map_or(false, |c| {
                c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?'
            }) {
                self.advance();
            }
            let error_str = &self.input[start..self.pos];
            if let Some(err) = CellError::parse(error_str) {
                return Token::Error(err);
            }
            return Token::Identifier(error_str.to_string());
        }

        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        if self.peek_char() == Some('!') {
            self.advance();
            return Token::SheetRef(text.to_string());
        }

        // TRUE/FALSE followed by '(' are the zero-argument functions
        let upper = text.to_uppercase();
        if upper == "TRUE" && self.peek_char() != Some('(') {
            return Token::Boolean(true);
        }
        if upper == "FALSE" && self.peek_char() != Some('(') {
            return Token::Boolean(false);
        }

        // LOG10(100) is a function call, not a cell reference
        if Self::is_cell_reference(text) && self.peek_char() != Some('(') {
            return Token::CellRef(text.to_string());
        }

        Token::Identifier(text.to_string())
    }

    fn is_cell_reference(text: &str) -> bool {
        // [$]letters[$]digits, nothing else
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        if chars.get(i) == Some(&'$') {
            i += 1;
        }

        let letter_start = i;
        while i < chars.len() && chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == letter_start || i - letter_start > 3 {
            return false;
        }

        if chars.get(i) == Some(&'$') {
            i += 1;
        }

        let digit_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == digit_start {
            return false;
        }

        i == chars.len()
    }

    /// `A`, `$XFD`: what a whole-column range endpoint looks like
    fn is_column_only(text: &str) -> bool {
        let letters = text.trim_start_matches('$');
        !letters.is_empty() && letters.len() <= 3 && letters.chars().all(|c| c.is_ascii_alphabetic())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Unary: -, %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FormulaError::TooDeep(MAX_NESTING));
        }
        let result = self.parse_comparison();
        self.depth -= 1;
        result
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current_token(), Token::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        // Excel evaluates ^ left to right: 2^3^2 = 64
        while matches!(self.current_token(), Token::Caret) {
            self.consume();
            let right = self.parse_unary()?;
            left = binary(BinaryOperator::Power, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            self.depth += 1;
            if self.depth > MAX_NESTING {
                return Err(FormulaError::TooDeep(MAX_NESTING));
            }
            let operand = self.parse_unary();
            self.depth -= 1;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand?),
            });
        }

        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.parse_unary();
        }

        let mut expr = self.parse_range()?;

        while matches!(self.current_token(), Token::Percent) {
            self.consume();
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }

        self.consume();
        let right = self.parse_primary()?;

        match (&left, &right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                Ok(FormulaExpr::RangeRef(CellRange::new(*start, *end)))
            }
            (FormulaExpr::NameRef(start), FormulaExpr::NameRef(end))
                if Self::is_column_only(start) && Self::is_column_only(end) =>
            {
                Err(FormulaError::UnsupportedRange(format!(
                    "whole-column range {}:{}",
                    start, end
                )))
            }
            (FormulaExpr::Number(start), FormulaExpr::Number(end))
                if start.fract() == 0.0 && end.fract() == 0.0 =>
            {
                Err(FormulaError::UnsupportedRange(format!(
                    "whole-row range {}:{}",
                    start, end
                )))
            }
            _ => Ok(binary(BinaryOperator::Range, left, right)),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(FormulaExpr::Number(n))
            }

            Token::String(s) => {
                self.consume();
                Ok(FormulaExpr::String(s))
            }

            Token::Boolean(b) => {
                self.consume();
                Ok(FormulaExpr::Boolean(b))
            }

            Token::Error(e) => {
                self.consume();
                Ok(FormulaExpr::Error(e))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(FormulaExpr::Paren(Box::new(expr)))
            }

            Token::LeftBrace => self.parse_array(),

            Token::SheetRef(sheet) => {
                self.consume();
                self.parse_sheet_reference(sheet)
            }

            Token::CellRef(ref_str) => {
                self.consume();
                Ok(FormulaExpr::CellRef(self.parse_cell_address(&ref_str)?))
            }

            Token::Identifier(name) => {
                self.consume();
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name))
                }
            }

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_array(&mut self) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftBrace)?;

        let mut rows = Vec::new();
        let mut current_row = Vec::new();

        if !matches!(self.current_token(), Token::RightBrace) {
            current_row.push(self.parse_expression()?);

            loop {
                match self.current_token() {
                    Token::Comma => {
                        self.consume();
                        current_row.push(self.parse_expression()?);
                    }
                    Token::Semicolon => {
                        self.consume();
                        rows.push(std::mem::take(&mut current_row));
                        current_row.push(self.parse_expression()?);
                    }
                    Token::RightBrace => break,
                    _ => {
                        return Err(FormulaError::Parse(
                            "Expected ',' ';' or '}' in array".into(),
                        ))
                    }
                }
            }
        }

        if !current_row.is_empty() {
            rows.push(current_row);
        }

        self.expect(&Token::RightBrace)?;
        Ok(FormulaExpr::Array(rows))
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_argument()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_argument()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }

    fn parse_argument(&mut self) -> FormulaResult<FormulaExpr> {
        if matches!(self.current_token(), Token::Comma | Token::RightParen) {
            return Ok(FormulaExpr::Missing);
        }
        self.parse_expression()
    }

    fn parse_sheet_reference(&mut self, sheet: String) -> FormulaResult<FormulaExpr> {
        let reference = match self.current_token().clone() {
            Token::CellRef(ref_str) => {
                self.consume();
                let start = self.parse_cell_address(&ref_str)?;
                if matches!(self.current_token(), Token::Colon) {
                    self.consume();
                    let end = match self.consume() {
                        Token::CellRef(end_str) => self.parse_cell_address(&end_str)?,
                        // Sheet1!A1:Sheet1!B2
                        Token::SheetRef(end_sheet) if end_sheet.eq_ignore_ascii_case(&sheet) => {
                            match self.consume() {
                                Token::CellRef(end_str) => self.parse_cell_address(&end_str)?,
                                other => {
                                    return Err(FormulaError::Parse(format!(
                                        "Expected cell reference after '{}!', got {:?}",
                                        end_sheet, other
                                    )))
                                }
                            }
                        }
                        Token::SheetRef(end_sheet) => {
                            return Err(FormulaError::Parse(format!(
                                "Range spans two sheets: {} and {}",
                                sheet, end_sheet
                            )))
                        }
                        other => {
                            return Err(FormulaError::Parse(format!(
                                "Expected end of range after ':', got {:?}",
                                other
                            )))
                        }
                    };
                    FormulaExpr::RangeRef(CellRange::new(start, end))
                } else {
                    FormulaExpr::CellRef(start)
                }
            }
            Token::Identifier(name) => {
                self.consume();
                if matches!(self.current_token(), Token::Colon) && Self::is_column_only(&name) {
                    return Err(FormulaError::UnsupportedRange(format!(
                        "whole-column range on sheet {}",
                        sheet
                    )));
                }
                FormulaExpr::NameRef(name)
            }
            Token::Number(_) => {
                return Err(FormulaError::UnsupportedRange(format!(
                    "whole-row range on sheet {}",
                    sheet
                )))
            }
            other => {
                return Err(FormulaError::Parse(format!(
                    "Expected reference after '{}!', got {:?}",
                    sheet, other
                )))
            }
        };

        Ok(FormulaExpr::Sheet {
            sheet,
            reference: Box::new(reference),
        })
    }

    fn parse_cell_address(&self, ref_str: &str) -> FormulaResult<CellAddress> {
        CellAddress::parse(ref_str).map_err(|e| {
            FormulaError::InvalidReference(format!("'{}': {}", ref_str, e))
        })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

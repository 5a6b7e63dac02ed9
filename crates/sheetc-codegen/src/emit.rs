//! Source emission
//!
//! [`CodeEmitter`] is the seam between the target-neutral [`Program`] and text.
//! [`RustEmitter`] prints one struct per class plus a `Model` that owns every
//! class and evaluates them in dependency order:
//!
//! ```text
//! pub struct Global { pub a1: f64 }
//! pub struct ClassB1 { pub b1: f64 }
//! impl ClassB1 {
//!     pub fn calculate(&mut self, global: &Global) {
//!         let b1: f64 = global.a1 + 1.0;
//!         self.b1 = b1;
//!     }
//! }
//! pub struct Model { pub global: Global, pub class_b1: ClassB1 }
//! ```

use std::fmt::Write;

use sheetc_graph::ClassKind;

use crate::error::CodegenResult;
use crate::expr::{BinaryOp, Expr, UnaryOp, ValueType};
use crate::options::CodegenOptions;
use crate::program::{ClassUnit, Program};

/// Turns a program into source text
pub trait CodeEmitter {
    fn emit(&self, program: &Program) -> CodegenResult<String>;
}

/// Emits Rust source that depends on the runtime crate
#[derive(Debug, Clone, Default)]
pub struct RustEmitter {
    options: CodegenOptions,
}

impl CodeEmitter for RustEmitter {
    fn emit(&self, program: &Program) -> CodegenResult<String> {
        let mut body = String::new();
        writeln!(
            body,
            "// Generated by sheetc from sheet '{}'. Do not edit.",
            program.sheet
        )?;
        writeln!(body)?;
        writeln!(body, "use {} as rt;", self.options.runtime_crate)?;

        for unit in &program.units {
            writeln!(body)?;
            self.unit(&mut body, program, unit)?;
        }
        writeln!(body)?;
        self.model(&mut body, program)?;

        let Some(module) = &self.options.module_name else {
            return Ok(body);
        };
        let mut out = String::with_capacity(body.len() + body.lines().count() * 4);
        writeln!(out, "pub mod {module} {{")?;
        for line in body.lines() {
            if line.is_empty() {
                writeln!(out)?;
            } else {
                writeln!(out, "    {line}")?;
            }
        }
        writeln!(out, "}}")?;
        Ok(out)
    }
}

impl RustEmitter {
    pub fn new(options: CodegenOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    /// Render a single expression
    pub fn expression(&self, expr: &Expr) -> String {
        match expr {
            Expr::Number(n) => number(*n),
            Expr::Text(s) => format!("String::from({s:?})"),
            Expr::Bool(b) => b.to_string(),
            Expr::Error(e) => format!("rt::Dynamic::Error(rt::CellError::{e:?})"),
            Expr::Empty => "rt::Dynamic::Empty".to_string(),
            Expr::Constant { path, .. } => path.to_string(),
            Expr::Ident { name, ty } => owned(name.clone(), *ty),
            Expr::Member { owner, field, ty } => owned(format!("{owner}.{field}"), *ty),
            Expr::Group(inner) => match inner.as_ref() {
                Expr::Binary { .. } | Expr::Unary { .. } => {
                    format!("({})", self.expression(inner))
                }
                other => self.expression(other),
            },
            Expr::Binary {
                op,
                left,
                right,
                parenthesize,
            } => format!(
                "{} {} {}",
                self.operand(left, *op, *parenthesize, false),
                op.symbol(),
                self.operand(right, *op, *parenthesize, true)
            ),
            Expr::Unary { op, operand } => {
                let sign = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                };
                let inner = self.expression(operand);
                match operand.as_ref() {
                    Expr::Binary { .. } | Expr::Unary { .. } | Expr::If { .. } => {
                        format!("{sign}({inner})")
                    }
                    Expr::Number(n) if *n < 0.0 => format!("{sign}({inner})"),
                    _ => format!("{sign}{inner}"),
                }
            }
            Expr::Call { function, args, .. } => {
                format!("rt::{function}({})", self.list(args))
            }
            Expr::Method {
                receiver,
                method,
                args,
                ..
            } if untyped_float(receiver) => {
                let receiver = match receiver.as_ref() {
                    Expr::Group(inner) => inner.as_ref(),
                    other => other,
                };
                let mut all = vec![self.expression(receiver)];
                all.extend(args.iter().map(|e| self.expression(e)));
                format!("f64::{method}({})", all.join(", "))
            }
            Expr::Method {
                receiver,
                method,
                args,
                ..
            } => format!("{}.{method}({})", self.receiver(receiver), self.list(args)),
            Expr::List(items) => format!("&[{}]", self.list(items)),
            Expr::Matrix(rows) => {
                let rows: Vec<String> = rows
                    .iter()
                    .map(|row| format!("vec![{}]", self.list(row)))
                    .collect();
                format!("&[{}]", rows.join(", "))
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition = match condition.as_ref() {
                    e @ Expr::If { .. } => format!("({})", self.expression(e)),
                    e => self.expression(e),
                };
                format!(
                    "if {condition} {{ {} }} else {{ {} }}",
                    self.expression(then_branch),
                    self.expression(else_branch)
                )
            }
            Expr::Cast { expr, to } => match (to, expr.as_ref()) {
                (ValueType::Dynamic, Expr::Text(s)) => format!("rt::Dynamic::from({s:?})"),
                (ValueType::Dynamic, e) => format!("rt::Dynamic::from({})", self.expression(e)),
                (ValueType::Number, e) => format!("rt::num({})", self.expression(e)),
                (ValueType::Bool, e) => format!("rt::truthy({})", self.expression(e)),
                (ValueType::Text, e) => format!("rt::text({})", self.expression(e)),
                (ValueType::Date, e) => format!("rt::date({})", self.expression(e)),
            },
            Expr::Placeholder { comment } => format!(
                "/* {} */ rt::Dynamic::Error(rt::CellError::Name)",
                comment.replace("*/", "* /").replace("/*", "/ *")
            ),
        }
    }

    fn list(&self, items: &[Expr]) -> String {
        items
            .iter()
            .map(|e| self.expression(e))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn operand(&self, child: &Expr, parent: BinaryOp, parenthesize: bool, right: bool) -> String {
        let text = self.expression(child);
        let wrap = match child {
            Expr::If { .. } => true,
            Expr::Binary { op, .. } if parenthesize => {
                let (inner, outer) = (precedence(*op), precedence(parent));
                inner < outer || (inner == outer && (right || parent.is_comparison()))
            }
            _ => false,
        };
        if wrap {
            format!("({text})")
        } else {
            text
        }
    }

    fn receiver(&self, receiver: &Expr) -> String {
        match receiver {
            Expr::Binary { .. } | Expr::Unary { .. } | Expr::If { .. } => {
                format!("({})", self.expression(receiver))
            }
            other => self.expression(other),
        }
    }

    fn unit(&self, out: &mut String, program: &Program, unit: &ClassUnit) -> CodegenResult<()> {
        let doc = match unit.kind {
            ClassKind::External => "Cells read from other sheets".to_string(),
            ClassKind::Global => "Values shared by more than one output".to_string(),
            ClassKind::Output => match program.outputs.iter().find(|o| o.class == unit.id) {
                Some(output) => format!("Computes output {}", output.label),
                None => format!("Output class {}", unit.name),
            },
        };
        writeln!(out, "/// {doc}")?;
        writeln!(out, "#[derive(Debug, Clone)]")?;
        writeln!(out, "pub struct {} {{", unit.name)?;
        for field in &unit.fields {
            if self.options.emit_comments {
                writeln!(out, "    /// {}", field.label)?;
            }
            writeln!(out, "    pub {}: {},", field.name, type_name(field.ty))?;
        }
        for statement in &unit.statements {
            if self.options.emit_comments {
                match &statement.formula {
                    Some(formula) => writeln!(
                        out,
                        "    /// {}: {}",
                        statement.label,
                        single_line(formula)
                    )?,
                    None => writeln!(out, "    /// {}", statement.label)?,
                }
            }
            writeln!(out, "    pub {}: {},", statement.name, type_name(statement.ty))?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl {} {{", unit.name)?;
        writeln!(out, "    pub fn new() -> Self {{")?;
        writeln!(out, "        Self {{")?;
        for field in &unit.fields {
            writeln!(
                out,
                "            {}: {},",
                field.name,
                self.expression(&field.init)
            )?;
        }
        for statement in &unit.statements {
            writeln!(
                out,
                "            {}: {},",
                statement.name,
                default_value(statement.ty)
            )?;
        }
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;

        if !unit.statements.is_empty() {
            self.calculate(out, unit)?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl Default for {} {{", unit.name)?;
        writeln!(out, "    fn default() -> Self {{")?;
        writeln!(out, "        Self::new()")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        Ok(())
    }

    fn calculate(&self, out: &mut String, unit: &ClassUnit) -> CodegenResult<()> {
        let params: Vec<String> = unit
            .parameters
            .iter()
            .map(|p| format!(", {}: &{}", p.name, p.type_name))
            .collect();
        writeln!(out)?;
        writeln!(out, "    #[allow(unused_variables)]")?;
        writeln!(out, "    pub fn calculate(&mut self{}) {{", params.concat())?;
        for field in &unit.fields {
            writeln!(out, "        let {} = {};", field.name, self_read(&field.name, field.ty))?;
        }
        for statement in unit.statements.iter().filter(|s| s.cyclic) {
            writeln!(
                out,
                "        let mut {}: {} = {};",
                statement.name,
                type_name(statement.ty),
                self_read(&statement.name, statement.ty)
            )?;
        }
        for statement in &unit.statements {
            if self.options.emit_comments {
                match &statement.formula {
                    Some(formula) => writeln!(
                        out,
                        "        // {}: {}",
                        statement.label,
                        single_line(formula)
                    )?,
                    None => writeln!(out, "        // {}", statement.label)?,
                }
            }
            let value = self.expression(&statement.expr);
            if statement.cyclic {
                writeln!(out, "        {} = {value};", statement.name)?;
            } else {
                writeln!(
                    out,
                    "        let {}: {} = {value};",
                    statement.name,
                    type_name(statement.ty)
                )?;
            }
        }
        for statement in &unit.statements {
            writeln!(out, "        self.{0} = {0};", statement.name)?;
        }
        writeln!(out, "    }}")?;
        Ok(())
    }

    fn model(&self, out: &mut String, program: &Program) -> CodegenResult<()> {
        writeln!(out, "/// Every class of '{}', evaluated in dependency order", program.sheet)?;
        writeln!(out, "#[derive(Debug, Clone, Default)]")?;
        writeln!(out, "pub struct Model {{")?;
        for unit in &program.units {
            writeln!(out, "    pub {}: {},", unit.instance(), unit.name)?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl Model {{")?;
        writeln!(out, "    pub fn new() -> Self {{")?;
        writeln!(out, "        Self::default()")?;
        writeln!(out, "    }}")?;
        writeln!(out)?;
        writeln!(out, "    pub fn calculate(&mut self) {{")?;
        for unit in program.units.iter().filter(|u| !u.statements.is_empty()) {
            let args: Vec<String> = unit
                .parameters
                .iter()
                .map(|p| format!("&self.{}", p.name))
                .collect();
            writeln!(
                out,
                "        self.{}.calculate({});",
                unit.instance(),
                args.join(", ")
            )?;
        }
        writeln!(out, "    }}")?;

        for output in &program.outputs {
            let (ret, read) = match output.ty {
                ValueType::Text => ("&str", "&"),
                ValueType::Dynamic => ("&rt::Dynamic", "&"),
                ty => (type_name(ty), ""),
            };
            writeln!(out)?;
            writeln!(out, "    /// Output {}", output.label)?;
            writeln!(out, "    pub fn {}(&self) -> {ret} {{", output.name)?;
            writeln!(out, "        {read}self.{}.{}", output.instance, output.name)?;
            writeln!(out, "    }}")?;
        }

        for unit in &program.units {
            for field in &unit.fields {
                writeln!(out)?;
                writeln!(out, "    /// Set input {}", field.label)?;
                writeln!(
                    out,
                    "    pub fn set_{}(&mut self, value: {}) {{",
                    field.name,
                    type_name(field.ty)
                )?;
                writeln!(out, "        self.{}.{} = value;", unit.instance(), field.name)?;
                writeln!(out, "    }}")?;
            }
        }
        writeln!(out, "}}")?;
        Ok(())
    }
}

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Mul | BinaryOp::Div => 3,
        BinaryOp::Add | BinaryOp::Sub => 2,
        _ => 1,
    }
}

fn number(n: f64) -> String {
    if n.is_nan() {
        "f64::NAN".to_string()
    } else if n == f64::INFINITY {
        "f64::INFINITY".to_string()
    } else if n == f64::NEG_INFINITY {
        "f64::NEG_INFINITY".to_string()
    } else {
        format!("{n:?}")
    }
}

fn owned(path: String, ty: ValueType) -> String {
    if ty.is_copy() {
        path
    } else {
        format!("{path}.clone()")
    }
}

/// Whether `expr` is built from float literals alone
///
/// Such an expression has no concrete float type in the printed source, so
/// calling an `f64` method on it does not resolve.
fn untyped_float(expr: &Expr) -> bool {
    match expr {
        Expr::Number(_) => true,
        Expr::Group(inner) => untyped_float(inner),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => untyped_float(operand),
        Expr::Binary {
            op, left, right, ..
        } if !op.is_comparison() => untyped_float(left) && untyped_float(right),
        Expr::If {
            then_branch,
            else_branch,
            ..
        } => untyped_float(then_branch) && untyped_float(else_branch),
        _ => false,
    }
}

fn self_read(name: &str, ty: ValueType) -> String {
    owned(format!("self.{name}"), ty)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn type_name(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Bool => "bool",
        ValueType::Number => "f64",
        ValueType::Date => "rt::Date",
        ValueType::Text => "String",
        ValueType::Dynamic => "rt::Dynamic",
    }
}

fn default_value(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Bool => "false",
        ValueType::Number => "0.0",
        ValueType::Date => "rt::Date::default()",
        ValueType::Text => "String::new()",
        ValueType::Dynamic => "rt::Dynamic::Empty",
    }
}

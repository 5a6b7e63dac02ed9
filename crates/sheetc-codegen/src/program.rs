//! Program assembly
//!
//! Walks a partitioned graph and turns every class into a [`ClassUnit`]: literal
//! and external cells become fields, formulas become statements in the class's
//! sorted order. The result is target-neutral; see [`crate::emit`] for printing.

use std::collections::BTreeSet;

use sheetc_core::CellValue;
use sheetc_formula::FunctionRegistry;
use sheetc_graph::{ClassId, ClassKind, Diagnostics, Graph, Partition, VertexId, VertexKind};

use crate::error::{CodegenError, CodegenResult};
use crate::expr::{Expr, ValueType};
use crate::translate::Translator;
use crate::types::TypeTable;

/// Instance variable holding a class, e.g. `class_b1` for `ClassB1`
pub fn instance_name(class_name: &str) -> String {
    let mut out = String::with_capacity(class_name.len() + 4);
    let mut prev_lower = false;
    for c in class_name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphabetic() {
            out.push(c);
            prev_lower = true;
        } else if c.is_ascii_digit() {
            if prev_lower {
                out.push('_');
            }
            out.push(c);
            prev_lower = false;
        } else {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_matches('_').to_string()
}

/// Everything generated from one worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub sheet: String,
    /// Units in evaluation order: External, Global, then output classes
    pub units: Vec<ClassUnit>,
    pub outputs: Vec<OutputBinding>,
}

impl Program {
    pub fn unit(&self, name: &str) -> Option<&ClassUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Number of placeholder expressions across all statements
    pub fn placeholder_count(&self) -> usize {
        self.units
            .iter()
            .flat_map(|u| &u.statements)
            .filter(|s| s.expr.contains_placeholder())
            .count()
    }
}

/// One generated type
#[derive(Debug, Clone, PartialEq)]
pub struct ClassUnit {
    pub id: ClassId,
    pub name: String,
    pub color: &'static str,
    pub kind: ClassKind,
    /// Literal and external cells
    pub fields: Vec<Field>,
    /// Formulas, dependencies first
    pub statements: Vec<Statement>,
    /// Other units `calculate` reads from, in evaluation order
    pub parameters: Vec<Parameter>,
}

impl ClassUnit {
    pub fn instance(&self) -> String {
        instance_name(&self.name)
    }
}

/// A stored input value
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: ValueType,
    pub init: Expr,
    pub label: String,
}

/// A computed value
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub name: String,
    pub ty: ValueType,
    pub expr: Expr,
    pub label: String,
    pub formula: Option<String>,
    /// On a circular reference; read before it is assigned
    pub cyclic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub class: ClassId,
    pub type_name: String,
}

/// Public accessor for an output field
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBinding {
    pub name: String,
    pub class: ClassId,
    pub instance: String,
    pub ty: ValueType,
    pub label: String,
}

/// Build the program for a partitioned graph
///
/// Translation problems are reported as warnings and never fail the build.
pub fn build_program(
    graph: &Graph,
    partition: &Partition,
    diagnostics: &mut Diagnostics,
) -> CodegenResult<Program> {
    build_program_with(graph, partition, FunctionRegistry::builtins(), diagnostics)
}

/// [`build_program`] with a custom function registry
pub fn build_program_with(
    graph: &Graph,
    partition: &Partition,
    functions: &FunctionRegistry,
    diagnostics: &mut Diagnostics,
) -> CodegenResult<Program> {
    let outputs = graph.output_fields();
    if partition.is_empty() && !outputs.is_empty() {
        return Err(CodegenError::NotPartitioned);
    }
    if let Some(&id) = outputs.iter().find(|id| graph.vertex(**id).class().is_none()) {
        return Err(CodegenError::Unnamed(graph.vertex(id).label()));
    }

    let types = TypeTable::build(graph, partition, functions);
    let translator = Translator::new(graph, partition, &types).with_functions(functions);

    let order: Vec<_> = partition
        .external()
        .into_iter()
        .chain(partition.global())
        .chain(partition.iter().filter(|c| !c.is_shared()))
        .collect();

    let mut units = Vec::with_capacity(order.len());
    for class in order {
        let cyclic: BTreeSet<VertexId> = class.cyclic.iter().copied().collect();
        let mut fields = Vec::new();
        let mut statements = Vec::new();
        let mut params = BTreeSet::new();

        for &id in &class.vertices {
            let vertex = graph.vertex(id);
            if vertex.kind() == VertexKind::Range {
                continue;
            }
            let name = vertex
                .variable_name()
                .ok_or_else(|| CodegenError::Unnamed(vertex.label()))?
                .to_string();
            let ty = types.get(id);

            if vertex.is_external() || !vertex.is_formula() {
                fields.push(Field {
                    name,
                    ty,
                    init: literal(vertex.value()).cast(ty),
                    label: vertex.label(),
                });
                continue;
            }

            let translation = translator.translate(id);
            for issue in &translation.issues {
                diagnostics.warning_at(vertex.label(), vertex.formula(), issue.as_str());
            }
            params.extend(translation.params.iter().copied());
            statements.push(Statement {
                name,
                ty,
                expr: translation.expr.cast(ty),
                label: vertex.label(),
                formula: vertex.formula().map(str::to_string),
                cyclic: cyclic.contains(&id),
            });
        }

        params.remove(&class.id);
        let parameters = ordered_parameters(partition, &params);
        tracing::debug!(
            "{}: {} fields, {} statements, {} parameters",
            class.name,
            fields.len(),
            statements.len(),
            parameters.len()
        );
        units.push(ClassUnit {
            id: class.id,
            name: class.name.clone(),
            color: class.color,
            kind: class.kind,
            fields,
            statements,
            parameters,
        });
    }

    let bindings = outputs
        .iter()
        .filter_map(|&id| {
            let vertex = graph.vertex(id);
            let class = partition.get(vertex.class()?)?;
            Some(OutputBinding {
                name: vertex.variable_name()?.to_string(),
                class: class.id,
                instance: instance_name(&class.name),
                ty: types.get(id),
                label: vertex.label(),
            })
        })
        .collect();

    let program = Program {
        sheet: graph.sheet_name().to_string(),
        units,
        outputs: bindings,
    };
    let placeholders = program.placeholder_count();
    if placeholders > 0 {
        diagnostics.warning(format!(
            "{placeholders} formulas in '{}' contain untranslated parts",
            program.sheet
        ));
    }
    Ok(program)
}

/// Dependencies in the order units are evaluated
fn ordered_parameters(partition: &Partition, params: &BTreeSet<ClassId>) -> Vec<Parameter> {
    let rank = |kind: ClassKind| match kind {
        ClassKind::External => 0,
        ClassKind::Global => 1,
        ClassKind::Output => 2,
    };
    let mut classes: Vec<_> = params
        .iter()
        .filter_map(|id| partition.get(*id))
        .collect();
    classes.sort_by_key(|c| (rank(c.kind), c.id));
    classes
        .into_iter()
        .map(|c| Parameter {
            name: instance_name(&c.name),
            class: c.id,
            type_name: c.name.clone(),
        })
        .collect()
}

/// Initial value of an input cell
fn literal(value: &CellValue) -> Expr {
    match value.effective_value() {
        CellValue::Number(n) => Expr::Number(*n),
        CellValue::Boolean(b) => Expr::Bool(*b),
        CellValue::String(s) => Expr::Text(s.as_str().to_string()),
        CellValue::Date(serial) => {
            Expr::call("Date::from_serial", vec![Expr::Number(*serial)], ValueType::Date)
        }
        CellValue::Error(e) => Expr::Error(*e),
        CellValue::Empty | CellValue::Formula { .. } => Expr::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetc_core::Worksheet;
    use sheetc_graph::{ClassPartitioner, GraphBuilder, Severity};

    fn program(sheet: &Worksheet) -> (Program, Diagnostics) {
        let mut diags = Diagnostics::new();
        let mut graph = GraphBuilder::new()
            .build(sheet, |_, _| None, &mut diags)
            .unwrap();
        let partition = ClassPartitioner::new()
            .partition(&mut graph, &mut diags)
            .unwrap();
        let program = build_program(&graph, &partition, &mut diags).unwrap();
        (program, diags)
    }

    #[test]
    fn test_instance_name() {
        assert_eq!(instance_name("ClassB1"), "class_b1");
        assert_eq!(instance_name("ClassAB12"), "class_ab12");
        assert_eq!(instance_name("Global"), "global");
        assert_eq!(instance_name("External"), "external");
        assert_eq!(instance_name("ClassB1_2"), "class_b1_2");
    }

    #[test]
    fn test_units_in_evaluation_order() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 10.0).unwrap();
        sheet.set_cell_formula("B1", "=A1+1").unwrap();
        sheet.set_cell_formula("C1", "=A1+2").unwrap();
        let (program, _) = program(&sheet);

        let names: Vec<_> = program.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Global", "ClassB1", "ClassC1"]);

        let global = program.unit("Global").unwrap();
        assert_eq!(global.fields.len(), 1);
        assert_eq!(global.fields[0].init, Expr::Number(10.0));
        assert!(global.statements.is_empty());

        let b1 = program.unit("ClassB1").unwrap();
        assert_eq!(b1.parameters.len(), 1);
        assert_eq!(b1.parameters[0].name, "global");
        assert_eq!(b1.statements[0].ty, ValueType::Number);

        let outputs: Vec<_> = program.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(outputs, ["b1", "c1"]);
    }

    #[test]
    fn test_statements_follow_dependencies() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=A1*2").unwrap();
        sheet.set_cell_formula("C1", "=B1+A1").unwrap();
        let (program, _) = program(&sheet);

        let unit = program.unit("ClassC1").unwrap();
        let names: Vec<_> = unit.statements.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b1", "c1"]);
        assert_eq!(unit.fields[0].name, "a1");
        assert!(unit.parameters.is_empty());
    }

    #[test]
    fn test_date_field_initializer() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", CellValue::Date(45306.0)).unwrap();
        sheet.set_cell_formula("B1", "=A1+7").unwrap();
        let (program, _) = program(&sheet);

        let field = &program.unit("ClassB1").unwrap().fields[0];
        assert_eq!(field.ty, ValueType::Date);
        assert_eq!(
            field.init,
            Expr::call("Date::from_serial", vec![Expr::Number(45306.0)], ValueType::Date)
        );
    }

    #[test]
    fn test_untranslatable_formula_is_reported() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=MYFUNC(A1)").unwrap();
        let (program, diags) = program(&sheet);

        assert_eq!(program.placeholder_count(), 1);
        let warning = diags
            .with_severity(Severity::Warning)
            .find(|d| d.message.contains("MYFUNC"))
            .unwrap();
        assert_eq!(warning.address.as_deref(), Some("B1"));
    }

    #[test]
    fn test_cycle_members_are_flagged() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_formula("A1", "=B1+1").unwrap();
        sheet.set_cell_formula("B1", "=A1+1").unwrap();
        sheet.set_cell_formula("C1", "=A1").unwrap();
        let (program, diags) = program(&sheet);

        assert!(diags.has_errors());
        let unit = program.unit("ClassC1").unwrap();
        let cyclic: Vec<_> = unit
            .statements
            .iter()
            .filter(|s| s.cyclic)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(cyclic, ["a1", "b1"]);
        assert_eq!(unit.statements.last().unwrap().name, "c1");
    }

    #[test]
    fn test_isolated_literals_are_skipped() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_value("D9", "notes").unwrap();
        sheet.set_cell_formula("B1", "=A1").unwrap();
        let (program, _) = program(&sheet);

        let fields: Vec<_> = program
            .units
            .iter()
            .flat_map(|u| &u.fields)
            .map(|f| f.label.as_str())
            .collect();
        assert_eq!(fields, ["A1"]);
    }
}

//! End-to-end graph scenarios

use pretty_assertions::assert_eq;
use sheetc_core::{CellAddress, CellHandle, CellValue, Workbook};
use sheetc_graph::{ClassPartitioner, Diagnostics, Graph, GraphBuilder, NodeType, Severity};

fn addr(s: &str) -> CellAddress {
    CellAddress::parse(s).unwrap()
}

fn labels(graph: &Graph, ids: &[sheetc_graph::VertexId]) -> Vec<String> {
    ids.iter().map(|id| graph.vertex(*id).label()).collect()
}

fn sheet1_graph(workbook: &Workbook, diags: &mut Diagnostics) -> Graph {
    let sheet = workbook.worksheet(0).unwrap();
    GraphBuilder::new()
        .with_names(workbook.named_ranges(), 0)
        .build(sheet, |s, a| workbook.resolve_external(s, a), diags)
        .unwrap()
}

#[test]
fn single_output_owns_its_inputs() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 5.0).unwrap();
    sheet.set_cell_formula("B1", "=A1*2").unwrap();

    let mut diags = Diagnostics::new();
    let mut graph = sheet1_graph(&workbook, &mut diags);

    let b1 = graph.find_cell(addr("B1")).unwrap();
    assert!(graph.vertex(b1).parents().is_empty());
    assert_eq!(graph.vertex(b1).children().len(), 1);
    assert_eq!(graph.vertex(b1).node_type(), Some(NodeType::OutputField));

    let partition = ClassPartitioner::new().partition(&mut graph, &mut diags).unwrap();
    assert_eq!(partition.len(), 1);
    assert_eq!(labels(&graph, &partition.classes()[0].vertices), vec!["A1", "B1"]);
}

#[test]
fn shared_input_moves_to_global() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 10.0).unwrap();
    sheet.set_cell_formula("B1", "=A1+1").unwrap();
    sheet.set_cell_formula("C1", "=A1+2").unwrap();

    let mut diags = Diagnostics::new();
    let mut graph = sheet1_graph(&workbook, &mut diags);
    let partition = ClassPartitioner::new().partition(&mut graph, &mut diags).unwrap();

    let summary: Vec<(String, Vec<String>)> = partition
        .iter()
        .map(|c| (c.name.clone(), labels(&graph, &c.vertices)))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ClassB1".to_string(), vec!["B1".to_string()]),
            ("ClassC1".to_string(), vec!["C1".to_string()]),
            ("Global".to_string(), vec!["A1".to_string()]),
        ]
    );
}

#[test]
fn plain_range_becomes_discrete_edges() {
    let mut workbook = Workbook::new();
    let sheet = workbook.worksheet_mut(0).unwrap();
    for row in 1..=5 {
        sheet.set_cell_value(&format!("A{row}"), row as f64).unwrap();
    }
    sheet.set_cell_formula("B1", "=A1:A5").unwrap();

    let mut diags = Diagnostics::new();
    let graph = sheet1_graph(&workbook, &mut diags);
    let b1 = graph.find_cell(addr("B1")).unwrap();
    let children: Vec<_> = graph.vertex(b1).children().iter().copied().collect();
    assert_eq!(labels(&graph, &children), vec!["A1", "A2", "A3", "A4", "A5"]);
    assert!(graph.vertices().all(|v| v.range().is_none()));
}

#[test]
fn self_reference_terminates_with_error() {
    let mut workbook = Workbook::new();
    workbook
        .worksheet_mut(0)
        .unwrap()
        .set_cell_formula("A1", "=A1+1")
        .unwrap();

    let mut diags = Diagnostics::new();
    let mut graph = sheet1_graph(&workbook, &mut diags);
    let a1 = graph.find_cell(addr("A1")).unwrap();
    graph.filter(&[a1]);

    let partition = ClassPartitioner::new().partition(&mut graph, &mut diags).unwrap();
    assert_eq!(partition.vertex_count(), 1);
    assert_eq!(diags.count(Severity::Error), 1);
}

#[test]
fn cross_sheet_cells_come_from_the_workbook() {
    let mut workbook = Workbook::new();
    let rates = workbook.add_worksheet_with_name("Rates").unwrap();
    workbook
        .worksheet_mut(rates)
        .unwrap()
        .set_cell_value("B2", 0.2)
        .unwrap();
    let sheet = workbook.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 100.0).unwrap();
    sheet.set_cell_formula("B1", "=A1*Rates!B2").unwrap();
    sheet.set_cell_formula("C1", "=A1*Rates!B3").unwrap();

    let mut diags = Diagnostics::new();
    let mut graph = sheet1_graph(&workbook, &mut diags);
    assert_eq!(graph.external_ids().len(), 1);
    assert_eq!(diags.count(Severity::Warning), 1);

    let external = graph.externals().next().unwrap();
    assert_eq!(external.value(), &CellValue::Number(0.2));
    assert_eq!(external.label(), "Rates!B2");

    let b1 = graph.find_cell(addr("B1")).unwrap();
    graph.filter(&[b1]);
    assert_eq!(graph.external_ids().len(), 1);

    let c1 = graph.find_cell(addr("C1")).unwrap();
    graph.filter(&[c1]);
    assert!(graph.external_ids().is_empty());

    // CellHandle is the resolver's currency
    let handle: Option<CellHandle> = workbook.resolve_external("rates", addr("B2"));
    assert!(handle.is_some());
}

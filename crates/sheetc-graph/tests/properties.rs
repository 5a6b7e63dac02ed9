//! Structural properties of filtering and partitioning over random acyclic sheets

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use sheetc_core::Worksheet;
use sheetc_graph::{ClassKind, ClassPartitioner, Diagnostics, Graph, GraphBuilder, VertexId};

/// `constants` numbers in column A, then one formula per entry in column B; each
/// formula references earlier cells only, so the sheet is acyclic
fn sheet_strategy() -> impl Strategy<Value = Worksheet> {
    (
        1usize..6,
        prop::collection::vec(prop::collection::vec(0usize..64, 1..4), 1..10),
    )
        .prop_map(|(constants, formulas)| {
            let mut sheet = Worksheet::new("Sheet1");
            let mut pool = Vec::new();
            for row in 1..=constants {
                let a1 = format!("A{row}");
                sheet.set_cell_value(&a1, row as f64).unwrap();
                pool.push(a1);
            }
            for (i, refs) in formulas.iter().enumerate() {
                let terms: Vec<&str> = refs.iter().map(|r| pool[r % pool.len()].as_str()).collect();
                let b1 = format!("B{}", i + 1);
                sheet
                    .set_cell_formula(&b1, &format!("={}", terms.join("+")))
                    .unwrap();
                pool.push(b1);
            }
            sheet
        })
}

fn build(sheet: &Worksheet) -> Graph {
    let mut diags = Diagnostics::new();
    GraphBuilder::new()
        .build(sheet, |_, _| None, &mut diags)
        .unwrap()
}

proptest! {
    #[test]
    fn filter_is_idempotent(sheet in sheet_strategy()) {
        let mut graph = build(&sheet);
        let roots = graph.output_fields();

        graph.filter(&roots);
        let active = graph.active_ids().to_vec();
        let rows = graph.populated_rows().to_vec();

        graph.filter(&roots);
        prop_assert_eq!(graph.active_ids(), active.as_slice());
        prop_assert_eq!(graph.populated_rows(), rows.as_slice());
    }

    #[test]
    fn partition_is_complete_and_ordered(sheet in sheet_strategy()) {
        let mut graph = build(&sheet);
        let roots = graph.output_fields();
        graph.filter(&roots);

        let mut owners: HashMap<VertexId, usize> = HashMap::new();
        for &root in &roots {
            for id in graph.reachable(root, false) {
                *owners.entry(id).or_insert(0) += 1;
            }
        }

        let mut diags = Diagnostics::new();
        let partition = ClassPartitioner::new().partition(&mut graph, &mut diags).unwrap();
        prop_assert!(!diags.has_errors());

        // Completeness: every reachable vertex exactly once
        prop_assert_eq!(partition.vertex_count(), owners.len());
        let mut seen = HashSet::new();
        for class in partition.iter() {
            for id in &class.vertices {
                prop_assert!(seen.insert(*id));
            }
        }

        // Shared ownership
        for class in partition.iter() {
            for id in &class.vertices {
                let shared = owners[id] >= 2;
                prop_assert_eq!(class.kind == ClassKind::Global, shared);
                if !shared {
                    prop_assert_eq!(class.output.map(|r| graph.reachable(r, false).contains(id)), Some(true));
                }
            }
        }

        // Dependencies precede dependents inside each class
        for class in partition.iter() {
            prop_assert!(!class.has_cycle());
            let position: HashMap<VertexId, usize> =
                class.vertices.iter().enumerate().map(|(i, id)| (*id, i)).collect();
            for (&id, &pos) in &position {
                for child in graph.vertex(id).children() {
                    if let Some(&child_pos) = position.get(child) {
                        prop_assert!(child_pos < pos);
                    }
                }
            }
        }
    }

    #[test]
    fn variable_names_are_unique(sheet in sheet_strategy()) {
        let mut graph = build(&sheet);
        let mut diags = Diagnostics::new();
        let partition = ClassPartitioner::new().partition(&mut graph, &mut diags).unwrap();

        let mut names: HashSet<String> = partition.iter().map(|c| c.name.to_lowercase()).collect();
        for class in partition.iter() {
            for id in &class.vertices {
                let name = graph.vertex(*id).variable_name().unwrap().to_lowercase();
                prop_assert!(names.insert(name));
            }
        }
    }
}
